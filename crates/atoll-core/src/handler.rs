//! Page handlers and the request context they receive

use crate::component::Component;
use crate::error::HandlerError;
use crate::render::Metadata;
use axum::body::Bytes;
use axum::http::header::{CONTENT_TYPE, HeaderName, HeaderValue, LOCATION};
use axum::http::{HeaderMap, Method as HttpMethod, StatusCode, Uri};
use axum::response::Response;
use futures::future::BoxFuture;
use indexmap::IndexMap;
use parking_lot::Mutex;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::sync::Arc;

/// What a handler answers with
pub enum Reply {
    /// Rendered through the render composer as an HTML document
    Component(Box<dyn Component>),
    /// Sent as-is
    Response(Response),
    /// Empty body with whatever status and headers the handler set
    Empty,
}

impl Reply {
    pub fn component(component: impl Component + 'static) -> Self {
        Self::Component(Box::new(component))
    }

    pub fn response(response: Response) -> Self {
        Self::Response(response)
    }

    /// `200 application/json` with `value` serialized as the body
    pub fn json(value: &impl Serialize) -> Result<Self, HandlerError> {
        let body = serde_json::to_vec(value)
            .map_err(|e| HandlerError::message(format!("failed to serialize JSON reply: {e}")))?;
        let mut response = Response::new(body.into());
        response
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(Self::Response(response))
    }
}

impl std::fmt::Debug for Reply {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Component(_) => f.write_str("Reply::Component"),
            Self::Response(r) => write!(f, "Reply::Response({})", r.status()),
            Self::Empty => f.write_str("Reply::Empty"),
        }
    }
}

pub type HandlerFuture = BoxFuture<'static, Result<Reply, HandlerError>>;

/// An async request handler for one method of one page
pub trait Handler: Send + Sync + 'static {
    fn call(&self, cx: RequestContext) -> HandlerFuture;
}

impl<F, Fut> Handler for F
where
    F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Reply, HandlerError>> + Send + 'static,
{
    fn call(&self, cx: RequestContext) -> HandlerFuture {
        Box::pin(self(cx))
    }
}

pub type SharedHandler = Arc<dyn Handler>;

/// Response state a handler sets on its context
#[derive(Debug, Clone, Default)]
pub struct ResponseParts {
    pub status: Option<StatusCode>,
    pub headers: HeaderMap,
    pub metadata: Metadata,
}

/// Everything a handler gets to see about its request.
///
/// Status, headers and head metadata set through the context are shared
/// with the dispatcher, which applies them to the final response.
#[derive(Debug, Clone)]
pub struct RequestContext {
    method: HttpMethod,
    uri: Uri,
    headers: HeaderMap,
    params: IndexMap<String, String>,
    body: Bytes,
    response: Arc<Mutex<ResponseParts>>,
}

impl RequestContext {
    pub fn new(
        method: HttpMethod,
        uri: Uri,
        headers: HeaderMap,
        params: IndexMap<String, String>,
        body: Bytes,
    ) -> Self {
        Self {
            method,
            uri,
            headers,
            params,
            body,
            response: Arc::new(Mutex::new(ResponseParts::default())),
        }
    }

    /// Handle to the response state, kept by the dispatcher
    pub fn response_parts(&self) -> Arc<Mutex<ResponseParts>> {
        self.response.clone()
    }

    pub fn method(&self) -> &HttpMethod {
        &self.method
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    pub fn path(&self) -> &str {
        self.uri.path()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Header value as text, if present and valid UTF-8
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Value bound to a dynamic segment, e.g. `postId` for `/posts/:postId`
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    pub fn params(&self) -> &IndexMap<String, String> {
        &self.params
    }

    /// Deserialize the query string
    pub fn query<T: DeserializeOwned>(&self) -> Result<T, HandlerError> {
        serde_urlencoded::from_str(self.uri.query().unwrap_or_default())
            .map_err(|e| HandlerError::bad_request(format!("invalid query string: {e}")))
    }

    /// Single query parameter
    pub fn query_value(&self, name: &str) -> Option<String> {
        let pairs: Vec<(String, String)> =
            serde_urlencoded::from_str(self.uri.query()?).unwrap_or_default();
        pairs.into_iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn text(&self) -> Result<String, HandlerError> {
        String::from_utf8(self.body.to_vec())
            .map_err(|_| HandlerError::bad_request("request body is not valid UTF-8"))
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, HandlerError> {
        serde_json::from_slice(&self.body)
            .map_err(|e| HandlerError::bad_request(format!("invalid JSON body: {e}")))
    }

    /// Deserialize an `application/x-www-form-urlencoded` body
    pub fn form<T: DeserializeOwned>(&self) -> Result<T, HandlerError> {
        serde_urlencoded::from_bytes(&self.body)
            .map_err(|e| HandlerError::bad_request(format!("invalid form body: {e}")))
    }

    pub fn set_status(&self, status: StatusCode) {
        self.response.lock().status = Some(status);
    }

    pub fn set_header(&self, name: &str, value: &str) -> Result<(), HandlerError> {
        let name = HeaderName::try_from(name)
            .map_err(|e| HandlerError::message(format!("invalid header name {name}: {e}")))?;
        let value = HeaderValue::try_from(value)
            .map_err(|e| HandlerError::message(format!("invalid header value: {e}")))?;
        self.response.lock().headers.insert(name, value);
        Ok(())
    }

    /// Answer with `302 Found` pointing at `location`
    pub fn redirect(&self, location: &str) -> Result<Reply, HandlerError> {
        let value = HeaderValue::try_from(location)
            .map_err(|e| HandlerError::message(format!("invalid redirect location: {e}")))?;
        let mut parts = self.response.lock();
        parts.status = Some(StatusCode::FOUND);
        parts.headers.insert(LOCATION, value);
        Ok(Reply::Empty)
    }

    /// Set the document title
    pub fn title(&self, title: impl Into<String>) {
        self.response.lock().metadata.title = Some(title.into());
    }

    /// Add a `<meta>` tag
    pub fn meta<I, K, V>(&self, attrs: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let attrs = attrs.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
        self.response.lock().metadata.meta.push(attrs);
    }

    /// Add a `<link>` tag
    pub fn link<I, K, V>(&self, attrs: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let attrs = attrs.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
        self.response.lock().metadata.link.push(attrs);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    fn context(uri: &str, body: &'static str) -> RequestContext {
        let mut params = IndexMap::new();
        params.insert("postId".to_string(), "hello world".to_string());
        RequestContext::new(
            HttpMethod::POST,
            uri.parse().unwrap(),
            HeaderMap::new(),
            params,
            Bytes::from_static(body.as_bytes()),
        )
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Search {
        q: String,
        page: Option<u32>,
    }

    #[test]
    fn query_and_params_are_exposed() {
        let cx = context("/posts/hello%20world?q=rust&page=2", "");
        assert_eq!(cx.param("postId"), Some("hello world"));
        assert_eq!(
            cx.query::<Search>().unwrap(),
            Search {
                q: "rust".into(),
                page: Some(2)
            }
        );
        assert_eq!(cx.query_value("q").as_deref(), Some("rust"));
        assert_eq!(cx.query_value("missing"), None);
    }

    #[test]
    fn body_helpers_reject_malformed_input() {
        let cx = context("/", "{not json");
        assert!(matches!(
            cx.json::<serde_json::Value>(),
            Err(HandlerError::BadRequest(_))
        ));

        let cx = context("/", "q=atoll&page=1");
        assert_eq!(
            cx.form::<Search>().unwrap(),
            Search {
                q: "atoll".into(),
                page: Some(1)
            }
        );
    }

    #[test]
    fn response_state_is_shared_with_the_dispatcher() {
        let cx = context("/", "");
        let parts = cx.response_parts();

        cx.set_status(StatusCode::CREATED);
        cx.set_header("x-atoll", "1").unwrap();
        cx.title("Posts");
        cx.meta([("name", "description"), ("content", "All posts")]);

        let parts = parts.lock();
        assert_eq!(parts.status, Some(StatusCode::CREATED));
        assert_eq!(parts.headers["x-atoll"], "1");
        assert_eq!(parts.metadata.title.as_deref(), Some("Posts"));
        assert_eq!(parts.metadata.meta.len(), 1);
    }

    #[test]
    fn redirect_sets_found_and_location() {
        let cx = context("/", "");
        let reply = cx.redirect("/login").unwrap();
        assert!(matches!(reply, Reply::Empty));

        let parts = cx.response_parts();
        let parts = parts.lock();
        assert_eq!(parts.status, Some(StatusCode::FOUND));
        assert_eq!(parts.headers[LOCATION], "/login");
    }

    #[tokio::test]
    async fn closures_are_handlers() {
        let handler: SharedHandler = Arc::new(|cx: RequestContext| async move {
            let markup = crate::component::Markup::new(cx.path().to_string());
            Ok::<_, HandlerError>(Reply::component(markup))
        });
        let reply = handler.call(context("/about", "")).await.unwrap();
        match reply {
            Reply::Component(c) => assert_eq!(c.render(), "/about"),
            other => panic!("unexpected reply {other:?}"),
        }
    }

    #[test]
    fn json_replies_are_complete_responses() {
        let reply = Reply::json(&serde_json::json!({ "ok": true })).unwrap();
        match reply {
            Reply::Response(response) => {
                assert_eq!(response.status(), StatusCode::OK);
                assert_eq!(response.headers()[CONTENT_TYPE], "application/json");
            }
            other => panic!("expected a response, got {other:?}"),
        }
    }
}
