//! End-to-end dispatch through the axum router

use atoll::server::Dispatcher;
use atoll_core::{
    Document, Element, HandlerError, Island, PageModule, PageRegistry, Plugin, PluginRegistry,
    RenderComposer, RenderContext, Reply, RequestContext, RouteTableBuilder,
};
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use axum::response::Response;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

fn write(root: &Path, file: &str, contents: &str) {
    let path = root.join(file);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

/// Adds the page path to the head so tests can see plugins ran
struct PathMarker;

impl Plugin for PathMarker {
    fn name(&self) -> &str {
        "path-marker"
    }

    fn render(&self, document: &mut Document, cx: &RenderContext<'_>) {
        document.push_head(format!("<meta name=\"page\" content=\"{}\">", cx.path));
    }
}

fn pages() -> PageRegistry {
    PageRegistry::new()
        .page("index", || {
            PageModule::new().get(|cx: RequestContext| async move {
                cx.title("Home");
                Ok::<_, HandlerError>(Reply::component(
                    Element::new("main")
                        .child(Element::new("h1").text("Welcome"))
                        .child(Island::new("counter").props(serde_json::json!({ "start": 3 }))),
                ))
            })
        })
        .page("posts/+postId", || {
            PageModule::new()
                .get(|cx: RequestContext| async move {
                    let id = cx.param("postId").unwrap_or_default().to_string();
                    Ok::<_, HandlerError>(Reply::component(Element::new("article").text(id)))
                })
                .post(|cx: RequestContext| async move {
                    let body: serde_json::Value = cx.json()?;
                    cx.set_status(StatusCode::CREATED);
                    cx.set_header("x-post", body["title"].as_str().unwrap_or_default())?;
                    Ok::<_, HandlerError>(Reply::Empty)
                })
        })
        .page("boom", || {
            PageModule::new().get(|_cx: RequestContext| async move {
                if true {
                    panic!("handler exploded");
                }
                Ok::<_, HandlerError>(Reply::Empty)
            })
        })
        .page("fails", || {
            PageModule::new().get(|_cx: RequestContext| async move {
                Err::<Reply, _>(HandlerError::message("database unavailable"))
            })
        })
        .page("old", || {
            PageModule::new().get(|cx: RequestContext| async move { cx.redirect("/") })
        })
}

struct Fixture {
    _dir: TempDir,
    dispatcher: Dispatcher,
}

fn fixture() -> Fixture {
    let dir = TempDir::new().unwrap();
    let server = dir.path().join("server/pages");
    for page in ["index.js", "posts/+postId.js", "boom.js", "fails.js", "old.js"] {
        write(&server, page, "export {};\n");
    }
    write(&dir.path().join(".client"), "counter.client.js", "console.log(1);\n");

    let table = RouteTableBuilder::new(&server).build(&pages(), 1).unwrap();

    let mut plugins = PluginRegistry::new();
    plugins.register(PathMarker).unwrap();
    let composer = RenderComposer::new(Arc::new(plugins));

    Fixture {
        dispatcher: Dispatcher::new(table, composer, dir.path().join(".client")),
        _dir: dir,
    }
}

async fn send(fixture: &Fixture, request: Request<Body>) -> Response {
    fixture.dispatcher.router().oneshot(request).await.unwrap()
}

async fn get(fixture: &Fixture, uri: &str) -> Response {
    send(fixture, Request::get(uri).body(Body::empty()).unwrap()).await
}

async fn text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn renders_component_pages_as_html_documents() {
    let fixture = fixture();
    let response = get(&fixture, "/").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/html; charset=utf-8"
    );
    let html = text(response).await;
    assert!(html.starts_with("<!DOCTYPE html>"), "{html}");
    assert!(html.contains("<h1>Welcome</h1>"), "{html}");
    assert!(html.contains("<meta name=\"page\" content=\"/\">"), "{html}");
    assert!(html.contains("data-island=\"counter\""), "{html}");
    assert!(html.contains("src=\"/public/counter.client.js\""), "{html}");
}

#[tokio::test]
async fn dynamic_segments_reach_the_handler() {
    let fixture = fixture();
    let html = text(get(&fixture, "/posts/hello%20world").await).await;
    assert!(html.contains("<article>hello world</article>"), "{html}");
}

#[tokio::test]
async fn empty_replies_carry_status_and_headers_set_on_the_context() {
    let fixture = fixture();
    let response = send(
        &fixture,
        Request::post("/posts/42")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"title":"first"}"#))
            .unwrap(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(response.headers()["x-post"], "first");
    assert!(text(response).await.is_empty());
}

#[tokio::test]
async fn redirects_are_empty_found_responses() {
    let fixture = fixture();
    let response = get(&fixture, "/old").await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(response.headers()[header::LOCATION], "/");
}

#[tokio::test]
async fn malformed_bodies_are_bad_requests() {
    let fixture = fixture();
    let response = send(
        &fixture,
        Request::post("/posts/42").body(Body::from("not json")).unwrap(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn handler_errors_and_panics_become_500s() {
    let fixture = fixture();

    let failed = get(&fixture, "/fails").await;
    assert_eq!(failed.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = text(failed).await;
    assert!(!body.contains("database"), "{body}");

    let panicked = get(&fixture, "/boom").await;
    assert_eq!(panicked.status(), StatusCode::INTERNAL_SERVER_ERROR);

    // The server keeps answering afterwards.
    assert_eq!(get(&fixture, "/").await.status(), StatusCode::OK);
}

#[tokio::test]
async fn unknown_paths_and_methods_are_404() {
    let fixture = fixture();
    assert_eq!(get(&fixture, "/nope").await.status(), StatusCode::NOT_FOUND);
    assert_eq!(get(&fixture, "/posts").await.status(), StatusCode::NOT_FOUND);

    let delete = send(
        &fixture,
        Request::delete("/").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(delete.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn public_prefix_serves_the_client_build() {
    let fixture = fixture();
    let response = get(&fixture, "/public/counter.client.js").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(text(response).await, "console.log(1);\n");

    let missing = get(&fixture, "/public/missing.js").await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn replaced_tables_apply_to_new_requests() {
    let fixture = fixture();
    let dir = TempDir::new().unwrap();
    write(&dir.path().join("pages"), "about.js", "export {};\n");
    let registry = PageRegistry::new().page("about", || {
        PageModule::new().get(|_cx: RequestContext| async move {
            Ok::<_, HandlerError>(Reply::component(Element::new("p").text("about")))
        })
    });
    let table = RouteTableBuilder::new(dir.path().join("pages"))
        .build(&registry, 2)
        .unwrap();

    fixture.dispatcher.replace_routes(table);

    assert_eq!(fixture.dispatcher.routes().generation(), 2);
    assert_eq!(get(&fixture, "/about").await.status(), StatusCode::OK);
    assert_eq!(get(&fixture, "/").await.status(), StatusCode::NOT_FOUND);
}
