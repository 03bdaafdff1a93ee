//! Demo site: static and dynamic pages, a form post, a JSON endpoint and a
//! hydrated counter island.
//!
//! ```text
//! cargo run -p atoll-demo-basic -- dev --cwd demos/basic
//! ```

use atoll::atoll_core::http::StatusCode;
use atoll::prelude::*;
use atoll_plugin_head::HeadPlugin;
use atoll_plugin_style::{StyleConfig, StylePlugin};
use serde::Deserialize;
use serde_json::json;

const POSTS: &[(&str, &str, &str)] = &[
    ("hello-world", "Hello, world", "The first post, rendered on the server."),
    ("islands", "Islands", "Only the counter ships JavaScript to the browser."),
];

fn find_post(id: &str) -> Option<(&'static str, &'static str)> {
    POSTS
        .iter()
        .find(|(slug, _, _)| *slug == id)
        .map(|(_, title, body)| (*title, *body))
}

fn layout(content: impl Component + 'static) -> Element {
    Element::new("div")
        .class("mx-auto p-6")
        .child(
            Element::new("nav").class("flex gap-4 mb-6").children([
                Element::new("a").attr("href", "/").text("Home"),
                Element::new("a").attr("href", "/posts").text("Posts"),
                Element::new("a").attr("href", "/security").text("Security"),
            ]),
        )
        .child(content)
}

fn home() -> PageModule {
    PageModule::new().get(|cx: RequestContext| async move {
        cx.title("Home");
        cx.meta([("name", "description"), ("content", "An atoll demo site")]);

        let start: i64 = cx
            .query_value("start")
            .and_then(|s| s.parse().ok())
            .unwrap_or(3);

        let counter = Island::new("counter")
            .props(json!({ "start": start }))
            .fallback(
                Element::new("span")
                    .class("font-bold")
                    .text(start.to_string()),
            );

        Ok::<_, HandlerError>(Reply::component(layout(
            Fragment::new()
                .push(Element::new("h1").class("text-3xl font-bold").text("atoll"))
                .push(Element::new("p").text("Server-rendered, with one interactive island:"))
                .push(counter),
        )))
    })
}

fn posts() -> PageModule {
    PageModule::new().get(|cx: RequestContext| async move {
        cx.title("Posts");
        let items = POSTS.iter().map(|(slug, title, _)| {
            Element::new("li").child(
                Element::new("a")
                    .attr("href", format!("/posts/{slug}"))
                    .text(*title),
            )
        });
        Ok::<_, HandlerError>(Reply::component(layout(
            Fragment::new()
                .push(Element::new("h1").class("text-2xl font-bold").text("Posts"))
                .push(Element::new("ul").children(items)),
        )))
    })
}

#[derive(Debug, Deserialize)]
struct Comment {
    author: String,
    text: String,
}

fn post() -> PageModule {
    PageModule::new()
        .get(|cx: RequestContext| async move {
            let id = cx.param("postId").unwrap_or_default().to_string();
            let Some((title, body)) = find_post(&id) else {
                cx.set_status(StatusCode::NOT_FOUND);
                cx.title("Not found");
                return Ok(Reply::component(layout(
                    Element::new("p").text(format!("No post named {id}")),
                )));
            };
            cx.title(title);
            Ok::<_, HandlerError>(Reply::component(layout(
                Element::new("article")
                    .child(Element::new("h1").class("text-2xl font-bold").text(title))
                    .child(Element::new("p").text(body))
                    .child(
                        Element::new("form")
                            .attr("method", "post")
                            .class("flex flex-col gap-2 mt-6")
                            .children([
                                Element::new("input").attr("name", "author"),
                                Element::new("textarea").attr("name", "text"),
                                Element::new("button").attr("type", "submit").text("Comment"),
                            ]),
                    ),
            )))
        })
        .post(|cx: RequestContext| async move {
            let comment: Comment = cx.form()?;
            if comment.author.trim().is_empty() {
                return Err(HandlerError::bad_request("author is required"));
            }
            tracing::info!(author = %comment.author, text = %comment.text, "comment received");
            let id = cx.param("postId").unwrap_or_default().to_string();
            cx.redirect(&format!("/posts/{id}"))
        })
}

fn security() -> PageModule {
    PageModule::new().get(|cx: RequestContext| async move {
        cx.title("Security");
        cx.set_header("x-frame-options", "DENY")?;
        cx.set_header("referrer-policy", "no-referrer")?;
        Ok::<_, HandlerError>(Reply::component(layout(
            Element::new("p").text("This page is served with extra security headers."),
        )))
    })
}

fn api() -> PageModule {
    PageModule::new().get(|_cx: RequestContext| async move {
        let posts: Vec<_> = POSTS
            .iter()
            .map(|(slug, title, _)| json!({ "id": slug, "title": title }))
            .collect();
        Reply::json(&json!({ "posts": posts }))
    })
}

#[tokio::main]
async fn main() -> miette::Result<()> {
    let app = App::new()
        .page("index", home)
        .page("posts/index", posts)
        .page("posts/+postId", post)
        .page("security/index", security)
        .page("api", api)
        .plugin(HeadPlugin::new().title_template("%s | atoll"))
        .plugin(StylePlugin::with_config(
            StyleConfig::new().rule("card", "padding:1rem;border-radius:0.5rem"),
        ));

    atoll::run(app).await
}
