//! Server-side component tree
//!
//! A [`Component`] renders itself to an HTML string. Pages build their
//! markup from [`Element`], [`Text`] and [`Markup`], and mark hydrated
//! regions with [`Island`].

use serde::Serialize;
use std::fmt;

/// Anything that can be rendered to an HTML string on the server
pub trait Component: Send {
    fn render(&self) -> String;
}

impl fmt::Debug for dyn Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component").finish_non_exhaustive()
    }
}

impl<C: Component + ?Sized> Component for Box<C> {
    fn render(&self) -> String {
        (**self).render()
    }
}

/// Escape text content
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Escape a double-quoted attribute value
pub fn escape_attr(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Pre-rendered HTML inserted verbatim
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Markup(pub String);

impl Markup {
    pub fn new(html: impl Into<String>) -> Self {
        Self(html.into())
    }
}

impl Component for Markup {
    fn render(&self) -> String {
        self.0.clone()
    }
}

/// Escaped text node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Text(pub String);

impl Component for Text {
    fn render(&self) -> String {
        escape_html(&self.0)
    }
}

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// An HTML element with attributes and children
#[derive(Debug)]
pub struct Element {
    tag: String,
    attrs: Vec<(String, String)>,
    children: Vec<Box<dyn Component>>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.push((name.into(), value.into()));
        self
    }

    /// Shorthand for `attr("class", ..)`
    pub fn class(self, value: impl Into<String>) -> Self {
        self.attr("class", value)
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.children.push(Box::new(Text(text.into())));
        self
    }

    pub fn child(mut self, child: impl Component + 'static) -> Self {
        self.children.push(Box::new(child));
        self
    }

    pub fn children<I, C>(mut self, children: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Component + 'static,
    {
        for child in children {
            self.children.push(Box::new(child));
        }
        self
    }
}

impl Component for Element {
    fn render(&self) -> String {
        let mut html = format!("<{}", self.tag);
        for (name, value) in &self.attrs {
            html.push_str(&format!(" {}=\"{}\"", name, escape_attr(value)));
        }
        html.push('>');

        if VOID_ELEMENTS.contains(&self.tag.as_str()) {
            return html;
        }

        for child in &self.children {
            html.push_str(&child.render());
        }
        html.push_str(&format!("</{}>", self.tag));
        html
    }
}

/// Sequence of sibling components without a wrapper element
#[derive(Debug, Default)]
pub struct Fragment(pub Vec<Box<dyn Component>>);

impl Fragment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(mut self, child: impl Component + 'static) -> Self {
        self.0.push(Box::new(child));
        self
    }
}

impl Component for Fragment {
    fn render(&self) -> String {
        self.0.iter().map(|c| c.render()).collect()
    }
}

/// URL the browser build emits for an island's client entry
pub fn island_entry_url(id: &str) -> String {
    format!("/public/{id}.client.js")
}

/// A region of the page hydrated in the browser by the island `id`.
///
/// The server renders `fallback` inside a `data-island` wrapper carrying the
/// serialized props, followed by the module script of the island's client
/// entry. The client entry hydrates the wrapper with the island's default
/// export.
#[derive(Debug)]
pub struct Island {
    id: String,
    props: serde_json::Value,
    fallback: Option<Box<dyn Component>>,
}

impl Island {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            props: serde_json::Value::Object(Default::default()),
            fallback: None,
        }
    }

    /// Props passed to the island component on hydration.
    ///
    /// Values that fail to serialize are logged and leave the props empty.
    pub fn props(mut self, props: impl Serialize) -> Self {
        self.props = match serde_json::to_value(props) {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(island = %self.id, error = %err, "island props failed to serialize");
                serde_json::Value::Object(Default::default())
            }
        };
        self
    }

    /// Server-rendered markup shown until the island hydrates
    pub fn fallback(mut self, fallback: impl Component + 'static) -> Self {
        self.fallback = Some(Box::new(fallback));
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

impl Component for Island {
    fn render(&self) -> String {
        let fallback = self
            .fallback
            .as_ref()
            .map(|f| f.render())
            .unwrap_or_default();

        format!(
            "<div data-island=\"{id}\" data-props=\"{props}\">{fallback}</div>\
             <script type=\"module\" src=\"{src}\"></script>",
            id = escape_attr(&self.id),
            props = escape_attr(&self.props.to_string()),
            src = escape_attr(&island_entry_url(&self.id)),
        )
    }
}
