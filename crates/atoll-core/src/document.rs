//! Per-request HTML document under construction

/// Head and body fragments of one rendered page.
///
/// Plugins append to either list; fragments are never merged or
/// de-duplicated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    pub head: Vec<String>,
    pub body: Vec<String>,
}

impl Document {
    /// Document whose body is the rendered page markup
    pub fn with_body(markup: String) -> Self {
        Self {
            head: Vec::new(),
            body: vec![markup],
        }
    }

    pub fn push_head(&mut self, fragment: impl Into<String>) {
        self.head.push(fragment.into());
    }

    pub fn push_body(&mut self, fragment: impl Into<String>) {
        self.body.push(fragment.into());
    }

    /// Concatenated body markup
    pub fn body_html(&self) -> String {
        self.body.concat()
    }

    /// Concatenated head markup
    pub fn head_html(&self) -> String {
        self.head.concat()
    }
}
