#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderSource {
    pub vert: String,
    pub frag: String,
    /// Optional human-friendly origin (path/label) for logs.
    pub origin: Option<String>,
}

impl ShaderSource {
    pub fn new(vert: impl Into<String>, frag: impl Into<String>) -> Self {
        Self {
            vert: vert.into(),
            frag: frag.into(),
            origin: None,
        }
    }

    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    /// Label used in log lines.
    pub fn label(&self) -> &str {
        self.origin.as_deref().unwrap_or("<inline>")
    }
}
