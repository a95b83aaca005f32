//! Rendering options configuration.

/// How the matched term is marked inside a reported line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Highlight {
    /// Terminal colors; honours `NO_COLOR` and colored's global override
    #[default]
    Color,
    /// Wrap the term in `[[` and `]]`
    Brackets,
    /// Leave the line untouched
    Plain,
}

/// Options for rendering match reports.
#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    /// Term highlighting
    pub highlight: Highlight,

    /// Print the archive member name before each line
    pub show_member: bool,
}

impl RenderOptions {
    /// Create new default render options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the highlighting style.
    pub fn with_highlight(mut self, highlight: Highlight) -> Self {
        self.highlight = highlight;
        self
    }

    /// Enable or disable member name prefixes.
    pub fn with_show_member(mut self, show: bool) -> Self {
        self.show_member = show;
        self
    }
}
