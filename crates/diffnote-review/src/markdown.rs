use crate::severity::SeverityCounts;

/// Append-only builder for Markdown comment bodies.
///
/// # Examples
///
/// ```
/// use diffnote_review::markdown::MarkdownBuilder;
///
/// let mut md = MarkdownBuilder::new();
/// md.add_text("Findings:").add_line_break();
/// md.start_list_item().add_text("1 critical").end_list_item();
/// assert_eq!(md.build(), "Findings:\n- 1 critical\n");
/// ```
#[derive(Debug, Clone, Default)]
pub struct MarkdownBuilder {
    out: String,
}

impl MarkdownBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a bullet list item.
    pub fn start_list_item(&mut self) -> &mut Self {
        self.out.push_str("- ");
        self
    }

    /// Close the current list item.
    pub fn end_list_item(&mut self) -> &mut Self {
        self.add_line_break()
    }

    /// Append text verbatim.
    pub fn add_text(&mut self, text: &str) -> &mut Self {
        self.out.push_str(text);
        self
    }

    /// Append a newline.
    pub fn add_line_break(&mut self) -> &mut Self {
        self.out.push('\n');
        self
    }

    /// Finish and return the Markdown text.
    pub fn build(self) -> String {
        self.out
    }
}

/// Body of the commit-level summary annotation.
///
/// # Examples
///
/// ```
/// use diffnote_review::markdown::summary_text;
/// use diffnote_review::severity::SeverityCounts;
///
/// let text = summary_text("SonarQube", &SeverityCounts::default());
/// assert_eq!(
///     text,
///     "SonarQube analysis reported 0 issues.\n\nWatch the comments in this conversation to review them."
/// );
/// ```
pub fn summary_text(analyzer: &str, counts: &SeverityCounts) -> String {
    let total = counts.total();
    let noun = if total == 1 { "issue" } else { "issues" };

    let mut md = MarkdownBuilder::new();
    md.add_text(&format!("{analyzer} analysis reported {total} {noun}."))
        .add_line_break()
        .add_line_break();

    if total > 0 {
        for (severity, count) in counts.most_severe_first() {
            md.start_list_item()
                .add_text(&format!("{count} {severity}"))
                .end_list_item();
        }
        md.add_line_break();
    }

    md.add_text("Watch the comments in this conversation to review them.");
    md.build()
}
