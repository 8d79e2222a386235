//! Directive lexicon
//!
//! Derives the token strings that identify each directive inside a line of
//! text for a given comment prefix, and finds which directive a line carries.

use std::fmt;

/// A patch directive embedded in a source comment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Directive {
    /// Replace the next line with the rendered content
    Replace,
    /// Add the rendered content in place of the directive line
    Add,
    /// Remove the next line
    Remove,
    /// Start of a template block
    TemplateStart,
    /// End of a template block
    TemplateEnd,
    /// Start of a skip block
    SkipStart,
    /// End of a skip block
    SkipEnd,
}

impl Directive {
    /// All directives in matching order
    pub const ALL: [Directive; 7] = [
        Directive::Replace,
        Directive::Add,
        Directive::Remove,
        Directive::TemplateStart,
        Directive::TemplateEnd,
        Directive::SkipStart,
        Directive::SkipEnd,
    ];

    /// Literal keyword following the comment prefix
    ///
    /// Replace and Add carry a trailing space before their content.
    pub fn keyword(&self) -> &'static str {
        match self {
            Self::Replace => "patchr:replace ",
            Self::Add => "patchr:add ",
            Self::Remove => "patchr:remove",
            Self::TemplateStart => "patchr:template-start",
            Self::TemplateEnd => "patchr:template-end",
            Self::SkipStart => "patchr:skip-start",
            Self::SkipEnd => "patchr:skip-end",
        }
    }
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.keyword().trim_end())
    }
}

/// A directive found in a line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirectiveMatch {
    pub directive: Directive,
    /// Byte offset where the token starts; everything before it is the indent
    pub start: usize,
    /// Byte offset just past the token; everything after it is the content
    pub end: usize,
}

impl DirectiveMatch {
    pub fn indent<'a>(&self, line: &'a str) -> &'a str {
        &line[..self.start]
    }

    pub fn content<'a>(&self, line: &'a str) -> &'a str {
        &line[self.end..]
    }
}

/// Token strings for every directive, built once per comment prefix
#[derive(Debug, Clone)]
pub struct Lexicon {
    tokens: Vec<(Directive, String)>,
}

impl Lexicon {
    pub fn new(comment_prefix: &str) -> Self {
        let tokens = Directive::ALL
            .iter()
            .map(|d| (*d, format!("{} {}", comment_prefix, d.keyword())))
            .collect();
        Self { tokens }
    }

    /// Token string for a directive
    pub fn token(&self, directive: Directive) -> &str {
        self.tokens
            .iter()
            .find(|(d, _)| *d == directive)
            .map(|(_, t)| t.as_str())
            .unwrap_or_default()
    }

    /// Find the directive carried by a line
    ///
    /// Tokens match anywhere in the line. When more than one token occurs,
    /// the one starting earliest wins; equal offsets fall back to `Directive::ALL` order.
    pub fn find(&self, line: &str) -> Option<DirectiveMatch> {
        let mut best: Option<DirectiveMatch> = None;
        for (directive, token) in &self.tokens {
            if let Some(start) = line.find(token.as_str()) {
                if best.is_none_or(|b| start < b.start) {
                    best = Some(DirectiveMatch {
                        directive: *directive,
                        start,
                        end: start + token.len(),
                    });
                }
            }
        }
        best
    }

    /// Whether a line carries the given directive's token
    pub fn contains(&self, line: &str, directive: Directive) -> bool {
        line.contains(self.token(directive))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_for_prefix() {
        let lexicon = Lexicon::new("//");
        assert_eq!(lexicon.token(Directive::Replace), "// patchr:replace ");
        assert_eq!(lexicon.token(Directive::Add), "// patchr:add ");
        assert_eq!(lexicon.token(Directive::Remove), "// patchr:remove");
        assert_eq!(lexicon.token(Directive::TemplateStart), "// patchr:template-start");
        assert_eq!(lexicon.token(Directive::TemplateEnd), "// patchr:template-end");
        assert_eq!(lexicon.token(Directive::SkipStart), "// patchr:skip-start");
        assert_eq!(lexicon.token(Directive::SkipEnd), "// patchr:skip-end");
    }

    #[test]
    fn test_find_reports_indent_and_content() {
        let lexicon = Lexicon::new("#");
        let line = "    # patchr:replace name: {{name}}";
        let m = lexicon.find(line).unwrap();
        assert_eq!(m.directive, Directive::Replace);
        assert_eq!(m.indent(line), "    ");
        assert_eq!(m.content(line), "name: {{name}}");
    }

    #[test]
    fn test_find_no_directive() {
        let lexicon = Lexicon::new("//");
        assert!(lexicon.find("fn main() {}").is_none());
        // Missing the space between prefix and keyword
        assert!(lexicon.find("//patchr:remove").is_none());
        // Replace requires content separated by a space
        assert!(lexicon.find("// patchr:replace").is_none());
    }

    #[test]
    fn test_find_matches_inside_other_text() {
        let lexicon = Lexicon::new("//");
        let line = r#"let s = "// patchr:remove";"#;
        let m = lexicon.find(line).unwrap();
        assert_eq!(m.directive, Directive::Remove);
        assert_eq!(m.indent(line), "let s = \"");
    }

    #[test]
    fn test_find_earliest_offset_wins() {
        let lexicon = Lexicon::new("//");
        let m = lexicon
            .find("// patchr:skip-start // patchr:replace x")
            .unwrap();
        assert_eq!(m.directive, Directive::SkipStart);
        assert_eq!(m.start, 0);

        let m = lexicon.find("x // patchr:add y // patchr:remove").unwrap();
        assert_eq!(m.directive, Directive::Add);
        assert_eq!(m.start, 2);
    }

    #[test]
    fn test_display_trims_keyword() {
        assert_eq!(Directive::Replace.to_string(), "patchr:replace");
        assert_eq!(Directive::TemplateEnd.to_string(), "patchr:template-end");
    }
}
