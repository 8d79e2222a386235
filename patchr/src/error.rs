//! Error types for patching

use std::path::PathBuf;

use thiserror::Error;

use crate::directive::Directive;

/// Errors that can occur while patching a stream or a file tree
#[derive(Debug, Error)]
pub enum PatchError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unexpected end directive '{directive}' at line {line}")]
    UnexpectedEndDirective { directive: Directive, line: usize },

    #[error("Unexpected EOF: '{directive}' at line {line} requires a following line")]
    UnexpectedEof { directive: Directive, line: usize },

    #[error("Unterminated '{directive}' block starting at line {line}")]
    UnterminatedBlock { directive: Directive, line: usize },

    #[error("Directive at line {line} is not valid UTF-8")]
    InvalidUtf8 { line: usize },

    #[error("Cannot parse template at line {line}: {source}")]
    TemplateParse {
        line: usize,
        #[source]
        source: Box<handlebars::TemplateError>,
    },

    #[error("Cannot execute template at line {line}: {source}")]
    TemplateRender {
        line: usize,
        #[source]
        source: Box<handlebars::RenderError>,
    },

    #[error("Unsupported file type '{extension}': {path} (use --comment-prefix or a patchr:comment-prefix line)")]
    UnsupportedFileType { path: PathBuf, extension: String },

    #[error("Unsupported values file extension '{extension}': {path}")]
    UnsupportedValuesFile { path: PathBuf, extension: String },

    #[error("Cannot decode values file {path}: {message}")]
    InvalidValues { path: PathBuf, message: String },

    #[error("File not found: {path}")]
    NotFound { path: PathBuf },

    #[error("Cannot apply patch to {path}: {source}")]
    File {
        path: PathBuf,
        #[source]
        source: Box<PatchError>,
    },
}

impl PatchError {
    /// Attach the file being processed to an error
    pub fn in_file(self, path: impl Into<PathBuf>) -> Self {
        match self {
            // Already carries a path
            PatchError::File { .. }
            | PatchError::UnsupportedFileType { .. }
            | PatchError::UnsupportedValuesFile { .. }
            | PatchError::InvalidValues { .. }
            | PatchError::NotFound { .. } => self,
            other => PatchError::File {
                path: path.into(),
                source: Box::new(other),
            },
        }
    }

    /// Line number of the directive that failed, if the error came from a stream
    pub fn line(&self) -> Option<usize> {
        match self {
            PatchError::UnexpectedEndDirective { line, .. }
            | PatchError::UnexpectedEof { line, .. }
            | PatchError::UnterminatedBlock { line, .. }
            | PatchError::InvalidUtf8 { line }
            | PatchError::TemplateParse { line, .. }
            | PatchError::TemplateRender { line, .. } => Some(*line),
            PatchError::File { source, .. } => source.line(),
            _ => None,
        }
    }
}

/// Errors raised while asking the operator for an input value
#[derive(Debug, Error)]
pub enum PromptError {
    #[error("Prompt for '{name}' interrupted")]
    Interrupted { name: String },

    #[error("End of input while prompting for '{name}'")]
    Eof { name: String },

    #[error("No value for input '{name}' and prompting is disabled")]
    NonInteractive { name: String },

    #[error("choose '{name}' needs at least one option")]
    NoOptions { name: String },

    #[error("Readline error: {0}")]
    Readline(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unexpected_end_directive_message() {
        let err = PatchError::UnexpectedEndDirective {
            directive: Directive::SkipEnd,
            line: 7,
        };

        let msg = err.to_string();
        assert!(msg.contains("patchr:skip-end"));
        assert!(msg.contains("7"));
    }

    #[test]
    fn test_in_file_wraps_stream_errors() {
        let err = PatchError::UnexpectedEof {
            directive: Directive::Remove,
            line: 3,
        }
        .in_file("src/main.go");

        let msg = err.to_string();
        assert!(msg.contains("src/main.go"));
        assert!(msg.contains("patchr:remove"));
        assert_eq!(err.line(), Some(3));
    }

    #[test]
    fn test_in_file_keeps_path_errors() {
        let err = PatchError::UnsupportedFileType {
            path: PathBuf::from("README.md"),
            extension: ".md".to_string(),
        }
        .in_file("other");

        assert!(matches!(err, PatchError::UnsupportedFileType { .. }));
        assert_eq!(err.line(), None);
    }

    #[test]
    fn test_non_interactive_message() {
        let err = PromptError::NonInteractive {
            name: "author".to_string(),
        };
        assert!(err.to_string().contains("author"));
    }
}
