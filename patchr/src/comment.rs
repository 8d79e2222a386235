//! Comment prefix detection
//!
//! Picks the line-comment marker for a file from, in order: configured
//! extension overrides, the built-in extension table, a shebang, or a
//! `patchr:comment-prefix` marker on the first line.

use std::collections::HashMap;
use std::path::Path;

use tracing::debug;

use crate::error::PatchError;

/// First-line marker declaring the comment prefix, e.g. `-- patchr:comment-prefix`
pub const COMMENT_PREFIX_DIRECTIVE: &str = "patchr:comment-prefix";

/// Built-in extension table
const WELL_KNOWN: &[(&str, &str)] = &[
    (".go", "//"),
    (".java", "//"),
    (".js", "//"),
    (".ts", "//"),
    (".kt", "//"),
    (".groovy", "//"),
    (".gradle", "//"),
    (".rs", "//"),
    (".c", "//"),
    (".h", "//"),
    (".cpp", "//"),
    (".cs", "//"),
    (".swift", "//"),
    (".scala", "//"),
    (".proto", "//"),
    (".sql", "--"),
    (".sh", "#"),
    (".bash", "#"),
    (".yaml", "#"),
    (".yml", "#"),
    (".py", "#"),
    (".rb", "#"),
    (".toml", "#"),
];

/// Extension of `path` with its leading dot, or an empty string
pub fn extension(path: &Path) -> String {
    path.extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default()
}

/// Comment prefix registered for an extension
pub fn prefix_for_extension(ext: &str, overrides: &HashMap<String, String>) -> Option<String> {
    if let Some(prefix) = overrides.get(ext) {
        return Some(prefix.clone());
    }
    WELL_KNOWN
        .iter()
        .find(|(known, _)| *known == ext)
        .map(|(_, prefix)| prefix.to_string())
}

/// Comment prefix declared by the first line of `content`
pub fn prefix_from_first_line(content: &str) -> Option<String> {
    let first = content.lines().next()?;
    if first.starts_with("#!") {
        debug!("prefix_from_first_line: shebang");
        return Some("#".to_string());
    }
    match first.find(COMMENT_PREFIX_DIRECTIVE) {
        Some(index) if index > 0 => {
            let prefix = first[..index].trim();
            debug!(%prefix, "prefix_from_first_line: comment-prefix directive");
            Some(prefix.to_string())
        }
        _ => None,
    }
}

/// Detect the comment prefix for a file
pub fn detect_comment_prefix(
    path: &Path,
    content: &str,
    overrides: &HashMap<String, String>,
) -> Result<String, PatchError> {
    let ext = extension(path);
    if let Some(prefix) = prefix_for_extension(&ext, overrides) {
        debug!(?path, %prefix, "detect_comment_prefix: matched extension");
        return Ok(prefix);
    }

    prefix_from_first_line(content).ok_or_else(|| PatchError::UnsupportedFileType {
        path: path.to_path_buf(),
        extension: ext,
    })
}
