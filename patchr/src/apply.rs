//! Applying patches to files and directory trees

use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::Path;

use serde_json::Value;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::comment;
use crate::error::PatchError;
use crate::patcher::Patcher;
use crate::resolver::InputResolver;

/// Options for applying patches to files
#[derive(Debug, Clone, Default)]
pub struct ApplyOptions {
    /// Comment prefix for every file, bypassing detection
    pub comment_prefix: Option<String>,
    /// Print patched output instead of writing files back
    pub dry_run: bool,
    /// Extension -> comment prefix overrides used by detection
    pub comment_prefixes: HashMap<String, String>,
}

/// Summary of an apply run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyReport {
    /// Files that were patched (or printed, in dry-run mode)
    pub files: usize,
    /// Files whose content changed
    pub changed: usize,
}

/// Apply patches to a file, or to every file under a directory
///
/// Files are processed one at a time in file-name order. The first failure
/// stops the run; files already written keep their new content.
pub fn apply_path(
    target: &Path,
    data: &Value,
    resolver: &InputResolver,
    options: &ApplyOptions,
    dry_run_out: &mut dyn Write,
) -> Result<ApplyReport, PatchError> {
    if !target.exists() {
        return Err(PatchError::NotFound {
            path: target.to_path_buf(),
        });
    }

    let mut report = ApplyReport::default();
    if target.is_dir() {
        debug!(?target, "apply_path: walking directory");
        for entry in WalkDir::new(target).sort_by_file_name() {
            let entry = entry.map_err(|e| PatchError::from(std::io::Error::from(e)).in_file(target))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let changed = apply_file(entry.path(), data, resolver, options, dry_run_out)?;
            report.files += 1;
            report.changed += usize::from(changed);
        }
    } else {
        let changed = apply_file(target, data, resolver, options, dry_run_out)?;
        report.files = 1;
        report.changed = usize::from(changed);
    }

    info!(files = report.files, changed = report.changed, "Apply complete");
    Ok(report)
}

/// Apply patches to a single file; returns whether its content changed
pub fn apply_file(
    path: &Path,
    data: &Value,
    resolver: &InputResolver,
    options: &ApplyOptions,
    dry_run_out: &mut dyn Write,
) -> Result<bool, PatchError> {
    let content = fs::read(path).map_err(|e| PatchError::from(e).in_file(path))?;

    let prefix = match &options.comment_prefix {
        Some(prefix) => prefix.clone(),
        None => comment::detect_comment_prefix(path, &String::from_utf8_lossy(&content), &options.comment_prefixes)?,
    };
    debug!(?path, %prefix, "apply_file: patching");

    let patched = Patcher::new(&prefix, resolver.clone())
        .apply_to_bytes(&content, data)
        .map_err(|e| e.in_file(path))?;
    let changed = patched != content;

    if options.dry_run {
        writeln!(dry_run_out, "=== {} === start ===", path.display())?;
        dry_run_out.write_all(&patched)?;
        writeln!(dry_run_out, "=== {} === end ===", path.display())?;
        return Ok(changed);
    }

    if changed {
        // Only reached after the whole file patched successfully
        fs::write(path, &patched).map_err(|e| PatchError::from(e).in_file(path))?;
        info!("Patched {}", path.display());
    } else {
        debug!(?path, "apply_file: unchanged");
    }
    Ok(changed)
}
