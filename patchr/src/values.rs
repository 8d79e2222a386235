//! Value files
//!
//! A values file supplies the data context for templates. It is patched
//! itself before decoding (with no data of its own), so it may use `input`
//! and `choose`; answers given there are cached for the files patched next.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde_json::Value;
use tracing::{debug, info};

use crate::comment;
use crate::error::PatchError;
use crate::patcher::Patcher;
use crate::resolver::InputResolver;

/// Load and decode a JSON or YAML values file
pub fn load_values(
    path: &Path,
    resolver: &InputResolver,
    overrides: &HashMap<String, String>,
) -> Result<Value, PatchError> {
    if !path.exists() {
        return Err(PatchError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let content = fs::read_to_string(path).map_err(|e| PatchError::from(e).in_file(path))?;

    let ext = comment::extension(path);
    let content = match comment::detect_comment_prefix(path, &content, overrides) {
        Ok(prefix) => {
            debug!(?path, %prefix, "load_values: patching values file");
            Patcher::new(&prefix, resolver.clone())
                .apply_to_string(&content, &Value::Null)
                .map_err(|e| e.in_file(path))?
        }
        Err(_) => {
            debug!(?path, "load_values: no comment prefix, using content verbatim");
            content
        }
    };

    let data = decode(path, &ext, &content)?;
    info!("Loaded values from: {}", path.display());
    Ok(data)
}

fn decode(path: &Path, ext: &str, content: &str) -> Result<Value, PatchError> {
    let invalid = |message: String| PatchError::InvalidValues {
        path: path.to_path_buf(),
        message,
    };
    match ext {
        ".json" => serde_json::from_str(content).map_err(|e| invalid(e.to_string())),
        ".yaml" | ".yml" => {
            if content.trim().is_empty() {
                return Ok(Value::Null);
            }
            serde_yaml::from_str(content).map_err(|e| invalid(e.to_string()))
        }
        _ => Err(PatchError::UnsupportedValuesFile {
            path: path.to_path_buf(),
            extension: ext.to_string(),
        }),
    }
}
