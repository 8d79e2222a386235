//! patchr - apply patch directives embedded in source comments
//!
//! Generated boilerplate can carry its own edit instructions as comments.
//! Running the patcher over such a file rewrites it line by line:
//!
//! ```text
//! // patchr:replace Use: "{{name}}",      replace the next line
//! // patchr:add {{license}}               insert a line here
//! // patchr:remove                        drop the next line
//! // patchr:template-start                render the commented block
//! // {{#if verbose}}log.debug(){{/if}}
//! // patchr:template-end
//! // patchr:skip-start                    drop everything up to skip-end
//! // patchr:skip-end
//! ```
//!
//! Templates are Handlebars, rendered against a data context loaded from a
//! JSON or YAML values file. `{{input "name"}}` and `{{choose "name" "a" "b"}}`
//! ask the operator once per name and reuse the answer everywhere.
//! Templates written for the Go version of patchr (`{{.Name}}`, pipelines)
//! must be converted to Handlebars syntax (`{{Name}}`, subexpressions).
//!
//! # Example
//!
//! ```
//! use patchr::{InputCache, InputResolver, Patcher};
//! use serde_json::json;
//!
//! let patcher = Patcher::new("//", InputResolver::non_interactive(InputCache::new()));
//! let out = patcher
//!     .apply_to_string("// patchr:replace const NAME = \"{{name}}\";\nconst NAME = \"x\";\n", &json!({"name": "demo"}))
//!     .unwrap();
//! assert_eq!(out, "const NAME = \"demo\";\n");
//! ```

pub mod apply;
pub mod cli;
pub mod comment;
pub mod config;
pub mod directive;
pub mod error;
mod patcher;
pub mod resolver;
mod template;
pub mod values;

pub use apply::{ApplyOptions, ApplyReport, apply_file, apply_path};
pub use directive::{Directive, DirectiveMatch, Lexicon};
pub use error::{PatchError, PromptError};
pub use patcher::Patcher;
pub use resolver::{InputCache, InputResolver, NonInteractive, Prompter, TerminalPrompter};
pub use template::TemplateEngine;
pub use values::load_values;
