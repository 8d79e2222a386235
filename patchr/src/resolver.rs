//! Input resolution
//!
//! Values requested by the `input` and `choose` template helpers are looked
//! up in a shared cache first. A miss asks the [`Prompter`] and remembers the
//! answer, so every name is prompted for at most once per cache.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use colored::Colorize;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::debug;

use crate::error::PromptError;

/// Source of answers for names missing from the cache
pub trait Prompter: Send + Sync {
    /// Ask for a free-text value
    fn input(&self, name: &str) -> Result<String, PromptError>;

    /// Ask for one of a fixed list of options
    fn choose(&self, name: &str, options: &[String]) -> Result<String, PromptError>;
}

/// Resolved input values, shared by every clone
#[derive(Debug, Clone, Default)]
pub struct InputCache {
    inner: Arc<Mutex<HashMap<String, String>>>,
}

impl InputCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, String>> {
        // A panic while holding the lock cannot leave the map half-written
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn get(&self, name: &str) -> Option<String> {
        self.lock().get(name).cloned()
    }

    /// Store a value, keeping an existing answer for the same name
    pub fn insert(&self, name: impl Into<String>, value: impl Into<String>) {
        self.lock().entry(name.into()).or_insert_with(|| value.into());
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Copy of the current contents
    pub fn snapshot(&self) -> HashMap<String, String> {
        self.lock().clone()
    }
}

impl From<HashMap<String, String>> for InputCache {
    fn from(map: HashMap<String, String>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(map)),
        }
    }
}

/// Cache-first resolver handed to the template helpers
#[derive(Clone)]
pub struct InputResolver {
    cache: InputCache,
    prompter: Arc<dyn Prompter>,
}

impl std::fmt::Debug for InputResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InputResolver").field("cache", &self.cache).finish_non_exhaustive()
    }
}

impl InputResolver {
    pub fn new(cache: InputCache, prompter: Arc<dyn Prompter>) -> Self {
        Self { cache, prompter }
    }

    /// Resolver that prompts on the terminal
    pub fn interactive(cache: InputCache) -> Self {
        Self::new(cache, Arc::new(TerminalPrompter))
    }

    /// Resolver that only answers from the cache
    pub fn non_interactive(cache: InputCache) -> Self {
        Self::new(cache, Arc::new(NonInteractive))
    }

    pub fn cache(&self) -> &InputCache {
        &self.cache
    }

    /// Resolve a free-text value
    pub fn resolve_input(&self, name: &str) -> Result<String, PromptError> {
        // The lock is held across the prompt so a name is never asked twice
        let mut cache = self.cache.lock();
        if let Some(value) = cache.get(name) {
            debug!(%name, "InputResolver::resolve_input: cache hit");
            return Ok(value.clone());
        }

        debug!(%name, "InputResolver::resolve_input: prompting");
        let value = self.prompter.input(name)?;
        cache.insert(name.to_string(), value.clone());
        Ok(value)
    }

    /// Resolve a value from a fixed list of options
    pub fn resolve_choice(&self, name: &str, options: &[String]) -> Result<String, PromptError> {
        let mut cache = self.cache.lock();
        if let Some(value) = cache.get(name) {
            debug!(%name, "InputResolver::resolve_choice: cache hit");
            return Ok(value.clone());
        }

        if options.is_empty() {
            return Err(PromptError::NoOptions { name: name.to_string() });
        }

        debug!(%name, options = options.len(), "InputResolver::resolve_choice: prompting");
        let value = self.prompter.choose(name, options)?;
        cache.insert(name.to_string(), value.clone());
        Ok(value)
    }
}

/// Prompts on the controlling terminal with rustyline
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalPrompter;

impl TerminalPrompter {
    fn readline(name: &str, prompt: &str) -> Result<String, PromptError> {
        let mut rl = DefaultEditor::new().map_err(|e| PromptError::Readline(e.to_string()))?;
        match rl.readline(prompt) {
            Ok(line) => Ok(line.trim_end_matches(['\r', '\n']).to_string()),
            Err(ReadlineError::Interrupted) => Err(PromptError::Interrupted { name: name.to_string() }),
            Err(ReadlineError::Eof) => Err(PromptError::Eof { name: name.to_string() }),
            Err(err) => Err(PromptError::Readline(err.to_string())),
        }
    }
}

impl Prompter for TerminalPrompter {
    fn input(&self, name: &str) -> Result<String, PromptError> {
        Self::readline(name, &format!("{}: ", name.green()))
    }

    fn choose(&self, name: &str, options: &[String]) -> Result<String, PromptError> {
        eprintln!("{}", name.green().bold());
        for (i, option) in options.iter().enumerate() {
            eprintln!("  {} {}", format!("{})", i + 1).yellow(), option);
        }

        loop {
            let answer = Self::readline(name, &format!("{} [1-{}]: ", name.green(), options.len()))?;
            if let Some(choice) = pick_option(&answer, options) {
                return Ok(choice);
            }
            eprintln!("{} '{}' is not one of the options", "✗".red(), answer.trim());
        }
    }
}

/// Match an answer against the options, by 1-based number or exact text
fn pick_option(answer: &str, options: &[String]) -> Option<String> {
    let answer = answer.trim();
    if let Ok(n) = answer.parse::<usize>() {
        if (1..=options.len()).contains(&n) {
            return Some(options[n - 1].clone());
        }
    }
    options.iter().find(|o| o.as_str() == answer).cloned()
}

/// Never prompts; a cache miss is an error
#[derive(Debug, Clone, Copy, Default)]
pub struct NonInteractive;

impl Prompter for NonInteractive {
    fn input(&self, name: &str) -> Result<String, PromptError> {
        Err(PromptError::NonInteractive { name: name.to_string() })
    }

    fn choose(&self, name: &str, _options: &[String]) -> Result<String, PromptError> {
        Err(PromptError::NonInteractive { name: name.to_string() })
    }
}
