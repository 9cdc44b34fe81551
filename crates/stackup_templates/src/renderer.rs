//! Placeholder substitution.
//!
//! Recognized syntax:
//!
//! - `$name` and `${name}`, where `name` matches `[_A-Za-z][_A-Za-z0-9]*`
//! - `$$`, which renders as a single `$`
//!
//! Substitution is permissive: a placeholder whose name has no value in the
//! mapping is kept exactly as written, and any other use of `$` is passed
//! through untouched.

use std::collections::{BTreeMap, BTreeSet};
use std::io::Write;
use std::path::{Path, PathBuf};

use regex::{Captures, Regex};
use tracing::{debug, info, warn};

use crate::document::TemplateDocument;
use crate::error::TemplateResult;

/// Outcome of rendering a template file in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderReport {
    /// File that was read and overwritten
    pub path: PathBuf,
    /// Text written back to `path`
    pub rendered: String,
    /// Number of placeholders replaced with a value
    pub substituted: usize,
    /// Placeholder names left in the output because the mapping lacks them
    pub unresolved: BTreeSet<String>,
}

impl RenderReport {
    /// Whether every placeholder in the template received a value.
    pub fn is_complete(&self) -> bool {
        self.unresolved.is_empty()
    }
}

/// Template renderer for `$name` / `${name}` placeholders.
pub struct TemplateRenderer {
    placeholder_pattern: Regex,
}

impl Default for TemplateRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateRenderer {
    /// Create a new template renderer.
    pub fn new() -> Self {
        Self {
            // $$ | $name | ${name}
            placeholder_pattern: Regex::new(
                r"\$(?:(\$)|([_A-Za-z][_A-Za-z0-9]*)|\{([_A-Za-z][_A-Za-z0-9]*)\})",
            )
            .expect("placeholder pattern is a valid regex"),
        }
    }

    /// Render content by replacing placeholders found in `variables`.
    pub fn render_content(&self, content: &str, variables: &BTreeMap<String, String>) -> String {
        self.substitute(content, variables).0
    }

    /// Names of all placeholders referenced in `content`.
    pub fn placeholders(&self, content: &str) -> BTreeSet<String> {
        self.placeholder_pattern
            .captures_iter(content)
            .filter_map(|caps| Self::placeholder_name(&caps).map(str::to_string))
            .collect()
    }

    /// Names referenced in `content` that have no entry in `variables`.
    pub fn unresolved(
        &self,
        content: &str,
        variables: &BTreeMap<String, String>,
    ) -> BTreeSet<String> {
        self.placeholders(content)
            .into_iter()
            .filter(|name| !variables.contains_key(name))
            .collect()
    }

    /// Render the file at `path` in place, echoing the result to stdout.
    pub fn render_file(
        &self,
        path: impl AsRef<Path>,
        variables: &BTreeMap<String, String>,
    ) -> TemplateResult<RenderReport> {
        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        self.render_file_to(path, variables, &mut handle)
    }

    /// Render the file at `path` in place, echoing the result to `echo`.
    ///
    /// The original content is overwritten; no backup is kept.
    pub fn render_file_to<W: Write + ?Sized>(
        &self,
        path: impl AsRef<Path>,
        variables: &BTreeMap<String, String>,
        echo: &mut W,
    ) -> TemplateResult<RenderReport> {
        let document = TemplateDocument::load(path)?;
        debug!(
            "Loaded template {:?} ({} bytes)",
            document.path(),
            document.raw().len()
        );

        let (rendered, substituted) = self.substitute(document.raw(), variables);
        let unresolved = self.unresolved(document.raw(), variables);

        if !unresolved.is_empty() {
            warn!(
                "Left {} placeholder(s) unresolved in {:?}: {}",
                unresolved.len(),
                document.path(),
                unresolved.iter().cloned().collect::<Vec<_>>().join(", ")
            );
        }

        writeln!(echo, "{}", rendered)?;
        echo.flush()?;

        let path = document.persist(&rendered)?;
        info!(
            "Rendered {:?}: {} placeholder(s) substituted",
            path, substituted
        );

        Ok(RenderReport {
            path,
            rendered,
            substituted,
            unresolved,
        })
    }

    /// Replace placeholders, returning the text and the number of replacements.
    fn substitute(&self, content: &str, variables: &BTreeMap<String, String>) -> (String, usize) {
        let mut substituted = 0;
        let rendered = self
            .placeholder_pattern
            .replace_all(content, |caps: &Captures| {
                if caps.get(1).is_some() {
                    return "$".to_string();
                }
                match Self::placeholder_name(caps).and_then(|name| variables.get(name)) {
                    Some(value) => {
                        substituted += 1;
                        value.clone()
                    }
                    None => caps[0].to_string(),
                }
            })
            .into_owned();
        (rendered, substituted)
    }

    fn placeholder_name<'t>(caps: &Captures<'t>) -> Option<&'t str> {
        caps.get(2).or_else(|| caps.get(3)).map(|m| m.as_str())
    }
}
