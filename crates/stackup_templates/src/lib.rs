//! # stackup_templates
//!
//! Placeholder substitution for stackup configuration templates.
//!
//! A template is any UTF-8 text file containing `$name` or `${name}`
//! placeholders. Rendering replaces the placeholders that have a value,
//! leaves the rest untouched, and writes the result back over the file.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::collections::BTreeMap;
//! use stackup_templates::TemplateRenderer;
//!
//! let mut vars = BTreeMap::new();
//! vars.insert("name".to_string(), "web".to_string());
//!
//! let renderer = TemplateRenderer::new();
//! let report = renderer.render_file("docker-compose.yml", &vars).unwrap();
//! println!("{} substituted", report.substituted);
//! ```

pub mod document;
pub mod error;
pub mod renderer;

pub use document::TemplateDocument;
pub use error::{TemplateError, TemplateResult};
pub use renderer::{RenderReport, TemplateRenderer};
