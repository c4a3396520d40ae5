// file: src/template/renderer.rs
// version: 1.0.0
// guid: ce95f64d-42aa-4117-b0d7-66340f4be880

//! Strict template renderer
//!
//! Template bodies are static per artifact kind and parameters are explicit
//! `Serialize` structs. A template that refers to a field the parameters do
//! not carry fails before rendering with an error naming that field, so a
//! typo never turns into silently empty text on the remote host.

use crate::error::KmachineError;
use crate::Result;
use minijinja::{AutoEscape, Environment, UndefinedBehavior, Value};
use serde::Serialize;
use tracing::debug;

/// Renders named static templates with explicit parameter records
pub struct TemplateRenderer {
    env: Environment<'static>,
}

impl Default for TemplateRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateRenderer {
    /// Create a renderer with strict undefined handling
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        // Output is YAML, shell and JSON lines; never escape by file suffix
        env.set_auto_escape_callback(|_| AutoEscape::None);
        env.set_trim_blocks(true);
        env.set_keep_trailing_newline(true);
        Self { env }
    }

    /// Render `body` (registered as `name`) with `params`
    ///
    /// # Errors
    ///
    /// Returns `KmachineError::Template` if the body does not parse, refers to
    /// a field missing from `params`, or fails during evaluation.
    pub fn render<S: Serialize>(
        &self,
        name: &'static str,
        body: &'static str,
        params: &S,
    ) -> Result<String> {
        let template = self
            .env
            .template_from_named_str(name, body)
            .map_err(|e| KmachineError::template(name, e.to_string()))?;

        let ctx = Value::from_serialize(params);

        let mut missing: Vec<String> = template
            .undeclared_variables(false)
            .into_iter()
            .filter(|field| {
                ctx.get_attr(field)
                    .map(|value| value.is_undefined())
                    .unwrap_or(true)
            })
            .collect();

        if !missing.is_empty() {
            missing.sort();
            return Err(KmachineError::template(
                name,
                format!("missing field(s): {}", missing.join(", ")),
            ));
        }

        let rendered = template
            .render(&ctx)
            .map_err(|e| KmachineError::template(name, e.to_string()))?;

        debug!("Rendered template {} ({} bytes)", name, rendered.len());
        Ok(rendered)
    }
}
