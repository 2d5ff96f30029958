//! Render document fields as templates.
//!
//! The stock [`PlaceholderRenderer`] understands `{{ .name }}` placeholders and
//! nothing else; other renderers plug in through [`Renderer`].

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::engine::{self, EngineError, FieldUpdate};
use crate::path::FieldPath;

/// Substitution values by name.
pub type Values = BTreeMap<String, String>;

static ACTION_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{\{(.*?)\}\}").unwrap());
static FIELD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\.([A-Za-z_][A-Za-z0-9_]*)\s*$").unwrap());

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("template {template:?}: no value for key {key:?}")]
    MissingKey { template: String, key: String },

    #[error("template {template:?}: unclosed action at byte {offset}")]
    Unterminated { template: String, offset: usize },

    #[error("template {template:?}: unsupported action {action:?}")]
    InvalidAction { template: String, action: String },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MissingKey {
    /// Fail the render.
    #[default]
    Error,
    /// Substitute an empty string.
    Empty,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RenderOpts {
    pub missing_key: MissingKey,
}

pub trait Renderer {
    fn render(&self, template: &str, values: &Values) -> Result<String, RenderError>;
}

#[derive(Debug, Clone, Default)]
pub struct PlaceholderRenderer {
    opts: RenderOpts,
}

impl PlaceholderRenderer {
    pub fn new(opts: RenderOpts) -> Self {
        Self { opts }
    }
}

fn check_unclosed(template: &str, text: &str, base: usize) -> Result<(), RenderError> {
    match text.find("{{") {
        Some(pos) => Err(RenderError::Unterminated {
            template: template.to_string(),
            offset: base + pos,
        }),
        None => Ok(()),
    }
}

impl Renderer for PlaceholderRenderer {
    fn render(&self, template: &str, values: &Values) -> Result<String, RenderError> {
        let mut out = String::with_capacity(template.len());
        let mut last = 0;
        for caps in ACTION_RE.captures_iter(template) {
            let Some(whole) = caps.get(0) else { continue };
            let gap = &template[last..whole.start()];
            check_unclosed(template, gap, last)?;
            out.push_str(gap);
            let action = &caps[1];
            let key = FIELD_RE
                .captures(action)
                .map(|c| c.get(1).map_or("", |m| m.as_str()))
                .ok_or_else(|| RenderError::InvalidAction {
                    template: template.to_string(),
                    action: action.trim().to_string(),
                })?;
            match (values.get(key), self.opts.missing_key) {
                (Some(v), _) => out.push_str(v),
                (None, MissingKey::Empty) => {}
                (None, MissingKey::Error) => {
                    return Err(RenderError::MissingKey {
                        template: template.to_string(),
                        key: key.to_string(),
                    });
                }
            }
            last = whole.end();
        }
        let tail = &template[last..];
        check_unclosed(template, tail, last)?;
        out.push_str(tail);
        Ok(out)
    }
}

/// Treat the string(s) at `path` as templates and replace them with their
/// rendering against `values`.
pub fn apply_field_template<R: Renderer + ?Sized>(
    doc: &mut Value,
    path: &FieldPath,
    values: &Values,
    renderer: &R,
) -> Result<(), EngineError> {
    engine::apply_field_func(doc, path, |template| {
        renderer.render(template, values).map(FieldUpdate::Set)
    })
}

/// [`apply_field_template`] for several paths in order, stopping at the first
/// failure.
pub fn apply_field_templates<R: Renderer + ?Sized>(
    doc: &mut Value,
    paths: &[FieldPath],
    values: &Values,
    renderer: &R,
) -> Result<(), EngineError> {
    for path in paths {
        debug!(%path, "rendering field");
        apply_field_template(doc, path, values, renderer)?;
    }
    Ok(())
}
