//! Locate string leaves addressed by a [`FieldPath`] and rewrite them in place.
//!
//! Paths come in three shapes, each with its own resolver:
//! - no `[]`: a single string field (`metadata.name`)
//! - `[]` last: every string of a list (`spec.args.[]`)
//! - `[]` before the last segment: the remaining path inside every object of
//!   a list (`spec.containers.[].image`), resolved by re-entering dispatch.
//!
//! Missing fields are never an error. Documents of the same kind are expected
//! to differ structurally, so a path that does not exist is skipped silently.

use std::error::Error as StdError;

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, trace};

use crate::accessor::{self, AccessError, kind_name};
use crate::path::{FieldPath, PathError, Segment, display_keys};

pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Outcome of a mutation for one located value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldUpdate {
    /// Replace the value.
    Set(String),
    /// Leave the value as it is.
    Keep,
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    InvalidPath(#[from] PathError),

    #[error("error reading object: {0}")]
    Read(#[source] AccessError),

    #[error("error updating object: {0}")]
    Write(#[source] AccessError),

    #[error("{path}[{index}]: expected an object, found {actual}")]
    ElementShape {
        path: String,
        index: usize,
        actual: &'static str,
    },

    #[error(transparent)]
    Mutation(BoxError),
}

impl EngineError {
    /// The mutation's own error, if that is what aborted the call.
    pub fn mutation_error(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        match self {
            EngineError::Mutation(e) => Some(e.as_ref()),
            _ => None,
        }
    }
}

/// Rewrite every string addressed by `path` with `f`.
///
/// `f` runs exactly once per located value, in document order. The first
/// error aborts the call; values rewritten before it stay rewritten.
pub fn apply_field_func<F, E>(doc: &mut Value, path: &FieldPath, mut f: F) -> Result<(), EngineError>
where
    F: FnMut(&str) -> Result<FieldUpdate, E>,
    E: Into<BoxError>,
{
    path.validate()?;
    let mut ff = |s: &str| f(s).map_err(|e| EngineError::Mutation(e.into()));
    dispatch(doc, path.segments(), &mut ff)
}

/// Like [`apply_field_func`], but works on a copy and returns it only when
/// every value was processed.
pub fn apply_field_func_copied<F, E>(doc: &Value, path: &FieldPath, f: F) -> Result<Value, EngineError>
where
    F: FnMut(&str) -> Result<FieldUpdate, E>,
    E: Into<BoxError>,
{
    let mut out = doc.clone();
    apply_field_func(&mut out, path, f)?;
    Ok(out)
}

type FieldFn<'a> = dyn FnMut(&str) -> Result<FieldUpdate, EngineError> + 'a;

fn dispatch(doc: &mut Value, path: &[Segment], ff: &mut FieldFn<'_>) -> Result<(), EngineError> {
    if path.is_empty() {
        return Ok(());
    }
    match path.iter().position(|s| *s == Segment::Expand) {
        None => apply_plain(doc, &keys_of(path), ff),
        Some(ind) if ind == path.len() - 1 => apply_string_list(doc, &keys_of(&path[..ind]), ff),
        Some(ind) => apply_nested_list(doc, &keys_of(&path[..ind]), &path[ind + 1..], ff),
    }
}

fn keys_of(path: &[Segment]) -> Vec<&str> {
    path.iter().filter_map(Segment::as_key).collect()
}

fn apply_plain(doc: &mut Value, keys: &[&str], ff: &mut FieldFn<'_>) -> Result<(), EngineError> {
    let existing = match accessor::nested_string(doc, keys) {
        Ok(Some(s)) => s,
        Ok(None) => {
            trace!(path = %display_keys(keys), "field not present, skipping");
            return Ok(());
        }
        Err(e) => {
            debug!(error = %e, "field is not a string, skipping");
            return Ok(());
        }
    };
    if let FieldUpdate::Set(value) = ff(&existing)? {
        accessor::set_nested_string(doc, keys, value).map_err(EngineError::Write)?;
    }
    Ok(())
}

fn apply_string_list(doc: &mut Value, keys: &[&str], ff: &mut FieldFn<'_>) -> Result<(), EngineError> {
    let Some(existing) = accessor::nested_string_list(doc, keys).map_err(EngineError::Read)? else {
        trace!(path = %display_keys(keys), "list not present, skipping");
        return Ok(());
    };
    let mut changed = false;
    let mut values = Vec::with_capacity(existing.len());
    for item in existing {
        match ff(&item)? {
            FieldUpdate::Set(v) => {
                changed = true;
                values.push(v);
            }
            FieldUpdate::Keep => values.push(item),
        }
    }
    if changed {
        accessor::set_nested_string_list(doc, keys, values).map_err(EngineError::Write)?;
    }
    Ok(())
}

fn apply_nested_list(
    doc: &mut Value,
    keys: &[&str],
    rest: &[Segment],
    ff: &mut FieldFn<'_>,
) -> Result<(), EngineError> {
    // The same key may hold a list in one document and a scalar in another.
    let mut items = match accessor::nested_list(doc, keys) {
        Ok(Some(items)) => items,
        Ok(None) => return Ok(()),
        Err(e) => {
            debug!(error = %e, "not a list, skipping");
            return Ok(());
        }
    };
    debug!(path = %display_keys(keys), len = items.len(), "descending into list");
    for (index, item) in items.iter_mut().enumerate() {
        if !item.is_object() {
            return Err(EngineError::ElementShape {
                path: display_keys(keys),
                index,
                actual: kind_name(item),
            });
        }
        dispatch(item, rest, ff)?;
    }
    accessor::set_nested_list(doc, keys, items).map_err(EngineError::Write)
}
