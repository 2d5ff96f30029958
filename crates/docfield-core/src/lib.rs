//! docfield-core: rewrite string fields of schemaless JSON documents by path
//!
//! This crate focuses on a small, well-factored surface:
//! - Field paths with a `[]` segment for "every element of this list"
//! - Nested read/write primitives over `serde_json::Value`
//! - The traversal engine that finds string leaves and applies a mutation
//! - Template rendering of fields against named values, and JSON file helpers
//!
pub mod accessor;
pub mod engine;
pub mod io;
pub mod path;
pub mod template;

pub use engine::{BoxError, EngineError, FieldUpdate, apply_field_func, apply_field_func_copied};
pub use io::{IoError, find_json_files, load_json_file, write_json_to_file};
pub use path::{EXPAND_TOKEN, FieldPath, PathError, Segment};
pub use template::{
    MissingKey, PlaceholderRenderer, RenderError, RenderOpts, Renderer, Values,
    apply_field_template, apply_field_templates,
};
