use serde_json::{Map, Value};

use super::{FieldContext, FieldResolver};
use crate::content::{Content, ContentView};
use crate::metadata::PropertyMetadata;

/// Passes the stored value through unchanged, with an empty view.
///
/// Used for scalar field types (text, numbers, dates, selects) and for
/// fields of templates without metadata.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultFieldResolver;

impl DefaultFieldResolver {
    /// View of a raw value without resolution.
    pub fn view_of(raw: &Value) -> ContentView {
        ContentView::new(Content::from(raw.clone()), Value::Object(Map::new()))
    }
}

impl FieldResolver for DefaultFieldResolver {
    fn resolve(&self, raw: &Value, _property: &PropertyMetadata, _context: &FieldContext<'_>) -> ContentView {
        Self::view_of(raw)
    }
}
