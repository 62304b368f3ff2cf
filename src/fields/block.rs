use serde_json::{Map, Value};

use super::{FieldContext, FieldResolver};
use crate::content::{Content, ContentView};
use crate::metadata::PropertyMetadata;

/// Resolves a list of typed blocks into one nested [`ContentView`] per block.
///
/// Each stored block is an object `{"type": name, ..fields}`. Its fields are
/// resolved through the registry using the properties of the block type
/// described on the block property; the `type` key is kept as a plain field.
/// Blocks of unknown types and malformed entries are skipped.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlockFieldResolver;

impl FieldResolver for BlockFieldResolver {
    fn resolve(&self, raw: &Value, property: &PropertyMetadata, context: &FieldContext<'_>) -> ContentView {
        let blocks = raw.as_array().map(Vec::as_slice).unwrap_or_default();

        let mut resolved = Vec::with_capacity(blocks.len());
        for block in blocks {
            let Some(fields) = block.as_object() else {
                continue;
            };
            let Some(block_type) = fields.get("type").and_then(Value::as_str) else {
                continue;
            };
            let Some(properties) = property.types.get(block_type) else {
                tracing::debug!("Unknown block type '{}' in '{}', skipping", block_type, property.name);
                continue;
            };

            let mut views = context.registry.resolve_properties(fields, properties, context.locale);
            views.insert(
                "type".to_string(),
                ContentView::content_only(Content::from(block_type)),
            );
            resolved.push(Content::from(ContentView::group(views)));
        }

        ContentView::new(Content::List(resolved), Value::Object(Map::new()))
    }
}
