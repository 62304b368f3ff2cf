use serde_json::{Map, Value};

use super::{FieldContext, FieldResolver};
use crate::constants::DEFAULT_SMART_PRIORITY;
use crate::content::{ContentView, SmartToken};
use crate::metadata::PropertyMetadata;

/// Resolves stored filter parameters into one [`SmartToken`].
///
/// The effective parameters are the property's `params` (defaults such as
/// `limit`) overridden by the stored filter object. A `provider` parameter
/// selects the smart resolver; otherwise the resolver's own loader key is
/// used. The view carries the effective parameters.
#[derive(Debug, Clone)]
pub struct SmartContentFieldResolver {
    loader_key: String,
    priority: i32,
}

impl SmartContentFieldResolver {
    /// Resolver querying `loader_key` unless the property names a provider.
    pub fn new(loader_key: impl Into<String>) -> Self {
        Self {
            loader_key: loader_key.into(),
            priority: DEFAULT_SMART_PRIORITY,
        }
    }

    /// Set the priority of emitted tokens.
    #[must_use]
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }
}

impl FieldResolver for SmartContentFieldResolver {
    fn resolve(&self, raw: &Value, property: &PropertyMetadata, _context: &FieldContext<'_>) -> ContentView {
        let mut parameters: Map<String, Value> = property.params.clone();
        if let Value::Object(filters) = raw {
            for (name, value) in filters {
                parameters.insert(name.clone(), value.clone());
            }
        }

        let loader_key = parameters
            .get("provider")
            .and_then(Value::as_str)
            .unwrap_or(&self.loader_key)
            .to_string();
        let parameters = Value::Object(parameters);

        let token = SmartToken::new(parameters.clone(), loader_key).with_priority(self.priority);
        ContentView::new(token, parameters)
    }
}
