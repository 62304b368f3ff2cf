//! Identity of content-bearing resources.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of the entity whose dimension rows are being resolved.
///
/// The engine never loads entities itself; this reference is carried from the
/// merged snapshot into the normalized output as its `resource` field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceRef {
    /// Kind of resource (`pages`, `articles`, `snippets`, ...).
    pub resource_key: String,
    /// Identifier of the resource within its kind.
    pub id: String,
}

impl ResourceRef {
    /// Create a new resource reference.
    pub fn new(resource_key: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            resource_key: resource_key.into(),
            id: id.into(),
        }
    }
}

impl fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.resource_key, self.id)
    }
}
