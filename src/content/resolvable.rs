//! Placeholder tokens for content that must be loaded in batches.
//!
//! Field resolvers never load referenced entities themselves. They emit
//! [`Resolvable`] tokens instead; the engine groups tokens by loader key and
//! priority, loads each group with one call and splices the results back.

use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fmt;
use std::sync::Arc;

use super::Content;
use crate::constants::{
    DEFAULT_METADATA_IDENTIFIER, DEFAULT_RESOURCE_PRIORITY, DEFAULT_SMART_PRIORITY,
    METADATA_IDENTIFIER_LENGTH,
};

/// Shapes one loaded raw value into content.
///
/// Receives `None` when the id was requested but the loader did not return
/// it; the callback decides the fallback.
pub type PostProcess = Arc<dyn Fn(Option<&Value>) -> Content + Send + Sync>;

/// Derive a stable metadata identifier from a shaping descriptor.
///
/// Two descriptors that serialize identically share an identifier.
pub fn metadata_identifier(descriptor: &Value) -> String {
    let mut hasher = Sha256::new();
    hasher.update(descriptor.to_string().as_bytes());
    let digest = hex::encode(hasher.finalize());
    digest[..METADATA_IDENTIFIER_LENGTH].to_string()
}

/// Reference to one entity, loaded by id through a resource loader.
#[derive(Clone)]
pub struct ResourceToken {
    id: String,
    loader_key: String,
    priority: i32,
    metadata_identifier: String,
    post_process: Option<PostProcess>,
}

impl ResourceToken {
    /// Token for `id` through `loader_key` with default priority and no shaping.
    pub fn new(id: impl Into<String>, loader_key: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            loader_key: loader_key.into(),
            priority: DEFAULT_RESOURCE_PRIORITY,
            metadata_identifier: DEFAULT_METADATA_IDENTIFIER.to_string(),
            post_process: None,
        }
    }

    /// Set the priority; higher priorities load first.
    #[must_use]
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Set the metadata identifier directly.
    #[must_use]
    pub fn with_metadata_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.metadata_identifier = identifier.into();
        self
    }

    /// Derive the metadata identifier from a shaping descriptor.
    #[must_use]
    pub fn with_metadata(self, descriptor: &Value) -> Self {
        let identifier = metadata_identifier(descriptor);
        self.with_metadata_identifier(identifier)
    }

    /// Attach the callback applied to the loaded raw value.
    #[must_use]
    pub fn with_post_process<F>(mut self, callback: F) -> Self
    where
        F: Fn(Option<&Value>) -> Content + Send + Sync + 'static,
    {
        self.post_process = Some(Arc::new(callback));
        self
    }

    /// Identifier of the referenced entity.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Key of the loader serving this token.
    pub fn loader_key(&self) -> &str {
        &self.loader_key
    }

    /// Resolution priority.
    pub fn priority(&self) -> i32 {
        self.priority
    }

    /// Shaping identifier distinguishing tokens for the same id.
    pub fn metadata_identifier(&self) -> &str {
        &self.metadata_identifier
    }

    /// Shape a raw value. Without a callback the raw value is used as-is
    /// and a missing value becomes `null`.
    pub fn shape(&self, raw: Option<&Value>) -> Content {
        match &self.post_process {
            Some(callback) => callback(raw),
            None => raw.cloned().map_or(Content::Null, Content::from),
        }
    }
}

impl fmt::Debug for ResourceToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceToken")
            .field("id", &self.id)
            .field("loader_key", &self.loader_key)
            .field("priority", &self.priority)
            .field("metadata_identifier", &self.metadata_identifier)
            .field("post_process", &self.post_process.is_some())
            .finish()
    }
}

impl PartialEq for ResourceToken {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.loader_key == other.loader_key
            && self.priority == other.priority
            && self.metadata_identifier == other.metadata_identifier
            && match (&self.post_process, &other.post_process) {
                (None, None) => true,
                (Some(a), Some(b)) => Arc::ptr_eq(a, b),
                _ => false,
            }
    }
}

/// Parametrized query resolved by a smart resolver into a [`ContentView`](super::ContentView).
///
/// A smart token has no stable id; each instance gets a unique identity at
/// construction so that equal parameters from two fields stay two queries.
#[derive(Debug, Clone, PartialEq)]
pub struct SmartToken {
    identity: String,
    loader_key: String,
    priority: i32,
    parameters: Value,
}

impl SmartToken {
    /// Query `parameters` through `loader_key` with the default smart priority.
    pub fn new(parameters: Value, loader_key: impl Into<String>) -> Self {
        Self {
            identity: uuid::Uuid::new_v4().to_string(),
            loader_key: loader_key.into(),
            priority: DEFAULT_SMART_PRIORITY,
            parameters,
        }
    }

    /// Set the priority; higher priorities load first.
    #[must_use]
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Unique identity used in place of an id.
    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Key of the smart resolver serving this token.
    pub fn loader_key(&self) -> &str {
        &self.loader_key
    }

    /// Resolution priority.
    pub fn priority(&self) -> i32 {
        self.priority
    }

    /// Query parameters.
    pub fn parameters(&self) -> &Value {
        &self.parameters
    }
}

/// A placeholder standing in for content that is loaded in batches.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolvable {
    /// Load one entity by id.
    Resource(ResourceToken),
    /// Run one parametrized query.
    Smart(SmartToken),
}

impl Resolvable {
    /// Queue key of the token: the entity id, or the identity of a smart token.
    pub fn id(&self) -> &str {
        match self {
            Self::Resource(token) => token.id(),
            Self::Smart(token) => token.identity(),
        }
    }

    /// Loader key used for batching.
    pub fn loader_key(&self) -> &str {
        match self {
            Self::Resource(token) => token.loader_key(),
            Self::Smart(token) => token.loader_key(),
        }
    }

    /// Resolution priority.
    pub fn priority(&self) -> i32 {
        match self {
            Self::Resource(token) => token.priority(),
            Self::Smart(token) => token.priority(),
        }
    }

    /// Metadata identifier; smart tokens always use the default.
    pub fn metadata_identifier(&self) -> &str {
        match self {
            Self::Resource(token) => token.metadata_identifier(),
            Self::Smart(_) => DEFAULT_METADATA_IDENTIFIER,
        }
    }

    /// Name of the token kind, used in errors and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Resource(_) => "resource",
            Self::Smart(_) => "smart",
        }
    }
}

impl From<ResourceToken> for Resolvable {
    fn from(token: ResourceToken) -> Self {
        Self::Resource(token)
    }
}

impl From<SmartToken> for Resolvable {
    fn from(token: SmartToken) -> Self {
        Self::Smart(token)
    }
}
