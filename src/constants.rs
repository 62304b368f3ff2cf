//! Global constants used throughout the content resolver.
//!
//! This module contains default priorities, reserved group names and other
//! values that are shared between the field resolvers, the resolution
//! queue and the output normalizer. Defining them centrally keeps the
//! different stages of the pipeline in agreement.

/// Priority assigned to a [`ResourceToken`](crate::content::ResourceToken)
/// when the field resolver does not pick one.
pub const DEFAULT_RESOURCE_PRIORITY: i32 = 0;

/// Priority assigned to a [`SmartToken`](crate::content::SmartToken) by default.
///
/// Smart queries aggregate many resources and usually expose further
/// references, so they load after every plain id lookup of a round.
pub const DEFAULT_SMART_PRIORITY: i32 = -100;

/// Metadata identifier used for tokens that carry no shaping descriptor.
pub const DEFAULT_METADATA_IDENTIFIER: &str = "default";

/// Number of hex characters kept from the SHA-256 digest of a shaping descriptor.
pub const METADATA_IDENTIFIER_LENGTH: usize = 16;

/// Default number of loader-key batches dispatched concurrently within one tier.
pub const DEFAULT_MAX_CONCURRENT_LOADS: usize = 8;

/// Group key holding the resolved template fields.
pub const TEMPLATE_GROUP: &str = "template";

/// Group key holding dimension settings (template key, locales, author data).
pub const SETTINGS_GROUP: &str = "settings";

/// Key under which a view fragment is stored while it waits to be re-spliced.
pub const VIEW_KEY: &str = "view";

/// Metadata key used by the registry for properties of an extension group.
///
/// Extension metadata is looked up as `"{EXTENSION_METADATA_PREFIX}{group}"`,
/// e.g. `extension:excerpt`.
pub const EXTENSION_METADATA_PREFIX: &str = "extension:";

