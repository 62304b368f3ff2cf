//! Priority queue of resolvables awaiting a batch load.
//!
//! Entries are keyed `priority -> loader key -> depth -> id -> metadata
//! identifier`. Each round of the driver extracts the highest remaining
//! priority as one tier; tiers always come out in strictly descending
//! priority and an extracted tier is removed as a whole.

use std::collections::BTreeMap;

use crate::content::Resolvable;

/// `id -> metadata identifier -> value`.
pub type IdMap<T> = BTreeMap<String, BTreeMap<String, T>>;

/// `loader key -> id -> metadata identifier -> resolvable`.
pub type ResourcesToLoad = BTreeMap<String, IdMap<Resolvable>>;

/// `loader key -> id -> depth`.
pub type LoaderIdDepths = BTreeMap<String, BTreeMap<String, usize>>;

type Tier = BTreeMap<String, BTreeMap<usize, IdMap<Resolvable>>>;

/// Result of [`ResolutionQueue::extract_top_tier`].
#[derive(Debug, Default)]
pub struct ExtractedTier {
    /// Priority of the extracted tier, `None` when the queue was empty.
    pub priority: Option<i32>,
    /// Entries within the depth limit, grouped by loader key.
    pub resources_to_load: ResourcesToLoad,
    /// Depth at which each loaded id was discovered (the shallowest one
    /// when an id was queued at several depths).
    pub loader_id_depths: LoaderIdDepths,
    /// Number of entries dropped for exceeding the depth limit.
    pub dropped: usize,
}

impl ExtractedTier {
    /// Whether nothing is left to load.
    pub fn is_empty(&self) -> bool {
        self.resources_to_load.is_empty()
    }
}

/// Queue of resolvables, grouped for batch loading.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolutionQueue {
    tiers: BTreeMap<i32, Tier>,
}

impl ResolutionQueue {
    /// Empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `resolvable` as discovered at `depth`.
    ///
    /// An entry with the same key is replaced.
    pub fn insert(&mut self, resolvable: Resolvable, depth: usize) {
        self.tiers
            .entry(resolvable.priority())
            .or_default()
            .entry(resolvable.loader_key().to_string())
            .or_default()
            .entry(depth)
            .or_default()
            .entry(resolvable.id().to_string())
            .or_default()
            .insert(resolvable.metadata_identifier().to_string(), resolvable);
    }

    /// Union of two queues; on a key collision the entry of `newer` wins.
    pub fn merge(mut older: Self, newer: Self) -> Self {
        older.absorb(newer);
        older
    }

    /// Merge `newer` into this queue; entries of `newer` win on collision.
    pub fn absorb(&mut self, newer: Self) {
        for (priority, loaders) in newer.tiers {
            let tier = self.tiers.entry(priority).or_default();
            for (loader_key, depths) in loaders {
                let by_depth = tier.entry(loader_key).or_default();
                for (depth, ids) in depths {
                    let by_id = by_depth.entry(depth).or_default();
                    for (id, shapes) in ids {
                        by_id.entry(id).or_default().extend(shapes);
                    }
                }
            }
        }
    }

    /// Remove the highest-priority tier and return its loadable entries.
    ///
    /// Entries deeper than `max_depth` are dropped with the tier, never
    /// deferred. An empty queue yields an empty result.
    pub fn extract_top_tier(&mut self, max_depth: usize) -> ExtractedTier {
        let Some((priority, tier)) = self.tiers.pop_last() else {
            return ExtractedTier::default();
        };

        let mut extracted = ExtractedTier {
            priority: Some(priority),
            ..ExtractedTier::default()
        };

        for (loader_key, depths) in tier {
            // Depths iterate ascending, so the shallowest occurrence wins.
            for (depth, ids) in depths {
                if depth > max_depth {
                    extracted.dropped += ids.values().map(BTreeMap::len).sum::<usize>();
                    continue;
                }

                for (id, shapes) in ids {
                    extracted
                        .loader_id_depths
                        .entry(loader_key.clone())
                        .or_default()
                        .entry(id.clone())
                        .or_insert(depth);

                    let entry = extracted
                        .resources_to_load
                        .entry(loader_key.clone())
                        .or_default()
                        .entry(id)
                        .or_default();
                    for (metadata_identifier, resolvable) in shapes {
                        entry.entry(metadata_identifier).or_insert(resolvable);
                    }
                }
            }
        }

        if extracted.dropped > 0 {
            tracing::debug!(
                "Dropped {} resolvable(s) beyond depth {} at priority {}",
                extracted.dropped,
                max_depth,
                priority
            );
        }

        extracted
    }

    /// Remaining priorities, highest first.
    pub fn priorities(&self) -> Vec<i32> {
        self.tiers.keys().rev().copied().collect()
    }

    /// Number of queued entries.
    pub fn len(&self) -> usize {
        self.tiers
            .values()
            .flat_map(BTreeMap::values)
            .flat_map(BTreeMap::values)
            .flat_map(BTreeMap::values)
            .map(BTreeMap::len)
            .sum()
    }

    /// Whether the queue holds no entries.
    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }

    /// Every queued resolvable, highest priority first.
    pub fn iter(&self) -> impl Iterator<Item = &Resolvable> {
        self.tiers
            .values()
            .rev()
            .flat_map(BTreeMap::values)
            .flat_map(BTreeMap::values)
            .flat_map(BTreeMap::values)
            .flat_map(BTreeMap::values)
    }
}
