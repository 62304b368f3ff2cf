//! Merging of dimension rows into content snapshots.
//!
//! Rows are first materialized into a map keyed by
//! `(resource, stage, version, locale)` and then looked up; grouping never
//! depends on the order in which rows were fetched.

use anyhow::Result;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};

use super::{ContentSnapshot, DimensionAttributes, DimensionRow, Stage};
use crate::core::{ResolveError, ResourceRef};

/// Grouping key of a dimension row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DimensionKey {
    /// Owning entity.
    pub resource: ResourceRef,
    /// Stage of the row.
    pub stage: Stage,
    /// Version of the row.
    pub version: u32,
    /// Locale; `None` sorts first, so each resource's unlocalized row leads its group.
    pub locale: Option<String>,
}

impl DimensionKey {
    fn of(row: &DimensionRow) -> Self {
        Self {
            resource: row.resource.clone(),
            stage: row.stage,
            version: row.version,
            locale: row.locale.clone(),
        }
    }

    fn lookup(resource: &ResourceRef, attributes: &DimensionAttributes, locale: Option<&str>) -> Self {
        Self {
            resource: resource.clone(),
            stage: attributes.stage,
            version: attributes.version,
            locale: locale.map(str::to_string),
        }
    }
}

/// Merges dimension rows into [`ContentSnapshot`]s.
pub struct DimensionMerger;

impl DimensionMerger {
    /// Index rows by [`DimensionKey`]. A later row with the same key replaces
    /// an earlier one.
    pub fn group_rows(rows: &[DimensionRow]) -> BTreeMap<DimensionKey, &DimensionRow> {
        let mut index = BTreeMap::new();
        for row in rows {
            index.insert(DimensionKey::of(row), row);
        }
        index
    }

    /// Merge the rows of one entity for one request.
    ///
    /// The entity is the resource of the first row. Fails with
    /// [`ResolveError::ContentNotFound`] when the unlocalized row for the
    /// requested stage and version is missing. A missing localized row is
    /// not an error; the result is a ghost snapshot.
    pub fn merge(rows: &[DimensionRow], attributes: &DimensionAttributes) -> Result<ContentSnapshot> {
        let Some(first) = rows.first() else {
            return Err(not_found("<unknown>", attributes).into());
        };
        let resource = first.resource.clone();
        let index = Self::group_rows(rows);

        Self::merge_indexed(&index, &resource, attributes)
            .ok_or_else(|| not_found(&resource.id, attributes).into())
    }

    /// Merge every entity found in `rows` for the same request.
    ///
    /// Entities without an unlocalized row for the requested stage and
    /// version are skipped. Snapshots are ordered by resource.
    pub fn merge_all(rows: &[DimensionRow], attributes: &DimensionAttributes) -> Vec<ContentSnapshot> {
        let index = Self::group_rows(rows);
        let resources: BTreeSet<&ResourceRef> = index.keys().map(|key| &key.resource).collect();

        resources
            .into_iter()
            .filter_map(|resource| {
                let snapshot = Self::merge_indexed(&index, resource, attributes);
                if snapshot.is_none() {
                    tracing::debug!(
                        "Skipping '{}': no unlocalized row for stage '{}' version {}",
                        resource,
                        attributes.stage,
                        attributes.version
                    );
                }
                snapshot
            })
            .collect()
    }

    fn merge_indexed(
        index: &BTreeMap<DimensionKey, &DimensionRow>,
        resource: &ResourceRef,
        attributes: &DimensionAttributes,
    ) -> Option<ContentSnapshot> {
        let unlocalized = *index.get(&DimensionKey::lookup(resource, attributes, None))?;

        let localized = attributes
            .locale
            .as_deref()
            .and_then(|locale| index.get(&DimensionKey::lookup(resource, attributes, Some(locale))))
            .copied();

        if attributes.locale.is_some() && localized.is_none() {
            tracing::debug!(
                "No '{}' row for '{}', returning ghost content",
                attributes.locale.as_deref().unwrap_or_default(),
                resource
            );
        }

        let available_locales: Vec<String> = index
            .keys()
            .filter(|key| {
                &key.resource == resource
                    && key.stage == attributes.stage
                    && key.version == attributes.version
            })
            .filter_map(|key| key.locale.clone())
            .collect();

        let mut template_data = unlocalized.template_data.clone();
        let mut extensions = unlocalized.extensions.clone();
        if let Some(localized) = localized {
            merge_fields(&mut template_data, &localized.template_data);
            for (group, fields) in &localized.extensions {
                merge_fields(extensions.entry(group.clone()).or_default(), fields);
            }
        }

        Some(ContentSnapshot {
            resource: resource.clone(),
            locale: localized.and_then(|row| row.locale.clone()),
            requested_locale: attributes.locale.clone(),
            stage: attributes.stage,
            version: attributes.version,
            template_key: localized
                .and_then(|row| row.template_key.clone())
                .or_else(|| unlocalized.template_key.clone()),
            template_data,
            extensions,
            available_locales,
            ghost_locale: unlocalized.ghost_locale.clone(),
            authored: localized.and_then(|row| row.authored).or(unlocalized.authored),
        })
    }
}

/// Overlay `overrides` onto `base`, field by field.
fn merge_fields(base: &mut Map<String, Value>, overrides: &Map<String, Value>) {
    for (name, value) in overrides {
        base.insert(name.clone(), value.clone());
    }
}

fn not_found(resource_id: &str, attributes: &DimensionAttributes) -> ResolveError {
    ResolveError::ContentNotFound {
        resource_id: resource_id.to_string(),
        stage: attributes.stage.to_string(),
        version: attributes.version,
    }
}
