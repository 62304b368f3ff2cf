//! Substitution of loaded values into flattened content.
//!
//! The replacer walks a flattened content tree depth-first and swaps each
//! token for its loaded value. Loaded values that carry views or further
//! tokens (smart query results, shaped pages referencing other pages) are
//! flattened again one level deeper than the id that produced them; their
//! new tokens go back into the queue for a later round and their views are
//! kept as fragments to be spliced into the view tree at the end.

use serde_json::{Map, Value};
use std::collections::BTreeSet;

use super::flattener::{FlattenedViews, flatten};
use super::loader::{ResolvedResource, ResolvedResources};
use super::queue::{LoaderIdDepths, ResolutionQueue};
use crate::content::{Content, ContentMap, ContentPath, ContentView, PathSegment, Resolvable};

/// Flattened content and view trees of one resolution in progress.
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    /// Content trees by group.
    pub content: ContentMap,
    /// View trees by group.
    pub view: Map<String, Value>,
    /// Views of substituted values, by the position they were substituted at.
    pub fragments: Vec<(ContentPath, Value)>,
    /// Positions forced to `null` by the depth or round limit.
    pub truncated: BTreeSet<ContentPath>,
}

impl Resolution {
    /// Start from a freshly flattened tree.
    pub fn new(flattened: FlattenedViews) -> Self {
        Self {
            content: flattened.content,
            view: flattened.view,
            fragments: Vec::new(),
            truncated: BTreeSet::new(),
        }
    }

    /// Whether any token is still waiting in the content tree.
    pub fn has_pending(&self) -> bool {
        self.content.values().any(Content::contains_resolvables)
    }

    /// Replace every remaining token with `null` and mark it truncated.
    ///
    /// Returns the number of tokens dropped.
    pub fn truncate_pending(&mut self) -> usize {
        let before = self.truncated.len();
        let content = std::mem::take(&mut self.content);
        let truncated = &mut self.truncated;
        let content = content
            .into_iter()
            .map(|(key, node)| {
                let path = ContentPath::root().key(&key);
                (key, truncate_tokens(node, &path, truncated))
            })
            .collect();
        self.content = content;
        self.truncated.len() - before
    }
}

/// Replaces tokens with values loaded in one round.
pub struct TokenReplacer<'a> {
    resolved: &'a ResolvedResources,
    loader_id_depths: &'a LoaderIdDepths,
    max_depth: usize,
    queue: &'a mut ResolutionQueue,
}

impl<'a> TokenReplacer<'a> {
    /// Replacer for one round. New tokens exposed by loaded values are
    /// pushed onto `queue`.
    pub fn new(
        resolved: &'a ResolvedResources,
        loader_id_depths: &'a LoaderIdDepths,
        max_depth: usize,
        queue: &'a mut ResolutionQueue,
    ) -> Self {
        Self {
            resolved,
            loader_id_depths,
            max_depth,
            queue,
        }
    }

    /// Replace tokens throughout `resolution`.
    pub fn replace_all(&mut self, resolution: &mut Resolution) {
        let content = std::mem::take(&mut resolution.content);
        let content = content
            .into_iter()
            .map(|(key, node)| {
                let path = ContentPath::root().key(&key);
                let node = self.replace(node, &path, 0, resolution);
                (key, node)
            })
            .collect();
        resolution.content = content;
    }

    /// Replace tokens in `content` found at `path`.
    ///
    /// A token's depth is the larger of `depth` and the depth stamped when
    /// it was queued. Tokens deeper than the limit become `null`; tokens
    /// without a loaded value are left untouched.
    pub fn replace(
        &mut self,
        content: Content,
        path: &ContentPath,
        depth: usize,
        resolution: &mut Resolution,
    ) -> Content {
        match content {
            Content::Resolvable {
                resolvable,
                depth: stamped,
            } => {
                let depth = depth.max(stamped);
                if depth > self.max_depth {
                    tracing::trace!("Truncating '{}' at {} (depth {})", resolvable.id(), path, depth);
                    resolution.truncated.insert(path.clone());
                    return Content::Null;
                }

                match self.lookup(&resolvable) {
                    Some(resolved) => {
                        tracing::trace!("Replacing '{}' at {}", resolvable.id(), path);
                        let next_depth = self.loaded_depth(&resolvable).unwrap_or(depth) + 1;
                        self.substitute(resolved.clone(), path, next_depth, resolution)
                    }
                    None => Content::Resolvable {
                        resolvable,
                        depth: stamped,
                    },
                }
            }
            Content::List(items) => Content::List(
                items
                    .into_iter()
                    .enumerate()
                    .map(|(index, item)| {
                        self.replace(item, &path.child(PathSegment::Index(index)), depth, resolution)
                    })
                    .collect(),
            ),
            Content::Map(map) => Content::Map(
                map.into_iter()
                    .map(|(key, item)| {
                        let item = self.replace(item, &path.key(&key), depth, resolution);
                        (key, item)
                    })
                    .collect(),
            ),
            Content::View(view) => {
                let (content, view) = view.into_parts();
                Content::from(ContentView::new(self.replace(content, path, depth, resolution), view))
            }
            plain @ (Content::Null | Content::Value(_)) => plain,
        }
    }

    fn lookup(&self, resolvable: &Resolvable) -> Option<&'a ResolvedResource> {
        self.resolved
            .get(resolvable.loader_key())?
            .get(resolvable.id())?
            .get(resolvable.metadata_identifier())
    }

    fn loaded_depth(&self, resolvable: &Resolvable) -> Option<usize> {
        self.loader_id_depths.get(resolvable.loader_key())?.get(resolvable.id()).copied()
    }

    fn substitute(
        &mut self,
        resolved: ResolvedResource,
        path: &ContentPath,
        next_depth: usize,
        resolution: &mut Resolution,
    ) -> Content {
        let content_view = match resolved {
            ResolvedResource::Value(content)
                if !content.contains_views() && !content.contains_resolvables() =>
            {
                return content;
            }
            ResolvedResource::Value(content) => ContentView::content_only(content),
            ResolvedResource::View(view) => view,
        };

        let (content, view) = flatten(content_view, next_depth, self.queue);
        if view.as_object().is_some_and(|view| !view.is_empty()) {
            resolution.fragments.push((path.clone(), view));
        }
        content
    }
}

fn truncate_tokens(content: Content, path: &ContentPath, truncated: &mut BTreeSet<ContentPath>) -> Content {
    match content {
        Content::Resolvable {
            ..
        } => {
            truncated.insert(path.clone());
            Content::Null
        }
        Content::List(items) => Content::List(
            items
                .into_iter()
                .enumerate()
                .map(|(index, item)| truncate_tokens(item, &path.child(PathSegment::Index(index)), truncated))
                .collect(),
        ),
        Content::Map(map) => Content::Map(
            map.into_iter()
                .map(|(key, item)| {
                    let item = truncate_tokens(item, &path.key(&key), truncated);
                    (key, item)
                })
                .collect(),
        ),
        Content::View(view) => {
            let (content, view) = view.into_parts();
            Content::from(ContentView::new(truncate_tokens(content, path, truncated), view))
        }
        plain => plain,
    }
}
