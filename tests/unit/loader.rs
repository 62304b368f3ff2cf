use content_resolver::config::ResolverConfig;
use content_resolver::content::{Content, ResourceToken};
use content_resolver::core::ResolveError;
use content_resolver::resolver::{BatchLoader, LoaderRegistry, ResolutionQueue, ResolvedResource};
use content_resolver::test_utils::{FailingLoader, RecordingLoader, StaticSmartResolver};
use serde_json::{Value, json};
use std::sync::Arc;

fn pick_url(raw: Option<&Value>) -> Content {
    raw.and_then(|value| value.get("url")).cloned().map_or(Content::Null, Content::from)
}

#[tokio::test]
async fn test_one_call_per_loader_key_per_tier() {
    let media = Arc::new(
        RecordingLoader::new()
            .with_value("1", json!({"url": "/1.png"}))
            .with_value("2", json!({"url": "/2.png"})),
    );
    let pages = Arc::new(RecordingLoader::new().with_value("9", json!({"title": "Nine"})));
    let mut registry = LoaderRegistry::new();
    registry.register_loader("media", media.clone());
    registry.register_loader("page", pages.clone());
    let config = ResolverConfig::new(2, 10);

    let mut queue = ResolutionQueue::new();
    queue.insert(ResourceToken::new("1", "media").into(), 0);
    queue.insert(ResourceToken::new("2", "media").into(), 1);
    queue.insert(ResourceToken::new("3", "media").into(), 0);
    queue.insert(ResourceToken::new("9", "page").into(), 0);
    let tier = queue.extract_top_tier(2);

    let loader = BatchLoader::new(&registry, &config);
    let resolved = loader.load_resources(tier.resources_to_load, Some("en")).await.unwrap();

    assert_eq!(media.calls(), vec![vec!["1".to_string(), "2".to_string(), "3".to_string()]]);
    assert_eq!(pages.call_count(), 1);
    assert_eq!(
        resolved["media"]["3"]["default"],
        ResolvedResource::Value(Content::Null),
        "ids the loader omits resolve to null"
    );
}

#[tokio::test]
async fn test_same_id_is_shaped_per_metadata_identifier() {
    let media = Arc::new(RecordingLoader::new().with_value("7", json!({"url": "/7.png", "title": "Seven"})));
    let mut registry = LoaderRegistry::new();
    registry.register_loader("media", media.clone());
    let config = ResolverConfig::new(2, 10);

    let mut queue = ResolutionQueue::new();
    queue.insert(ResourceToken::new("7", "media").into(), 0);
    queue.insert(
        ResourceToken::new("7", "media")
            .with_metadata(&json!({"properties": ["url"]}))
            .with_post_process(pick_url)
            .into(),
        0,
    );
    let tier = queue.extract_top_tier(2);

    let loader = BatchLoader::new(&registry, &config);
    let resolved = loader.load_resources(tier.resources_to_load, None).await.unwrap();

    assert_eq!(media.calls(), vec![vec!["7".to_string()]]);
    let shapes = &resolved["media"]["7"];
    assert_eq!(shapes.len(), 2);
    assert_eq!(
        shapes["default"],
        ResolvedResource::Value(Content::from(json!({"url": "/7.png", "title": "Seven"})))
    );
    let shaped = shapes.iter().find(|(identifier, _)| identifier.as_str() != "default").unwrap().1;
    assert_eq!(shaped, &ResolvedResource::Value(Content::from("/7.png")));
}

#[tokio::test]
async fn test_raw_values_are_cached_across_tiers() {
    let media = Arc::new(RecordingLoader::new().with_value("1", json!({"url": "/1.png"})));
    let mut registry = LoaderRegistry::new();
    registry.register_loader("media", media.clone());
    let config = ResolverConfig::new(2, 10);
    let loader = BatchLoader::new(&registry, &config);

    let mut queue = ResolutionQueue::new();
    queue.insert(ResourceToken::new("1", "media").with_priority(5).into(), 0);
    queue.insert(ResourceToken::new("1", "media").with_priority(1).into(), 1);
    queue.insert(ResourceToken::new("2", "media").with_priority(1).into(), 1);

    let first = queue.extract_top_tier(2);
    loader.load_resources(first.resources_to_load, None).await.unwrap();
    let second = queue.extract_top_tier(2);
    loader.load_resources(second.resources_to_load, None).await.unwrap();

    assert_eq!(media.calls(), vec![vec!["1".to_string()], vec!["2".to_string()]]);
    assert_eq!(loader.cached(), 2);
}

#[tokio::test]
async fn test_loader_errors_are_typed() {
    let mut registry = LoaderRegistry::new();
    registry.register_loader("media", Arc::new(FailingLoader));
    registry.register_smart_resolver("page", Arc::new(StaticSmartResolver::new(vec![])));
    let config = ResolverConfig::new(2, 10);
    let loader = BatchLoader::new(&registry, &config);

    let load = |loader_key: &str| {
        let mut queue = ResolutionQueue::new();
        queue.insert(ResourceToken::new("1", loader_key).into(), 0);
        queue.extract_top_tier(2).resources_to_load
    };

    let error = loader.load_resources(load("media"), None).await.unwrap_err();
    assert!(matches!(
        error.downcast_ref::<ResolveError>(),
        Some(ResolveError::LoaderFailed { loader_key, count: 1, .. }) if loader_key == "media"
    ));

    let error = loader.load_resources(load("snippet"), None).await.unwrap_err();
    assert!(matches!(
        error.downcast_ref::<ResolveError>(),
        Some(ResolveError::LoaderNotFound { available, .. }) if available.len() == 2
    ));

    let error = loader.load_resources(load("page"), None).await.unwrap_err();
    assert!(matches!(
        error.downcast_ref::<ResolveError>(),
        Some(ResolveError::UnsupportedResourceType { kind, .. }) if kind == "resource"
    ));

    let error = loader.load_resources(load(" "), None).await.unwrap_err();
    assert!(matches!(error.downcast_ref::<ResolveError>(), Some(ResolveError::InvalidLoaderKey { .. })));
}
