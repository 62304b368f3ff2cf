use content_resolver::core::ResolveError;
use content_resolver::dimension::{DimensionAttributes, Stage};
use content_resolver::fields::SingleSelectionFieldResolver;
use content_resolver::metadata::{MetadataRegistry, PropertyMetadata, TemplateMetadata};
use content_resolver::test_utils::{
    FailingLoader, RecordingLoader, StaticSmartResolver, TestResolverBuilder, default_template,
    init_test_logging, localized_page_row, page_row,
};
use serde_json::json;
use std::sync::Arc;

fn live() -> DimensionAttributes {
    DimensionAttributes::new(Stage::Live)
}

#[tokio::test]
async fn test_empty_template_resolves_to_empty_output() {
    init_test_logging(None);
    let resolver = TestResolverBuilder::new(2, 10).build();

    let resolved = resolver.resolve_rows(&[page_row("1")], &live(), None).await.unwrap();

    assert_eq!(resolved.content, json!({}));
    assert_eq!(resolved.view, json!({}));
    assert!(resolved.extension.is_empty());
    assert!(resolved.truncated.is_empty());
    assert_eq!(resolved.settings["template_key"], json!("default"));
}

#[tokio::test]
async fn test_higher_priority_tier_loads_first() {
    init_test_logging(None);
    let metadata = default_template(vec![
        PropertyMetadata::new("title", "text_line"),
        PropertyMetadata::new("high_priority_example", "high_priority_page"),
        PropertyMetadata::new("low_priority_example", "low_priority_page"),
    ]);
    let pages = Arc::new(
        RecordingLoader::new()
            .with_value("333", json!("High Priority Title"))
            .with_value("444", json!("Low Priority Title")),
    );
    let resolver = TestResolverBuilder::new(2, 10)
        .with_metadata(metadata)
        .with_field_resolver("high_priority_page", SingleSelectionFieldResolver::new("page").with_priority(10))
        .with_field_resolver("low_priority_page", SingleSelectionFieldResolver::new("page").with_priority(1))
        .with_loader("page", pages.clone())
        .build();

    let row = page_row("1")
        .with_template_value("title", json!("Main Example"))
        .with_template_value("high_priority_example", json!(333))
        .with_template_value("low_priority_example", json!(444));
    let resolved = resolver.resolve_rows(&[row], &live(), None).await.unwrap();

    assert_eq!(resolved.content["title"], json!("Main Example"));
    assert_eq!(resolved.content["high_priority_example"], json!("High Priority Title"));
    assert_eq!(resolved.content["low_priority_example"], json!("Low Priority Title"));
    assert_eq!(pages.calls(), vec![vec!["333".to_string()], vec!["444".to_string()]]);
}

#[tokio::test]
async fn test_fields_of_one_tier_share_a_loader_call() {
    let metadata = default_template(vec![
        PropertyMetadata::new("links", "page_selection"),
        PropertyMetadata::new("main", "single_page_selection"),
        PropertyMetadata::new("hero", "single_media_selection"),
    ]);
    let pages = Arc::new(
        RecordingLoader::new()
            .with_value("1", json!({"title": "One"}))
            .with_value("2", json!({"title": "Two"}))
            .with_value("4", json!({"title": "Four"})),
    );
    let media = Arc::new(RecordingLoader::new().with_value("9", json!({"url": "/9.png"})));
    let resolver = TestResolverBuilder::new(2, 10)
        .with_metadata(metadata)
        .with_loader("page", pages.clone())
        .with_loader("media", media.clone())
        .build();

    let row = page_row("10")
        .with_template_value("links", json!([1, "2", "3"]))
        .with_template_value("main", json!({"id": 4}))
        .with_template_value("hero", json!("9"));
    let resolved = resolver.resolve_rows(&[row], &live(), None).await.unwrap();

    assert_eq!(
        pages.calls(),
        vec![vec!["1".to_string(), "2".to_string(), "3".to_string(), "4".to_string()]]
    );
    assert_eq!(media.call_count(), 1);
    assert_eq!(resolved.content["links"], json!([{"title": "One"}, {"title": "Two"}, null]));
    assert_eq!(resolved.content["main"], json!({"title": "Four"}));
    assert_eq!(resolved.content["hero"], json!({"url": "/9.png"}));
    assert_eq!(resolved.view["links"], json!({"ids": ["1", "2", "3"]}));
    assert_eq!(resolved.view["main"], json!({"id": "4"}));
}

#[tokio::test]
async fn test_same_id_in_two_shapes_is_fetched_once() {
    let metadata = default_template(vec![
        PropertyMetadata::new("image", "single_media_selection"),
        PropertyMetadata::new("thumbnail", "single_media_selection").with_param("properties", json!(["url"])),
    ]);
    let media = Arc::new(
        RecordingLoader::new().with_value("7", json!({"url": "/7.png", "title": "Seven", "size": 42})),
    );
    let resolver = TestResolverBuilder::new(2, 10)
        .with_metadata(metadata)
        .with_loader("media", media.clone())
        .build();

    let row = page_row("1").with_template_value("image", json!(7)).with_template_value("thumbnail", json!(7));
    let resolved = resolver.resolve_rows(&[row], &live(), None).await.unwrap();

    assert_eq!(media.calls(), vec![vec!["7".to_string()]]);
    assert_eq!(resolved.content["image"], json!({"url": "/7.png", "title": "Seven", "size": 42}));
    assert_eq!(resolved.content["thumbnail"], json!({"url": "/7.png"}));
}

#[tokio::test]
async fn test_smart_content_results_are_resolved_in_a_later_round() {
    let metadata = default_template(vec![
        PropertyMetadata::new("teasers", "smart_content").with_param("limit", json!(2)),
    ]);
    let pages = Arc::new(
        RecordingLoader::new()
            .with_value("2", json!({"title": "Two"}))
            .with_value("3", json!({"title": "Three"})),
    );
    let resolver = TestResolverBuilder::new(2, 10)
        .with_metadata(metadata)
        .with_smart_resolver("page", Arc::new(StaticSmartResolver::new(vec![json!("2"), json!(3), json!("4")])))
        .with_loader("page", pages.clone())
        .build();

    let row = page_row("1").with_template_value("teasers", json!({"tags": ["news"]}));
    let resolved = resolver.resolve_rows(&[row], &live().with_locale("en"), None).await.unwrap();

    assert_eq!(resolved.content["teasers"], json!([{"title": "Two"}, {"title": "Three"}]));
    assert_eq!(resolved.view["teasers"]["limit"], json!(2));
    assert_eq!(resolved.view["teasers"]["tags"], json!(["news"]));
    assert_eq!(resolved.view["teasers"]["total"], json!(2));
    assert_eq!(pages.calls(), vec![vec!["2".to_string(), "3".to_string()]]);
}

#[tokio::test]
async fn test_extension_groups_resolve_through_their_metadata() {
    let mut metadata = MetadataRegistry::new();
    metadata.register(TemplateMetadata::new("default", vec![PropertyMetadata::new("title", "text_line")]));
    metadata.register(TemplateMetadata::new(
        "extension:excerpt",
        vec![
            PropertyMetadata::new("description", "text_area"),
            PropertyMetadata::new("image", "single_media_selection"),
        ],
    ));
    let media = Arc::new(RecordingLoader::new().with_value("5", json!({"url": "/5.png"})));
    let resolver = TestResolverBuilder::new(2, 10)
        .with_metadata(metadata)
        .with_loader("media", media.clone())
        .build();

    let row = page_row("1")
        .with_template_value("title", json!("Home"))
        .with_extension_value("excerpt", "description", json!("Welcome"))
        .with_extension_value("excerpt", "image", json!(5))
        .with_extension_value("seo", "noindex", json!(true));
    let resolved = resolver.resolve_rows(&[row], &live(), None).await.unwrap();

    assert_eq!(resolved.content, json!({"title": "Home"}));
    assert_eq!(resolved.extension["excerpt"], json!({"description": "Welcome", "image": {"url": "/5.png"}}));
    assert_eq!(resolved.extension["seo"], json!({"noindex": true}));
    assert_eq!(media.call_count(), 1);
}

#[tokio::test]
async fn test_property_filter_restricts_fields() {
    let metadata = default_template(vec![
        PropertyMetadata::new("title", "text_line"),
        PropertyMetadata::new("image", "single_media_selection"),
    ]);
    let media = Arc::new(RecordingLoader::new().with_value("7", json!({"url": "/7.png"})));
    let resolver = TestResolverBuilder::new(2, 10)
        .with_metadata(metadata)
        .with_loader("media", media.clone())
        .build();

    let row = page_row("1")
        .with_template_value("title", json!("Home"))
        .with_template_value("image", json!(7))
        .with_extension_value("excerpt", "description", json!("Welcome"));
    let properties = vec!["title".to_string(), "excerpt.description".to_string()];
    let resolved = resolver.resolve_rows(&[row], &live(), Some(&properties)).await.unwrap();

    assert_eq!(resolved.content, json!({"title": "Home"}));
    assert_eq!(resolved.extension["excerpt"], json!({"description": "Welcome"}));
    assert_eq!(media.call_count(), 0);
}

#[tokio::test]
async fn test_localized_content_and_ghost_fallback() {
    let resolver = TestResolverBuilder::new(2, 10).build();
    let rows = vec![
        page_row("1").with_ghost_locale("en").with_template_value("title", json!("Home")),
        localized_page_row("1", "en").with_template_value("title", json!("Home (en)")),
    ];

    let english = resolver.resolve_rows(&rows, &live().with_locale("en"), None).await.unwrap();
    assert_eq!(english.content["title"], json!("Home (en)"));
    assert_eq!(english.settings["locale"], json!("en"));
    assert_eq!(english.settings["available_locales"], json!(["en"]));

    let ghost = resolver.resolve_rows(&rows, &live().with_locale("de"), None).await.unwrap();
    assert_eq!(ghost.content["title"], json!("Home"));
    assert_eq!(ghost.settings["locale"], json!(null));
    assert_eq!(ghost.settings["ghost_locale"], json!("en"));
}

#[tokio::test]
async fn test_missing_unlocalized_row_is_not_found() {
    let resolver = TestResolverBuilder::new(2, 10).build();
    let rows = vec![localized_page_row("1", "en")];

    let error = resolver.resolve_rows(&rows, &live().with_locale("en"), None).await.unwrap_err();

    assert!(matches!(
        error.downcast_ref::<ResolveError>(),
        Some(ResolveError::ContentNotFound { resource_id, .. }) if resource_id == "1"
    ));
}

#[tokio::test]
async fn test_loader_failure_aborts_resolution() {
    let metadata = default_template(vec![
        PropertyMetadata::new("title", "text_line"),
        PropertyMetadata::new("image", "single_media_selection"),
    ]);
    let resolver = TestResolverBuilder::new(2, 10)
        .with_metadata(metadata)
        .with_loader("media", Arc::new(FailingLoader))
        .build();

    let row = page_row("1").with_template_value("title", json!("Home")).with_template_value("image", json!(7));
    let error = resolver.resolve_rows(&[row], &live(), None).await.unwrap_err();

    assert!(matches!(
        error.downcast_ref::<ResolveError>(),
        Some(ResolveError::LoaderFailed { loader_key, .. }) if loader_key == "media"
    ));
}

#[tokio::test]
async fn test_unregistered_loader_key_fails_fast() {
    let metadata = default_template(vec![PropertyMetadata::new("category", "single_category_selection")]);
    let resolver = TestResolverBuilder::new(2, 10)
        .with_metadata(metadata)
        .with_loader("media", Arc::new(RecordingLoader::new()))
        .build();

    let row = page_row("1").with_template_value("category", json!(3));
    let error = resolver.resolve_rows(&[row], &live(), None).await.unwrap_err();

    assert!(matches!(
        error.downcast_ref::<ResolveError>(),
        Some(ResolveError::LoaderNotFound { loader_key, .. }) if loader_key == "category"
    ));
}
