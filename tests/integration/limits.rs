use content_resolver::content::{Content, ContentMap, ContentView, ResourceToken};
use content_resolver::dimension::{DimensionAttributes, Stage};
use content_resolver::metadata::PropertyMetadata;
use content_resolver::test_utils::{
    RecordingLoader, StaticSmartResolver, TestResolverBuilder, default_template, page_row,
};
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Token whose loaded value links to the next page through another token.
fn linked_page(id: &str) -> ResourceToken {
    ResourceToken::new(id, "page").with_post_process(|raw| {
        let Some(raw) = raw else {
            return Content::Null;
        };
        let mut page = ContentMap::new();
        page.insert("title".to_string(), Content::from(raw["title"].clone()));
        if let Some(next) = raw.get("next").and_then(Value::as_str) {
            page.insert("next".to_string(), Content::from(linked_page(next)));
        }
        Content::Map(page)
    })
}

#[tokio::test]
async fn test_tokens_beyond_max_depth_become_null() {
    let metadata = default_template(vec![
        PropertyMetadata::new("hero", "single_media_selection"),
        PropertyMetadata::new("blocks", "block").with_block_type(
            "image",
            vec![
                PropertyMetadata::new("caption", "text_line"),
                PropertyMetadata::new("image", "single_media_selection"),
            ],
        ),
    ]);
    let media = Arc::new(
        RecordingLoader::new()
            .with_value("7", json!({"url": "/7.png"}))
            .with_value("8", json!({"url": "/8.png"})),
    );
    let resolver = TestResolverBuilder::new(0, 10)
        .with_metadata(metadata)
        .with_loader("media", media.clone())
        .build();

    let row = page_row("1")
        .with_template_value("hero", json!(8))
        .with_template_value("blocks", json!([{"type": "image", "caption": "Cap", "image": 7}]));
    let resolved = resolver.resolve_rows(&[row], &DimensionAttributes::new(Stage::Live), None).await.unwrap();

    assert_eq!(resolved.content["hero"], json!({"url": "/8.png"}));
    assert_eq!(resolved.content["blocks"], json!([{"type": "image", "caption": "Cap", "image": null}]));
    assert_eq!(resolved.truncated, vec!["/content/blocks/0/image".to_string()]);
    assert_eq!(media.calls(), vec![vec!["8".to_string()]]);
}

#[tokio::test]
async fn test_round_limit_nulls_pending_tokens() {
    let metadata = default_template(vec![PropertyMetadata::new("teasers", "smart_content")]);
    let pages = Arc::new(RecordingLoader::new().with_value("2", json!({"title": "Two"})));
    let resolver = TestResolverBuilder::new(5, 1)
        .with_metadata(metadata)
        .with_smart_resolver("page", Arc::new(StaticSmartResolver::new(vec![json!("2"), json!("3")])))
        .with_loader("page", pages.clone())
        .build();

    let row = page_row("1").with_template_value("teasers", json!({}));
    let resolved = resolver.resolve_rows(&[row], &DimensionAttributes::new(Stage::Live), None).await.unwrap();

    assert_eq!(resolved.content["teasers"], json!([null, null]));
    assert_eq!(
        resolved.truncated,
        vec!["/content/teasers/0".to_string(), "/content/teasers/1".to_string()]
    );
    assert_eq!(pages.call_count(), 0);
}

#[tokio::test]
async fn test_cyclic_references_stop_at_max_depth() {
    let pages = Arc::new(
        RecordingLoader::new()
            .with_value("a", json!({"title": "A", "next": "b"}))
            .with_value("b", json!({"title": "B", "next": "a"})),
    );
    let resolver = TestResolverBuilder::new(3, 20).with_loader("page", pages.clone()).build();

    let mut views = BTreeMap::new();
    views.insert("link".to_string(), ContentView::content_only(linked_page("a")));
    let resolved = resolver.resolve_content_views(views, None).await.unwrap();

    assert_eq!(
        resolved.content["link"],
        json!({
            "title": "A",
            "next": {"title": "B", "next": {"title": "A", "next": {"title": "B", "next": null}}}
        })
    );
    assert_eq!(resolved.truncated, vec!["/link/next/next/next/next".to_string()]);
    assert_eq!(pages.calls(), vec![vec!["a".to_string()], vec!["b".to_string()]]);
}
