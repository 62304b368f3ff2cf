use content_resolver::content::{Content, ContentView, ResourceToken, SmartToken};
use content_resolver::resolver::flattener;
use content_resolver::resolver::queue::LoaderIdDepths;
use content_resolver::resolver::replacer::{Resolution, TokenReplacer};
use content_resolver::resolver::{ResolutionQueue, ResolvedResources};
use serde_json::json;
use std::collections::BTreeMap;

fn template_views() -> BTreeMap<String, ContentView> {
    let mut fields = BTreeMap::new();
    fields.insert("title".to_string(), ContentView::content_only("Main Example"));
    fields.insert(
        "image".to_string(),
        ContentView::new(ResourceToken::new("7", "media"), json!({"id": "7"})),
    );
    fields.insert(
        "links".to_string(),
        ContentView::new(
            Content::List(vec![ResourceToken::new("1", "page").into(), ResourceToken::new("2", "page").into()]),
            json!({"ids": ["1", "2"]}),
        ),
    );
    fields.insert(
        "teasers".to_string(),
        ContentView::new(SmartToken::new(json!({"limit": 2}), "page"), json!({"limit": 2})),
    );

    let mut views = BTreeMap::new();
    views.insert("template".to_string(), ContentView::group(fields));
    views
}

#[test]
fn test_replace_without_loaded_values_is_a_no_op() {
    let mut queue = ResolutionQueue::new();
    let flattened = flattener::resolve_views(template_views(), 0, &mut queue);
    let mut resolution = Resolution::new(flattened);
    let before = resolution.content.clone();
    let view_before = resolution.view.clone();

    let resolved = ResolvedResources::new();
    let depths = LoaderIdDepths::new();
    let mut follow_up = ResolutionQueue::new();
    TokenReplacer::new(&resolved, &depths, 2, &mut follow_up).replace_all(&mut resolution);

    assert_eq!(resolution.content, before);
    assert_eq!(resolution.view, view_before);
    assert!(resolution.truncated.is_empty());
    assert!(resolution.fragments.is_empty());
    assert!(follow_up.is_empty());
    assert!(resolution.has_pending());
}

#[test]
fn test_flatten_queues_every_token_once() {
    let mut queue = ResolutionQueue::new();
    let flattened = flattener::resolve_views(template_views(), 0, &mut queue);

    assert_eq!(queue.len(), 4);
    assert_eq!(queue.priorities(), vec![0, -100]);
    assert_eq!(flattened.view["template"]["image"], json!({"id": "7"}));
    assert_eq!(flattened.view["template"]["links"], json!({"ids": ["1", "2"]}));
}
