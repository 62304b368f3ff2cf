use content_resolver::content::{Resolvable, ResourceToken, SmartToken};
use content_resolver::resolver::ResolutionQueue;

fn page(id: &str, priority: i32) -> Resolvable {
    ResourceToken::new(id, "page").with_priority(priority).into()
}

#[test]
fn test_tiers_come_out_in_descending_priority() {
    let mut queue = ResolutionQueue::new();
    for (id, priority) in [("1", 0), ("2", 10), ("3", -100), ("4", 1), ("5", 10), ("6", 0)] {
        queue.insert(page(id, priority), 0);
    }
    queue.insert(SmartToken::new(serde_json::json!({"limit": 3}), "page").into(), 0);

    let mut seen = Vec::new();
    let mut previous_len = queue.len();
    while !queue.is_empty() {
        let tier = queue.extract_top_tier(5);
        seen.push(tier.priority.unwrap());

        assert!(queue.len() < previous_len, "queue must shrink with every extraction");
        previous_len = queue.len();
    }

    assert_eq!(seen, vec![10, 1, 0, -100]);
    assert!(seen.windows(2).all(|pair| pair[0] > pair[1]));
    assert_eq!(queue.extract_top_tier(5).priority, None);
}

#[test]
fn test_tier_groups_ids_by_loader_key() {
    let mut queue = ResolutionQueue::new();
    queue.insert(page("1", 0), 0);
    queue.insert(page("2", 0), 1);
    queue.insert(ResourceToken::new("7", "media").into(), 0);

    let tier = queue.extract_top_tier(1);

    assert_eq!(tier.resources_to_load.len(), 2);
    assert_eq!(tier.resources_to_load["page"].len(), 2);
    assert_eq!(tier.loader_id_depths["page"]["2"], 1);
    assert_eq!(tier.loader_id_depths["media"]["7"], 0);
}

#[test]
fn test_merge_later_queue_wins_on_collision() {
    let older_token = ResourceToken::new("123", "page").with_priority(1).with_post_process(|_| "older".into());
    let newer_token = ResourceToken::new("123", "page").with_priority(1).with_post_process(|_| "newer".into());

    let mut older = ResolutionQueue::new();
    older.insert(older_token.into(), 0);
    let mut newer = ResolutionQueue::new();
    newer.insert(newer_token.clone().into(), 0);

    let merged = ResolutionQueue::merge(older, newer);

    assert_eq!(merged.len(), 1);
    let survivor = merged.iter().next().unwrap();
    assert_eq!(survivor, &Resolvable::Resource(newer_token));
}

#[test]
fn test_merge_keeps_distinct_entries() {
    let mut older = ResolutionQueue::new();
    older.insert(page("1", 1), 0);
    let mut newer = ResolutionQueue::new();
    newer.insert(page("1", 1), 1);
    newer.insert(page("2", 5), 0);

    let merged = ResolutionQueue::merge(older, newer);

    assert_eq!(merged.len(), 3);
    assert_eq!(merged.priorities(), vec![5, 1]);
}

#[test]
fn test_entries_beyond_depth_are_dropped_with_their_tier() {
    let mut queue = ResolutionQueue::new();
    queue.insert(page("1", 0), 0);
    queue.insert(page("2", 0), 3);

    let tier = queue.extract_top_tier(2);

    assert_eq!(tier.dropped, 1);
    assert_eq!(tier.resources_to_load["page"].len(), 1);
    assert!(queue.is_empty());
}
