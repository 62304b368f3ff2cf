use chrono::{TimeZone, Utc};
use content_resolver::core::{ResolveError, ResourceRef};
use content_resolver::dimension::{DimensionAttributes, DimensionMerger, DimensionRow, Stage};
use serde_json::json;

fn row(id: &str, locale: Option<&str>, stage: Stage) -> DimensionRow {
    DimensionRow::new(ResourceRef::new("pages", id), locale.map(str::to_string), stage)
}

#[test]
fn test_stage_and_version_select_rows() {
    let rows = vec![
        row("1", None, Stage::Draft).with_template_value("title", json!("Draft")),
        row("1", None, Stage::Live).with_template_value("title", json!("Live")),
        row("1", None, Stage::Live).with_version(1).with_template_value("title", json!("Archived")),
    ];

    let draft = DimensionMerger::merge(&rows, &DimensionAttributes::new(Stage::Draft)).unwrap();
    let live = DimensionMerger::merge(&rows, &DimensionAttributes::new(Stage::Live)).unwrap();
    let archived = DimensionMerger::merge(&rows, &DimensionAttributes::new(Stage::Live).with_version(1)).unwrap();

    assert_eq!(draft.template_data["title"], json!("Draft"));
    assert_eq!(live.template_data["title"], json!("Live"));
    assert_eq!(archived.template_data["title"], json!("Archived"));
    assert_eq!(archived.version, 1);
}

#[test]
fn test_localized_row_overrides_unlocalized_fields() {
    let authored = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
    let rows = vec![
        row("1", None, Stage::Live)
            .with_template_key("default")
            .with_template_value("title", json!("Shared"))
            .with_template_value("layout", json!("wide"))
            .with_extension_value("excerpt", "description", json!("Shared excerpt")),
        row("1", Some("de"), Stage::Live)
            .with_template_key("homepage")
            .with_authored(authored)
            .with_template_value("title", json!("Startseite"))
            .with_extension_value("excerpt", "title", json!("Auszug")),
        row("1", Some("fr"), Stage::Draft),
    ];

    let snapshot =
        DimensionMerger::merge(&rows, &DimensionAttributes::new(Stage::Live).with_locale("de")).unwrap();

    assert!(!snapshot.is_ghost());
    assert_eq!(snapshot.locale.as_deref(), Some("de"));
    assert_eq!(snapshot.template_key.as_deref(), Some("homepage"));
    assert_eq!(snapshot.template_data["title"], json!("Startseite"));
    assert_eq!(snapshot.template_data["layout"], json!("wide"));
    assert_eq!(snapshot.extension("excerpt").unwrap()["description"], json!("Shared excerpt"));
    assert_eq!(snapshot.extension("excerpt").unwrap()["title"], json!("Auszug"));
    assert_eq!(snapshot.authored, Some(authored));
    assert_eq!(snapshot.available_locales, vec!["de".to_string()]);
}

#[test]
fn test_missing_localized_row_yields_ghost() {
    let rows = vec![
        row("1", None, Stage::Live).with_ghost_locale("en").with_template_value("title", json!("Home")),
        row("1", Some("en"), Stage::Live),
    ];

    let snapshot =
        DimensionMerger::merge(&rows, &DimensionAttributes::new(Stage::Live).with_locale("de")).unwrap();

    assert!(snapshot.is_ghost());
    assert_eq!(snapshot.locale, None);
    assert_eq!(snapshot.requested_locale.as_deref(), Some("de"));
    assert_eq!(snapshot.effective_locale(), Some("de"));
    assert_eq!(snapshot.ghost_locale.as_deref(), Some("en"));
    assert_eq!(snapshot.template_data["title"], json!("Home"));
}

#[test]
fn test_missing_unlocalized_row_is_not_found() {
    let rows = vec![row("1", Some("en"), Stage::Live)];

    let error = DimensionMerger::merge(&rows, &DimensionAttributes::new(Stage::Live).with_locale("en")).unwrap_err();
    let error = error.downcast_ref::<ResolveError>().unwrap();
    assert!(error.is_not_found());

    let error = DimensionMerger::merge(&[], &DimensionAttributes::new(Stage::Live)).unwrap_err();
    assert!(error.downcast_ref::<ResolveError>().is_some_and(ResolveError::is_not_found));
}

#[test]
fn test_merge_all_skips_incomplete_resources() {
    let rows = vec![
        row("2", None, Stage::Live),
        row("1", None, Stage::Live),
        row("3", Some("en"), Stage::Live),
        row("1", Some("en"), Stage::Live),
    ];

    let snapshots = DimensionMerger::merge_all(&rows, &DimensionAttributes::new(Stage::Live).with_locale("en"));

    let ids: Vec<&str> = snapshots.iter().map(|snapshot| snapshot.resource.id.as_str()).collect();
    assert_eq!(ids, vec!["1", "2"]);
    assert!(!snapshots[0].is_ghost());
    assert!(snapshots[1].is_ghost());
}
