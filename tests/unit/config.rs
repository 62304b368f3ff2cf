use content_resolver::config::ResolverConfig;
use content_resolver::core::ResolveError;
use serde_json::json;
use tempfile::TempDir;

#[test]
fn test_full_config_parses() {
    let config = ResolverConfig::from_toml(
        r#"
max_depth = 2
max_rounds = 20
max_concurrent_loads = 4

[loaders.media]
params = { formats = ["sulu-400x400"] }

[loaders.page]
"#,
    )
    .unwrap();

    assert_eq!(config.max_depth, 2);
    assert_eq!(config.max_concurrent_loads, 4);
    assert_eq!(config.loader_params("media"), json!({"formats": ["sulu-400x400"]}));
    assert_eq!(config.loader_params("page"), json!({}));
    assert_eq!(config.loader_params("tag"), json!({}));
}

#[test]
fn test_invalid_limits_are_config_errors() {
    for content in ["max_depth = 1\nmax_rounds = 0\n", "max_depth = 1\nmax_rounds = 1\nmax_concurrent_loads = 0\n"] {
        let error = ResolverConfig::from_toml(content).unwrap_err();
        assert!(matches!(error.downcast_ref::<ResolveError>(), Some(ResolveError::ConfigError { .. })));
    }
}

#[test]
fn test_zero_depth_is_valid() {
    let config = ResolverConfig::from_toml("max_depth = 0\nmax_rounds = 1\n").unwrap();
    assert_eq!(config.max_depth, 0);
}

#[tokio::test]
async fn test_save_and_load_round_trip() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("nested").join("resolver.toml");

    let config = ResolverConfig::new(3, 12)
        .with_max_concurrent_loads(2)
        .with_loader_params("page", json!({"properties": ["title", "url"]}));
    config.save_to(&path).await.unwrap();

    let loaded = ResolverConfig::load_from(&path).await.unwrap();
    assert_eq!(loaded, config);
}

#[tokio::test]
async fn test_load_missing_file_fails_with_path() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("missing.toml");

    let error = ResolverConfig::load_from(&path).await.unwrap_err();
    assert!(error.to_string().contains("missing.toml"));
}
