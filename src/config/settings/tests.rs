use super::*;
use tempfile::TempDir;

#[test]
fn defaults_when_config_missing() {
    let dir = TempDir::new().expect("tempdir");
    let config = Config::load(dir.path()).expect("load should succeed");

    assert_eq!(config.service.base_url, "https://api.openai.com");
    assert_eq!(config.chunking.chunk_size, 1000);
    assert_eq!(config.chunking.chunk_overlap, 200);
    assert_eq!(config.retrieval.top_k, 4);
    assert_eq!(config.base_dir, dir.path());
}

#[test]
fn save_and_reload_round_trip() {
    let dir = TempDir::new().expect("tempdir");
    let mut config = Config::load(dir.path()).expect("load should succeed");
    config.service.generation_model = "test-model".to_string();
    config.chunking.chunk_size = 500;
    config.chunking.chunk_overlap = 50;
    config.retrieval.top_k = 7;

    config.save().expect("save should succeed");

    let reloaded = Config::load(dir.path()).expect("reload should succeed");
    assert_eq!(reloaded, config);
}

#[test]
fn partial_file_uses_section_defaults() {
    let dir = TempDir::new().expect("tempdir");
    std::fs::write(
        dir.path().join("config.toml"),
        "[retrieval]\ntop_k = 9\n",
    )
    .expect("write config");

    let config = Config::load(dir.path()).expect("load should succeed");
    assert_eq!(config.retrieval.top_k, 9);
    assert_eq!(config.chunking.chunk_size, 1000);
    assert_eq!(config.service.timeout_seconds, 30);
}

#[test]
fn rejects_overlap_not_smaller_than_chunk_size() {
    let mut config = Config::default();
    config.chunking.chunk_size = 100;
    config.chunking.chunk_overlap = 100;

    let err = config.validate().expect_err("validation should fail");
    assert!(matches!(err, ConfigError::OverlapTooLarge(100, 100)));
}

#[test]
fn rejects_invalid_url() {
    let mut config = Config::default();
    config.service.base_url = "not a url".to_string();

    let err = config.validate().expect_err("validation should fail");
    assert!(matches!(err, ConfigError::InvalidUrl(_)));
}

#[test]
fn rejects_zero_top_k() {
    let mut config = Config::default();
    config.retrieval.top_k = 0;

    let err = config.validate().expect_err("validation should fail");
    assert!(matches!(err, ConfigError::InvalidTopK(0)));
}

#[test]
fn rejects_out_of_range_timeout() {
    let mut config = Config::default();
    config.service.timeout_seconds = 0;
    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidTimeout(0))
    ));

    config.service.timeout_seconds = 301;
    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidTimeout(301))
    ));
}

#[test]
fn invalid_file_fails_to_load() {
    let dir = TempDir::new().expect("tempdir");
    std::fs::write(
        dir.path().join("config.toml"),
        "[chunking]\nchunk_size = 10\nchunk_overlap = 20\n",
    )
    .expect("write config");

    assert!(Config::load(dir.path()).is_err());
}

#[test]
fn relative_paths_resolve_against_base_dir() {
    let dir = TempDir::new().expect("tempdir");
    let config = Config::load(dir.path()).expect("load should succeed");

    assert_eq!(config.documents_path(), dir.path().join("documents"));
    assert_eq!(config.index_path(), dir.path().join("vector_index.json"));
}

#[test]
fn absolute_paths_left_untouched() {
    let dir = TempDir::new().expect("tempdir");
    let mut config = Config::load(dir.path()).expect("load should succeed");
    let absolute = dir.path().join("elsewhere").join("index.json");
    config.storage.index_path = absolute.clone();

    assert_eq!(config.index_path(), absolute);
}
