//! Config file loading tests

use frontdesk_core::Config;
use std::io::Write;

#[test]
fn load_from_yaml_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        "llm_service:\n  url: http://inference.internal:8000\n  model: test-model\nrouter:\n  max_hops: 3\n  candidate_pool: 20\n  top_k: 4\n"
    )
    .unwrap();

    let config = Config::load_from(file.path()).unwrap();
    assert_eq!(config.llm_service.url, "http://inference.internal:8000");
    assert_eq!(config.llm_service.model, "test-model");
    assert_eq!(config.router.max_hops, 3);
    assert_eq!(config.router.candidate_pool, 20);
    assert_eq!(config.router.top_k, 4);
    // Untouched sections fall back to defaults
    assert_eq!(config.reranker.stage, "staging");
}

#[test]
fn invalid_tuning_is_rejected_at_load() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "router:\n  candidate_pool: 2\n  top_k: 5\n").unwrap();
    assert!(Config::load_from(file.path()).is_err());
}
