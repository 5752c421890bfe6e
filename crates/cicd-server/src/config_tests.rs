use super::*;

#[test]
fn default_config_binds_to_a_sensible_address() {
    let config = ServerConfig::default();
    assert_eq!(config.bind_addr, "0.0.0.0:7070");
    assert!(config.discovery_labels.is_empty());
    assert!(config.log_dir.is_none());
}

#[test]
fn parses_a_partial_toml_overlay_onto_the_defaults() {
    let toml = r#"
        bind_addr = "127.0.0.1:9000"

        [scheduler]
        worker_count = 8
    "#;
    let config = ServerConfig::from_toml_str(toml).unwrap();
    assert_eq!(config.bind_addr, "127.0.0.1:9000");
    assert_eq!(config.scheduler.worker_count, 8);
    // Untouched nested fields keep their defaults.
    assert_eq!(config.scheduler.queue_size, 1000);
    assert_eq!(config.fleet.send_queue_size, 256);
}
