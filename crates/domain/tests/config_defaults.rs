use es_domain::config::{Config, ConfigSeverity};

#[test]
fn default_listener_binds_every_interface() {
    let config = Config::default();
    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.server.port, 8000);
}

#[test]
fn default_config_validates_clean() {
    let config = Config::default();
    let issues = config.validate();
    assert!(issues.is_empty(), "unexpected issues: {issues:?}");
}

#[test]
fn default_cors_allows_local_dev_servers() {
    let config = Config::default();
    assert!(config
        .server
        .cors
        .allowed_origins
        .contains(&"http://localhost:*".to_string()));
}

#[test]
fn dispatch_defaults_match_provider_pacing() {
    let config = Config::default();
    assert_eq!(config.dispatch.chunk_size, 50);
    assert_eq!(config.dispatch.inter_chunk_delay_ms, 1000);
}

#[test]
fn directory_defaults_index_both_phone_fields() {
    let config = Config::default();
    assert_eq!(
        config.directory.indexed_group_fields,
        vec!["parentPhone".to_string(), "alternateParentPhone".to_string()]
    );
    assert_eq!(config.directory.students_ttl_secs, 600);
    assert_eq!(config.directory.tenant_name_ttl_secs, 86_400);
}

#[test]
fn tutor_cache_ttl_is_fifteen_days() {
    let config = Config::default();
    assert_eq!(config.tutor.cache_ttl_secs, 15 * 24 * 3600);
}

#[test]
fn partial_toml_keeps_other_defaults() {
    let toml_str = r#"
[whatsapp]
default_country_code = "44"

[dispatch]
chunk_size = 10
"#;
    let config: Config = toml::from_str(toml_str).unwrap();
    assert_eq!(config.whatsapp.default_country_code, "44");
    assert_eq!(config.whatsapp.api_version, "v24.0");
    assert_eq!(config.dispatch.chunk_size, 10);
    assert_eq!(config.dispatch.inter_chunk_delay_ms, 1000);
}

#[test]
fn zero_chunk_size_is_an_error() {
    let config: Config = toml::from_str("[dispatch]\nchunk_size = 0\n").unwrap();
    let issues = config.validate();
    assert!(issues
        .iter()
        .any(|i| i.field == "dispatch.chunk_size" && i.severity == ConfigSeverity::Error));
}

#[test]
fn non_numeric_country_code_is_an_error() {
    let config: Config =
        toml::from_str("[whatsapp]\ndefault_country_code = \"+91\"\n").unwrap();
    assert!(config
        .validate()
        .iter()
        .any(|i| i.field == "whatsapp.default_country_code"));
}

#[test]
fn bad_timezone_is_an_error() {
    let config: Config = toml::from_str("[directory]\ntimezone = \"Mars/Olympus\"\n").unwrap();
    assert!(config
        .validate()
        .iter()
        .any(|i| i.field == "directory.timezone"));
}

#[test]
fn cors_wildcard_warns() {
    let config: Config =
        toml::from_str("[server.cors]\nallowed_origins = [\"*\"]\n").unwrap();
    let issues = config.validate();
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].severity, ConfigSeverity::Warning);
}

#[test]
fn server_and_observability_checks_are_part_of_validate() {
    let config: Config = toml::from_str(
        "[server.rate_limit]\nrequests_per_second = 5\nburst_size = 0\n\n[observability]\nsample_rate = -0.1\n",
    )
    .unwrap();
    let fields: Vec<_> = config.validate().into_iter().map(|i| i.field).collect();
    assert_eq!(fields, vec!["server.rate_limit", "observability.sample_rate"]);
}
