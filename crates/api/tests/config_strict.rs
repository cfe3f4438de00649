use warden_api::config::{self, ConfigError};

mod common;

use common::TestServer;

#[test]
fn default_policy_compiles() {
    let policy = config::default_policy().unwrap();
    assert_eq!(policy.version, 1);
    let compiled = policy.compile().unwrap();
    assert_eq!(compiled.registry.len(), 7);
    assert_eq!(compiled.bindings.len(), 7);
}

#[test]
fn unknown_fields_are_rejected() {
    let yaml = r#"
version: 1
operations:
  - id: a
    route: GET /a
    alow_anonymous: true
"#;
    assert!(matches!(config::load_from_str(yaml), Err(ConfigError::Yaml(_))));

    let yaml = r#"
version: 1
global:
  - rolez: Admin
operations:
  - id: a
    route: GET /a
"#;
    assert!(matches!(config::load_from_str(yaml), Err(ConfigError::Yaml(_))));
}

#[test]
fn version_must_be_one() {
    let yaml = r#"
version: 2
operations:
  - id: a
    route: GET /a
"#;
    assert!(matches!(
        config::load_from_str(yaml),
        Err(ConfigError::UnsupportedVersion(2))
    ));
}

#[test]
fn malformed_routes_are_rejected() {
    for route in ["/a", "get /a", "GET a", "GET"] {
        let yaml = format!("version: 1\noperations:\n  - id: a\n    route: \"{route}\"\n");
        assert!(
            matches!(config::load_from_str(&yaml), Err(ConfigError::Yaml(_))),
            "{route}"
        );
    }
}

#[test]
fn cache_seconds_rules() {
    let yaml = r#"
version: 1
operations:
  - id: a
    route: DELETE /a
    cache_seconds: 60
"#;
    assert!(matches!(config::load_from_str(yaml), Err(ConfigError::Invalid(_))));

    let yaml = r#"
version: 1
operations:
  - id: a
    route: GET /a
    cache_seconds: 0
"#;
    assert!(matches!(config::load_from_str(yaml), Err(ConfigError::Invalid(_))));
}

#[test]
fn registry_errors_surface_at_compile() {
    let yaml = r#"
version: 1
operations:
  - id: a
    group: missing
    route: GET /a
"#;
    let policy = config::load_from_str(yaml).unwrap();
    assert!(matches!(policy.compile(), Err(ConfigError::Registry(_))));

    let yaml = r#"
version: 1
operations:
  - id: a
    route: GET /a
  - id: b
    route: GET /a
"#;
    let policy = config::load_from_str(yaml).unwrap();
    assert!(matches!(policy.compile(), Err(ConfigError::Binding(_))));
}

#[tokio::test]
async fn route_without_binding_is_a_contract_violation() {
    // Only /health is bound; every other route reaches `authorize` unresolved.
    let yaml = r#"
version: 1
operations:
  - id: system.health
    route: GET /health
    allow_anonymous: true
"#;
    let server = TestServer::spawn_with(config::load_from_str(yaml).unwrap()).await;

    let res = reqwest::get(server.url("/health")).await.unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::OK);

    let res = reqwest::get(server.url("/")).await.unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::INTERNAL_SERVER_ERROR);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "internal_error");
}
