//! Integration tests for loading the dashboard configuration from disk

use revops::prelude::*;
use std::io::Write;
use tempfile::NamedTempFile;

const CONFIG: &str = r#"
objects:
  - object_type: Account
    resource: accounts
    default_sort: { field: AnnualRevenue, direction: DESC }
    fields:
      - { name: Name, label: Account Name, type: string }
      - { name: AnnualRevenue, label: Annual Revenue, type: number }
      - { name: Rating, label: Rating, type: currency }
scope_defaults:
  ae: mine
  sales_leader: all
client:
  base_url: http://crm.internal:8080
  timeout_ms: 5000
  max_retries: 0
"#;

fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_load_from_file() {
    let file = write_config(CONFIG);
    let config = DashboardConfig::from_yaml_file(file.path()).unwrap();

    let account = config.object("Account").unwrap();
    let catalog = account.catalog();
    let fields: Vec<&str> = catalog.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(fields, vec!["Name", "AnnualRevenue", "Rating"]);
    assert_eq!(catalog.type_of("Rating"), FieldType::String);

    let defaults = account.list_defaults(config.scope_defaults.resolve("sales_leader"));
    assert_eq!(defaults.scope, OwnershipScope::All);
    assert_eq!(defaults.sort_field, "AnnualRevenue");
    assert_eq!(defaults.sort_direction, SortDirection::Desc);

    assert_eq!(config.client.timeout_ms, 5000);
    assert_eq!(config.client.retry_backoff_ms, 200);
    assert_eq!(RetryPolicy::from_config(&config.client).max_retries, 0);
}

#[test]
fn test_loaded_config_builds_a_context() {
    let file = write_config(CONFIG);
    let config = DashboardConfig::from_yaml_file(file.path()).unwrap();

    let context = AppContext::new(config).unwrap();
    assert_eq!(context.client().base_url().as_str(), "http://crm.internal:8080/");
}

#[test]
fn test_missing_file() {
    let err = DashboardConfig::from_yaml_file("/nonexistent/revops.yaml").unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ConfigError>(),
        Some(ConfigError::FileNotFound { .. })
    ));
}

#[test]
fn test_malformed_yaml_names_the_file() {
    let file = write_config("objects: [ { object_type: Account ");
    let err = DashboardConfig::from_yaml_file(file.path()).unwrap_err();

    match err.downcast_ref::<ConfigError>() {
        Some(ConfigError::ParseError { file: Some(name), .. }) => {
            assert_eq!(name, &file.path().display().to_string());
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn test_duplicate_resource_is_rejected() {
    let yaml = r#"
objects:
  - object_type: Account
    resource: accounts
    default_sort: { field: Name }
    fields: [ { name: Name, label: Name, type: string } ]
  - object_type: Contact
    resource: accounts
    default_sort: { field: Name }
    fields: [ { name: Name, label: Name, type: string } ]
"#;
    let err = DashboardConfig::from_yaml_str(yaml).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ConfigError>(),
        Some(ConfigError::InvalidValue { .. })
    ));
}
