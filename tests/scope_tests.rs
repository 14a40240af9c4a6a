//! Integration tests for ownership scopes and role defaults

use revops::prelude::*;

fn role_defaults() -> ScopeDefaults {
    ScopeDefaults::new()
        .with("ae", OwnershipScope::Mine)
        .with("am", OwnershipScope::Team)
}

fn user(role: &str) -> CurrentUser {
    CurrentUser {
        id: "005A".to_string(),
        name: "Ada".to_string(),
        role: role.to_string(),
        team_member_ids: vec!["005B".to_string()],
    }
}

fn initial_scope(role: &str, url: &str) -> OwnershipScope {
    let config = DashboardConfig::default_config();
    let object = config.object("Account").unwrap();
    let defaults = object.list_defaults(resolve_default_scope(role, &role_defaults()));

    ListFilterController::initialize(
        object.resource.clone(),
        object.catalog(),
        &UrlParams::parse(url),
        defaults,
    )
    .state()
    .scope
}

#[test]
fn test_role_default_applies_without_url_scope() {
    assert_eq!(initial_scope("ae", ""), OwnershipScope::Mine);
    assert_eq!(initial_scope("am", ""), OwnershipScope::Team);
}

#[test]
fn test_unknown_role_falls_back_to_mine() {
    assert_eq!(initial_scope("finance", ""), OwnershipScope::Mine);
    assert_eq!(resolve_default_scope("finance", &ScopeDefaults::new()), OwnershipScope::Mine);
}

#[test]
fn test_url_scope_wins_over_role_default() {
    assert_eq!(initial_scope("ae", "scope=all"), OwnershipScope::All);
    assert_eq!(initial_scope("am", "scope=bogus"), OwnershipScope::Team);
}

#[test]
fn test_scope_admits_by_owner() {
    let user = user("am");

    assert!(OwnershipScope::Mine.admits(Some("005A"), &user));
    assert!(!OwnershipScope::Mine.admits(Some("005B"), &user));
    assert!(OwnershipScope::Team.admits(Some("005B"), &user));
    assert!(!OwnershipScope::Team.admits(Some("005C"), &user));
    assert!(!OwnershipScope::Team.admits(None, &user));
    assert!(OwnershipScope::All.admits(None, &user));
}

#[test]
fn test_scope_wire_names() {
    for scope in [OwnershipScope::Mine, OwnershipScope::Team, OwnershipScope::All] {
        assert_eq!(scope.as_str().parse::<OwnershipScope>(), Ok(scope));
        assert_eq!(
            serde_json::to_value(scope).unwrap(),
            serde_json::Value::String(scope.to_string())
        );
    }
}
