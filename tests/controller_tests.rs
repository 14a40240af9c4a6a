//! Integration tests for the list-filter state controller
//!
//! Generated states and operation sequences come from a small seeded
//! generator so every run exercises the same cases.

use revops::prelude::*;

// =============================================================================
// Fixtures
// =============================================================================

/// xorshift64* generator; deterministic for a given seed
struct Gen(u64);

impl Gen {
    fn new(seed: u64) -> Self {
        Self(seed.max(1))
    }

    fn next(&mut self) -> u64 {
        self.0 ^= self.0 >> 12;
        self.0 ^= self.0 << 25;
        self.0 ^= self.0 >> 27;
        self.0.wrapping_mul(0x2545_F491_4F6C_DD1D)
    }

    fn below(&mut self, n: usize) -> usize {
        (self.next() % n as u64) as usize
    }

    fn pick<'a, T>(&mut self, items: &'a [T]) -> &'a T {
        &items[self.below(items.len())]
    }

    fn chance(&mut self) -> bool {
        self.next() % 2 == 0
    }
}

fn catalog() -> FieldCatalog {
    FieldCatalog::from_descriptors([
        FieldDescriptor::new("Name", "Account Name", FieldType::String),
        FieldDescriptor::new("Industry", "Industry", FieldType::Picklist),
        FieldDescriptor::new("AnnualRevenue", "Annual Revenue", FieldType::Number),
        FieldDescriptor::new("CreatedDate", "Created Date", FieldType::Date),
    ])
}

fn defaults() -> ListDefaults {
    ListDefaults::new(OwnershipScope::Mine, "Name", SortDirection::Asc)
}

fn controller(url: &str) -> ListFilterController {
    ListFilterController::initialize("accounts", catalog(), &UrlParams::parse(url), defaults())
}

/// A filter that is valid against [`catalog`]
fn random_filter(g: &mut Gen) -> FilterCriteria {
    let catalog = catalog();
    let field = g.pick(&["Name", "Industry", "AnnualRevenue", "CreatedDate"]).to_string();
    let field_type = catalog.type_of(&field);
    let operator = *g.pick(operators_for(field_type));

    let value: FilterValue = if operator.takes_list() {
        vec!["Tech".to_string(), "Retail & Co".to_string()].into()
    } else {
        match field_type {
            FieldType::Number => ((g.below(1000) * 250) as f64).into(),
            FieldType::Date => format!("2024-{:02}-{:02}", g.below(12) + 1, g.below(28) + 1).into(),
            _ => g.pick(&["Acme", "a=b&c", "Üml äut", "100%"]).to_string().into(),
        }
    };

    FilterCriteria::new(field, operator, value)
}

fn random_state(g: &mut Gen) -> ListQueryState {
    let scopes = [OwnershipScope::Mine, OwnershipScope::Team, OwnershipScope::All];
    let directions = [SortDirection::Asc, SortDirection::Desc];

    ListQueryState {
        scope: *g.pick(&scopes),
        filters: (0..g.below(5)).map(|_| random_filter(g)).collect(),
        search: if g.chance() {
            g.pick(&["acme", "Acme Labs", "o'neil & sons", "  padded "]).to_string()
        } else {
            String::new()
        },
        sort_field: g.pick(&["Name", "AnnualRevenue", "CreatedDate"]).to_string(),
        sort_direction: *g.pick(&directions),
    }
}

fn url_filters(controller: &ListFilterController) -> Vec<FilterCriteria> {
    let params = UrlParams::parse(&controller.url_query());
    match params.filters {
        Some(raw) => decode_filters(&raw).unwrap(),
        None => Vec::new(),
    }
}

// =============================================================================
// URL Round-Trip Tests
// =============================================================================

#[test]
fn test_url_round_trip_for_generated_states() {
    let mut g = Gen::new(0x5EED);
    let defaults = defaults();
    let catalog = catalog();

    for _ in 0..500 {
        let state = random_state(&mut g);
        let query = state.to_url(&defaults).to_query_string();
        let parsed = ListQueryState::from_url(&UrlParams::parse(&query), &defaults, &catalog);
        assert_eq!(parsed, state, "query string: {}", query);
    }
}

#[test]
fn test_default_state_round_trips_to_empty_query() {
    let state = ListQueryState::from_defaults(&defaults());
    assert_eq!(state.to_url(&defaults()).to_query_string(), "");

    let parsed = ListQueryState::from_url(&UrlParams::parse(""), &defaults(), &catalog());
    assert_eq!(parsed, state);
}

#[test]
fn test_explicit_default_values_canonicalize() {
    let explicit = controller("scope=mine&sortField=Name&sortDir=ASC");
    assert_eq!(explicit.url_query(), "");
    assert_eq!(explicit.state(), controller("").state());
}

#[test]
fn test_controller_reloads_from_its_own_url() {
    let mut original = controller("");
    original.set_scope(OwnershipScope::Team);
    original.set_search("acme");
    original.sort_by("AnnualRevenue");
    original.sort_by("AnnualRevenue");
    original.add_filter(FilterCriteria::new("Industry", FilterOperator::Equals, "Tech"));

    let reloaded = controller(&original.url_query());
    assert_eq!(reloaded.state(), original.state());
    assert_eq!(reloaded.query_key(), original.query_key());
    assert_eq!(reloaded.state().sort_direction, SortDirection::Desc);
}

#[test]
fn test_tampered_url_degrades_to_defaults() {
    let tampered = controller(
        "scope=everyone&sortDir=sideways&sortField=Password__c&filters=%5B%7B%22field%22%3A%22Name%22%2C%22operator%22%3A%22gt%22%2C%22value%22%3A%22M%22%7D%5D",
    );
    assert_eq!(tampered.state(), &ListQueryState::from_defaults(&defaults()));
    assert_eq!(tampered.url_query(), "");
    assert_eq!(tampered.query_params()["sortField"], "Name");
}

// =============================================================================
// Filter / URL Consistency Tests
// =============================================================================

#[test]
fn test_filters_and_url_never_diverge() {
    let mut g = Gen::new(42);

    for _ in 0..50 {
        let mut controller = controller("");
        for _ in 0..40 {
            match g.below(6) {
                0..=2 => {
                    controller.add_filter(random_filter(&mut g));
                }
                3 | 4 => {
                    let len = controller.filters().len();
                    controller.remove_filter(g.below(len + 1));
                }
                _ => controller.clear_filters(),
            }
            assert_eq!(url_filters(&controller), controller.filters());
        }
    }
}

#[test]
fn test_add_then_remove_leaves_no_filters_key() {
    let mut controller = controller("");

    assert!(controller.add_filter(FilterCriteria::new(
        "Industry",
        FilterOperator::Equals,
        "Tech"
    )));
    assert!(controller.url().contains("filters"));

    let removed = controller.remove_filter(0);
    assert_eq!(removed.map(|f| f.field), Some("Industry".to_string()));
    assert!(controller.filters().is_empty());
    assert!(!controller.url().contains("filters"));
    assert!(!controller.query_params().contains_key("filters"));
}

#[test]
fn test_removal_after_prior_removal_uses_current_positions() {
    let mut controller = controller("");
    for industry in ["Tech", "Retail", "Energy"] {
        controller.add_filter(FilterCriteria::new("Industry", FilterOperator::Equals, industry));
    }

    controller.remove_filter(0);
    let removed = controller.remove_filter(1).unwrap();
    assert_eq!(removed.value, FilterValue::from("Energy"));
    assert_eq!(controller.filter_labels(), vec!["Industry equals Retail".to_string()]);
    assert_eq!(controller.remove_filter(1), None);
}

#[test]
fn test_invalid_filters_never_enter_the_list() {
    let mut controller = controller("");

    assert!(!controller.add_filter(FilterCriteria::new("Name", FilterOperator::GreaterThan, "M")));
    assert!(!controller.add_filter(FilterCriteria::new("Industry", FilterOperator::Equals, "")));
    assert!(!controller.add_filter(FilterCriteria::new(
        "AnnualRevenue",
        FilterOperator::Equals,
        "lots"
    )));
    assert!(!controller.add_filter(FilterCriteria::new(
        "Industry",
        FilterOperator::Between,
        vec!["A".to_string(), "B".to_string()]
    )));

    assert!(controller.filters().is_empty());
    assert_eq!(controller.url_query(), "");
}

#[test]
fn test_non_finite_numbers_never_reach_the_url() {
    let mut controller = controller("");
    let before = controller.query_key();

    for value in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
        assert!(!controller.add_filter(FilterCriteria::new(
            "AnnualRevenue",
            FilterOperator::GreaterThan,
            value
        )));
    }
    assert!(!controller.add_filter(FilterCriteria::new(
        "AnnualRevenue",
        FilterOperator::GreaterThan,
        "NaN"
    )));

    assert!(controller.filters().is_empty());
    assert_eq!(controller.query_key(), before);

    assert!(controller.add_filter(FilterCriteria::new(
        "AnnualRevenue",
        FilterOperator::GreaterThan,
        1_000_000.0
    )));
    let reloaded = self::controller(&controller.url_query());
    assert_eq!(reloaded.filters(), controller.filters());
}

#[test]
fn test_blank_column_sort_round_trips() {
    let mut controller = controller("");
    controller.sort_by("AnnualRevenue");
    controller.sort_by("");

    assert_eq!(controller.state().sort_field, "Name");
    let reloaded = self::controller(&controller.url_query());
    assert_eq!(reloaded.state(), controller.state());
}

// =============================================================================
// Derivation Tests
// =============================================================================

#[test]
fn test_query_params_always_carry_scope() {
    let params = controller("").query_params();
    let keys: Vec<&str> = params.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["scope", "sortField", "sortDir"]);
    assert_eq!(params["scope"], "mine");
}

#[test]
fn test_query_key_tracks_every_state_change() {
    let mut controller = controller("");
    let mut seen = vec![controller.query_key()];

    controller.set_scope(OwnershipScope::All);
    seen.push(controller.query_key());
    controller.set_search("acme");
    seen.push(controller.query_key());
    controller.set_sort_direction(SortDirection::Desc);
    seen.push(controller.query_key());
    controller.add_filter(FilterCriteria::new("Industry", FilterOperator::Equals, "Tech"));
    seen.push(controller.query_key());

    for (i, a) in seen.iter().enumerate() {
        for b in &seen[i + 1..] {
            assert_ne!(a, b);
        }
    }
}

#[test]
fn test_clearing_sort_field_restores_default() {
    let mut controller = controller("sortField=AnnualRevenue");
    controller.set_sort_field("");
    assert_eq!(controller.state().sort_field, "Name");
    assert!(!controller.url().contains("sortField"));
}

#[test]
fn test_filter_draft_feeds_the_controller() {
    let catalog = catalog();
    let mut controller = controller("");
    let mut draft = FilterDraft::new();

    draft.select_field("AnnualRevenue");
    assert_eq!(draft.available_operators(&catalog), operators_for(FieldType::Number));
    draft.select_operator(FilterOperator::GreaterThan);
    assert!(!draft.can_apply(&catalog));
    draft.set_value(1_000_000.0);

    let criteria = draft.apply(&catalog).unwrap();
    assert!(controller.add_filter(criteria));
    assert_eq!(
        controller.filter_labels(),
        vec!["Annual Revenue is greater than 1000000".to_string()]
    );
}
