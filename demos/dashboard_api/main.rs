//! Dashboard API example
//!
//! Serves the list and metadata endpoints over an in-memory store seeded
//! with a small account hierarchy, a few opportunities and one user per
//! role. Pass the caller in the `x-user-id` header:
//!
//! ```text
//! curl -H 'x-user-id: 005-am' 'http://127.0.0.1:3000/api/accounts?grouped=true'
//! ```

use anyhow::anyhow;
use revops::prelude::*;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let config = match std::env::args().nth(1) {
        Some(path) => DashboardConfig::from_yaml_file(path)?,
        None => DashboardConfig::default_config(),
    };

    let store = InMemoryRecordStore::new();
    populate_test_data(&store)?;

    println!("🚀 Starting revops dashboard API");
    println!("\n🌐 Server running on http://127.0.0.1:3000");
    println!("\n📚 Routes:");
    println!("    GET    /api/accounts                    - Accounts (?grouped=true for hierarchies)");
    println!("    GET    /api/opportunities               - Open opportunities (?includeClosed=true)");
    println!("    GET    /api/metadata/scope-defaults     - Role to default scope");
    println!("    GET    /api/metadata/fields/{{type}}      - Field permissions");
    println!("    GET    /api/user/me                     - Current user");
    println!("    GET    /health                          - Liveness");
    println!("\n👤 Users: 005-ae (mine), 005-am (team), 005-lead (all)");

    ServerBuilder::new()
        .with_store(store)
        .with_config(config)
        .serve("127.0.0.1:3000")
        .await
}

fn date(year: i32, month: u32, day: u32) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| anyhow!("invalid date {}-{}-{}", year, month, day))
}

/// Populate the store with test data
fn populate_test_data(store: &InMemoryRecordStore) -> Result<()> {
    let users = vec![
        CurrentUser {
            id: "005-ae".to_string(),
            name: "Avery Executive".to_string(),
            role: "ae".to_string(),
            team_member_ids: Vec::new(),
        },
        CurrentUser {
            id: "005-am".to_string(),
            name: "Morgan Manager".to_string(),
            role: "am".to_string(),
            team_member_ids: vec!["005-ae".to_string()],
        },
        CurrentUser {
            id: "005-lead".to_string(),
            name: "Riley Lead".to_string(),
            role: "sales_leader".to_string(),
            team_member_ids: vec!["005-ae".to_string(), "005-am".to_string()],
        },
    ];

    let accounts = vec![
        Account::new("001-globex", "Globex Holdings")
            .with_owner("005-am")
            .with_industry("Manufacturing")
            .with_annual_revenue(48_000_000.0),
        Account::new("001-globex-eu", "Globex Europe")
            .with_parent("001-globex")
            .with_owner("005-ae")
            .with_industry("Manufacturing")
            .with_annual_revenue(12_500_000.0),
        Account::new("001-globex-apac", "Globex APAC")
            .with_parent("001-globex")
            .with_owner("005-ae")
            .with_industry("Manufacturing"),
        Account::new("001-initech", "Initech")
            .with_owner("005-ae")
            .with_industry("Technology")
            .with_annual_revenue(3_200_000.0),
        Account::new("001-umbrella", "Umbrella Corp")
            .with_owner("005-lead")
            .with_industry("Healthcare")
            .with_annual_revenue(91_000_000.0),
    ];

    let mut renewal = Opportunity::new("006-renewal", "Globex Renewal FY26")
        .with_owner("005-am")
        .with_stage("Negotiation", false)
        .with_amount(420_000.0)
        .with_close_date(date(2026, 11, 30)?);
    renewal.account_id = Some("001-globex".to_string());
    renewal.account_name = Some("Globex Holdings".to_string());

    let mut expansion = Opportunity::new("006-expansion", "Initech Seat Expansion")
        .with_owner("005-ae")
        .with_stage("Discovery", false)
        .with_amount(85_000.0)
        .with_close_date(date(2027, 1, 15)?);
    expansion.account_id = Some("001-initech".to_string());
    expansion.account_name = Some("Initech".to_string());

    let mut pilot = Opportunity::new("006-pilot", "Umbrella Pilot")
        .with_owner("005-lead")
        .with_stage("Closed Won", true)
        .with_amount(60_000.0)
        .with_close_date(date(2026, 6, 1)?);
    pilot.account_id = Some("001-umbrella".to_string());
    pilot.account_name = Some("Umbrella Corp".to_string());

    store.seed(accounts, vec![renewal, expansion, pilot], users)?;
    Ok(())
}
