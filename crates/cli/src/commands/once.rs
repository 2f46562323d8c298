//! `groupwarden once` — Run a single reconciliation pass.

use groupwarden_config::AppConfig;

pub async fn run(config: AppConfig, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let reconciler = super::build_reconciler(&config)?;
    let report = reconciler.tick().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("GroupWarden — reconciliation pass");
    println!("=================================");
    println!("  Groups seen:     {}", report.groups_seen);
    println!("  Members seen:    {}", report.members_seen);
    println!("  Already isolated: {}", report.skipped);

    if report.has_changes() {
        for group in &report.groups_created {
            println!("  + created group  {group}");
        }
        for user in &report.users_reassigned {
            println!("  → reassigned     {user}");
        }
    } else {
        println!("\n  Nothing to do, every member has a group of their own.");
    }

    Ok(())
}
