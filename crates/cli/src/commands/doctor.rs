//! `groupwarden doctor` — Diagnose configuration and connectivity.

use groupwarden_client::MealieClient;
use groupwarden_config::{AppConfig, ConfigError};
use groupwarden_core::GroupGateway;

pub async fn run(loaded: Result<AppConfig, ConfigError>) -> Result<(), Box<dyn std::error::Error>> {
    println!("🩺 GroupWarden Doctor");
    println!("=====================\n");

    let mut issues = 0;

    let config = match loaded {
        Ok(config) => {
            println!("  ✅ Configuration valid");
            config
        }
        Err(e) => {
            println!("  ❌ Configuration invalid: {e}");
            return Err(format!("1 issue found: {e}").into());
        }
    };

    if config.require_api_key().is_err() {
        println!("  ❌ No API key — set MEALIE_API_KEY or mealie.api_key");
        return Err("1 issue found: missing API key".into());
    }
    println!("  ✅ API key configured");

    let client = MealieClient::from_config(&config)?;

    match client.self_group().await {
        Ok(own) => {
            println!("  ✅ Reached {} (caller's group: {})", client.base_url(), own.name);
            match client.list_groups().await {
                Ok(groups) => {
                    println!("  ✅ Admin group listing works ({} groups)", groups.len());
                    if groups.iter().any(|g| g.name == own.name) {
                        println!("  ✅ Caller's group is present in the group listing");
                    } else {
                        println!("  ❌ Caller's group '{}' is missing from the group listing", own.name);
                        issues += 1;
                    }
                }
                Err(e) => {
                    println!("  ❌ Listing groups failed: {e}");
                    issues += 1;
                }
            }
        }
        Err(e) => {
            println!("  ❌ Could not reach {}: {e}", client.base_url());
            issues += 1;
        }
    }

    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
        Ok(())
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
        Err(format!("{issues} issue(s) found").into())
    }
}
