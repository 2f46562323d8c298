//! `groupwarden status` — Show the effective configuration.

use std::path::Path;

use groupwarden_config::AppConfig;

pub fn run(config: &AppConfig, path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let config_path = path
        .map(Path::to_path_buf)
        .unwrap_or_else(AppConfig::config_path);

    println!("GroupWarden Status");
    println!("==================");
    println!("  Config file:   {}", config_path.display());
    println!("  Server:        {}", config.mealie.base_url);
    println!(
        "  API key:       {}",
        if config.require_api_key().is_ok() { "set (redacted)" } else { "missing" }
    );
    println!("  Page size:     {}", config.mealie.per_page);
    println!("  Timeout:       {}s", config.mealie.timeout_secs);
    println!("  Interval:      {}ms", config.poll.interval_ms);
    println!("  Fail fast:     {}", if config.poll.fail_fast { "on" } else { "off" });
    println!("  Isolation:     {}", config.reconcile.isolation_check);
    println!("  On user error: {}", config.reconcile.on_user_error);
    println!("  Retry:         {} attempt(s)", config.retry.max_attempts);
    println!("  Logging:       {} ({})", config.logging.level, config.logging.format);

    if config_path.exists() {
        println!("\n  ✅ Config file found");
    } else {
        println!("\n  ⚠️  No config file — run `groupwarden onboard` or rely on environment variables");
    }

    Ok(())
}
