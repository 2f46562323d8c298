//! `groupwarden onboard` — Write a starter configuration file.

use std::path::Path;

use groupwarden_config::AppConfig;

pub async fn run(path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let config_path = path
        .map(Path::to_path_buf)
        .unwrap_or_else(AppConfig::config_path);

    println!("GroupWarden — First-Time Setup");
    println!("==============================\n");

    if let Some(dir) = config_path.parent() {
        if !dir.as_os_str().is_empty() && !dir.exists() {
            std::fs::create_dir_all(dir)?;
            println!("✅ Created config directory: {}", dir.display());
        }
    }

    if config_path.exists() {
        println!("  Config file already exists: {}", config_path.display());
    } else {
        let mut content = String::from(
            "# GroupWarden configuration\n\
             # The API key can also come from MEALIE_API_KEY.\n\
             # [mealie]\n\
             # api_key = \"...\"\n\n",
        );
        content.push_str(&AppConfig::default_toml());
        std::fs::write(&config_path, content)?;
        println!("✅ Wrote {}", config_path.display());
    }

    println!("\nNext steps:");
    println!("  1. Set mealie.base_url and an admin API key");
    println!("  2. Run `groupwarden doctor` to check connectivity");
    println!("  3. Run `groupwarden daemon`");

    Ok(())
}
