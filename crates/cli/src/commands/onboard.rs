//! `dossier onboard` — Write a default config and JSONL sample data.

use super::runtime::{clock_for, configured_domains};
use dossier_config::AppConfig;
use dossier_engine::today;
use dossier_store::FileStore;

pub async fn run(now: Option<&str>, force: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config_dir = AppConfig::config_dir();
    let config_path = AppConfig::config_path();

    println!("📇 Dossier — First-Time Setup");
    println!("=============================\n");

    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir)?;
        println!("✅ Created config directory: {}", config_dir.display());
    } else {
        println!("  Config directory exists: {}", config_dir.display());
    }

    if config_path.exists() {
        println!("⚠️  Config already exists at: {}", config_path.display());
    } else {
        std::fs::write(&config_path, AppConfig::default_toml())?;
        println!("✅ Created config.toml at: {}", config_path.display());
    }

    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let zone = config.zone()?;
    let anchor = today(clock_for(now, &zone)?.now(), &zone);
    let domains = configured_domains(&config)?;

    let data_dir = config.data_dir();
    let store = FileStore::new(&data_dir, domains.iter().flat_map(|d| d.schemas.clone()));
    println!("\n📂 Sample data in {} (dated around {anchor})", store.dir().display());

    for domain in &domains {
        for (collection, records) in domain.sample_records(anchor)? {
            let path = data_dir.join(format!("{collection}.jsonl"));
            if path.exists() && !force {
                println!("  ⏭️  {collection}.jsonl exists (use --force to overwrite)");
                continue;
            }
            store.write_collection(&collection, &records).await?;
            println!("  ✅ {collection}.jsonl ({} records)", records.len());
        }
    }

    println!("\n📝 Next steps:");
    println!("  1. Set `backend = \"file\"` under [store] in {} to query these files", config_path.display());
    println!("  2. Run `dossier tools` to see what clients can call");
    println!("  3. Try `dossier overdue legal` or `dossier stats billing`");

    Ok(())
}
