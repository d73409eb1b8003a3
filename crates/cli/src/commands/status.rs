//! `dossier status` — Show configuration and record store status.

use super::runtime::Runtime;
use dossier_config::AppConfig;

pub async fn run(now: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let runtime = Runtime::build(now)?;
    let config = &runtime.config;

    println!("📇 Dossier Status");
    println!("=================");
    println!("  Config dir:   {}", AppConfig::config_dir().display());
    println!("  Time zone:    {}", runtime.zone);
    println!("  Currency:     {}", config.currency);
    println!("  Days ahead:   {}", config.default_days_ahead);
    println!("  Store:        {}", runtime.store.name());
    if config.store.backend == "file" {
        println!("  Data dir:     {}", config.data_dir().display());
    }
    println!("  Now:          {}", runtime.clock.now().with_timezone(&runtime.zone).format("%Y-%m-%d %H:%M"));

    for service in &runtime.services {
        let domain = service.domain();
        println!("\n  {} ({})", domain.title, domain.name);
        for collection in domain.collections() {
            match runtime.store.count(collection).await {
                Ok(n) => println!("    ✅ {collection:<14} {n} records"),
                Err(e) => println!("    ❌ {collection:<14} {e}"),
            }
        }
    }

    if AppConfig::config_path().exists() {
        println!("\n  ✅ Config file found");
    } else {
        println!("\n  ⚠️  No config file — run `dossier onboard` first");
    }

    Ok(())
}
