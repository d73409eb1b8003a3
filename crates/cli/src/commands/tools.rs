//! `dossier tools` — List the tools of every enabled domain.

use super::runtime::Runtime;
use dossier_config::AppConfig;

pub async fn run(now: Option<&str>, schema: bool) -> Result<(), Box<dyn std::error::Error>> {
    let runtime = Runtime::build(now)?;
    let registry = runtime.registry();

    if runtime.services.is_empty() {
        println!(
            "⚠️  No domains enabled — check [domains] in {}",
            AppConfig::config_path().display()
        );
        return Ok(());
    }

    for service in &runtime.services {
        let domain = service.domain();
        println!("📁 {} ({})", domain.title, domain.name);
        for info in domain.tools() {
            println!("  {:<28} {}", info.name, info.description);
            if let Some(tool) = registry.get(&info.name).filter(|_| schema) {
                let pretty = serde_json::to_string_pretty(&tool.parameters_schema())?;
                for line in pretty.lines() {
                    println!("      {line}");
                }
            }
        }
        println!();
    }
    println!("{} tools available", registry.len());
    Ok(())
}
