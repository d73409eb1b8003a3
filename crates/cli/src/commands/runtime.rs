//! Shared wiring: config → clock → domains → store → services → tools.

use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone, Utc};
use dossier_config::AppConfig;
use dossier_core::record::parse_timestamp;
use dossier_core::{Clock, FixedClock, RecordStore, SystemClock};
use dossier_domains::{DOMAIN_NAMES, Domain, DomainService, ServiceOptions, builtin, seed_memory_store};
use dossier_engine::today;
use dossier_store::FileStore;
use dossier_core::tool::ToolRegistry;
use std::sync::Arc;
use tracing::{debug, info};

pub struct Runtime {
    pub config: AppConfig,
    pub zone: FixedOffset,
    pub clock: Arc<dyn Clock>,
    pub store: Arc<dyn RecordStore>,
    pub services: Vec<Arc<DomainService>>,
}

impl Runtime {
    /// Load config and build every enabled domain's service.
    pub fn build(now: Option<&str>) -> Result<Self, Box<dyn std::error::Error>> {
        let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
        Self::from_config(config, now)
    }

    pub fn from_config(config: AppConfig, now: Option<&str>) -> Result<Self, Box<dyn std::error::Error>> {
        config.validate_domains(&DOMAIN_NAMES)?;
        let zone = config.zone()?;
        let clock = clock_for(now, &zone)?;
        let domains = configured_domains(&config)?;

        let store: Arc<dyn RecordStore> = match config.store.backend.as_str() {
            "file" => {
                let dir = config.data_dir();
                info!(dir = %dir.display(), "Using file store");
                Arc::new(FileStore::new(dir, domains.iter().flat_map(|d| d.schemas.clone())))
            }
            _ => {
                let store = seed_memory_store(&domains, today(clock.now(), &zone))?;
                debug!("Using in-memory store with sample data");
                Arc::new(store)
            }
        };

        let options = ServiceOptions {
            zone,
            currency: config.currency.clone(),
            default_days_ahead: config.default_days_ahead,
        };
        let services = domains
            .into_iter()
            .map(|domain| {
                Arc::new(DomainService::new(
                    Arc::new(domain),
                    Arc::clone(&store),
                    Arc::clone(&clock),
                    options.clone(),
                ))
            })
            .collect();

        Ok(Self {
            config,
            zone,
            clock,
            store,
            services,
        })
    }

    /// The service of an enabled domain.
    pub fn service(&self, name: &str) -> Result<Arc<DomainService>, String> {
        self.services
            .iter()
            .find(|s| s.domain().name.eq_ignore_ascii_case(name.trim()))
            .cloned()
            .ok_or_else(|| {
                let enabled: Vec<&str> = self.services.iter().map(|s| s.domain().name.as_str()).collect();
                format!("Unknown or disabled domain '{name}' (available: {})", enabled.join(", "))
            })
    }

    pub fn registry(&self) -> ToolRegistry {
        dossier_tools::default_registry(&self.services)
    }
}

/// Built-in domains that are enabled, with terminal-status overrides applied.
pub fn configured_domains(config: &AppConfig) -> Result<Vec<Domain>, Box<dyn std::error::Error>> {
    let mut domains = Vec::new();
    for mut domain in builtin() {
        if !config.domain_enabled(&domain.name) {
            debug!(domain = %domain.name, "Domain disabled");
            continue;
        }
        if let Some(overrides) = config.domains.get(&domain.name) {
            for (collection, statuses) in &overrides.terminal_statuses {
                domain.set_terminal_statuses(collection, statuses)?;
            }
        }
        domain.validate()?;
        domains.push(domain);
    }
    Ok(domains)
}

/// A fixed clock for `--now`, otherwise the system clock.
pub fn clock_for(now: Option<&str>, zone: &FixedOffset) -> Result<Arc<dyn Clock>, String> {
    match now {
        Some(text) => Ok(Arc::new(FixedClock(parse_now(text, zone)?))),
        None => Ok(Arc::new(SystemClock)),
    }
}

/// A bare date means midnight in the configured zone.
pub fn parse_now(text: &str, zone: &FixedOffset) -> Result<DateTime<Utc>, String> {
    let text = text.trim();
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return date
            .and_hms_opt(0, 0, 0)
            .and_then(|midnight| zone.from_local_datetime(&midnight).single())
            .map(|local| local.with_timezone(&Utc))
            .ok_or_else(|| format!("Invalid --now value: {text}"));
    }
    parse_timestamp(text).ok_or_else(|| format!("Invalid --now value '{text}' (expected YYYY-MM-DD or RFC 3339)"))
}
