//! The built-in domain catalog and sample-data seeding.

use chrono::NaiveDate;
use dossier_core::SchemaError;
use dossier_store::InMemoryStore;
use tracing::info;

use crate::domain::Domain;
use crate::{billing, legal, veterinary};

/// Names of the built-in domains, in catalog order.
pub const DOMAIN_NAMES: [&str; 3] = [legal::NAME, billing::NAME, veterinary::NAME];

/// Every built-in domain, in catalog order.
pub fn builtin() -> Vec<Domain> {
    vec![legal::domain(), billing::domain(), veterinary::domain()]
}

/// Look up a built-in domain by name (case-insensitive).
pub fn find(name: &str) -> Option<Domain> {
    builtin()
        .into_iter()
        .find(|d| d.name.eq_ignore_ascii_case(name.trim()))
}

/// An in-memory store holding one domain's sample data.
pub fn sample_store(domain: &Domain, today: NaiveDate) -> Result<InMemoryStore, SchemaError> {
    seed_memory_store(std::slice::from_ref(domain), today)
}

/// An in-memory store holding the sample data of several domains.
///
/// Collection names are unique across the built-in catalog, so all
/// domains can share one store.
pub fn seed_memory_store(domains: &[Domain], today: NaiveDate) -> Result<InMemoryStore, SchemaError> {
    let mut store = InMemoryStore::new();
    for domain in domains {
        for (collection, records) in domain.sample_records(today)? {
            info!(domain = %domain.name, collection = %collection, count = records.len(), "Seeded sample data");
            store = store.with_collection(collection, records);
        }
    }
    Ok(store)
}
