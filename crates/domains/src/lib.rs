//! Domain catalogs for Dossier.
//!
//! Each domain (legal practice, SaaS billing, veterinary clinic) is a
//! [`Domain`] value: schemas, bindings from the four query shapes to
//! collections and fields, and fixed report templates. [`DomainService`]
//! runs those shapes against a [`RecordStore`](dossier_core::RecordStore).

pub mod billing;
pub mod catalog;
pub mod domain;
pub mod legal;
pub mod service;
pub mod veterinary;

pub use catalog::{DOMAIN_NAMES, builtin, find, sample_store, seed_memory_store};
pub use domain::{
    Domain, SearchBinding, StatsBinding, TableBinding, ToolInfo, TotalBinding, WindowBinding,
};
pub use service::{DomainService, QueryOutcome, ServiceOptions};
