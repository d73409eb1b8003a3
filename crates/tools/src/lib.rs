//! Tool-calling adapters for Dossier.
//!
//! Every domain exposes four tools, one per query shape: search, overdue
//! items, upcoming window and stats summary. Tools validate the raw JSON
//! arguments, call the domain service and return its report text as-is.
//!
//! Failures stay in three buckets a client can act on: an empty result is
//! a successful call with a "none found" report, bad arguments are
//! [`ToolError::InvalidArguments`](dossier_core::ToolError::InvalidArguments),
//! and a store that cannot be read is
//! [`ToolError::StoreUnavailable`](dossier_core::ToolError::StoreUnavailable).

mod args;
pub mod overdue;
pub mod search;
pub mod stats;
pub mod upcoming;

use dossier_core::tool::ToolRegistry;
use dossier_domains::DomainService;
use std::sync::Arc;

pub use overdue::OverdueItemsTool;
pub use search::SearchTool;
pub use stats::StatsSummaryTool;
pub use upcoming::UpcomingWindowTool;

/// Register the four tools of one domain.
pub fn register_domain(registry: &mut ToolRegistry, service: Arc<DomainService>) {
    registry.register(Box::new(SearchTool::new(Arc::clone(&service))));
    registry.register(Box::new(OverdueItemsTool::new(Arc::clone(&service))));
    registry.register(Box::new(UpcomingWindowTool::new(Arc::clone(&service))));
    registry.register(Box::new(StatsSummaryTool::new(service)));
}

/// Create a tool registry with the tools of every given domain.
pub fn default_registry(services: &[Arc<DomainService>]) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    for service in services {
        register_domain(&mut registry, Arc::clone(service));
    }
    registry
}
