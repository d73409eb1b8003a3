//! Stats-summary tool — grouped counts, sums, rates and totals.

use async_trait::async_trait;
use dossier_core::error::ToolError;
use dossier_core::tool::{Tool, ToolResult};
use dossier_domains::DomainService;
use std::sync::Arc;

use crate::args::{to_tool_error, to_tool_result};

pub struct StatsSummaryTool {
    service: Arc<DomainService>,
}

impl StatsSummaryTool {
    pub fn new(service: Arc<DomainService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl Tool for StatsSummaryTool {
    fn name(&self) -> &str {
        &self.service.domain().stats.tool.name
    }

    fn description(&self) -> &str {
        &self.service.domain().stats.tool.description
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({ "type": "object", "properties": {} })
    }

    async fn execute(&self, _arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let outcome = self
            .service
            .stats_summary()
            .await
            .map_err(|e| to_tool_error(self.name(), e))?;
        Ok(to_tool_result(&self.service.domain().name, outcome))
    }
}
