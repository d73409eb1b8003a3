//! Upcoming-window tool — records dated from today through N days ahead.

use async_trait::async_trait;
use dossier_core::error::ToolError;
use dossier_core::tool::{Tool, ToolResult};
use dossier_domains::DomainService;
use std::sync::Arc;

use crate::args::{optional_int, to_tool_error, to_tool_result};

pub struct UpcomingWindowTool {
    service: Arc<DomainService>,
}

impl UpcomingWindowTool {
    pub fn new(service: Arc<DomainService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl Tool for UpcomingWindowTool {
    fn name(&self) -> &str {
        &self.service.domain().upcoming.tool.name
    }

    fn description(&self) -> &str {
        &self.service.domain().upcoming.tool.description
    }

    fn parameters_schema(&self) -> serde_json::Value {
        let default = self.service.options().default_days_ahead;
        serde_json::json!({
            "type": "object",
            "properties": {
                "days_ahead": {
                    "type": "integer",
                    "minimum": 0,
                    "description": format!("How many days ahead to look; 0 means today only (default {default})"),
                    "default": default
                }
            }
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let days_ahead = optional_int(&arguments, "days_ahead")?;
        let outcome = self
            .service
            .upcoming_window(days_ahead)
            .await
            .map_err(|e| to_tool_error(self.name(), e))?;
        Ok(to_tool_result(&self.service.domain().name, outcome))
    }
}
