//! Overdue-items tool — past-due records whose status is not terminal.

use async_trait::async_trait;
use dossier_core::error::ToolError;
use dossier_core::tool::{Tool, ToolResult};
use dossier_domains::DomainService;
use std::sync::Arc;

use crate::args::{optional_str, to_tool_error, to_tool_result};

pub struct OverdueItemsTool {
    service: Arc<DomainService>,
}

impl OverdueItemsTool {
    pub fn new(service: Arc<DomainService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl Tool for OverdueItemsTool {
    fn name(&self) -> &str {
        &self.service.domain().overdue.tool.name
    }

    fn description(&self) -> &str {
        &self.service.domain().overdue.tool.description
    }

    fn parameters_schema(&self) -> serde_json::Value {
        match &self.service.domain().overdue.assignee_field {
            Some(_) => serde_json::json!({
                "type": "object",
                "properties": {
                    "assigned_to": {
                        "type": "string",
                        "description": "Only items assigned to this person (case-insensitive)"
                    }
                }
            }),
            None => serde_json::json!({ "type": "object", "properties": {} }),
        }
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let assigned_to = optional_str(&arguments, "assigned_to")?;
        let outcome = self
            .service
            .overdue_items(assigned_to)
            .await
            .map_err(|e| to_tool_error(self.name(), e))?;
        Ok(to_tool_result(&self.service.domain().name, outcome))
    }
}
