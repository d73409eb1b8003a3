//! Search tool — free text plus optional filters over a domain's main
//! collection (cases, customers, patients).

use async_trait::async_trait;
use dossier_core::error::ToolError;
use dossier_core::tool::{Tool, ToolResult};
use dossier_domains::DomainService;
use std::sync::Arc;
use tracing::debug;

use crate::args::{parse_query, to_tool_error, to_tool_result};

pub struct SearchTool {
    service: Arc<DomainService>,
}

impl SearchTool {
    pub fn new(service: Arc<DomainService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl Tool for SearchTool {
    fn name(&self) -> &str {
        &self.service.domain().search.tool.name
    }

    fn description(&self) -> &str {
        &self.service.domain().search.tool.description
    }

    fn parameters_schema(&self) -> serde_json::Value {
        let domain = self.service.domain();
        let filterable: Vec<&str> = domain
            .schema(&domain.search.collection)
            .map(|s| s.filterable.iter().map(String::as_str).collect())
            .unwrap_or_default();
        let filter_properties: serde_json::Map<String, serde_json::Value> = filterable
            .iter()
            .map(|field| {
                (
                    field.to_string(),
                    serde_json::json!({
                        "oneOf": [
                            { "type": "string" },
                            { "type": "array", "items": { "type": "string" } }
                        ],
                        "description": format!("Exact {field} (case-insensitive), or a list of accepted values")
                    }),
                )
            })
            .collect();

        serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Text to look for; an empty string matches everything"
                },
                "filters": {
                    "type": "object",
                    "description": "Optional exact-match filters",
                    "properties": filter_properties,
                    "additionalProperties": false
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let query = parse_query(&arguments)?;
        debug!(tool = self.name(), text = %query.text, filters = query.filters.len(), "Executing search");

        let outcome = self
            .service
            .search(&query)
            .await
            .map_err(|e| to_tool_error(self.name(), e))?;
        Ok(to_tool_result(&self.service.domain().name, outcome))
    }
}
