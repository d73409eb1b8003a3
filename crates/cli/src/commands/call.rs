//! `dossier call` — Invoke a tool the way a tool-calling client would.

use super::runtime::Runtime;
use dossier_core::tool::ToolCall;
use dossier_core::ToolError;
use tracing::debug;

pub async fn run(
    now: Option<&str>,
    tool: &str,
    args: &str,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let arguments: serde_json::Value =
        serde_json::from_str(args).map_err(|e| format!("--args is not valid JSON: {e}"))?;
    if !arguments.is_object() {
        return Err("--args must be a JSON object".into());
    }

    let runtime = Runtime::build(now)?;
    let registry = runtime.registry();
    let call = ToolCall {
        id: format!("call_{}", uuid::Uuid::new_v4().simple()),
        name: tool.to_string(),
        arguments,
    };
    debug!(id = %call.id, tool = %call.name, "Executing tool call");

    match registry.execute(&call).await {
        Ok(result) if json => println!("{}", serde_json::to_string_pretty(&result)?),
        Ok(result) => println!("{}", result.output),
        Err(ToolError::NotFound(name)) => {
            return Err(format!(
                "Unknown tool '{name}' (available: {})",
                registry.names().join(", ")
            )
            .into());
        }
        Err(e) => return Err(e.into()),
    }
    Ok(())
}
