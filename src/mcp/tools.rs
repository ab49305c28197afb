//! MCP tool definitions and dispatch.
//!
//! Each tool maps to a read-only `StoryForge` query. Definitions carry JSON
//! Schema input descriptions so clients can discover them.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::errors::{Result, StoryForgeError};
use crate::storyforge::StoryForge;

/// A tool definition exposed by the MCP server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Unique tool name.
    pub name: String,
    /// Human-readable description of what the tool does.
    pub description: String,
    /// JSON Schema describing the tool's input parameters.
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

fn block_schema(category_hint: &str, block_hint: &str) -> Value {
    json!({
        "type": "object",
        "properties": {
            "category": { "type": "string", "description": category_hint },
            "block": { "type": "string", "description": block_hint }
        },
        "required": ["category", "block"]
    })
}

/// Returns the list of all tool definitions exposed by this MCP server.
pub fn get_tool_definitions() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition {
            name: "storyforge_resolve".to_string(),
            description: "Resolve one reference such as [alice], [character:alice], [alice:summary] or [character:alice:summary] to the selected output it names.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "reference": {
                        "type": "string",
                        "description": "Reference token, with or without brackets"
                    }
                },
                "required": ["reference"]
            }),
        },
        ToolDefinition {
            name: "storyforge_expand".to_string(),
            description: "Replace every resolvable [reference] in a text with its content. Unresolved references are kept as written.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "text": {
                        "type": "string",
                        "description": "Text containing bracketed references"
                    }
                },
                "required": ["text"]
            }),
        },
        ToolDefinition {
            name: "storyforge_references_in".to_string(),
            description: "List the distinct references a block's stage inputs cite.".to_string(),
            input_schema: block_schema("Category of the citing block", "Name of the citing block"),
        },
        ToolDefinition {
            name: "storyforge_references_to".to_string(),
            description: "List the stages (category, block, stage) whose input cites the given block.".to_string(),
            input_schema: block_schema("Category of the cited block", "Name of the cited block"),
        },
        ToolDefinition {
            name: "storyforge_unresolved".to_string(),
            description: "List the references a block cites that do not resolve (missing, ambiguous or unselected).".to_string(),
            input_schema: block_schema("Category of the block", "Name of the block"),
        },
        ToolDefinition {
            name: "storyforge_block".to_string(),
            description: "Show a block's stages, selected outputs and reference metrics.".to_string(),
            input_schema: block_schema("Category of the block", "Name of the block"),
        },
        ToolDefinition {
            name: "storyforge_status".to_string(),
            description: "Return aggregate statistics about the project (categories, blocks, stages, versions, references).".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {}
            }),
        },
    ]
}

/// Dispatches a tool call to the appropriate handler.
///
/// `server_stats` is merged into the `storyforge_status` output when given.
pub fn handle_tool_call(
    sf: &StoryForge,
    tool_name: &str,
    args: Value,
    server_stats: Option<Value>,
) -> Result<Value> {
    let max_chars = sf.get_config().max_response_chars;
    let output = match tool_name {
        "storyforge_resolve" => handle_resolve(sf, &args)?,
        "storyforge_expand" => sf.expand(required_str(&args, "text")?),
        "storyforge_references_in" => handle_references_in(sf, &args)?,
        "storyforge_references_to" => handle_references_to(sf, &args)?,
        "storyforge_unresolved" => handle_unresolved(sf, &args)?,
        "storyforge_block" => handle_block(sf, &args)?,
        "storyforge_status" => handle_status(sf, server_stats)?,
        _ => {
            return Err(StoryForgeError::Tool {
                message: format!("unknown tool: {}", tool_name),
            })
        }
    };

    Ok(text_content(&output, max_chars))
}

/// Wraps text in an MCP content envelope, truncating to `max_chars`.
pub fn text_content(text: &str, max_chars: usize) -> Value {
    json!({
        "content": [{ "type": "text", "text": truncate_response(text, max_chars) }]
    })
}

/// Truncates a string to at most `max_chars` characters, appending a
/// truncation notice if anything was cut.
pub fn truncate_response(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        None => s.to_string(),
        Some((end, _)) => format!("{}\n\n[... truncated at {} chars]", &s[..end], max_chars),
    }
}

fn required_str<'v>(args: &'v Value, name: &str) -> Result<&'v str> {
    args.get(name)
        .and_then(|v| v.as_str())
        .ok_or_else(|| StoryForgeError::Tool {
            message: format!("missing required parameter: {}", name),
        })
}

fn block_args(args: &Value) -> Result<(&str, &str)> {
    Ok((required_str(args, "category")?, required_str(args, "block")?))
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_default()
}

fn handle_resolve(sf: &StoryForge, args: &Value) -> Result<String> {
    let reference = required_str(args, "reference")?;
    Ok(match sf.resolve(reference) {
        Some(content) => content,
        None => format!("Unresolved reference: {}", reference),
    })
}

fn handle_references_in(sf: &StoryForge, args: &Value) -> Result<String> {
    let (category, block) = block_args(args)?;
    let refs = sf.references_in(category, block);
    Ok(pretty(&json!({
        "category": category,
        "block": block,
        "references": refs,
    })))
}

fn handle_references_to(sf: &StoryForge, args: &Value) -> Result<String> {
    let (category, block) = block_args(args)?;
    let refs = sf.references_to(category, block);
    Ok(pretty(&json!({
        "category": category,
        "block": block,
        "referenced_by": refs,
    })))
}

fn handle_unresolved(sf: &StoryForge, args: &Value) -> Result<String> {
    let (category, block) = block_args(args)?;
    let unresolved = sf.unresolved_references_in(category, block);
    Ok(pretty(&json!({
        "category": category,
        "block": block,
        "unresolved": unresolved,
    })))
}

fn handle_block(sf: &StoryForge, args: &Value) -> Result<String> {
    let (category, block) = block_args(args)?;
    let Some(block_data) = sf.project().get_block(category, block) else {
        return Ok(format!("Block not found: {}:{}", category, block));
    };

    let stages: Vec<Value> = block_data
        .stages
        .iter()
        .map(|(name, stage)| {
            json!({
                "name": name,
                "input": stage.input,
                "selected": stage.selected,
                "versions": stage.output.keys().collect::<Vec<_>>(),
                "selected_output": stage.selected_output(),
            })
        })
        .collect();
    let metrics = sf.block_metrics(category, block);

    Ok(pretty(&json!({
        "category": category,
        "block": block,
        "stages": stages,
        "metrics": {
            "stage_count": metrics.stage_count,
            "outgoing_references": metrics.outgoing_reference_count,
            "unresolved_references": metrics.unresolved_reference_count,
            "incoming_references": metrics.incoming_reference_count,
        },
    })))
}

fn handle_status(sf: &StoryForge, server_stats: Option<Value>) -> Result<String> {
    let mut output = serde_json::to_value(sf.get_stats())?;
    output["title"] = json!(sf.project().title());
    if let Some(stats) = server_stats {
        output["server"] = stats;
    }
    Ok(pretty(&output))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_definitions_complete() {
        let tools = get_tool_definitions();
        assert_eq!(tools.len(), 7);

        let tool_names: Vec<&str> = tools.iter().map(|t| t.name.as_str()).collect();
        for expected in [
            "storyforge_resolve",
            "storyforge_expand",
            "storyforge_references_in",
            "storyforge_references_to",
            "storyforge_unresolved",
            "storyforge_block",
            "storyforge_status",
        ] {
            assert!(tool_names.contains(&expected), "missing tool {expected}");
        }
    }

    #[test]
    fn test_tool_definitions_have_object_schemas() {
        for tool in get_tool_definitions() {
            assert!(!tool.description.is_empty());
            assert_eq!(tool.input_schema["type"], "object");
        }
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        let text = "é".repeat(10);
        let result = truncate_response(&text, 5);
        assert!(result.starts_with("ééééé\n\n"));
        assert!(result.contains("[... truncated at 5 chars]"));
        assert_eq!(truncate_response(&text, 10), text);
    }

    #[test]
    fn test_truncate_short_response_untouched() {
        assert_eq!(truncate_response("hello", 100), "hello");
    }

    #[test]
    fn test_required_str_reports_missing_parameter() {
        let err = required_str(&json!({}), "reference").unwrap_err();
        assert!(err.to_string().contains("missing required parameter: reference"));
    }
}
