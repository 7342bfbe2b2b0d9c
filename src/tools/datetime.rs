//! Date and time tools

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Local};
use serde_json::{json, Value};

use super::{string_arg, Tool};

const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d";
const DEFAULT_TIME_FORMAT: &str = "%H:%M:%S";

/// Render `moment` with a strftime format, rejecting invalid specifiers
/// instead of panicking inside Display.
fn render(moment: DateTime<Local>, format: &str) -> Result<String, String> {
    let items: Vec<Item> = StrftimeItems::new(format).collect();
    if items.iter().any(|item| matches!(item, Item::Error)) {
        return Err(format!("invalid format string '{}'", format));
    }
    Ok(moment.format_with_items(items.into_iter()).to_string())
}

fn format_arg(args: &Value, default: &str) -> String {
    match string_arg(args, "format") {
        Some(format) if !format.trim().is_empty() => format,
        _ => default.to_string(),
    }
}

/// Returns today's date in the requested strftime format
pub struct CurrentDateTool;

impl Tool for CurrentDateTool {
    fn name(&self) -> &str {
        "get_current_date"
    }

    fn description(&self) -> &str {
        "Returns today's date in the specified strftime format. Default: %Y-%m-%d."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "format": {
                    "type": "string",
                    "description": "strftime date format, e.g. %Y-%m-%d"
                }
            }
        })
    }

    fn invoke(&self, args: Value) -> Result<String, String> {
        render(Local::now(), &format_arg(&args, DEFAULT_DATE_FORMAT))
    }
}

/// Returns the current time in the requested strftime format
pub struct CurrentTimeTool;

impl Tool for CurrentTimeTool {
    fn name(&self) -> &str {
        "get_current_time"
    }

    fn description(&self) -> &str {
        "Returns the current time in the specified strftime format. Default: %H:%M:%S."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "format": {
                    "type": "string",
                    "description": "strftime time format, e.g. %H:%M:%S"
                }
            }
        })
    }

    fn invoke(&self, args: Value) -> Result<String, String> {
        render(Local::now(), &format_arg(&args, DEFAULT_TIME_FORMAT))
    }
}
