//! Response schemas handed to the gateway for structured output.

use serde_json::{json, Value};

pub fn palette_entry_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "type": {
                "type": "STRING",
                "format": "enum",
                "enum": ["Primary", "Secondary", "Accent"]
            },
            "name": { "type": "STRING" },
            "hex": { "type": "STRING" }
        },
        "required": ["type", "name", "hex"]
    })
}

pub fn concept_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "conceptName": { "type": "STRING" },
            "visualDescription": { "type": "STRING" },
            "meaning": { "type": "STRING" },
            "colorPalette": {
                "type": "ARRAY",
                "items": palette_entry_schema()
            }
        },
        "required": ["conceptName", "visualDescription", "meaning", "colorPalette"]
    })
}

pub fn concept_list_schema() -> Value {
    json!({
        "type": "ARRAY",
        "items": concept_schema()
    })
}
