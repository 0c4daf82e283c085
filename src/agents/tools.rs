use schemars::{gen::SchemaSettings, JsonSchema};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A tool invocation requested by the model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: Value,
}

impl ToolCall {
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }
}

/// A tool offered to the model: name, description, and a JSON schema for
/// its parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// Generate a tool declaration from a typed argument struct. Every agent
/// declares its tools through this one function so the schema shape stays
/// uniform; vendor-specific sanitization happens in the provider adapter.
pub fn declaration_for<T: JsonSchema>(name: &str, description: &str) -> ToolDefinition {
    let settings = SchemaSettings::default().with(|s| {
        s.inline_subschemas = true;
    });
    let schema = settings.into_generator().into_root_schema_for::<T>();
    let mut parameters = serde_json::to_value(schema.schema).unwrap_or_else(|_| Value::Null);
    if let Some(obj) = parameters.as_object_mut() {
        obj.remove("title");
        obj.remove("$schema");
    }
    ToolDefinition {
        name: name.to_string(),
        description: description.to_string(),
        parameters,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(JsonSchema)]
    #[allow(dead_code)]
    struct SampleArgs {
        city: String,
        max_results: Option<u32>,
    }

    #[test]
    fn declaration_has_object_schema() {
        let def = declaration_for::<SampleArgs>("Sample", "a sample tool");
        assert_eq!(def.name, "Sample");
        assert_eq!(def.parameters["type"], "object");
        assert!(def.parameters["properties"]["city"].is_object());
        assert!(def.parameters.get("title").is_none());
    }
}
