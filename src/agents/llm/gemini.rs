//! Google Gemini provider over the generativelanguage REST API.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{LlmProvider, ModelTurn};
use crate::agents::conversation::{Message, Role};
use crate::agents::error::{LlmError, LlmResult};
use crate::agents::tools::{ToolCall, ToolDefinition};
use crate::config::LlmSettings;

pub struct GeminiProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    temperature: Option<f32>,
    max_output_tokens: Option<u32>,
}

impl GeminiProvider {
    pub fn new(settings: &LlmSettings, api_key: String) -> Self {
        let base_url = settings
            .base_url
            .clone()
            .unwrap_or_else(|| "https://generativelanguage.googleapis.com/v1beta".to_string());
        Self {
            client: reqwest::Client::new(),
            api_key,
            base_url,
            model: settings.model.clone(),
            temperature: settings.temperature,
            max_output_tokens: settings.max_output_tokens,
        }
    }

    fn build_request_body(&self, messages: &[Message], tools: &[ToolDefinition]) -> Value {
        let (contents, system_instruction) = convert_messages(messages);

        let mut body = json!({ "contents": contents });

        if let Some(sys) = system_instruction {
            body["systemInstruction"] = json!({ "parts": [{ "text": sys }] });
        }

        let mut generation_config = json!({});
        if let Some(temp) = self.temperature {
            generation_config["temperature"] = json!(temp);
        }
        if let Some(max) = self.max_output_tokens {
            generation_config["maxOutputTokens"] = json!(max);
        }
        if generation_config.as_object().is_some_and(|o| !o.is_empty()) {
            body["generationConfig"] = generation_config;
        }

        if !tools.is_empty() {
            body["tools"] = json!([{
                "function_declarations": tools.iter().map(|t| {
                    json!({
                        "name": t.name,
                        "description": t.description,
                        "parameters": sanitize_schema(t.parameters.clone()),
                    })
                }).collect::<Vec<_>>()
            }]);
        }

        body
    }
}

/// Convert neutral history into Gemini contents, pulling the system
/// message out into systemInstruction.
fn convert_messages(messages: &[Message]) -> (Vec<Value>, Option<String>) {
    let mut contents = Vec::new();
    let mut system_instruction: Option<String> = None;

    for m in messages {
        match m.role {
            Role::System => {
                system_instruction = Some(m.content.clone());
            }
            Role::User => {
                contents.push(json!({
                    "role": "user",
                    "parts": [{ "text": m.content }]
                }));
            }
            Role::Assistant => {
                let mut parts = Vec::new();
                if !m.content.is_empty() {
                    parts.push(json!({ "text": m.content }));
                }
                if let Some(tool_calls) = &m.tool_calls {
                    for tc in tool_calls {
                        parts.push(json!({
                            "functionCall": { "name": tc.name, "args": tc.arguments }
                        }));
                    }
                }
                if !parts.is_empty() {
                    contents.push(json!({ "role": "model", "parts": parts }));
                }
            }
            Role::Tool => {
                let tool_name = m.name.clone().unwrap_or_else(|| "tool".to_string());
                let response_value: Value = serde_json::from_str(&m.content)
                    .unwrap_or_else(|_| json!({ "result": m.content }));
                contents.push(json!({
                    "role": "user",
                    "parts": [{
                        "functionResponse": {
                            "name": tool_name,
                            "response": response_value
                        }
                    }]
                }));
            }
        }
    }

    (contents, system_instruction)
}

/// Gemini's function-declaration schema dialect is stricter than draft-07:
/// uppercase type names, no anyOf, no defaults or formats.
fn sanitize_schema(mut schema: Value) -> Value {
    sanitize_in_place(&mut schema);
    schema
}

fn sanitize_in_place(value: &mut Value) {
    if let Some(obj) = value.as_object_mut() {
        obj.remove("title");
        obj.remove("default");
        obj.remove("format");
        obj.remove("$schema");

        // Optional fields come through as anyOf [T, null]; take the typed arm
        if let Some(any_of) = obj.remove("anyOf") {
            if let Some(arms) = any_of.as_array() {
                if let Some(typed) = arms
                    .iter()
                    .find(|arm| arm.get("type").and_then(Value::as_str) != Some("null"))
                {
                    let mut typed = typed.clone();
                    sanitize_in_place(&mut typed);
                    if let Some(src) = typed.as_object() {
                        for (k, v) in src {
                            obj.entry(k.clone()).or_insert_with(|| v.clone());
                        }
                    }
                }
            }
        }

        if let Some(ty) = obj.get_mut("type") {
            if let Some(name) = ty.as_str() {
                *ty = json!(name.to_uppercase());
            } else if let Some(arr) = ty.as_array() {
                // ["string", "null"] style nullables collapse to the typed arm
                if let Some(name) = arr
                    .iter()
                    .filter_map(Value::as_str)
                    .find(|name| *name != "null")
                {
                    *ty = json!(name.to_uppercase());
                }
            }
        }

        for (_, child) in obj.iter_mut() {
            sanitize_in_place(child);
        }
    } else if let Some(arr) = value.as_array_mut() {
        for child in arr {
            sanitize_in_place(child);
        }
    }
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn converse(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
    ) -> LlmResult<ModelTurn> {
        let body = self.build_request_body(messages, tools);
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                message: error_text,
            });
        }

        let gemini_response: GeminiResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Parse(format!("failed to parse response: {e}")))?;

        parse_turn(&gemini_response)
    }
}

fn parse_turn(response: &GeminiResponse) -> LlmResult<ModelTurn> {
    let candidate = response
        .candidates
        .first()
        .ok_or_else(|| LlmError::Parse("no candidates in response".to_string()))?;

    let mut turn = ModelTurn::default();
    if let Some(parts) = &candidate.content.parts {
        for (index, part) in parts.iter().enumerate() {
            if let Some(text) = &part.text {
                turn.text.push_str(text);
            }
            if let Some(fc) = &part.function_call {
                turn.tool_calls.push(ToolCall::new(
                    format!("call_{index}"),
                    fc.name.clone(),
                    fc.args.clone().unwrap_or(Value::Object(Default::default())),
                ));
            }
        }
    }
    Ok(turn)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: GeminiContent,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiContent {
    parts: Option<Vec<GeminiPart>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPart {
    text: Option<String>,
    function_call: Option<GeminiFunctionCall>,
}

#[derive(Debug, Deserialize)]
struct GeminiFunctionCall {
    name: String,
    args: Option<Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_message_becomes_system_instruction() {
        let messages = vec![Message::system("be brief"), Message::user("hi")];
        let (contents, sys) = convert_messages(&messages);
        assert_eq!(sys.as_deref(), Some("be brief"));
        assert_eq!(contents.len(), 1);
        assert_eq!(contents[0]["role"], "user");
    }

    #[test]
    fn tool_results_become_function_responses() {
        let messages = vec![Message::tool_result(
            "call_0",
            "SearchFlights",
            &json!({"success": true}),
        )];
        let (contents, _) = convert_messages(&messages);
        assert_eq!(
            contents[0]["parts"][0]["functionResponse"]["name"],
            "SearchFlights"
        );
        assert_eq!(
            contents[0]["parts"][0]["functionResponse"]["response"]["success"],
            true
        );
    }

    #[test]
    fn sanitize_uppercases_types_and_resolves_nullables() {
        let schema = json!({
            "type": "object",
            "title": "Args",
            "properties": {
                "city": { "type": "string" },
                "limit": { "type": ["integer", "null"], "format": "uint32" }
            }
        });
        let clean = sanitize_schema(schema);
        assert_eq!(clean["type"], "OBJECT");
        assert!(clean.get("title").is_none());
        assert_eq!(clean["properties"]["city"]["type"], "STRING");
        assert_eq!(clean["properties"]["limit"]["type"], "INTEGER");
        assert!(clean["properties"]["limit"].get("format").is_none());
    }

    #[test]
    fn parses_mixed_text_and_function_call() {
        let response: GeminiResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": {
                    "parts": [
                        { "text": "Searching now." },
                        { "functionCall": { "name": "SearchFlights", "args": { "origin": "JFK" } } }
                    ]
                }
            }]
        }))
        .unwrap();
        let turn = parse_turn(&response).unwrap();
        assert_eq!(turn.text, "Searching now.");
        assert_eq!(turn.tool_calls.len(), 1);
        assert_eq!(turn.tool_calls[0].name, "SearchFlights");
    }
}
