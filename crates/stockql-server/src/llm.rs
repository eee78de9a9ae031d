//! Interpreter: natural language to stockql IR through a chat completion model

use std::sync::Arc;

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs, ResponseFormat,
    },
    Client,
};
use async_trait::async_trait;
use stockql_ir::{Field, Operator, QueryIr, DEFAULT_LIMIT, MAX_LIMIT};
use thiserror::Error;

use crate::config::{Config, ConfigError, LlmConfig};

#[derive(Debug, Error)]
pub enum InterpretError {
    /// The model answered, but not with a JSON object
    #[error("Failed to parse LLM response as JSON: {0}")]
    Interpretation(String),

    /// The completion service itself failed (network, auth, quota)
    #[error("LLM request failed: {0}")]
    Upstream(String),
}

impl From<OpenAIError> for InterpretError {
    fn from(e: OpenAIError) -> Self {
        InterpretError::Upstream(e.to_string())
    }
}

const PREAMBLE: &str = "You are a query parser for a stock database.
Parse the user's natural language query into a structured JSON format.";

const OUTPUT_SHAPE: &str = r#"Output format:
{
  "filters": [{"field": <field>, "operator": <operator>, "value": <string | number | array>}],
  "order_by": {"field": <field>, "direction": "asc" | "desc"},
  "limit": <integer>
}
All keys are optional."#;

const EXAMPLES: &str = r#"Examples:
- "Show me stocks with price above $100" -> {"filters": [{"field": "price", "operator": "gt", "value": 100}]}
- "Find tech stocks" -> {"filters": [{"field": "sector", "operator": "eq", "value": "Technology"}]}
- "Get stocks where volume is above 1 million and price is between $50 and $200" ->
  {"filters": [{"field": "volume", "operator": "gt", "value": 1000000},
               {"field": "price", "operator": "between", "value": [50, 200]}]}
- "Top 5 companies by market cap" -> {"order_by": {"field": "market_cap", "direction": "desc"}, "limit": 5}

Return ONLY valid JSON, no additional text."#;

/// Instruction sent with every request, generated from the field catalog
pub fn system_prompt() -> String {
    let fields: Vec<String> = Field::ALL
        .iter()
        .map(|f| format!("- {}: {} ({})", f.name(), f.description(), f.kind().as_str()))
        .collect();
    let operators: Vec<String> = Operator::ALL
        .iter()
        .map(|op| format!("- {}: {}", op.name(), op.description()))
        .collect();

    format!(
        "{}\n\nAvailable fields:\n{}\n\nAvailable operators:\n{}\n\n{}\n\
         limit is between 1 and {} (default {}).\n\n{}",
        PREAMBLE,
        fields.join("\n"),
        operators.join("\n"),
        OUTPUT_SHAPE,
        MAX_LIMIT,
        DEFAULT_LIMIT,
        EXAMPLES
    )
}

/// Text completion backend
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Complete `user` under `system`, returning the raw model text
    async fn complete(&self, system: &str, user: &str) -> Result<String, InterpretError>;
}

/// OpenAI-compatible chat completions (OpenAI, Groq, ...)
pub struct OpenAiCompletion {
    client: Client<OpenAIConfig>,
    model: String,
    temperature: f32,
}

impl OpenAiCompletion {
    pub fn new(api_key: String, config: &LlmConfig) -> Self {
        let mut openai_config = OpenAIConfig::new().with_api_key(api_key);
        if let Some(base) = &config.api_base {
            openai_config = openai_config.with_api_base(base);
        }

        Self {
            client: Client::with_config(openai_config),
            model: config.model.clone(),
            temperature: config.temperature,
        }
    }
}

#[async_trait]
impl CompletionService for OpenAiCompletion {
    async fn complete(&self, system: &str, user: &str) -> Result<String, InterpretError> {
        let messages = vec![
            ChatCompletionRequestMessage::System(
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(system)
                    .build()?,
            ),
            ChatCompletionRequestMessage::User(
                ChatCompletionRequestUserMessageArgs::default()
                    .content(user)
                    .build()?,
            ),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(self.model.as_str())
            .messages(messages)
            .temperature(self.temperature)
            .response_format(ResponseFormat::JsonObject)
            .build()?;

        let response = self.client.chat().create(request).await?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| InterpretError::Upstream("No response content from model".to_string()))
    }
}

/// Turns user text into a normalized [`QueryIr`]
pub struct Interpreter {
    service: Arc<dyn CompletionService>,
    system_prompt: String,
}

impl Interpreter {
    pub fn new(service: Arc<dyn CompletionService>) -> Self {
        Self {
            service,
            system_prompt: system_prompt(),
        }
    }

    /// OpenAI-backed interpreter; fails when `OPENAI_API_KEY` is not set
    pub fn from_config(config: &LlmConfig) -> Result<Self, ConfigError> {
        let api_key = Config::get_openai_api_key()?;
        tracing::info!(model = %config.model, api_base = ?config.api_base, "completion service configured");
        Ok(Self::new(Arc::new(OpenAiCompletion::new(api_key, config))))
    }

    pub async fn interpret(&self, text: &str) -> Result<QueryIr, InterpretError> {
        let content = self.service.complete(&self.system_prompt, text).await?;
        tracing::debug!(response = %content, "model response");
        parse_response(&content)
    }
}

/// Parse model output and normalize it. Field and operator names are not
/// validated here.
pub fn parse_response(content: &str) -> Result<QueryIr, InterpretError> {
    let value: serde_json::Value = serde_json::from_str(content)
        .map_err(|e| InterpretError::Interpretation(e.to_string()))?;

    if !value.is_object() {
        return Err(InterpretError::Interpretation(format!(
            "expected a JSON object, got: {}",
            content
        )));
    }

    Ok(QueryIr::from_json(&value))
}
