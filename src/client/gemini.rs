use super::model::{ChatModel, FunctionCall, Part, Reply};
use super::session::Turn;

use anyhow::{Context, Result};
use async_openai::Client;
use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionMessageToolCall, ChatCompletionRequestAssistantMessage,
    ChatCompletionRequestAssistantMessageContent, ChatCompletionRequestMessage,
    ChatCompletionRequestToolMessage, ChatCompletionRequestToolMessageContent,
    ChatCompletionRequestUserMessage, ChatCompletionRequestUserMessageContent,
    ChatCompletionResponseMessage, ChatCompletionTool, ChatCompletionToolType,
    CreateChatCompletionRequestArgs, CreateChatCompletionResponse,
    FunctionCall as OpenAIFunctionCall,
};
use async_trait::async_trait;
use serde_json::{Value, json};

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/openai";
pub const DEFAULT_MODEL: &str = "gemini-1.5-pro";

/// Gemini, spoken to through its OpenAI-compatible chat completions API.
pub struct GeminiModel {
    inner: Client<OpenAIConfig>,
    model: String,
    tools: Vec<ChatCompletionTool>,
}

impl GeminiModel {
    pub fn new(api_key: &str, api_base: &str, model: &str, tools: Vec<ChatCompletionTool>) -> Self {
        let config = OpenAIConfig::new()
            .with_api_base(api_base)
            .with_api_key(api_key);
        GeminiModel {
            inner: Client::with_config(config),
            model: model.to_string(),
            tools,
        }
    }
}

#[async_trait]
impl ChatModel for GeminiModel {
    async fn generate(&self, turns: &[Turn]) -> Result<Reply> {
        let mut args = CreateChatCompletionRequestArgs::default();
        args.model(self.model.as_str())
            .messages(chat_completion_messages(turns))
            .n(1);
        if !self.tools.is_empty() {
            args.tools(self.tools.clone());
        }
        let request = args.build().context("building chat completion request")?;

        let response = self
            .inner
            .chat()
            .create(request)
            .await
            .context("model request failed")?;
        Ok(reply_from_response(response))
    }
}

pub fn chat_completion_messages(turns: &[Turn]) -> Vec<ChatCompletionRequestMessage> {
    turns.iter().map(chat_completion_message).collect()
}

fn chat_completion_message(turn: &Turn) -> ChatCompletionRequestMessage {
    match turn {
        Turn::User(text) => ChatCompletionRequestMessage::User(ChatCompletionRequestUserMessage {
            content: ChatCompletionRequestUserMessageContent::Text(text.clone()),
            name: None,
        }),
        Turn::Model(reply) => {
            let text = reply.text();
            let tool_calls: Vec<_> = reply
                .function_calls()
                .map(|call| ChatCompletionMessageToolCall {
                    id: call.id.clone(),
                    r#type: ChatCompletionToolType::Function,
                    function: OpenAIFunctionCall {
                        name: call.name.clone(),
                        arguments: call.args.to_string(),
                    },
                })
                .collect();
            ChatCompletionRequestMessage::Assistant(ChatCompletionRequestAssistantMessage {
                content: if text.is_empty() {
                    None
                } else {
                    Some(ChatCompletionRequestAssistantMessageContent::Text(text))
                },
                tool_calls: if tool_calls.is_empty() {
                    None
                } else {
                    Some(tool_calls)
                },
                ..Default::default()
            })
        }
        Turn::FunctionResult {
            call_id,
            name,
            response,
        } => ChatCompletionRequestMessage::Tool(ChatCompletionRequestToolMessage {
            content: ChatCompletionRequestToolMessageContent::Text(
                json!({ "name": name, "response": response }).to_string(),
            ),
            tool_call_id: call_id.clone(),
        }),
    }
}

pub fn reply_from_response(response: CreateChatCompletionResponse) -> Reply {
    match response.choices.into_iter().next() {
        Some(choice) => reply_from_message(choice.message),
        None => Reply::default(),
    }
}

fn reply_from_message(message: ChatCompletionResponseMessage) -> Reply {
    let mut parts = vec![];
    if let Some(text) = message.content.filter(|text| !text.is_empty()) {
        parts.push(Part::Text(text));
    }
    for call in message.tool_calls.unwrap_or_default() {
        // keep undecodable arguments verbatim, the tool rejects them as malformed
        let args = serde_json::from_str(&call.function.arguments)
            .unwrap_or(Value::String(call.function.arguments));
        parts.push(Part::FunctionCall(FunctionCall {
            id: call.id,
            name: call.function.name,
            args,
        }));
    }
    Reply { parts }
}
