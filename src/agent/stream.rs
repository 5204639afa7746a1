//! Streaming chat completion without tools.

use crate::error::{Result, VibraError};
use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
};
use async_openai::Client;
use futures::StreamExt;
use tracing::debug;

/// Send one message and hand each text delta to `on_delta` as it arrives.
///
/// Returns the full reply once the stream ends.
pub async fn stream_chat<F>(
    client: &Client<OpenAIConfig>,
    model: &str,
    system_prompt: Option<&str>,
    message: &str,
    mut on_delta: F,
) -> Result<String>
where
    F: FnMut(&str),
{
    let mut messages: Vec<ChatCompletionRequestMessage> = Vec::new();
    if let Some(prompt) = system_prompt {
        messages.push(
            ChatCompletionRequestSystemMessageArgs::default()
                .content(prompt)
                .build()
                .map_err(|e| VibraError::Agent(e.to_string()))?
                .into(),
        );
    }
    messages.push(
        ChatCompletionRequestUserMessageArgs::default()
            .content(message)
            .build()
            .map_err(|e| VibraError::Agent(e.to_string()))?
            .into(),
    );

    let request = CreateChatCompletionRequestArgs::default()
        .model(model)
        .messages(messages)
        .build()
        .map_err(|e| VibraError::Agent(e.to_string()))?;

    let mut stream = client
        .chat()
        .create_stream(request)
        .await
        .map_err(|e| VibraError::OpenAI(format!("Chat API error: {}", e)))?;

    let mut reply = String::new();
    let mut chunks = 0usize;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| VibraError::OpenAI(format!("Stream error: {}", e)))?;
        chunks += 1;
        for choice in chunk.choices {
            if let Some(delta) = choice.delta.content {
                on_delta(&delta);
                reply.push_str(&delta);
            }
        }
    }

    debug!("Stream finished after {} chunks", chunks);
    Ok(reply)
}
