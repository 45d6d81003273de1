use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
use common::{
    error::AppError,
    storage::{types::document_chunk::ScoredChunk, vector_store::StoreHandle},
};
use serde_json::Value;
use tracing::debug;

use crate::prompts;

/// One completed question/answer exchange, kept for follow-up questions.
#[derive(Debug, Clone)]
pub struct ChatTurn {
    pub question: String,
    pub answer: String,
}

/// Fetches the stored chunks most similar to `question`.
pub async fn retrieve_context(
    store: &StoreHandle,
    question: &str,
    top_k: usize,
) -> Result<Vec<ScoredChunk>, AppError> {
    store.similarity_search(question, top_k).await
}

/// Converts retrieval matches into the JSON context the model sees.
pub fn chunks_to_chat_context(chunks: &[ScoredChunk]) -> Value {
    fn round_distance(value: f32) -> f64 {
        (f64::from(value) * 1000.0).round() / 1000.0
    }

    serde_json::json!(chunks
        .iter()
        .map(|entry| {
            serde_json::json!({
                "source": entry.chunk.source,
                "chunk_index": entry.chunk.chunk_index,
                "content": entry.chunk.text,
                "distance": round_distance(entry.distance),
            })
        })
        .collect::<Vec<_>>())
}

/// Answers one question: retrieve context, render the system prompt, and
/// run a chat completion over the running history.
pub async fn answer_question(
    client: &Client<OpenAIConfig>,
    model: &str,
    store: &StoreHandle,
    history: &[ChatTurn],
    question: &str,
    top_k: usize,
) -> Result<String, AppError> {
    let chunks = retrieve_context(store, question, top_k).await?;
    debug!(matches = chunks.len(), "retrieved context for question");

    let system_prompt = prompts::render_system_prompt(&chunks_to_chat_context(&chunks))?;

    let mut messages: Vec<ChatCompletionRequestMessage> =
        Vec::with_capacity(history.len() * 2 + 2);
    messages.push(
        ChatCompletionRequestSystemMessageArgs::default()
            .content(system_prompt)
            .build()?
            .into(),
    );
    for turn in history {
        messages.push(
            ChatCompletionRequestUserMessageArgs::default()
                .content(turn.question.clone())
                .build()?
                .into(),
        );
        messages.push(
            ChatCompletionRequestAssistantMessageArgs::default()
                .content(turn.answer.clone())
                .build()?
                .into(),
        );
    }
    messages.push(
        ChatCompletionRequestUserMessageArgs::default()
            .content(question.to_owned())
            .build()?
            .into(),
    );

    let request = CreateChatCompletionRequestArgs::default()
        .model(model)
        .messages(messages)
        .build()?;
    let response = client.chat().create(request).await?;

    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| AppError::Processing("chat model returned no content".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::storage::types::document_chunk::DocumentChunk;

    fn scored(text: &str, source: &str, index: usize, distance: f32) -> ScoredChunk {
        ScoredChunk {
            chunk: DocumentChunk::new(text.to_string(), source.to_string(), index),
            distance,
        }
    }

    #[test]
    fn chat_context_preserves_ranking_order_and_fields() {
        let chunks = vec![
            scored("alpha text", "a.pdf", 0, 0.1234),
            scored("beta text", "b.pdf", 7, 0.5678),
        ];
        let context = chunks_to_chat_context(&chunks);

        let entries = context.as_array().expect("context is an array");
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0]["source"], "a.pdf");
        assert_eq!(entries[0]["content"], "alpha text");
        assert_eq!(entries[1]["chunk_index"], 7);
        // distances are rounded to three decimals for the prompt
        assert_eq!(entries[0]["distance"], 0.123);
        assert_eq!(entries[1]["distance"], 0.568);
    }

    #[test]
    fn empty_retrieval_produces_an_empty_context_array() {
        let context = chunks_to_chat_context(&[]);
        assert_eq!(context, serde_json::json!([]));
    }
}
