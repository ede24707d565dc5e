//! The language-model boundary of a prioritization cycle

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::llm::{CompletionRequest, LlmClient, LlmError, Message, StopReason};
use crate::prompts::PromptLoader;

use super::request::PrioritizationRequest;

/// Name of the prompt template used for prioritization
pub const PRIORITIZE_TEMPLATE: &str = "prioritize";

/// Turns a request into the model's raw text answer
///
/// Implementations make one attempt per call; validation of the answer
/// happens in `parse_result`.
#[async_trait]
pub trait PriorityModel: Send + Sync {
    async fn invoke(&self, request: &PrioritizationRequest) -> Result<String, LlmError>;
}

/// PriorityModel backed by an LLM client and the `prioritize` prompt
pub struct LlmPriorityModel {
    client: Arc<dyn LlmClient>,
    prompts: PromptLoader,
    max_tokens: u32,
}

impl LlmPriorityModel {
    pub fn new(client: Arc<dyn LlmClient>, prompts: PromptLoader, max_tokens: u32) -> Self {
        Self {
            client,
            prompts,
            max_tokens,
        }
    }

    fn completion_request(&self, request: &PrioritizationRequest) -> Result<CompletionRequest, LlmError> {
        let system_prompt = self
            .prompts
            .render(PRIORITIZE_TEMPLATE, request)
            .map_err(|e| LlmError::Config(e.to_string()))?;
        let payload = serde_json::to_string_pretty(request)?;

        Ok(CompletionRequest {
            system_prompt,
            messages: vec![Message::user(payload)],
            max_tokens: self.max_tokens,
            json_output: true,
        })
    }
}

#[async_trait]
impl PriorityModel for LlmPriorityModel {
    async fn invoke(&self, request: &PrioritizationRequest) -> Result<String, LlmError> {
        debug!(task_count = request.tasks.len(), "LlmPriorityModel::invoke: called");
        let completion = self.completion_request(request)?;
        let response = self.client.complete(completion).await?;

        if response.stop_reason == StopReason::MaxTokens {
            warn!(
                max_tokens = self.max_tokens,
                "LlmPriorityModel::invoke: response truncated at max tokens"
            );
        }
        debug!(
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            "LlmPriorityModel::invoke: response received"
        );

        Ok(response.content.unwrap_or_default())
    }
}
