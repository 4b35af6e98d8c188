use super::{
    ChatMessage, Completion, CompletionTransport, FragmentStream, LlmError, OpenAiTransport,
};
use crate::config::{LlmConfig, RetryPolicy};
use futures::{future, StreamExt};
use tracing::error;

/// Chat client that assembles streamed fragments into one answer and retries
/// when an attempt yields nothing.
pub struct ChatClient<T = OpenAiTransport> {
    transport: T,
    retry: RetryPolicy,
}

impl ChatClient<OpenAiTransport> {
    pub fn new(config: LlmConfig) -> Result<Self, LlmError> {
        let transport = OpenAiTransport::new(&config)?;
        Ok(Self::with_transport(transport, config.retry))
    }
}

impl<T: CompletionTransport> ChatClient<T> {
    pub fn with_transport(transport: T, retry: RetryPolicy) -> Self {
        Self { transport, retry }
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Issue one streaming request. Only non-empty fragments are yielded;
    /// the stream ends when the server closes it.
    pub async fn stream_completion(
        &self,
        messages: &[ChatMessage],
    ) -> Result<FragmentStream, LlmError> {
        let fragments = self.transport.open_stream(messages).await?;
        Ok(fragments
            .filter(|fragment| future::ready(!fragment.is_empty()))
            .boxed())
    }

    /// Drain one streaming attempt. Failures and silence both come back empty.
    async fn attempt(&self, messages: &[ChatMessage]) -> String {
        match self.stream_completion(messages).await {
            Ok(fragments) => fragments.collect::<Vec<_>>().await.concat(),
            Err(e) => {
                error!(error = %e, "LLM chat request failed");
                String::new()
            }
        }
    }

    pub async fn complete(&self, messages: &[ChatMessage]) -> Completion {
        let mut retry = 0;
        loop {
            let text = self.attempt(messages).await;
            if !text.is_empty() {
                return Completion::Text(text);
            }

            retry += 1;
            error!(retry, "LLM chat error, retrying");
            if retry > self.retry.max_retries {
                error!(
                    "LLM chat error, retry {} times, exit",
                    self.retry.max_retries
                );
                return Completion::ExhaustedRetries {
                    retries: self.retry.max_retries,
                };
            }
            tokio::time::sleep(self.retry.delay()).await;
        }
    }

    /// [`Self::complete`] with exhaustion folded into the failure message.
    pub async fn complete_text(&self, messages: &[ChatMessage]) -> String {
        self.complete(messages).await.into_legacy_string()
    }
}
