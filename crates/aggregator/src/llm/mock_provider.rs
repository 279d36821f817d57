use crate::adapters::ModelReport;
use crate::llm::provider::{LlmError, LlmProvider, LlmRequest, LlmResponse, TokenUsage};
use async_trait::async_trait;
use std::collections::HashMap;

/// Test double for the LLM seam. Responses are canned `ModelReport`s keyed
/// by prompt substring, serialized with a prose wrapper so the extractor is
/// exercised the way a real response would.
pub struct MockProvider {
    responses: HashMap<String, ModelReport>,
    default_response: ModelReport,
    call_count: std::sync::atomic::AtomicUsize,
    should_fail: bool,
    raw_response: Option<String>,
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockProvider {
    pub fn new() -> Self {
        Self {
            responses: HashMap::new(),
            default_response: ModelReport::default(),
            call_count: std::sync::atomic::AtomicUsize::new(0),
            should_fail: false,
            raw_response: None,
        }
    }

    pub fn failing() -> Self {
        let mut provider = Self::new();
        provider.should_fail = true;
        provider
    }

    /// Returns `text` verbatim for every request, bypassing serialization.
    /// Lets tests drive the extractor with refusals and malformed output.
    pub fn with_raw_response(mut self, text: impl Into<String>) -> Self {
        self.raw_response = Some(text.into());
        self
    }

    pub fn with_response(mut self, pattern: &str, response: ModelReport) -> Self {
        self.responses.insert(pattern.to_string(), response);
        self
    }

    pub fn with_default_response(mut self, response: ModelReport) -> Self {
        self.default_response = response;
        self
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(std::sync::atomic::Ordering::SeqCst)
    }

    fn generate_content(&self, request: &LlmRequest) -> Result<String, LlmError> {
        if let Some(ref raw) = self.raw_response {
            return Ok(raw.clone());
        }

        let combined = format!("{} {}", request.system_prompt, request.user_prompt);
        let report = self
            .responses
            .iter()
            .find(|(pattern, _)| combined.contains(pattern.as_str()))
            .map(|(_, report)| report)
            .unwrap_or(&self.default_response);

        let json = serde_json::to_string(report)
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;
        Ok(format!("Here is the security analysis:\n\n{json}"))
    }
}

#[async_trait]
impl LlmProvider for MockProvider {
    async fn complete(&self, request: LlmRequest) -> Result<LlmResponse, LlmError> {
        self.call_count
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);

        if self.should_fail {
            return Err(LlmError::ApiError(
                "Mock provider configured to fail".to_string(),
            ));
        }

        tokio::time::sleep(tokio::time::Duration::from_millis(5)).await;

        Ok(LlmResponse {
            content: self.generate_content(&request)?,
            model: "mock-model".to_string(),
            usage: TokenUsage {
                prompt_tokens: 100,
                completion_tokens: 200,
                total_tokens: 300,
            },
        })
    }

    fn model_name(&self) -> &str {
        "mock-model"
    }

    fn max_context_tokens(&self) -> usize {
        100_000
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ModelVulnerability;
    use crate::extract::extract_response;

    fn request(prompt: &str) -> LlmRequest {
        LlmRequest {
            system_prompt: "Analyze code".to_string(),
            user_prompt: prompt.to_string(),
            temperature: 0.2,
            max_tokens: 1000,
        }
    }

    #[tokio::test]
    async fn test_canned_response_round_trips_through_extractor() {
        let report = ModelReport {
            vulnerabilities: vec![ModelVulnerability {
                severity: "High".to_string(),
                title: "eval on user input".to_string(),
                location: "app.py:7".to_string(),
                ..ModelVulnerability::default()
            }],
            ..ModelReport::default()
        };
        let provider = MockProvider::new().with_response("app.py", report);

        let response = provider.complete(request("contents of app.py")).await.unwrap();
        let extraction = extract_response(&response.content);

        assert!(extraction.parsed);
        assert_eq!(extraction.report.vulnerabilities.len(), 1);
    }

    #[tokio::test]
    async fn test_call_counting() {
        let provider = MockProvider::new();
        assert_eq!(provider.call_count(), 0);

        provider.complete(request("one")).await.unwrap();
        provider.complete(request("two")).await.unwrap();
        assert_eq!(provider.call_count(), 2);
    }

    #[tokio::test]
    async fn test_failing_provider() {
        let provider = MockProvider::failing();
        assert!(provider.complete(request("anything")).await.is_err());
    }

    #[tokio::test]
    async fn test_raw_response_passthrough() {
        let provider = MockProvider::new().with_raw_response("Sorry, I cannot comply.");
        let response = provider.complete(request("anything")).await.unwrap();
        assert_eq!(response.content, "Sorry, I cannot comply.");
    }
}
