//! The Relevance Gate HTTP call and its yes/no/unknown contract (spec.md
//! §4.6).

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::budget::Budget;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateVerdict {
    Yes,
    No,
    /// Ambiguous, empty, error, or over-budget: callers fall back to the
    /// local score (spec.md §4.6 contract, never blocks).
    Unknown,
}

pub struct RelevanceGate {
    client: reqwest::Client,
    api_key: String,
    model: String,
    timeout: Duration,
    readable_max_chars: usize,
    budget: Budget,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: String,
}

pub struct GateQuery<'a> {
    pub land_name: &'a str,
    pub land_description: Option<&'a str>,
    pub land_lang: &'a str,
    pub land_lemmas: &'a [String],
    pub url: &'a str,
    pub title: Option<&'a str>,
    pub description: Option<&'a str>,
    pub readable: Option<&'a str>,
}

impl RelevanceGate {
    pub fn new(
        api_key: String,
        model: String,
        timeout_secs: u64,
        readable_max_chars: usize,
        max_calls_per_run: u64,
    ) -> reqwest::Result<Self> {
        Ok(Self {
            client: reqwest::Client::builder().timeout(Duration::from_secs(timeout_secs)).build()?,
            api_key,
            model,
            timeout: Duration::from_secs(timeout_secs),
            readable_max_chars,
            budget: Budget::new(max_calls_per_run),
        })
    }

    /// Ask the gate whether `query.url` belongs in the Land. Never returns
    /// an error: over-budget, network failure, and unparseable responses all
    /// collapse to [`GateVerdict::Unknown`].
    pub async fn ask(&self, query: &GateQuery<'_>) -> GateVerdict {
        if !self.budget.try_claim() {
            return GateVerdict::Unknown;
        }

        let prompt = build_prompt(query, self.readable_max_chars);
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage { role: "user", content: prompt }],
        };

        let response = self
            .client
            .post("https://openrouter.ai/api/v1/chat/completions")
            .bearer_auth(&self.api_key)
            .json(&request)
            .timeout(self.timeout)
            .send()
            .await;

        let response = match response {
            Ok(r) => r,
            Err(e) => {
                warn!(error = %e, "relevance gate call failed, falling back to local score");
                return GateVerdict::Unknown;
            }
        };

        let parsed: Result<ChatResponse, _> = response.json().await;
        match parsed {
            Ok(body) => body
                .choices
                .first()
                .map(|c| parse_verdict(&c.message.content))
                .unwrap_or(GateVerdict::Unknown),
            Err(e) => {
                warn!(error = %e, "relevance gate returned unparseable response");
                GateVerdict::Unknown
            }
        }
    }

    #[must_use]
    pub fn calls_used(&self) -> u64 {
        self.budget.used()
    }
}

fn build_prompt(query: &GateQuery<'_>, max_chars: usize) -> String {
    let readable = query.readable.unwrap_or_default();
    let truncated: String = readable.chars().take(max_chars).collect();
    format!(
        "Land: {} ({}). Language: {}. Terms: {}.\nPage: {} | title: {} | description: {}\nBody:\n{}\n\nIs this page relevant to the Land? Answer yes or no.",
        query.land_name,
        query.land_description.unwrap_or(""),
        query.land_lang,
        query.land_lemmas.join(", "),
        query.url,
        query.title.unwrap_or(""),
        query.description.unwrap_or(""),
        truncated,
    )
}

/// Normalize the gate's free-text answer to yes/no/unknown by looking only
/// at the first word (spec.md §6 "LLM gate").
fn parse_verdict(content: &str) -> GateVerdict {
    let first_word = content
        .trim()
        .split_whitespace()
        .next()
        .unwrap_or("")
        .trim_matches(|c: char| !c.is_alphanumeric())
        .to_ascii_lowercase();
    match first_word.as_str() {
        "yes" | "oui" => GateVerdict::Yes,
        "no" | "non" => GateVerdict::No,
        _ => GateVerdict::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn sample_query() -> GateQuery<'static> {
        GateQuery {
            land_name: "asthme",
            land_description: None,
            land_lang: "fr",
            land_lemmas: &[],
            url: "https://example.com/a",
            title: Some("title"),
            description: None,
            readable: Some("body"),
        }
    }

    #[test]
    fn parse_verdict_reads_only_first_word() {
        assert_eq!(parse_verdict("Yes, this is relevant."), GateVerdict::Yes);
        assert_eq!(parse_verdict("non pertinent"), GateVerdict::No);
        assert_eq!(parse_verdict("maybe?"), GateVerdict::Unknown);
        assert_eq!(parse_verdict(""), GateVerdict::Unknown);
    }

    #[tokio::test]
    async fn budget_exhaustion_short_circuits_before_any_network_call() {
        let server = MockServer::start().await;
        Mock::given(method("POST")).respond_with(ResponseTemplate::new(500)).expect(0).mount(&server).await;

        let gate = RelevanceGate::new("key".into(), "model".into(), 5, 6000, 0).unwrap();
        let verdict = gate.ask(&sample_query()).await;
        assert_eq!(verdict, GateVerdict::Unknown);
    }
}
