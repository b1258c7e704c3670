//! OpenAI-compatible oracle provider.
//!
//! Speaks the `/chat/completions` and `/embeddings` surface, which most
//! hosted and local gateways accept. All transport and schema failures are
//! mapped onto [`OracleError`] so the retry layer can tell transient from
//! permanent.

use crate::oracle::{CouncilReport, GeneratedResponse, Oracle, ResponseRequest};
use crate::retry::OracleError;
use async_trait::async_trait;
use noema_core::config::OracleConfig;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

const COUNCIL_SYSTEM_PROMPT: &str = r#"You are the perception cortex of a conversational agent. Score the user's message through five lenses, each 0.0-10.0 with a short rationale and a 0.0-1.0 confidence:

- "intuition": resemblance to recurring past patterns
- "amygdala": threat, distress or conflict in the message
- "prefrontal": need for logic, planning or factual structure
- "social": need for politeness, empathy or ritual
- "striatum": reward, novelty or play opportunity

Also classify "intent" as one of: phatic, casual, narrative, deep, task.

When asked for a FULL report, additionally extract:
- "profile_update": explicitly self-disclosed identity facts (name, traits, preferred address mode), or null
- "affective_extraction": explicit emotional attitudes toward named entities, e.g. "I hate Java" -> {"subject":"User","predicate":"HATES","object":"Java","intensity":0.9,"valence":-0.9}

Reply with a single JSON object:
{"lenses": {"intuition": {"score": 0.0, "rationale": "...", "confidence": 0.0}, ...},
 "intent": "...", "profile_update": null, "affective_extraction": []}"#;

const RESPONSE_SYSTEM_PROMPT: &str = r#"You are {name}, answering with the voice of your "{agent}" faculty (reason: {rationale}). Address the user in {mode} register.

Follow every bracketed style directive exactly. If an EMOTIONAL RELATIONS block is present, respect those attitudes: never casually recommend something the user hates.

Reply with a single JSON object:
{"text": "<your reply>", "predicted_reaction": "<one sentence: what the user will most likely say next>"}"#;

#[derive(Debug, Clone)]
pub struct OpenAiOracle {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    embedding_model: String,
}

impl OpenAiOracle {
    pub fn new(config: &OracleConfig) -> Result<Self, OracleError> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| OracleError::Unauthorized("OPENAI_API_KEY not set".to_string()))?;
        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| "https://api.openai.com/v1".to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            client: Client::builder()
                .timeout(Duration::from_secs(60))
                .build()
                .map_err(|e| OracleError::Network(e.to_string()))?,
            api_key,
            base_url,
            model: config.model.clone(),
            embedding_model: config.embedding_model.clone(),
        })
    }

    async fn post(&self, path: &str, body: Value) -> Result<Value, OracleError> {
        let response = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| OracleError::Network(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return response
                .json()
                .await
                .map_err(|e| OracleError::InvalidResponse(e.to_string()));
        }

        let text = response.text().await.unwrap_or_default();
        Err(match status {
            StatusCode::TOO_MANY_REQUESTS => OracleError::RateLimited,
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => OracleError::Unauthorized(text),
            s if s.is_server_error() => OracleError::Server(format!("{}: {}", s, text)),
            s => OracleError::InvalidResponse(format!("{}: {}", s, text)),
        })
    }

    /// One JSON-mode chat call; returns the parsed content object.
    async fn chat_json(&self, system: &str, user: &str) -> Result<Value, OracleError> {
        let body = json!({
            "model": self.model,
            "response_format": {"type": "json_object"},
            "messages": [
                {"role": "system", "content": system},
                {"role": "user", "content": user},
            ],
        });
        let response = self.post("/chat/completions", body).await?;
        let content = response["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| OracleError::InvalidResponse("no message content".to_string()))?;
        serde_json::from_str(content)
            .map_err(|e| OracleError::InvalidResponse(format!("bad JSON content: {}", e)))
    }
}

#[derive(Deserialize)]
struct GeneratedPayload {
    text: String,
    #[serde(default)]
    predicted_reaction: Option<String>,
}

#[async_trait]
impl Oracle for OpenAiOracle {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, OracleError> {
        let body = json!({"model": self.embedding_model, "input": text});
        let response = self.post("/embeddings", body).await?;
        let values = response["data"][0]["embedding"]
            .as_array()
            .ok_or_else(|| OracleError::InvalidResponse("no embedding in response".to_string()))?;
        Ok(values
            .iter()
            .filter_map(|v| v.as_f64().map(|f| f as f32))
            .collect())
    }

    async fn council_report(
        &self,
        text: &str,
        context: &str,
        full: bool,
    ) -> Result<CouncilReport, OracleError> {
        let mode = if full { "FULL" } else { "LIGHT" };
        let user = format!(
            "Report mode: {}\n\nRecent context:\n{}\n\nUser message:\n{}",
            mode, context, text
        );
        let value = self.chat_json(COUNCIL_SYSTEM_PROMPT, &user).await?;
        let report: CouncilReport = serde_json::from_value(value)
            .map_err(|e| OracleError::InvalidResponse(format!("bad report shape: {}", e)))?;
        if !report.is_complete() {
            return Err(OracleError::InvalidResponse(
                "report missing council lenses".to_string(),
            ));
        }
        Ok(report)
    }

    async fn generate_response(
        &self,
        request: &ResponseRequest,
    ) -> Result<GeneratedResponse, OracleError> {
        let system = RESPONSE_SYSTEM_PROMPT
            .replace("{name}", &request.bot_name)
            .replace("{agent}", request.agent.as_str())
            .replace("{rationale}", &request.rationale)
            .replace("{mode}", &request.user_mode);

        let mut user = String::new();
        if !request.context.is_empty() {
            user.push_str(&format!("MEMORY CONTEXT:\n{}\n\n", request.context));
        }
        if !request.affective_context.is_empty() {
            user.push_str(&format!(
                "EMOTIONAL RELATIONS:\n{}\n\n",
                request.affective_context
            ));
        }
        if !request.style.is_empty() {
            user.push_str(&format!("STYLE:\n{}\n\n", request.style));
        }
        if let Some(pivot) = &request.pivot_directive {
            user.push_str(&format!("{}\n\n", pivot));
        }
        user.push_str(&format!("USER:\n{}", request.user_text));

        let value = self.chat_json(&system, &user).await?;
        let payload: GeneratedPayload = serde_json::from_value(value)
            .map_err(|e| OracleError::InvalidResponse(format!("bad response shape: {}", e)))?;
        Ok(GeneratedResponse {
            text: payload.text,
            predicted_reaction: payload.predicted_reaction.filter(|p| !p.is_empty()),
        })
    }
}
