//! Minimal OpenAI client for the Binno questionnaire.
//!
//! We only call chat.completions and request either plain text or a strict
//! JSON object. Calls are instrumented and log model names, latencies, and
//! response sizes (not contents).
//!
//! NOTE: We never log the API key and we keep payload truncations short.

use std::time::Duration;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};

use crate::config::Prompts;
use crate::domain::{AnalysisReport, Exchange};
use crate::util::fill_template;

#[derive(Clone)]
pub struct OpenAI {
  pub client: reqwest::Client,
  pub api_key: String,
  pub base_url: String,
  pub fast_model: String,
  pub strong_model: String,
}

impl OpenAI {
  /// Construct the client if we find OPENAI_API_KEY; otherwise return None.
  pub fn from_env() -> Option<Self> {
    let api_key = std::env::var("OPENAI_API_KEY").ok()?;
    let base_url =
      std::env::var("OPENAI_BASE_URL").unwrap_or_else(|_| "https://api.openai.com/v1".into());
    let fast_model =
      std::env::var("OPENAI_FAST_MODEL").unwrap_or_else(|_| "gpt-4o-mini".into());
    let strong_model =
      std::env::var("OPENAI_STRONG_MODEL").unwrap_or_else(|_| "gpt-4o".into());

    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(20))
      .build()
      .ok()?;

    Some(Self { client, api_key, base_url, fast_model, strong_model })
  }

  /// Plain-text chat completion. Used for adaptive question generation.
  #[instrument(level = "info", skip(self, system, user), fields(model = %model))]
  async fn chat_plain(
    &self,
    model: &str,
    system: &str,
    user: &str,
    temperature: f32,
  ) -> Result<String, String> {
    let url = format!("{}/chat/completions", self.base_url);
    let req = ChatCompletionRequest {
      model: model.to_string(),
      messages: vec![
        ChatMessageReq { role: "system".into(), content: system.into() },
        ChatMessageReq { role: "user".into(), content: user.into() },
      ],
      temperature,
      response_format: None,
      max_tokens: None,
    };

    let res = self.client.post(&url)
      .header(USER_AGENT, "ctdhub-backend/0.1")
      .header(CONTENT_TYPE, "application/json")
      .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
      .json(&req).send().await.map_err(|e| e.to_string())?;

    if !res.status().is_success() {
      let status = res.status();
      let body = res.text().await.unwrap_or_default();
      let msg = extract_openai_error(&body).unwrap_or_else(|| body);
      return Err(format!("OpenAI HTTP {}: {}", status, msg));
    }

    let body: ChatCompletionResponse = res.json().await.map_err(|e| e.to_string())?;
    if let Some(usage) = &body.usage {
      info!(prompt_tokens = ?usage.prompt_tokens, completion_tokens = ?usage.completion_tokens, total_tokens = ?usage.total_tokens, "OpenAI usage");
    }
    let text = body.choices.get(0)
      .and_then(|c| c.message.content.clone())
      .unwrap_or_default().trim().to_string();

    Ok(text)
  }

  /// JSON-object chat completion. Generic over the target type T.
  #[instrument(level = "info", skip(self, system, user), fields(model = %model))]
  async fn chat_json<T: for<'a> Deserialize<'a>>(
    &self,
    model: &str,
    system: &str,
    user: &str,
    temperature: f32,
  ) -> Result<T, String> {
    let url = format!("{}/chat/completions", self.base_url);
    let req = ChatCompletionRequest {
      model: model.to_string(),
      messages: vec![
        ChatMessageReq { role: "system".into(), content: system.into() },
        ChatMessageReq { role: "user".into(), content: user.into() },
      ],
      temperature,
      response_format: Some(ResponseFormat { r#type: "json_object".into() }),
      max_tokens: None,
    };

    let res = self.client.post(&url)
      .header(USER_AGENT, "ctdhub-backend/0.1")
      .header(CONTENT_TYPE, "application/json")
      .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
      .json(&req).send().await.map_err(|e| e.to_string())?;

    if !res.status().is_success() {
      let status = res.status();
      let body = res.text().await.unwrap_or_default();
      let msg = extract_openai_error(&body).unwrap_or_else(|| body);
      return Err(format!("OpenAI HTTP {}: {}", status, msg));
    }

    let body: ChatCompletionResponse = res.json().await.map_err(|e| e.to_string())?;
    if let Some(usage) = &body.usage {
      info!(prompt_tokens = ?usage.prompt_tokens, completion_tokens = ?usage.completion_tokens, total_tokens = ?usage.total_tokens, "OpenAI usage");
    }
    let text = body.choices.get(0)
      .and_then(|c| c.message.content.clone())
      .unwrap_or_default();

    serde_json::from_str::<T>(&text).map_err(|e| format!("JSON parse error: {}", e))
  }

  // --- High-level helpers (domain-specialized) ---

  /// Ask the model for the next interview question, given the transcript so far.
  #[instrument(level = "info", skip(self, prompts, transcript), fields(exchanges = transcript.len(), model = %self.fast_model))]
  pub async fn next_question(
    &self,
    prompts: &Prompts,
    transcript: &[Exchange],
    index: usize,
    total: usize,
  ) -> Result<String, String> {
    let rendered = render_transcript(transcript);
    let user = fill_template(
      &prompts.question_user_template,
      &[
        ("index", &index.to_string()),
        ("total", &total.to_string()),
        ("transcript", &rendered),
      ],
    );

    let start = std::time::Instant::now();
    let result = self.chat_plain(&self.fast_model, &prompts.question_system, &user, 0.7).await;
    let elapsed = start.elapsed();

    match &result {
      Ok(q) if !q.trim().is_empty() => {
        info!(target: "binno", ?elapsed, "Next question generated");
        Ok(q.trim().to_string())
      }
      Ok(_) => {
        error!(target: "binno", ?elapsed, "Model returned an empty question");
        Err("empty question from model".into())
      }
      Err(e) => {
        error!(target: "binno", ?elapsed, error = %e, "Model call failed during question generation");
        Err(e.clone())
      }
    }
  }

  /// Produce the final analysis report from a completed transcript.
  #[instrument(level = "info", skip(self, prompts, transcript), fields(exchanges = transcript.len(), model = %self.strong_model))]
  pub async fn final_analysis(
    &self,
    prompts: &Prompts,
    transcript: &[Exchange],
  ) -> Result<AnalysisReport, String> {
    #[derive(Deserialize)]
    struct Out {
      score: f64,
      verdict: String,
      #[serde(default)] strengths: Vec<String>,
      #[serde(default)] risks: Vec<String>,
    }

    let rendered = render_transcript(transcript);
    let user = fill_template(&prompts.analysis_user_template, &[("transcript", &rendered)]);
    let out: Out = self.chat_json(&self.strong_model, &prompts.analysis_system, &user, 0.2).await?;

    let score = out.score.clamp(0.0, 100.0).round() as u8;
    info!(target: "binno", score, "Final analysis generated");
    Ok(AnalysisReport { score, verdict: out.verdict, strengths: out.strengths, risks: out.risks })
  }
}

/// Flatten a transcript into "Q: … / A: …" lines for prompt templates.
pub fn render_transcript(transcript: &[Exchange]) -> String {
  transcript
    .iter()
    .map(|e| format!("Q: {}\nA: {}", e.question, e.answer))
    .collect::<Vec<_>>()
    .join("\n\n")
}

// --- Chat DTOs ---

#[derive(Serialize)]
struct ChatCompletionRequest {
  model: String,
  messages: Vec<ChatMessageReq>,
  temperature: f32,
  #[serde(skip_serializing_if = "Option::is_none")]
  response_format: Option<ResponseFormat>,
  #[serde(skip_serializing_if = "Option::is_none")]
  max_tokens: Option<u32>,
}
#[derive(Serialize)]
struct ChatMessageReq { role: String, content: String }
#[derive(Serialize)]
struct ResponseFormat { #[serde(rename = "type")] r#type: String }

#[derive(Deserialize)]
struct ChatCompletionResponse {
  choices: Vec<ChatChoice>,
  #[serde(default)] usage: Option<Usage>,
}
#[derive(Deserialize)]
struct ChatChoice { message: ChatMessageResp }
#[derive(Deserialize)]
struct ChatMessageResp { content: Option<String> }
#[derive(Deserialize)]
struct Usage {
  #[serde(default)] prompt_tokens: Option<u32>,
  #[serde(default)] completion_tokens: Option<u32>,
  #[serde(default)] total_tokens: Option<u32>,
}

/// Try to extract a clean error message from OpenAI error body.
fn extract_openai_error(body: &str) -> Option<String> {
  #[derive(Deserialize)]
  struct EWrap { error: EObj }
  #[derive(Deserialize)]
  struct EObj { message: String }
  match serde_json::from_str::<EWrap>(body) {
    Ok(w) => Some(w.error.message),
    Err(_) => None,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn transcript_renders_in_order() {
    let t = vec![
      Exchange { question: "q1".into(), answer: "a1".into() },
      Exchange { question: "q2".into(), answer: "a2".into() },
    ];
    assert_eq!(render_transcript(&t), "Q: q1\nA: a1\n\nQ: q2\nA: a2");
  }

  #[test]
  fn openai_error_body_is_unwrapped() {
    let body = r#"{"error":{"message":"Rate limit reached","type":"rate_limit"}}"#;
    assert_eq!(extract_openai_error(body).as_deref(), Some("Rate limit reached"));
    assert!(extract_openai_error("plain text").is_none());
  }
}
