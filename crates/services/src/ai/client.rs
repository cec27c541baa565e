use std::env;
use std::time::Duration;

use async_trait::async_trait;
use interview_core::model::{Candidate, Difficulty, GeneratedQuestion, Question, ResumeAnalysis};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::retry::{JSON_LADDER, RetryPolicy, Strategy, TEXT_LADDER};
use super::{AiCollaborator, Evaluation, SpeechClip, parse, prompts};
use crate::error::AiError;
use crate::resume::ResumeDocument;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
const PLACEHOLDER_KEYS: [&str; 2] = ["your_api_key_here", "your_openai_api_key_here"];

#[derive(Clone, Debug)]
pub struct AiConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub fallback_model: Option<String>,
    pub tts_model: String,
    pub tts_voice: String,
}

impl AiConfig {
    /// Reads `INTERVIEW_AI_*` and `INTERVIEW_TTS_*`; `None` when no usable
    /// API key is set.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let api_key = env::var("INTERVIEW_AI_API_KEY").ok()?;
        let api_key = api_key.trim();
        if api_key.is_empty() || PLACEHOLDER_KEYS.contains(&api_key) {
            return None;
        }
        let var_or = |name: &str, default: &str| {
            env::var(name)
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| default.into())
        };
        Some(Self {
            base_url: var_or("INTERVIEW_AI_BASE_URL", "https://api.openai.com/v1"),
            api_key: api_key.to_string(),
            model: var_or("INTERVIEW_AI_MODEL", "gpt-4o-mini"),
            fallback_model: env::var("INTERVIEW_AI_FALLBACK_MODEL")
                .ok()
                .filter(|v| !v.trim().is_empty()),
            tts_model: var_or("INTERVIEW_TTS_MODEL", "tts-1"),
            tts_voice: var_or("INTERVIEW_TTS_VOICE", "alloy"),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url.trim_end_matches('/'))
    }

    fn model_for(&self, strategy: Strategy) -> &str {
        match strategy {
            Strategy::FallbackModel => self.fallback_model.as_deref().unwrap_or(&self.model),
            Strategy::JsonFormat | Strategy::Plain => &self.model,
        }
    }
}

/// OpenAI-compatible chat completions client.
#[derive(Clone)]
pub struct HttpAiClient {
    client: Client,
    config: AiConfig,
    retry: RetryPolicy,
}

impl HttpAiClient {
    #[must_use]
    pub fn new(config: AiConfig) -> Self {
        Self {
            client: Client::new(),
            config,
            retry: RetryPolicy::default(),
        }
    }

    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    #[must_use]
    pub fn config(&self) -> &AiConfig {
        &self.config
    }

    /// One chat completion attempt.
    ///
    /// # Errors
    ///
    /// Returns `AiError` when the request fails or the response is empty.
    pub async fn complete(&self, prompt: &str, strategy: Strategy) -> Result<String, AiError> {
        let model = self.config.model_for(strategy);
        let payload = ChatRequest {
            model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: prompts::SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: 0.2,
            response_format: (strategy == Strategy::JsonFormat).then_some(ResponseFormat {
                kind: "json_object",
            }),
        };

        let response = self
            .client
            .post(self.config.endpoint("chat/completions"))
            .bearer_auth(&self.config.api_key)
            .timeout(REQUEST_TIMEOUT)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AiError::HttpStatus(response.status()));
        }

        let body: ChatResponse = response.json().await?;
        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or(AiError::EmptyResponse)?;

        debug!(model, ?strategy, chars = content.len(), "AI completion received");
        Ok(content)
    }

    async fn speech_once(&self, text: &str) -> Result<SpeechClip, AiError> {
        let payload = SpeechRequest {
            model: &self.config.tts_model,
            voice: &self.config.tts_voice,
            input: text,
            response_format: "mp3",
        };
        let response = self
            .client
            .post(self.config.endpoint("audio/speech"))
            .bearer_auth(&self.config.api_key)
            .timeout(REQUEST_TIMEOUT)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AiError::HttpStatus(response.status()));
        }
        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Err(AiError::EmptyResponse);
        }
        Ok(SpeechClip {
            bytes: bytes.to_vec(),
            mime_type: "audio/mpeg".into(),
        })
    }
}

#[async_trait]
impl AiCollaborator for HttpAiClient {
    async fn analyze_resume(&self, resume: &ResumeDocument) -> Result<ResumeAnalysis, AiError> {
        let prompt = prompts::resume_prompt(&resume.text);
        self.retry
            .run("analyze_resume", &JSON_LADDER, |strategy| {
                let prompt = &prompt;
                async move {
                    let raw = self.complete(prompt, strategy).await?;
                    parse::parse_resume_analysis(&raw)
                }
            })
            .await
    }

    async fn generate_questions(
        &self,
        analysis: Option<&ResumeAnalysis>,
    ) -> Result<Vec<GeneratedQuestion>, AiError> {
        let prompt = prompts::question_prompt(analysis);
        self.retry
            .run("generate_questions", &JSON_LADDER, |strategy| {
                let prompt = &prompt;
                async move {
                    let raw = self.complete(prompt, strategy).await?;
                    parse::parse_questions(&raw)
                }
            })
            .await
    }

    async fn evaluate_answer(
        &self,
        question: &str,
        answer: &str,
        difficulty: Difficulty,
    ) -> Result<Evaluation, AiError> {
        let prompt = prompts::evaluation_prompt(question, answer, difficulty);
        self.retry
            .run("evaluate_answer", &JSON_LADDER, |strategy| {
                let prompt = &prompt;
                async move {
                    let raw = self.complete(prompt, strategy).await?;
                    parse::parse_evaluation(&raw)
                }
            })
            .await
    }

    /// One plain attempt; a missing reference answer is not worth retries.
    async fn reference_answer(
        &self,
        question: &str,
        difficulty: Difficulty,
    ) -> Result<String, AiError> {
        let prompt = prompts::reference_prompt(question, difficulty);
        self.complete(&prompt, Strategy::Plain).await
    }

    async fn summarize(
        &self,
        candidate: &Candidate,
        questions: &[Question],
    ) -> Result<String, AiError> {
        let prompt = prompts::summary_prompt(candidate, questions);
        self.retry
            .run("summarize", &TEXT_LADDER, |strategy| {
                let prompt = &prompt;
                async move { self.complete(prompt, strategy).await }
            })
            .await
    }

    async fn synthesize_speech(&self, text: &str) -> Result<SpeechClip, AiError> {
        self.retry
            .run("synthesize_speech", &TEXT_LADDER, |_| self.speech_once(text))
            .await
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    voice: &'a str,
    input: &'a str,
    response_format: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Debug, Deserialize)]
struct ChatMessageResponse {
    content: Option<String>,
}
