use std::time::Duration;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use log::{info, error, debug};
use once_cell::sync::Lazy;
use regex::Regex;
use crate::ai_service::{AnswerEvaluator, QuestionGenerator, ServiceError};
use crate::config::AiConfig;
use crate::interview::Difficulty;

static SCORE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)score\D{0,12}?(-?\d+)").expect("score pattern is valid")
});

#[derive(Serialize, Deserialize)]
struct OpenAIMessage {
    role: String,
    content: String,
}

#[derive(Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    max_tokens: u32,
    temperature: f64,
    stream: bool,
}

#[derive(Deserialize)]
struct OpenAIChoice {
    message: OpenAIMessage,
}

#[derive(Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
    usage: Option<OpenAIUsage>,
}

#[derive(Deserialize)]
struct OpenAIUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

#[derive(Deserialize)]
struct EvaluationPayload {
    score: f64,
}

#[derive(Error, Debug)]
enum ChatError {
    #[error("OpenAI API error ({status}): {body}")]
    Api { status: u16, body: String },
    #[error("No response choices from OpenAI")]
    Empty,
    #[error(transparent)]
    Request(#[from] reqwest::Error),
}

impl From<ChatError> for ServiceError {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::Api { status, body } => ServiceError::Api { status, body },
            ChatError::Empty => ServiceError::EmptyResponse,
            ChatError::Request(e) => ServiceError::Request(e.to_string()),
        }
    }
}

#[derive(Clone)]
pub struct OpenAIClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAIClient {
    pub fn from_config(config: &AiConfig, api_key: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(5))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
        }
    }

    async fn chat(&self, system_prompt: String, user_prompt: String, max_tokens: u32, temperature: f64) -> Result<String, ChatError> {
        let request = OpenAIRequest {
            model: self.model.clone(),
            messages: vec![
                OpenAIMessage {
                    role: "system".to_string(),
                    content: system_prompt,
                },
                OpenAIMessage {
                    role: "user".to_string(),
                    content: user_prompt,
                },
            ],
            max_tokens,
            temperature,
            stream: false,
        };

        debug!("Sending request to OpenAI with model: {}", self.model);

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("OpenAI API error: {}", error_text);
            return Err(ChatError::Api { status: status.as_u16(), body: error_text });
        }

        let openai_response: OpenAIResponse = response.json().await?;

        if let Some(usage) = &openai_response.usage {
            debug!(
                "Token usage - Prompt: {}, Completion: {}, Total: {}",
                usage.prompt_tokens, usage.completion_tokens, usage.total_tokens
            );
        }

        openai_response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or(ChatError::Empty)
    }

    fn question_prompts(difficulty: Difficulty, background_text: &str) -> (String, String) {
        let mut system_prompt = String::from(
            "You are a technical interviewer for a Full Stack Developer (React/Node.js) role. Ask exactly one question.",
        );
        system_prompt.push_str("\n\nGuidelines:");
        system_prompt.push_str(match difficulty {
            Difficulty::Easy => "\n- Easy: a fundamentals question answerable in about 20 seconds",
            Difficulty::Medium => "\n- Medium: a practical question answerable in about a minute",
            Difficulty::Hard => "\n- Hard: a design or debugging question answerable in about two minutes",
        });
        system_prompt.push_str("\n- Return only the question text, no numbering or formatting");

        let background = background_text.trim();
        let user_prompt = if background.is_empty() {
            format!("Generate one {} interview question.", difficulty)
        } else {
            let excerpt: String = background.chars().take(3000).collect();
            format!(
                "Candidate background:\n{}\n\nGenerate one {} interview question relevant to this background.",
                excerpt, difficulty
            )
        };

        (system_prompt, user_prompt)
    }

    fn evaluation_prompts(question: &str, answer: &str, difficulty: Difficulty) -> (String, String) {
        let system_prompt = String::from(
            "You grade technical interview answers. Respond with JSON only: {\"score\": <integer 0-10>}.",
        );
        let user_prompt = format!(
            "Difficulty: {}\nQuestion: {}\nAnswer: {}\n\nScore the answer from 0 to 10.",
            difficulty, question, answer
        );
        (system_prompt, user_prompt)
    }

    /// Reads a score from `{"score": n}` or, failing that, the first number after "score".
    pub fn parse_score(content: &str) -> Option<i32> {
        let trimmed = content
            .trim()
            .trim_start_matches("```json")
            .trim_start_matches("```")
            .trim_end_matches("```")
            .trim();

        if let Ok(payload) = serde_json::from_str::<EvaluationPayload>(trimmed) {
            return Some(payload.score.round() as i32);
        }

        SCORE_PATTERN
            .captures(trimmed)
            .and_then(|captures| captures.get(1))
            .and_then(|m| m.as_str().parse::<i32>().ok())
    }
}

#[async_trait]
impl QuestionGenerator for OpenAIClient {
    async fn generate_question(
        &self,
        difficulty: Difficulty,
        background_text: &str,
    ) -> Result<String, ServiceError> {
        let (system_prompt, user_prompt) = Self::question_prompts(difficulty, background_text);
        let question = self
            .chat(system_prompt, user_prompt, 200, 0.7)
            .await?;

        info!("🤖 Generated {} question: {}", difficulty, question.chars().take(50).collect::<String>());
        Ok(question)
    }
}

#[async_trait]
impl AnswerEvaluator for OpenAIClient {
    async fn evaluate_answer(
        &self,
        question: &str,
        answer: &str,
        difficulty: Difficulty,
    ) -> Result<i32, ServiceError> {
        let (system_prompt, user_prompt) = Self::evaluation_prompts(question, answer, difficulty);
        let content = self
            .chat(system_prompt, user_prompt, 50, 0.0)
            .await?;

        Self::parse_score(&content).ok_or(ServiceError::EmptyResponse)
    }
}
