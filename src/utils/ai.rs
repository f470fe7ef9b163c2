// src/utils/ai.rs

use serde::Deserialize;
use serde_json::json;

use crate::{
    config::Config,
    error::AppError,
    models::quiz::{OptionInput, Question, QuestionInput, OPTIONS_PER_QUESTION},
};

/// Marks assigned to generated questions; faculty can adjust them afterwards
/// through the normal question-edit flow.
const GENERATED_QUESTION_MARKS: i64 = 1;

/// How many times a malformed model response is retried before giving up.
const GENERATION_ATTEMPTS: usize = 2;

/// Client for an OpenAI-compatible chat completions endpoint used to draft
/// multiple-choice questions. The model's output is parsed and pushed through
/// the same validation as manually authored questions; nothing the model says
/// is trusted as-is.
#[derive(Clone)]
pub struct AiClient {
    http: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
}

/// Shape the model is instructed to produce, one entry per question.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeneratedQuestion {
    text: String,
    options: Vec<String>,
    /// Zero-based index into `options`.
    correct_index: usize,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

impl AiClient {
    /// Returns None when the AI endpoint is not configured.
    pub fn from_config(config: &Config) -> Option<Self> {
        let api_url = config.ai_api_url.clone()?;
        let api_key = config.ai_api_key.clone()?;

        Some(Self {
            http: reqwest::Client::new(),
            api_url,
            api_key,
            model: config.ai_model.clone(),
        })
    }

    /// Generates `num_questions` questions on `topic` at `difficulty`.
    ///
    /// Retries once on malformed output; every surviving question satisfies
    /// the usual invariants (4 options, exactly one correct, marks > 0).
    pub async fn generate_questions(
        &self,
        topic: &str,
        num_questions: i64,
        difficulty: &str,
    ) -> Result<Vec<Question>, AppError> {
        let prompt = build_prompt(topic, num_questions, difficulty);
        let mut last_error = "question generation failed".to_string();

        for attempt in 0..GENERATION_ATTEMPTS {
            let raw = self.request_completion(&prompt).await?;

            match parse_generated(&raw, difficulty) {
                Ok(questions) if questions.len() == num_questions as usize => {
                    return Ok(questions);
                }
                Ok(questions) => {
                    last_error = format!(
                        "model produced {} questions instead of {}",
                        questions.len(),
                        num_questions
                    );
                }
                Err(e) => {
                    last_error = e;
                }
            }

            tracing::warn!(
                "Question generation attempt {} rejected: {}",
                attempt + 1,
                last_error
            );
        }

        Err(AppError::BadRequest(format!(
            "AI generation failed: {}",
            last_error
        )))
    }

    async fn request_completion(&self, prompt: &str) -> Result<String, AppError> {
        let body = json!({
            "model": self.model,
            "messages": [
                {
                    "role": "system",
                    "content": "You write exam questions. Respond with a JSON array only, no prose, no markdown."
                },
                { "role": "user", "content": prompt }
            ],
            "temperature": 0.7,
        });

        let response = self
            .http
            .post(format!("{}/chat/completions", self.api_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("AI endpoint unreachable: {:?}", e);
                AppError::InternalServerError(e.to_string())
            })?;

        if !response.status().is_success() {
            return Err(AppError::InternalServerError(format!(
                "AI endpoint returned status {}",
                response.status()
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| AppError::InternalServerError(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| AppError::InternalServerError("AI response had no choices".to_string()))
    }
}

fn build_prompt(topic: &str, num_questions: i64, difficulty: &str) -> String {
    format!(
        "Write {num_questions} {difficulty}-level multiple-choice questions about \"{topic}\" \
         for a college exam. Return a JSON array where each element is \
         {{\"text\": string, \"options\": [4 strings], \"correctIndex\": 0-based integer}}. \
         Exactly 4 options per question, exactly one correct."
    )
}

/// Parses the model output and converts it through the standard authoring
/// validation. Returns a message describing the first defect found.
fn parse_generated(raw: &str, difficulty: &str) -> Result<Vec<Question>, String> {
    let cleaned = strip_code_fences(raw);

    let generated: Vec<GeneratedQuestion> = serde_json::from_str(cleaned)
        .map_err(|e| format!("model output is not a JSON question array: {}", e))?;

    let mut questions = Vec::with_capacity(generated.len());
    for g in generated {
        if g.correct_index >= OPTIONS_PER_QUESTION {
            return Err(format!("correctIndex {} out of range", g.correct_index));
        }

        let input = QuestionInput {
            id: None,
            text: g.text,
            options: g
                .options
                .into_iter()
                .enumerate()
                .map(|(i, text)| OptionInput {
                    text,
                    is_correct: i == g.correct_index,
                })
                .collect(),
            marks: GENERATED_QUESTION_MARKS,
            difficulty: difficulty.to_string(),
        };

        questions.push(input.into_question()?);
    }

    Ok(questions)
}

/// Models frequently wrap JSON in markdown fences despite instructions.
fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let without_open = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    without_open.strip_suffix("```").unwrap_or(without_open).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_clean_json_array() {
        let raw = r#"[{"text":"2+2?","options":["3","4","5","6"],"correctIndex":1}]"#;
        let questions = parse_generated(raw, "Easy").unwrap();
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].correct_option_id(), Some(2));
        assert_eq!(questions[0].correct_answer, "4");
        assert_eq!(questions[0].difficulty, "Easy");
    }

    #[test]
    fn parses_fenced_json() {
        let raw = "```json\n[{\"text\":\"2+2?\",\"options\":[\"3\",\"4\",\"5\",\"6\"],\"correctIndex\":1}]\n```";
        assert_eq!(parse_generated(raw, "Easy").unwrap().len(), 1);
    }

    #[test]
    fn rejects_out_of_range_correct_index() {
        let raw = r#"[{"text":"2+2?","options":["3","4","5","6"],"correctIndex":4}]"#;
        assert!(parse_generated(raw, "Easy").is_err());
    }

    #[test]
    fn rejects_wrong_option_count() {
        let raw = r#"[{"text":"2+2?","options":["3","4"],"correctIndex":1}]"#;
        assert!(parse_generated(raw, "Easy").is_err());
    }
}
