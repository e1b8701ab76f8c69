use std::time::Duration;

use color_eyre::Result;
use serde::{Deserialize, Serialize};

use crate::db::models::{Category, QuizModel};
use crate::db::{Db, StoreError};
use crate::models::{NewOption, NewQuestion, NewQuiz, QuestionType};
use crate::names;

#[derive(Debug, thiserror::Error)]
pub enum GeneratorError {
    #[error("generator request failed: {0}")]
    Request(String),

    #[error("generator did not answer within {0:?}")]
    Timeout(Duration),

    #[error("malformed generator output: {0}")]
    Malformed(String),
}

// ---------------------------------------------------------------------------
// QuizGenerator trait (the external text-to-quiz collaborator)
// ---------------------------------------------------------------------------

#[cfg_attr(test, mockall::automock)]
pub trait QuizGenerator: Send + Sync {
    /// Returns the raw generator text, expected to be the quiz JSON.
    fn generate(
        &self,
        category_name: &str,
        text: &str,
    ) -> impl std::future::Future<Output = Result<String>> + Send;
}

// ---------------------------------------------------------------------------
// Groq chat-completions client
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    content: String,
}

#[derive(Clone)]
pub struct GroqClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
    url: String,
}

impl GroqClient {
    pub fn new(api_key: String, model: String, url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            model,
            url,
        }
    }
}

fn system_prompt(category_name: &str) -> String {
    format!(
        r#"You are a quiz generator. The user gives you a topic, an article or a document. Based on it, generate {count} questions for the category "{category_name}". Return only JSON in exactly this format:
{{
  "quizTitle": "Quiz title",
  "questions": [
    {{
      "type": "single",
      "question": "Question?",
      "options": ["Option1", "Option2", "Option3", "Option4"],
      "correct": [2],
      "points": 1
    }},
    {{
      "type": "multiple",
      "question": "Question with several answers?",
      "options": ["A", "B", "C", "D"],
      "correct": [0, 3],
      "points": 2
    }},
    {{
      "type": "text",
      "question": "Open question?",
      "answer": "Correct answer",
      "points": 2
    }}
  ]
}}"#,
        count = names::GENERATED_QUESTION_COUNT,
    )
}

impl QuizGenerator for GroqClient {
    async fn generate(&self, category_name: &str, text: &str) -> Result<String> {
        let body = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system_prompt(category_name),
                },
                ChatMessage {
                    role: "user",
                    content: format!("Category: {category_name}. Text: {text}"),
                },
            ],
        };

        let resp = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| GeneratorError::Request(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            tracing::error!("generator API error: {status} - {text}");
            return Err(GeneratorError::Request(format!("generator API returned {status}")).into());
        }

        let completion: ChatResponse = resp
            .json()
            .await
            .map_err(|e| GeneratorError::Malformed(format!("unexpected completion body: {e}")))?;

        let content = completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| GeneratorError::Malformed("completion has no choices".to_string()))?;

        tracing::info!("generator answered for category {category_name}: {} bytes", content.len());
        Ok(content)
    }
}

// ---------------------------------------------------------------------------
// Generator output
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedQuiz {
    pub quiz_title: String,
    pub questions: Vec<GeneratedQuestion>,
}

#[derive(Debug, Deserialize)]
pub struct GeneratedQuestion {
    #[serde(rename = "type")]
    pub kind: String,
    pub question: Option<String>,
    pub options: Option<Vec<String>>,
    #[serde(default)]
    pub correct: Vec<usize>,
    pub points: Option<i64>,
}

/// Models like to wrap JSON in a Markdown fence; peel it off if present.
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    match trimmed.strip_prefix("```") {
        Some(rest) => {
            let rest = rest.strip_prefix("json").unwrap_or(rest);
            rest.strip_suffix("```").unwrap_or(rest).trim()
        }
        None => trimmed,
    }
}

/// Parse the generator text into the typed quiz and the raw JSON value.
pub fn parse_generated(raw: &str) -> Result<(GeneratedQuiz, serde_json::Value), GeneratorError> {
    let value: serde_json::Value = serde_json::from_str(strip_code_fence(raw))
        .map_err(|e| GeneratorError::Malformed(format!("invalid JSON: {e}")))?;
    let quiz: GeneratedQuiz = serde_json::from_value(value.clone())
        .map_err(|e| GeneratorError::Malformed(format!("unexpected shape: {e}")))?;
    Ok((quiz, value))
}

/// Map generator output onto the manual authoring payload.
pub fn to_new_quiz(generated: &GeneratedQuiz, category: &Category) -> Result<NewQuiz, GeneratorError> {
    if generated.quiz_title.trim().is_empty() {
        return Err(GeneratorError::Malformed("quizTitle is empty".to_string()));
    }

    let questions = generated
        .questions
        .iter()
        .enumerate()
        .map(|(idx, q)| {
            to_new_question(q).map_err(|e| GeneratorError::Malformed(format!("question {idx}: {e}")))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(NewQuiz {
        title: generated.quiz_title.clone(),
        description: Some(names::generated_description(&category.name)),
        category_id: category.id.clone(),
        image_url: None,
        questions,
    })
}

fn to_new_question(q: &GeneratedQuestion) -> Result<NewQuestion, String> {
    let question_type = match q.kind.as_str() {
        "single" => QuestionType::Single,
        "multiple" => QuestionType::Multiple,
        "text" => QuestionType::TextAnswer,
        other => return Err(format!("unknown question type {other:?}")),
    };

    let options = match question_type {
        QuestionType::TextAnswer => Vec::new(),
        QuestionType::Single | QuestionType::Multiple => {
            let labels = q
                .options
                .as_ref()
                .filter(|o| !o.is_empty())
                .ok_or("options are required for single and multiple questions")?;
            if let Some(bad) = q.correct.iter().find(|&&i| i >= labels.len()) {
                return Err(format!("correct index {bad} out of range for {} options", labels.len()));
            }
            labels
                .iter()
                .enumerate()
                .map(|(i, name)| NewOption {
                    name: name.clone(),
                    is_correct: q.correct.contains(&i),
                })
                .collect()
        }
    };

    let question = NewQuestion {
        question_type,
        points: q.points.unwrap_or(names::GENERATED_DEFAULT_POINTS),
        question: q.question.clone(),
        image_url: None,
        options,
    };
    question.check()?;
    Ok(question)
}

// ---------------------------------------------------------------------------
// GeneratorService
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct GeneratedOutcome {
    #[serde(flatten)]
    pub quiz: QuizModel,
    pub generated_data: serde_json::Value,
}

pub struct GeneratorService<G: QuizGenerator = GroqClient> {
    generator: G,
    timeout: Duration,
}

impl<G: QuizGenerator + Clone> Clone for GeneratorService<G> {
    fn clone(&self) -> Self {
        Self {
            generator: self.generator.clone(),
            timeout: self.timeout,
        }
    }
}

impl<G: QuizGenerator> GeneratorService<G> {
    pub fn new(generator: G, timeout: Duration) -> Self {
        Self { generator, timeout }
    }

    /// Generate a quiz from free text and persist it through the same path
    /// as manual authoring. Nothing is written unless the whole output is valid.
    pub async fn generate_quiz(
        &self,
        db: &Db,
        text: &str,
        category_id: &str,
    ) -> Result<GeneratedOutcome> {
        if text.trim().is_empty() {
            return Err(StoreError::Invalid("text cannot be empty".to_string()).into());
        }

        let category = db.category(category_id).await?;

        let raw = tokio::time::timeout(self.timeout, self.generator.generate(&category.name, text))
            .await
            .map_err(|_| GeneratorError::Timeout(self.timeout))?
            .map_err(|e| match e.downcast::<GeneratorError>() {
                Ok(e) => e,
                Err(e) => GeneratorError::Request(e.to_string()),
            })?;

        let (generated, generated_data) = parse_generated(&raw)?;
        let new_quiz = to_new_quiz(&generated, &category)?;
        let quiz = db.create_quiz(&new_quiz).await?;

        tracing::info!(
            "quiz generated with id: {} from {} questions in category {}",
            quiz.id,
            new_quiz.questions.len(),
            category.id
        );
        Ok(GeneratedOutcome {
            quiz,
            generated_data,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
