// Database model structs

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::QuestionType;

#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct AuthUser {
    pub id: String,
    pub login: String,
    pub name: Option<String>,
    pub surname: Option<String>,
    pub score: i64,
}

#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct Category {
    pub id: String,
    pub name: String,
}

/// Quiz summary returned by the authoring endpoints.
#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct QuizModel {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub category_id: String,
    pub image_url: String,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct QuizListItem {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub category_id: String,
    pub category_name: String,
}

#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct QuestionModel {
    pub id: String,
    pub question_type: QuestionType,
    pub quiz_id: String,
    pub points: i64,
    pub question: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct OptionModel {
    pub id: String,
    pub question_id: String,
    pub name: String,
    pub is_correct: bool,
}

#[derive(Debug, Serialize)]
pub struct QuestionWithOptions {
    #[serde(flatten)]
    pub question: QuestionModel,
    pub options: Vec<OptionModel>,
}

#[derive(Debug, Serialize)]
pub struct QuizDetail {
    #[serde(flatten)]
    pub quiz: QuizModel,
    pub questions: Vec<QuestionWithOptions>,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct TestResultModel {
    pub id: String,
    pub user_id: String,
    pub quiz_id: Option<String>,
    pub score: i64,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct UserAnswerModel {
    pub id: String,
    pub question_id: String,
    pub text_answer: Option<String>,
    pub option_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SubmissionReceipt {
    pub test_result_id: String,
    pub updated_score: i64,
}

#[derive(Debug, PartialEq, Serialize)]
pub struct DailyActivity {
    pub date: String,
    pub count: i64,
}

/// Row counts touched by one reconciliation.
#[derive(Debug, Default, PartialEq)]
pub struct ReconcileStats {
    pub questions_inserted: usize,
    pub questions_updated: usize,
    pub options_inserted: usize,
    pub options_updated: usize,
    pub options_deleted: usize,
}
