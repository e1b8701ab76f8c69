#![allow(dead_code)]

use std::time::Duration;

use quizmaker::db::models::Category;
use quizmaker::db::Db;
use quizmaker::models::{NewOption, NewQuestion, NewQuiz, QuestionType};
use quizmaker::services::generator::{GeneratorService, GroqClient};
use quizmaker::AppState;

pub async fn create_test_db() -> Db {
    use std::sync::atomic::{AtomicU32, Ordering};
    static COUNTER: AtomicU32 = AtomicU32::new(0);
    let id = COUNTER.fetch_add(1, Ordering::SeqCst);
    let path =
        std::env::temp_dir().join(format!("quizmaker_test_{}_{}.db", std::process::id(), id));
    // Clean up leftover file from previous runs
    let _ = std::fs::remove_file(&path);
    let url = format!("sqlite:{}", path.display());
    Db::new(&url).await.expect("failed to create test database")
}

/// App state whose generator points at a closed local port.
pub fn test_state(db: Db) -> AppState {
    let generator = GeneratorService::new(
        GroqClient::new(
            String::new(),
            "test-model".to_string(),
            "http://127.0.0.1:9/v1/chat/completions".to_string(),
        ),
        Duration::from_secs(1),
    );
    AppState::new(db, generator)
}

pub async fn create_category(db: &Db) -> Category {
    db.create_category("Science")
        .await
        .expect("create category")
}

pub async fn create_user(db: &Db, login: &str) -> String {
    db.create_user(login, "secret", Some("Test"), None)
        .await
        .expect("create user")
}

pub async fn count(db: &Db, table: &str) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(db.pool())
        .await
        .expect("count rows")
}

pub fn single_question(labels: &[&str], correct: usize) -> NewQuestion {
    NewQuestion {
        question_type: QuestionType::Single,
        points: 10,
        question: Some("Pick one".to_string()),
        image_url: None,
        options: labels
            .iter()
            .enumerate()
            .map(|(i, name)| NewOption {
                name: name.to_string(),
                is_correct: i == correct,
            })
            .collect(),
    }
}

pub fn multiple_question(labels: &[&str]) -> NewQuestion {
    NewQuestion {
        question_type: QuestionType::Multiple,
        points: 20,
        question: Some("Pick all".to_string()),
        image_url: None,
        options: labels
            .iter()
            .map(|name| NewOption {
                name: name.to_string(),
                is_correct: true,
            })
            .collect(),
    }
}

pub fn new_quiz(category_id: &str, questions: Vec<NewQuestion>) -> NewQuiz {
    NewQuiz {
        title: "Physics".to_string(),
        description: Some("Basics".to_string()),
        category_id: category_id.to_string(),
        image_url: None,
        questions,
    }
}

/// Makes every insert of an option named `boom` fail.
pub async fn install_option_fault(db: &Db) {
    sqlx::query(
        r#"
        CREATE TRIGGER fail_boom_option BEFORE INSERT ON options
        WHEN NEW.name = 'boom'
        BEGIN
            SELECT RAISE(ABORT, 'injected failure');
        END
        "#,
    )
    .execute(db.pool())
    .await
    .expect("install trigger");
}
