mod common;

use chrono::{Duration, NaiveDate, TimeZone, Utc};
use quizmaker::db::models::QuizModel;
use quizmaker::db::{Db, StoreError};
use quizmaker::models::{AnswerEntry, QuestionType, Submission};

struct Fixture {
    db: Db,
    user_id: String,
    quiz: QuizModel,
    multiple_id: String,
    multiple_options: Vec<String>,
    text_id: String,
}

async fn fixture() -> Fixture {
    let db = common::create_test_db().await;
    let category = common::create_category(&db).await;
    let user_id = common::create_user(&db, "student").await;

    let mut text = common::single_question(&[], 0);
    text.question_type = QuestionType::TextAnswer;
    text.options.clear();

    let quiz = db
        .create_quiz(&common::new_quiz(
            &category.id,
            vec![common::multiple_question(&["o1", "o2", "o3"]), text],
        ))
        .await
        .unwrap();
    let detail = db.quiz_detail(&quiz.id).await.unwrap();

    Fixture {
        user_id,
        quiz,
        multiple_id: detail.questions[0].question.id.clone(),
        multiple_options: detail.questions[0]
            .options
            .iter()
            .map(|o| o.id.clone())
            .collect(),
        text_id: detail.questions[1].question.id.clone(),
        db,
    }
}

async fn set_score(db: &Db, user_id: &str, score: i64) {
    sqlx::query("UPDATE users SET score = ? WHERE id = ?")
        .bind(score)
        .bind(user_id)
        .execute(db.pool())
        .await
        .unwrap();
}

fn submission(quiz_id: &str, answers: Vec<AnswerEntry>, total_score: i64) -> Submission {
    Submission {
        quiz_id: quiz_id.to_string(),
        answers,
        total_score,
    }
}

fn option_answer(question_id: &str, option_ids: &[String]) -> AnswerEntry {
    AnswerEntry {
        question_id: question_id.to_string(),
        option_ids: option_ids.to_vec(),
        text_answer: None,
    }
}

// ---------------------------------------------------------------------------
// Submission
// ---------------------------------------------------------------------------

#[tokio::test]
async fn submission_records_result_answers_and_score() {
    let f = fixture().await;
    set_score(&f.db, &f.user_id, 10).await;

    let chosen = f.multiple_options[..2].to_vec();
    let receipt = f
        .db
        .submit_answers(
            &f.user_id,
            &submission(&f.quiz.id, vec![option_answer(&f.multiple_id, &chosen)], 5),
            Utc::now(),
        )
        .await
        .unwrap();

    assert_eq!(receipt.updated_score, 15);
    assert_eq!(f.db.user(&f.user_id).await.unwrap().score, 15);

    let results = f.db.test_results(&f.user_id).await.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].score, 5);
    assert_eq!(results[0].id, receipt.test_result_id);
    assert_eq!(results[0].quiz_id.as_deref(), Some(f.quiz.id.as_str()));

    let answers = f.db.answers_for_result(&receipt.test_result_id).await.unwrap();
    assert_eq!(answers.len(), 2);
    assert!(answers.iter().all(|a| a.text_answer.is_none()));
    let mut option_ids: Vec<String> = answers.iter().filter_map(|a| a.option_id.clone()).collect();
    option_ids.sort();
    let mut expected = chosen.clone();
    expected.sort();
    assert_eq!(option_ids, expected);
}

#[tokio::test]
async fn text_answer_is_stored_without_option() {
    let f = fixture().await;

    let entry = AnswerEntry {
        question_id: f.text_id.clone(),
        option_ids: vec![],
        text_answer: Some("Because".to_string()),
    };
    let receipt = f
        .db
        .submit_answers(&f.user_id, &submission(&f.quiz.id, vec![entry], 0), Utc::now())
        .await
        .unwrap();

    let answers = f.db.answers_for_result(&receipt.test_result_id).await.unwrap();
    assert_eq!(answers.len(), 1);
    assert_eq!(answers[0].text_answer.as_deref(), Some("Because"));
    assert!(answers[0].option_id.is_none());
    assert_eq!(receipt.updated_score, 0);
}

#[tokio::test]
async fn foreign_option_rolls_back_the_whole_submission() {
    let f = fixture().await;
    set_score(&f.db, &f.user_id, 10).await;

    let answers = vec![
        option_answer(&f.multiple_id, &f.multiple_options[..1]),
        option_answer(&f.text_id, &f.multiple_options[1..2]),
    ];
    let err = f
        .db
        .submit_answers(&f.user_id, &submission(&f.quiz.id, answers, 5), Utc::now())
        .await
        .unwrap_err();

    assert!(matches!(err.downcast_ref::<StoreError>(), Some(StoreError::Invalid(_))));
    assert_eq!(common::count(&f.db, "test_results").await, 0);
    assert_eq!(common::count(&f.db, "user_answers").await, 0);
    assert_eq!(f.db.user(&f.user_id).await.unwrap().score, 10);
}

#[tokio::test]
async fn missing_quiz_or_question_is_not_found() {
    let f = fixture().await;

    let err = f
        .db
        .submit_answers(&f.user_id, &submission("missing", vec![], 1), Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(err.downcast_ref::<StoreError>(), Some(StoreError::NotFound { .. })));

    let answers = vec![option_answer("missing", &[])];
    let err = f
        .db
        .submit_answers(&f.user_id, &submission(&f.quiz.id, answers, 1), Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(err.downcast_ref::<StoreError>(), Some(StoreError::NotFound { .. })));
    assert_eq!(common::count(&f.db, "test_results").await, 0);
}

#[tokio::test]
async fn negative_score_is_rejected() {
    let f = fixture().await;

    let err = f
        .db
        .submit_answers(&f.user_id, &submission(&f.quiz.id, vec![], -3), Utc::now())
        .await
        .unwrap_err();

    assert!(matches!(err.downcast_ref::<StoreError>(), Some(StoreError::Invalid(_))));
    assert_eq!(f.db.tests_count(&f.user_id).await.unwrap(), 0);
}

#[tokio::test]
async fn deleting_a_quiz_keeps_results_and_score() {
    let f = fixture().await;

    f.db.submit_answers(
        &f.user_id,
        &submission(
            &f.quiz.id,
            vec![option_answer(&f.multiple_id, &f.multiple_options[..1])],
            7,
        ),
        Utc::now(),
    )
    .await
    .unwrap();

    f.db.delete_quiz(&f.quiz.id).await.unwrap();

    assert_eq!(common::count(&f.db, "user_answers").await, 0);
    let results = f.db.test_results(&f.user_id).await.unwrap();
    assert_eq!(results.len(), 1);
    assert!(results[0].quiz_id.is_none());
    assert_eq!(f.db.user(&f.user_id).await.unwrap().score, 7);
}

// ---------------------------------------------------------------------------
// Activity
// ---------------------------------------------------------------------------

#[tokio::test]
async fn activity_counts_one_attempt_on_its_day() {
    let f = fixture().await;
    let today = NaiveDate::from_ymd_opt(2024, 5, 20).unwrap();
    let day = NaiveDate::from_ymd_opt(2024, 5, 10).unwrap();
    let completed_at = Utc.from_utc_datetime(&day.and_hms_opt(15, 30, 0).unwrap());

    f.db.submit_answers(&f.user_id, &submission(&f.quiz.id, vec![], 1), completed_at)
        .await
        .unwrap();

    let activity = f.db.activity(&f.user_id, today, 90).await.unwrap();

    assert_eq!(activity.len(), 90);
    assert_eq!(activity.first().unwrap().date, "2024-02-21");
    assert_eq!(activity.last().unwrap().date, "2024-05-20");
    for entry in &activity {
        let expected = if entry.date == "2024-05-10" { 1 } else { 0 };
        assert_eq!(entry.count, expected, "unexpected count on {}", entry.date);
    }
}

#[tokio::test]
async fn activity_ignores_attempts_outside_the_window_and_other_users() {
    let f = fixture().await;
    let other = common::create_user(&f.db, "someone-else").await;
    let today = NaiveDate::from_ymd_opt(2024, 5, 20).unwrap();
    let now = Utc.from_utc_datetime(&today.and_hms_opt(12, 0, 0).unwrap());

    f.db.submit_answers(&f.user_id, &submission(&f.quiz.id, vec![], 1), now - Duration::days(90))
        .await
        .unwrap();
    f.db.submit_answers(&other, &submission(&f.quiz.id, vec![], 1), now)
        .await
        .unwrap();
    f.db.submit_answers(&f.user_id, &submission(&f.quiz.id, vec![], 1), now)
        .await
        .unwrap();
    f.db.submit_answers(&f.user_id, &submission(&f.quiz.id, vec![], 1), now)
        .await
        .unwrap();

    let activity = f.db.activity(&f.user_id, today, 90).await.unwrap();

    assert_eq!(activity.iter().map(|d| d.count).sum::<i64>(), 2);
    assert_eq!(activity.last().unwrap().count, 2);
    assert_eq!(f.db.tests_count(&f.user_id).await.unwrap(), 3);
}
