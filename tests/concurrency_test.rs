mod common;

use chrono::Utc;
use quizmaker::models::{AnswerEntry, Submission};
use tokio::task::JoinSet;

const CREATES: usize = 20;
const SUBMISSIONS: i64 = 20;
const DELETES: usize = 10;

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_writes_on_different_quizzes_all_succeed() {
    let db = common::create_test_db().await;
    let category = common::create_category(&db).await;
    let user_id = common::create_user(&db, "busy").await;

    let answered = db
        .create_quiz(&common::new_quiz(
            &category.id,
            vec![common::multiple_question(&["A", "B", "C"])],
        ))
        .await
        .unwrap();
    let question = db.quiz_detail(&answered.id).await.unwrap().questions.remove(0);
    let question_id = question.question.id.clone();
    let option_id = question.options[0].id.clone();

    let mut doomed = Vec::with_capacity(DELETES);
    for _ in 0..DELETES {
        let quiz = db
            .create_quiz(&common::new_quiz(
                &category.id,
                vec![common::single_question(&["X", "Y"], 0)],
            ))
            .await
            .unwrap();
        doomed.push(quiz.id);
    }

    let mut tasks = JoinSet::new();

    for _ in 0..CREATES {
        let db = db.clone();
        let quiz = common::new_quiz(
            &category.id,
            vec![
                common::single_question(&["A", "B", "C"], 0),
                common::single_question(&["D", "E", "F"], 2),
            ],
        );
        tasks.spawn(async move { db.create_quiz(&quiz).await.map(|_| ()) });
    }

    for score in 1..=SUBMISSIONS {
        let db = db.clone();
        let user_id = user_id.clone();
        let submission = Submission {
            quiz_id: answered.id.clone(),
            answers: vec![AnswerEntry {
                question_id: question_id.clone(),
                option_ids: vec![option_id.clone()],
                text_answer: None,
            }],
            total_score: score,
        };
        tasks.spawn(async move {
            db.submit_answers(&user_id, &submission, Utc::now())
                .await
                .map(|_| ())
        });
    }

    for quiz_id in doomed {
        let db = db.clone();
        tasks.spawn(async move { db.delete_quiz(&quiz_id).await });
    }

    let mut failures = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        if let Err(e) = joined.expect("task should not panic") {
            failures.push(e.to_string());
        }
    }
    assert!(failures.is_empty(), "concurrent writes failed: {failures:?}");

    assert_eq!(common::count(&db, "quizzes").await, 1 + CREATES as i64);
    assert_eq!(common::count(&db, "questions").await, 1 + 2 * CREATES as i64);
    assert_eq!(common::count(&db, "options").await, 3 + 6 * CREATES as i64);
    assert_eq!(common::count(&db, "test_results").await, SUBMISSIONS);
    assert_eq!(common::count(&db, "user_answers").await, SUBMISSIONS);

    let expected_score: i64 = (1..=SUBMISSIONS).sum();
    assert_eq!(db.user(&user_id).await.unwrap().score, expected_score);
    let recorded: i64 = sqlx::query_scalar("SELECT SUM(score) FROM test_results WHERE user_id = ?")
        .bind(&user_id)
        .fetch_one(db.pool())
        .await
        .unwrap();
    assert_eq!(recorded, expected_score);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_updates_on_different_quizzes_all_succeed() {
    let db = common::create_test_db().await;
    let category = common::create_category(&db).await;

    let mut ids = Vec::new();
    for _ in 0..10 {
        let quiz = db
            .create_quiz(&common::new_quiz(
                &category.id,
                vec![common::single_question(&["A", "B"], 0)],
            ))
            .await
            .unwrap();
        ids.push(quiz.id);
    }

    let mut tasks = JoinSet::new();
    for (i, quiz_id) in ids.iter().cloned().enumerate() {
        let db = db.clone();
        tasks.spawn(async move {
            let patch = serde_json::from_value(serde_json::json!({
                "title": format!("Renamed {i}"),
                "questions": [{"question_type": "TEXT_ANSWER", "question": "Why?"}]
            }))
            .expect("valid patch json");
            db.update_quiz(&quiz_id, patch).await.map(|_| ())
        });
    }

    while let Some(joined) = tasks.join_next().await {
        joined.expect("task should not panic").unwrap();
    }

    assert_eq!(common::count(&db, "questions").await, 20);
    for (i, quiz_id) in ids.iter().enumerate() {
        assert_eq!(db.quiz(quiz_id).await.unwrap().title, format!("Renamed {i}"));
    }
}
