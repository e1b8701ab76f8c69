use std::collections::HashMap;

use chrono::{DateTime, Days, NaiveDate, NaiveTime, Utc};
use color_eyre::Result;

use super::models::{DailyActivity, SubmissionReceipt, TestResultModel, UserAnswerModel};
use super::{new_id, Db, StoreError, Tx};
use crate::models::Submission;

impl Db {
    /// Record one completed attempt: the TestResult, every UserAnswer row and
    /// the user's score increment commit together or not at all.
    pub async fn submit_answers(
        &self,
        user_id: &str,
        submission: &Submission,
        completed_at: DateTime<Utc>,
    ) -> Result<SubmissionReceipt> {
        if submission.total_score < 0 {
            return Err(StoreError::Invalid(format!(
                "total_score cannot be negative: {}",
                submission.total_score
            ))
            .into());
        }

        let mut tx = self.write_tx().await?;

        Self::quiz_tx(&mut tx, &submission.quiz_id).await?;

        let test_result_id = new_id();
        sqlx::query(
            "INSERT INTO test_results (id, user_id, quiz_id, score, completed_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&test_result_id)
        .bind(user_id)
        .bind(&submission.quiz_id)
        .bind(submission.total_score)
        .bind(completed_at)
        .execute(&mut *tx)
        .await?;

        let mut answer_rows = 0;
        for entry in &submission.answers {
            let question = Self::question_in_quiz_tx(&mut tx, &submission.quiz_id, &entry.question_id)
                .await?
                .ok_or_else(|| StoreError::not_found("question", &entry.question_id))?;

            if let Some(text) = &entry.text_answer {
                Self::insert_answer_tx(&mut tx, user_id, &test_result_id, &question.id, Some(text), None)
                    .await?;
                answer_rows += 1;
            }

            for option_id in &entry.option_ids {
                Self::ensure_option_of_question_tx(&mut tx, &question.id, option_id).await?;
                Self::insert_answer_tx(&mut tx, user_id, &test_result_id, &question.id, None, Some(option_id))
                    .await?;
                answer_rows += 1;
            }
        }

        let updated_score: i64 =
            sqlx::query_scalar("UPDATE users SET score = score + ? WHERE id = ? RETURNING score")
                .bind(submission.total_score)
                .bind(user_id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| StoreError::not_found("user", user_id))?;

        tx.commit().await?;

        tracing::info!(
            "answers submitted for quiz={} user={user_id}: test_result={test_result_id}, rows={answer_rows}, score=+{}",
            submission.quiz_id,
            submission.total_score
        );

        Ok(SubmissionReceipt {
            test_result_id,
            updated_score,
        })
    }

    async fn insert_answer_tx(
        tx: &mut Tx<'_>,
        user_id: &str,
        test_result_id: &str,
        question_id: &str,
        text_answer: Option<&str>,
        option_id: Option<&str>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO user_answers (id, user_id, test_result_id, question_id, text_answer, option_id)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(new_id())
        .bind(user_id)
        .bind(test_result_id)
        .bind(question_id)
        .bind(text_answer)
        .bind(option_id)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }

    async fn ensure_option_of_question_tx(
        tx: &mut Tx<'_>,
        question_id: &str,
        option_id: &str,
    ) -> Result<()> {
        let belongs: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM options WHERE id = ? AND question_id = ?)",
        )
        .bind(option_id)
        .bind(question_id)
        .fetch_one(&mut **tx)
        .await?;

        if !belongs {
            return Err(StoreError::Invalid(format!(
                "option {option_id} does not belong to question {question_id}"
            ))
            .into());
        }
        Ok(())
    }

    pub async fn tests_count(&self, user_id: &str) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM test_results WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    pub async fn test_results(&self, user_id: &str) -> Result<Vec<TestResultModel>> {
        let results = sqlx::query_as::<_, TestResultModel>(
            r#"
            SELECT id, user_id, quiz_id, score, completed_at
            FROM test_results
            WHERE user_id = ?
            ORDER BY completed_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(results)
    }

    pub async fn answers_for_result(&self, test_result_id: &str) -> Result<Vec<UserAnswerModel>> {
        let answers = sqlx::query_as::<_, UserAnswerModel>(
            "SELECT id, question_id, text_answer, option_id FROM user_answers WHERE test_result_id = ?",
        )
        .bind(test_result_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(answers)
    }

    /// Attempts per calendar day (UTC) for the `days` days ending at `today`,
    /// oldest first, with zero for days without attempts.
    pub async fn activity(
        &self,
        user_id: &str,
        today: NaiveDate,
        days: u32,
    ) -> Result<Vec<DailyActivity>> {
        let start = today
            .checked_sub_days(Days::new(u64::from(days.saturating_sub(1))))
            .ok_or_else(|| StoreError::Invalid(format!("activity window too large: {days}")))?;
        let since = start.and_time(NaiveTime::MIN).and_utc();

        let completed: Vec<DateTime<Utc>> = sqlx::query_scalar(
            "SELECT completed_at FROM test_results WHERE user_id = ? AND completed_at >= ?",
        )
        .bind(user_id)
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        let mut per_day: HashMap<NaiveDate, i64> = HashMap::new();
        for at in completed {
            *per_day.entry(at.date_naive()).or_default() += 1;
        }

        let activity = start
            .iter_days()
            .take(days as usize)
            .map(|day| DailyActivity {
                date: day.format("%Y-%m-%d").to_string(),
                count: per_day.get(&day).copied().unwrap_or(0),
            })
            .collect();

        Ok(activity)
    }
}
