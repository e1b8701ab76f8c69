use color_eyre::Result;

use super::models::{QuizDetail, QuizListItem, QuizModel, ReconcileStats};
use super::{new_id, Db, StoreError, Tx};
use crate::models::{NewQuiz, Patch, QuizPatch};
use crate::names;

impl Db {
    /// Insert a quiz with all its questions and options atomically in a transaction.
    pub async fn create_quiz(&self, quiz: &NewQuiz) -> Result<QuizModel> {
        let mut tx = self.write_tx().await?;

        Self::ensure_category_tx(&mut tx, &quiz.category_id).await?;

        let image_url = quiz
            .image_url
            .clone()
            .unwrap_or_else(|| names::DEFAULT_QUIZ_IMAGE_URL.to_string());

        let created = sqlx::query_as::<_, QuizModel>(
            r#"
            INSERT INTO quizzes (id, title, description, category_id, image_url)
            VALUES (?, ?, ?, ?, ?)
            RETURNING id, title, description, category_id, image_url
            "#,
        )
        .bind(new_id())
        .bind(&quiz.title)
        .bind(&quiz.description)
        .bind(&quiz.category_id)
        .bind(&image_url)
        .fetch_one(&mut *tx)
        .await?;

        let mut option_count = 0;
        for question in &quiz.questions {
            let (_, options) = Self::insert_question_tx(&mut tx, &created.id, question).await?;
            option_count += options;
        }

        tx.commit().await?;

        tracing::info!(
            "new quiz created with id: {}, questions: {}, options: {option_count}",
            created.id,
            quiz.questions.len()
        );
        Ok(created)
    }

    /// Merge a sparse patch into an existing quiz. Absent fields are kept,
    /// questions missing from the payload are left alone, and options are only
    /// removed through `delete_options`.
    pub async fn update_quiz(&self, quiz_id: &str, patch: QuizPatch) -> Result<QuizModel> {
        let mut tx = self.write_tx().await?;

        let mut quiz = Self::quiz_tx(&mut tx, quiz_id).await?;

        if let Some(title) = patch.title.required("title").map_err(StoreError::Invalid)? {
            quiz.title = title;
        }
        patch.description.apply_to(&mut quiz.description);
        if let Some(category_id) = patch
            .category_id
            .required("category_id")
            .map_err(StoreError::Invalid)?
        {
            Self::ensure_category_tx(&mut tx, &category_id).await?;
            quiz.category_id = category_id;
        }
        match patch.image_url {
            Patch::Absent => {}
            Patch::Null => quiz.image_url = names::DEFAULT_QUIZ_IMAGE_URL.to_string(),
            Patch::Value(url) => quiz.image_url = url,
        }

        sqlx::query(
            "UPDATE quizzes SET title = ?, description = ?, category_id = ?, image_url = ? WHERE id = ?",
        )
        .bind(&quiz.title)
        .bind(&quiz.description)
        .bind(&quiz.category_id)
        .bind(&quiz.image_url)
        .bind(&quiz.id)
        .execute(&mut *tx)
        .await?;

        let mut stats = ReconcileStats::default();
        for question_patch in patch.questions.unwrap_or_default() {
            let existing = match question_patch.target_id() {
                Some(question_id) => Self::question_in_quiz_tx(&mut tx, &quiz.id, question_id).await?,
                None => None,
            };

            match existing {
                Some(question) => {
                    Self::reconcile_question_tx(&mut tx, question, question_patch, &mut stats).await?;
                }
                None => {
                    let question = question_patch.into_new().map_err(StoreError::Invalid)?;
                    let (_, options) = Self::insert_question_tx(&mut tx, &quiz.id, &question).await?;
                    stats.questions_inserted += 1;
                    stats.options_inserted += options;
                }
            }
        }

        tx.commit().await?;

        tracing::info!("quiz updated with id: {}: {stats:?}", quiz.id);
        Ok(quiz)
    }

    /// Delete a quiz together with its questions, their options and the user
    /// answers pointing at them. Attempt records and scores are kept.
    pub async fn delete_quiz(&self, quiz_id: &str) -> Result<()> {
        let mut tx = self.write_tx().await?;

        Self::quiz_tx(&mut tx, quiz_id).await?;

        sqlx::query("DELETE FROM quizzes WHERE id = ?")
            .bind(quiz_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!("quiz deleted with id: {quiz_id}");
        Ok(())
    }

    pub async fn quiz(&self, quiz_id: &str) -> Result<QuizModel> {
        sqlx::query_as::<_, QuizModel>(
            "SELECT id, title, description, category_id, image_url FROM quizzes WHERE id = ?",
        )
        .bind(quiz_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::not_found("quiz", quiz_id).into())
    }

    pub async fn quiz_detail(&self, quiz_id: &str) -> Result<QuizDetail> {
        let quiz = self.quiz(quiz_id).await?;
        let questions = self.questions_with_options(quiz_id).await?;
        Ok(QuizDetail { quiz, questions })
    }

    /// Page through quizzes joined with their category name. Returns the page
    /// and the total number of quizzes.
    pub async fn quizzes(&self, skip: i64, limit: i64) -> Result<(Vec<QuizListItem>, i64)> {
        let quizzes = sqlx::query_as::<_, QuizListItem>(
            r#"
            SELECT
              quizzes.id AS id,
              quizzes.title AS title,
              quizzes.description AS description,
              quizzes.category_id AS category_id,
              categories.name AS category_name
            FROM
              quizzes
              JOIN categories ON categories.id = quizzes.category_id
            ORDER BY
              quizzes.id
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(limit)
        .bind(skip)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM quizzes")
            .fetch_one(&self.pool)
            .await?;

        Ok((quizzes, total))
    }

    pub(super) async fn quiz_tx(tx: &mut Tx<'_>, quiz_id: &str) -> Result<QuizModel> {
        sqlx::query_as::<_, QuizModel>(
            "SELECT id, title, description, category_id, image_url FROM quizzes WHERE id = ?",
        )
        .bind(quiz_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| StoreError::not_found("quiz", quiz_id).into())
    }
}
