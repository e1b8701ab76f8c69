use color_eyre::Result;

use super::models::{OptionModel, QuestionModel, QuestionWithOptions, ReconcileStats};
use super::{new_id, Db, StoreError, Tx};
use crate::models::{NewOption, NewQuestion, QuestionPatch, QuestionType};

impl Db {
    pub async fn questions_with_options(&self, quiz_id: &str) -> Result<Vec<QuestionWithOptions>> {
        let questions = sqlx::query_as::<_, QuestionModel>(
            r#"
            SELECT id, question_type, quiz_id, points, question, image_url
            FROM questions
            WHERE quiz_id = ?
            ORDER BY position, id
            "#,
        )
        .bind(quiz_id)
        .fetch_all(&self.pool)
        .await?;

        let mut result = Vec::with_capacity(questions.len());
        for question in questions {
            let options = self.options(&question.id).await?;
            result.push(QuestionWithOptions { question, options });
        }

        Ok(result)
    }

    pub async fn options(&self, question_id: &str) -> Result<Vec<OptionModel>> {
        let options = sqlx::query_as::<_, OptionModel>(
            "SELECT id, question_id, name, is_correct FROM options WHERE question_id = ? ORDER BY position, id",
        )
        .bind(question_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(options)
    }

    /// Insert a question and all of its options. Returns the new question id
    /// and the number of options written.
    pub(super) async fn insert_question_tx(
        tx: &mut Tx<'_>,
        quiz_id: &str,
        question: &NewQuestion,
    ) -> Result<(String, usize)> {
        question.check().map_err(StoreError::Invalid)?;

        let question_id = new_id();
        let position: i64 = sqlx::query_scalar(
            "SELECT COALESCE(MAX(position), -1) + 1 FROM questions WHERE quiz_id = ?",
        )
        .bind(quiz_id)
        .fetch_one(&mut **tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO questions (id, question_type, quiz_id, points, question, image_url, position)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&question_id)
        .bind(question.question_type)
        .bind(quiz_id)
        .bind(question.points)
        .bind(&question.question)
        .bind(&question.image_url)
        .bind(position)
        .execute(&mut **tx)
        .await?;

        for option in &question.options {
            Self::insert_option_tx(tx, &question_id, option).await?;
        }

        Ok((question_id, question.options.len()))
    }

    pub(super) async fn insert_option_tx(
        tx: &mut Tx<'_>,
        question_id: &str,
        option: &NewOption,
    ) -> Result<String> {
        let option_id = new_id();

        sqlx::query(
            r#"
            INSERT INTO options (id, question_id, name, is_correct, position)
            SELECT ?, ?, ?, ?, COALESCE(MAX(position), -1) + 1 FROM options WHERE question_id = ?
            "#,
        )
        .bind(&option_id)
        .bind(question_id)
        .bind(&option.name)
        .bind(option.is_correct)
        .bind(question_id)
        .execute(&mut **tx)
        .await?;

        Ok(option_id)
    }

    /// A question matches only when it belongs to the quiz being updated.
    pub(super) async fn question_in_quiz_tx(
        tx: &mut Tx<'_>,
        quiz_id: &str,
        question_id: &str,
    ) -> Result<Option<QuestionModel>> {
        let question = sqlx::query_as::<_, QuestionModel>(
            r#"
            SELECT id, question_type, quiz_id, points, question, image_url
            FROM questions
            WHERE id = ? AND quiz_id = ?
            "#,
        )
        .bind(question_id)
        .bind(quiz_id)
        .fetch_optional(&mut **tx)
        .await?;

        Ok(question)
    }

    async fn option_in_question_tx(
        tx: &mut Tx<'_>,
        question_id: &str,
        option_id: &str,
    ) -> Result<Option<OptionModel>> {
        let option = sqlx::query_as::<_, OptionModel>(
            "SELECT id, question_id, name, is_correct FROM options WHERE id = ? AND question_id = ?",
        )
        .bind(option_id)
        .bind(question_id)
        .fetch_optional(&mut **tx)
        .await?;

        Ok(option)
    }

    /// Apply a patch to an existing question: scalar fields first, then option
    /// upserts, then `delete_options`. The final option set must satisfy the
    /// question type.
    pub(super) async fn reconcile_question_tx(
        tx: &mut Tx<'_>,
        mut current: QuestionModel,
        patch: QuestionPatch,
        stats: &mut ReconcileStats,
    ) -> Result<()> {
        let QuestionPatch {
            question_type,
            points,
            question,
            image_url,
            options,
            delete_options,
            ..
        } = patch;

        if let Some(question_type) = question_type
            .required("question_type")
            .map_err(StoreError::Invalid)?
        {
            current.question_type = question_type;
        }
        if let Some(points) = points.required("points").map_err(StoreError::Invalid)? {
            if points < 0 {
                return Err(StoreError::Invalid(format!("points cannot be negative: {points}")).into());
            }
            current.points = points;
        }
        question.apply_to(&mut current.question);
        image_url.apply_to(&mut current.image_url);

        sqlx::query(
            "UPDATE questions SET question_type = ?, points = ?, question = ?, image_url = ? WHERE id = ?",
        )
        .bind(current.question_type)
        .bind(current.points)
        .bind(&current.question)
        .bind(&current.image_url)
        .bind(&current.id)
        .execute(&mut **tx)
        .await?;
        stats.questions_updated += 1;

        for option_patch in options {
            let existing = match option_patch.target_id() {
                Some(option_id) => Self::option_in_question_tx(tx, &current.id, option_id).await?,
                None => None,
            };

            match existing {
                Some(mut option) => {
                    if let Some(name) = option_patch
                        .name
                        .required("option name")
                        .map_err(StoreError::Invalid)?
                    {
                        option.name = name;
                    }
                    if let Some(is_correct) = option_patch
                        .is_correct
                        .required("is_correct")
                        .map_err(StoreError::Invalid)?
                    {
                        option.is_correct = is_correct;
                    }

                    sqlx::query("UPDATE options SET name = ?, is_correct = ? WHERE id = ?")
                        .bind(&option.name)
                        .bind(option.is_correct)
                        .bind(&option.id)
                        .execute(&mut **tx)
                        .await?;
                    stats.options_updated += 1;
                }
                None => {
                    let option = option_patch.into_new().map_err(StoreError::Invalid)?;
                    Self::insert_option_tx(tx, &current.id, &option).await?;
                    stats.options_inserted += 1;
                }
            }
        }

        for option_id in &delete_options {
            let result = sqlx::query("DELETE FROM options WHERE id = ? AND question_id = ?")
                .bind(option_id)
                .bind(&current.id)
                .execute(&mut **tx)
                .await?;
            stats.options_deleted += result.rows_affected() as usize;
        }

        Self::check_question_options_tx(tx, &current.id, current.question_type).await
    }

    async fn check_question_options_tx(
        tx: &mut Tx<'_>,
        question_id: &str,
        question_type: QuestionType,
    ) -> Result<()> {
        let (total, correct): (i64, i64) = sqlx::query_as(
            r#"
            SELECT COUNT(*), COALESCE(SUM(CASE WHEN is_correct THEN 1 ELSE 0 END), 0)
            FROM options
            WHERE question_id = ?
            "#,
        )
        .bind(question_id)
        .fetch_one(&mut **tx)
        .await?;

        question_type
            .check_options(total as usize, correct as usize)
            .map_err(|e| StoreError::Invalid(format!("question {question_id}: {e}")).into())
    }
}
