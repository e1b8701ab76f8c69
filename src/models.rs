use serde::{Deserialize, Deserializer, Serialize};

use crate::names;

/// A field of an update payload: left out, explicitly `null`, or set.
#[derive(Debug, Clone, PartialEq)]
pub enum Patch<T> {
    Absent,
    Null,
    Value(T),
}

impl<T> Default for Patch<T> {
    fn default() -> Self {
        Patch::Absent
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Patch<T> {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        // Absent fields never reach here; they take `#[serde(default)]`.
        Ok(match Option::<T>::deserialize(d)? {
            Some(v) => Patch::Value(v),
            None => Patch::Null,
        })
    }
}

impl<T> Patch<T> {
    pub fn is_absent(&self) -> bool {
        matches!(self, Patch::Absent)
    }

    /// For fields that cannot be cleared: `null` is rejected.
    pub fn required(self, field: &str) -> Result<Option<T>, String> {
        match self {
            Patch::Absent => Ok(None),
            Patch::Null => Err(format!("{field} cannot be null")),
            Patch::Value(v) => Ok(Some(v)),
        }
    }

    /// Applies the patch to a clearable field.
    pub fn apply_to(self, slot: &mut Option<T>) {
        match self {
            Patch::Absent => {}
            Patch::Null => *slot = None,
            Patch::Value(v) => *slot = Some(v),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuestionType {
    Single,
    Multiple,
    TextAnswer,
}

impl QuestionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::Single => "SINGLE",
            QuestionType::Multiple => "MULTIPLE",
            QuestionType::TextAnswer => "TEXT_ANSWER",
        }
    }

    /// Checks an option set against the rules of this question type.
    pub fn check_options(&self, total: usize, correct: usize) -> Result<(), String> {
        let rule = match self {
            QuestionType::Single if correct != 1 => "exactly one correct option",
            QuestionType::Multiple if correct == 0 => "at least one correct option",
            QuestionType::TextAnswer if total > 0 => "no options",
            _ => return Ok(()),
        };
        Err(format!(
            "{} question needs {rule}, got {correct} correct of {total}",
            self.as_str()
        ))
    }
}

fn default_points() -> i64 {
    names::DEFAULT_POINTS
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewQuiz {
    pub title: String,
    pub description: Option<String>,
    pub category_id: String,
    pub image_url: Option<String>,
    #[serde(default)]
    pub questions: Vec<NewQuestion>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewQuestion {
    pub question_type: QuestionType,
    #[serde(default = "default_points")]
    pub points: i64,
    pub question: Option<String>,
    pub image_url: Option<String>,
    #[serde(default)]
    pub options: Vec<NewOption>,
}

impl NewQuestion {
    pub fn check(&self) -> Result<(), String> {
        if self.points < 0 {
            return Err(format!("points cannot be negative: {}", self.points));
        }
        let correct = self.options.iter().filter(|o| o.is_correct).count();
        self.question_type.check_options(self.options.len(), correct)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewOption {
    pub name: String,
    #[serde(default)]
    pub is_correct: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct QuizPatch {
    #[serde(default)]
    pub title: Patch<String>,
    #[serde(default)]
    pub description: Patch<String>,
    #[serde(default)]
    pub category_id: Patch<String>,
    #[serde(default)]
    pub image_url: Patch<String>,
    pub questions: Option<Vec<QuestionPatch>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct QuestionPatch {
    pub id: Option<String>,
    #[serde(default)]
    pub question_type: Patch<QuestionType>,
    #[serde(default)]
    pub points: Patch<i64>,
    #[serde(default)]
    pub question: Patch<String>,
    #[serde(default)]
    pub image_url: Patch<String>,
    #[serde(default)]
    pub options: Vec<OptionPatch>,
    #[serde(default)]
    pub delete_options: Vec<String>,
}

impl QuestionPatch {
    /// The id, if it is present and non-empty.
    pub fn target_id(&self) -> Option<&str> {
        self.id.as_deref().filter(|id| !id.is_empty())
    }

    /// Turns a patch that matched no existing question into a brand-new question.
    pub fn into_new(self) -> Result<NewQuestion, String> {
        let question_type = self
            .question_type
            .required("question_type")?
            .ok_or("question_type is required for a new question")?;
        let points = self.points.required("points")?.unwrap_or(names::DEFAULT_POINTS);
        let mut question = None;
        self.question.apply_to(&mut question);
        let mut image_url = None;
        self.image_url.apply_to(&mut image_url);

        let options = self
            .options
            .into_iter()
            .map(OptionPatch::into_new)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(NewQuestion {
            question_type,
            points,
            question,
            image_url,
            options,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct OptionPatch {
    pub id: Option<String>,
    #[serde(default)]
    pub name: Patch<String>,
    #[serde(default)]
    pub is_correct: Patch<bool>,
}

impl OptionPatch {
    pub fn target_id(&self) -> Option<&str> {
        self.id.as_deref().filter(|id| !id.is_empty())
    }

    pub fn into_new(self) -> Result<NewOption, String> {
        let name = self
            .name
            .required("option name")?
            .ok_or("option name is required for a new option")?;
        let is_correct = self.is_correct.required("is_correct")?.unwrap_or(false);
        Ok(NewOption { name, is_correct })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnswerEntry {
    pub question_id: String,
    #[serde(default)]
    pub option_ids: Vec<String>,
    pub text_answer: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Submission {
    pub quiz_id: String,
    pub answers: Vec<AnswerEntry>,
    #[serde(default)]
    pub total_score: i64,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProfilePatch {
    pub name: Option<String>,
    pub surname: Option<String>,
    pub password: Option<String>,
}
