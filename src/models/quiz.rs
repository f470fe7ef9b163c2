// src/models/quiz.rs

use serde::{Deserialize, Serialize};
use sqlx::{prelude::FromRow, types::Json};
use uuid::Uuid;
use validator::Validate;

pub const QUIZ_DRAFT: &str = "Draft";
pub const QUIZ_PUBLISHED: &str = "Published";
pub const QUIZ_CLOSED: &str = "Closed";

pub const ASSESSMENT_TYPES: [&str; 4] = ["ISA1", "ISA2", "ESA", "Other"];
pub const DIFFICULTIES: [&str; 3] = ["Easy", "Medium", "Hard"];

/// Number of options every question carries.
pub const OPTIONS_PER_QUESTION: usize = 4;

/// Position of a quiz status on the Draft -> Published -> Closed ladder.
/// Returns None for unknown status strings.
pub fn status_rank(status: &str) -> Option<u8> {
    match status {
        QUIZ_DRAFT => Some(0),
        QUIZ_PUBLISHED => Some(1),
        QUIZ_CLOSED => Some(2),
        _ => None,
    }
}

/// Represents the 'quizzes' table in the database.
/// Questions are embedded as a JSON array, mirroring the document layout
/// the frontend expects.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quiz {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub subject: String,
    pub branch: String,
    pub semester: i64,
    pub due_date: chrono::DateTime<chrono::Utc>,
    pub total_marks: i64,

    /// Attempt duration in minutes.
    pub duration: i64,

    /// 'ISA1', 'ISA2', 'ESA' or 'Other'.
    pub assessment_type: String,

    /// 'Draft', 'Published' or 'Closed'. Transitions are monotonic.
    pub status: String,

    pub questions: Json<Vec<Question>>,

    /// Faculty user id of the author.
    pub created_by: i64,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// A single multiple-choice question embedded in a quiz.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: Uuid,
    pub text: String,
    pub options: Vec<QuestionOption>,

    /// Text of the correct option, kept alongside the option flag for
    /// display in result breakdowns. Scoring compares option ids.
    pub correct_answer: String,

    pub marks: i64,

    /// 'Easy', 'Medium' or 'Hard'.
    pub difficulty: String,
}

impl Question {
    /// Id of the option flagged correct, if the invariant holds.
    pub fn correct_option_id(&self) -> Option<i64> {
        self.options.iter().find(|o| o.is_correct).map(|o| o.id)
    }
}

/// An answer option. Ids are stable small integers (1..=4) so that stored
/// answers survive later edits to option wording.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionOption {
    pub id: i64,
    pub text: String,
    pub is_correct: bool,
}

/// Quiz shape sent to students: no correctness data.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicQuiz {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub subject: String,
    pub branch: String,
    pub semester: i64,
    pub due_date: chrono::DateTime<chrono::Utc>,
    pub total_marks: i64,
    pub duration: i64,
    pub assessment_type: String,
    pub status: String,
    pub questions: Vec<PublicQuestion>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicQuestion {
    pub id: Uuid,
    pub text: String,
    pub options: Vec<PublicOption>,
    pub marks: i64,
    pub difficulty: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicOption {
    pub id: i64,
    pub text: String,
}

impl From<&Quiz> for PublicQuiz {
    fn from(quiz: &Quiz) -> Self {
        PublicQuiz {
            id: quiz.id,
            title: quiz.title.clone(),
            description: quiz.description.clone(),
            subject: quiz.subject.clone(),
            branch: quiz.branch.clone(),
            semester: quiz.semester,
            due_date: quiz.due_date,
            total_marks: quiz.total_marks,
            duration: quiz.duration,
            assessment_type: quiz.assessment_type.clone(),
            status: quiz.status.clone(),
            questions: quiz
                .questions
                .iter()
                .map(|q| PublicQuestion {
                    id: q.id,
                    text: q.text.clone(),
                    options: q
                        .options
                        .iter()
                        .map(|o| PublicOption {
                            id: o.id,
                            text: o.text.clone(),
                        })
                        .collect(),
                    marks: q.marks,
                    difficulty: q.difficulty.clone(),
                })
                .collect(),
        }
    }
}

/// DTO for authoring a question. The server assigns option ids positionally
/// and derives `correct_answer` from the flagged option, so clients cannot
/// desynchronize the two.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionInput {
    /// Present when editing an existing question, absent for new ones.
    pub id: Option<Uuid>,
    pub text: String,
    pub options: Vec<OptionInput>,
    pub marks: i64,
    pub difficulty: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionInput {
    pub text: String,
    pub is_correct: bool,
}

impl QuestionInput {
    /// Validates the input and builds the embedded question form.
    pub fn into_question(self) -> Result<Question, String> {
        if self.text.trim().is_empty() {
            return Err("Question text cannot be empty".to_string());
        }
        if self.options.len() != OPTIONS_PER_QUESTION {
            return Err(format!(
                "Each question must have exactly {} options",
                OPTIONS_PER_QUESTION
            ));
        }
        if self.options.iter().any(|o| o.text.trim().is_empty()) {
            return Err("Option text cannot be empty".to_string());
        }
        let correct_count = self.options.iter().filter(|o| o.is_correct).count();
        if correct_count != 1 {
            return Err("Exactly one option must be marked correct".to_string());
        }
        if self.marks <= 0 {
            return Err("Question marks must be positive".to_string());
        }
        if !DIFFICULTIES.contains(&self.difficulty.as_str()) {
            return Err(format!("Unknown difficulty '{}'", self.difficulty));
        }

        let options: Vec<QuestionOption> = self
            .options
            .into_iter()
            .enumerate()
            .map(|(i, o)| QuestionOption {
                id: (i + 1) as i64,
                text: o.text,
                is_correct: o.is_correct,
            })
            .collect();

        let correct_answer = options
            .iter()
            .find(|o| o.is_correct)
            .map(|o| o.text.clone())
            .unwrap_or_default();

        Ok(Question {
            id: self.id.unwrap_or_else(Uuid::new_v4),
            text: self.text,
            options,
            correct_answer,
            marks: self.marks,
            difficulty: self.difficulty,
        })
    }
}

/// Builds and validates a full question list from authoring input.
pub fn build_questions(inputs: Vec<QuestionInput>) -> Result<Vec<Question>, String> {
    inputs.into_iter().map(|q| q.into_question()).collect()
}

/// DTO for creating a quiz. Starts in Draft unless questions and an explicit
/// 'Published' status are provided together.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateQuizRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(max = 2000))]
    pub description: String,
    #[validate(length(min = 1, max = 100))]
    pub subject: String,
    #[validate(length(min = 1, max = 100))]
    pub branch: String,
    #[validate(range(min = 1, max = 8))]
    pub semester: i64,
    pub due_date: chrono::DateTime<chrono::Utc>,
    #[validate(range(min = 1))]
    pub total_marks: i64,
    #[validate(range(min = 1, max = 600))]
    pub duration: i64,
    pub assessment_type: String,
    pub status: Option<String>,
    pub questions: Option<Vec<QuestionInput>>,
}

/// DTO for updating a quiz. Fields are optional; a provided questions array
/// replaces the embedded list wholesale (add/edit/delete are id-indexed
/// array mutations on the client side).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateQuizRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub subject: Option<String>,
    pub branch: Option<String>,
    pub semester: Option<i64>,
    pub due_date: Option<chrono::DateTime<chrono::Utc>>,
    pub total_marks: Option<i64>,
    pub duration: Option<i64>,
    pub assessment_type: Option<String>,
    pub status: Option<String>,
    pub questions: Option<Vec<QuestionInput>>,
}

/// DTO for AI-assisted question generation.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GenerateQuestionsRequest {
    #[validate(length(min = 1, max = 200))]
    pub topic: String,
    #[validate(range(min = 1, max = 20))]
    pub num_questions: i64,
    pub difficulty: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(correct: usize) -> QuestionInput {
        QuestionInput {
            id: None,
            text: "What is an inode?".to_string(),
            options: (0..4)
                .map(|i| OptionInput {
                    text: format!("Option {}", i),
                    is_correct: i == correct,
                })
                .collect(),
            marks: 5,
            difficulty: "Easy".to_string(),
        }
    }

    #[test]
    fn builds_question_with_stable_option_ids() {
        let q = input(2).into_question().unwrap();
        let ids: Vec<i64> = q.options.iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
        assert_eq!(q.correct_option_id(), Some(3));
    }

    #[test]
    fn correct_answer_matches_flagged_option() {
        let q = input(1).into_question().unwrap();
        assert_eq!(q.correct_answer, "Option 1");
        let flagged = q.options.iter().find(|o| o.is_correct).unwrap();
        assert_eq!(q.correct_answer, flagged.text);
    }

    #[test]
    fn rejects_multiple_correct_options() {
        let mut bad = input(0);
        bad.options[3].is_correct = true;
        assert!(bad.into_question().is_err());
    }

    #[test]
    fn rejects_wrong_option_count() {
        let mut bad = input(0);
        bad.options.pop();
        assert!(bad.into_question().is_err());
    }

    #[test]
    fn rejects_non_positive_marks() {
        let mut bad = input(0);
        bad.marks = 0;
        assert!(bad.into_question().is_err());
    }

    #[test]
    fn status_ladder_is_ordered() {
        assert!(status_rank(QUIZ_DRAFT) < status_rank(QUIZ_PUBLISHED));
        assert!(status_rank(QUIZ_PUBLISHED) < status_rank(QUIZ_CLOSED));
        assert_eq!(status_rank("Archived"), None);
    }
}
