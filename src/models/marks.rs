// src/models/marks.rs

use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use std::collections::HashMap;

use crate::config::{ESA_MAX_MARKS, ISA_MAX_MARKS};

pub const EXAM_TYPES: [&str; 3] = ["ISA1", "ISA2", "ESA"];

/// Maximum marks for an exam type. Returns None for unknown types.
pub fn max_marks_for(exam_type: &str) -> Option<i64> {
    match exam_type {
        "ISA1" | "ISA2" => Some(ISA_MAX_MARKS),
        "ESA" => Some(ESA_MAX_MARKS),
        _ => None,
    }
}

/// Represents one row of the 'marks' table: a single student's score for one
/// subject in one exam. Unique per (student, subject, exam type); re-upload
/// replaces the stored value.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkRow {
    pub id: i64,
    pub student_id: i64,
    pub subject: String,
    pub exam_type: String,
    pub marks: i64,
    pub uploaded_by: i64,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// DTO for uploading marks: one exam type, scores keyed by subject.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddMarksRequest {
    pub student_id: i64,
    pub exam_type: String,
    pub marks: HashMap<String, i64>,
}

/// Read shape: nested map examType -> subject -> marks, matching the way the
/// marks screens render per-exam tables.
pub fn group_marks(rows: Vec<MarkRow>) -> HashMap<String, HashMap<String, i64>> {
    let mut grouped: HashMap<String, HashMap<String, i64>> = HashMap::new();
    for row in rows {
        grouped
            .entry(row.exam_type)
            .or_default()
            .insert(row.subject, row.marks);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exam_type_bounds() {
        assert_eq!(max_marks_for("ISA1"), Some(30));
        assert_eq!(max_marks_for("ISA2"), Some(30));
        assert_eq!(max_marks_for("ESA"), Some(60));
        assert_eq!(max_marks_for("MIDTERM"), None);
    }

    #[test]
    fn grouping_nests_by_exam_then_subject() {
        let rows = vec![
            MarkRow {
                id: 1,
                student_id: 7,
                subject: "Maths".to_string(),
                exam_type: "ISA1".to_string(),
                marks: 25,
                uploaded_by: 2,
                created_at: None,
            },
            MarkRow {
                id: 2,
                student_id: 7,
                subject: "Physics".to_string(),
                exam_type: "ISA1".to_string(),
                marks: 22,
                uploaded_by: 2,
                created_at: None,
            },
            MarkRow {
                id: 3,
                student_id: 7,
                subject: "Maths".to_string(),
                exam_type: "ESA".to_string(),
                marks: 51,
                uploaded_by: 2,
                created_at: None,
            },
        ];

        let grouped = group_marks(rows);
        assert_eq!(grouped["ISA1"]["Maths"], 25);
        assert_eq!(grouped["ISA1"]["Physics"], 22);
        assert_eq!(grouped["ESA"]["Maths"], 51);
        assert!(grouped.get("ISA2").is_none());
    }
}
