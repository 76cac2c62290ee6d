use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;

use crate::error::ProgressError;

/// Smallest unit of course content with a binary completion flag.
///
/// Clients attach extra per-chapter data (watched seconds, bookmarks...)
/// which is round-tripped but never interpreted here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChapterProgress {
    pub chapter_id: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Grouping of chapters within a course, keyed by `section_id`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionProgress {
    pub section_id: String,
    #[serde(default)]
    pub chapters: Vec<ChapterProgress>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Per-user per-course progress record, one per (user, course) pair.
///
/// `overall_progress` is always derived from the section set, never taken
/// from input. `enrollment_date` is set once when the record is created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseProgress {
    pub user_id: String,
    pub course_id: String,
    #[serde(with = "time::serde::rfc3339")]
    pub enrollment_date: OffsetDateTime,
    pub overall_progress: f64,
    #[serde(rename = "lastAccessedTimestamp", with = "time::serde::rfc3339")]
    pub last_accessed: OffsetDateTime,
    #[serde(default)]
    pub sections: Vec<SectionProgress>,
}

/// Partial chapter update. A missing `completed` leaves the stored flag
/// alone; extra fields overwrite same-named stored fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChapterUpdate {
    pub chapter_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Partial section update, merged additively into the stored record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionUpdate {
    pub section_id: String,
    #[serde(default)]
    pub chapters: Vec<ChapterUpdate>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Parse the JSON sections payload a request handler receives.
/// Structural problems (missing ids, wrong shapes) come back as
/// `Validation`, not as a storage failure.
pub fn sections_from_json(payload: &str) -> Result<Vec<SectionUpdate>, ProgressError> {
    serde_json::from_str(payload).map_err(|e| ProgressError::Validation(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn test_record_serializes_to_wire_shape() {
        let record = CourseProgress {
            user_id: "u1".to_string(),
            course_id: "rust-101".to_string(),
            enrollment_date: datetime!(2026-01-15 10:00 UTC),
            overall_progress: 50.0,
            last_accessed: datetime!(2026-02-01 08:30 UTC),
            sections: vec![SectionProgress {
                section_id: "s1".to_string(),
                chapters: vec![ChapterProgress {
                    chapter_id: "c1".to_string(),
                    completed: true,
                    extra: BTreeMap::new(),
                }],
                extra: BTreeMap::new(),
            }],
        };
        let json: Value = serde_json::to_value(&record).unwrap();
        assert_eq!(json["userId"], "u1");
        assert_eq!(json["courseId"], "rust-101");
        assert_eq!(json["enrollmentDate"], "2026-01-15T10:00:00Z");
        assert_eq!(json["lastAccessedTimestamp"], "2026-02-01T08:30:00Z");
        assert_eq!(json["overallProgress"], 50.0);
        assert_eq!(json["sections"][0]["sectionId"], "s1");
        assert_eq!(json["sections"][0]["chapters"][0]["chapterId"], "c1");
        assert_eq!(json["sections"][0]["chapters"][0]["completed"], true);
    }

    #[test]
    fn test_record_roundtrips() {
        let record = CourseProgress {
            user_id: "u1".to_string(),
            course_id: "rust-101".to_string(),
            enrollment_date: datetime!(2026-01-15 10:00 UTC),
            overall_progress: 0.0,
            last_accessed: datetime!(2026-01-15 10:00 UTC),
            sections: vec![],
        };
        let json = serde_json::to_string(&record).unwrap();
        let parsed: CourseProgress = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, record);
    }

    #[test]
    fn test_unknown_chapter_fields_are_retained() {
        let update: ChapterUpdate =
            serde_json::from_str(r#"{"chapterId":"c1","completed":true,"watchedSeconds":312}"#)
                .unwrap();
        assert_eq!(update.chapter_id, "c1");
        assert_eq!(update.completed, Some(true));
        assert_eq!(update.extra["watchedSeconds"], 312);
        let json: Value = serde_json::to_value(&update).unwrap();
        assert_eq!(json["watchedSeconds"], 312);
    }

    #[test]
    fn test_missing_completed_is_unspecified() {
        let update: ChapterUpdate = serde_json::from_str(r#"{"chapterId":"c1"}"#).unwrap();
        assert_eq!(update.completed, None);
    }

    #[test]
    fn test_malformed_payload_is_a_validation_error() {
        let err = sections_from_json(r#"[{"chapters":[]}]"#).unwrap_err();
        assert!(matches!(err, ProgressError::Validation(_)));
    }
}
