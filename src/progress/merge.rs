use std::collections::HashMap;
use std::mem::take;

use time::OffsetDateTime;

use crate::error::ProgressError;

use super::model::{
    ChapterProgress, ChapterUpdate, CourseProgress, SectionProgress, SectionUpdate,
};

/// Reject a payload carrying blank ids before any state is touched
pub fn validate_sections(incoming: &[SectionUpdate]) -> Result<(), ProgressError> {
    for section in incoming {
        if section.section_id.trim().is_empty() {
            return Err(ProgressError::Validation(
                "section is missing a sectionId".to_string(),
            ));
        }
        for chapter in &section.chapters {
            if chapter.chapter_id.trim().is_empty() {
                return Err(ProgressError::Validation(format!(
                    "chapter in section {} is missing a chapterId",
                    section.section_id
                )));
            }
        }
    }
    Ok(())
}

/// Merge a partial sections update into the stored section set.
///
/// Sections already stored keep their original order and every field except
/// `chapters`; genuinely new sections are appended in the order they appear
/// in `incoming`. Nothing is ever removed, the update is additive.
pub fn merge_sections(
    existing: Vec<SectionProgress>,
    incoming: &[SectionUpdate],
) -> Vec<SectionProgress> {
    let mut merged = existing;
    let mut index: HashMap<String, usize> = merged
        .iter()
        .enumerate()
        .map(|(i, section)| (section.section_id.clone(), i))
        .collect();
    for update in incoming {
        match index.get(&update.section_id) {
            Some(&i) => {
                let chapters = take(&mut merged[i].chapters);
                merged[i].chapters = merge_chapters(chapters, &update.chapters);
            }
            None => {
                index.insert(update.section_id.clone(), merged.len());
                merged.push(SectionProgress::from(update));
            }
        }
    }
    merged
}

/// Merge a partial chapters update into the stored chapter list.
///
/// A supplied `completed` always wins, so a later `false` un-completes a
/// chapter; an unsupplied one leaves the stored flag alone. Extra fields
/// shallow-merge: incoming entries overwrite same-named stored entries.
pub fn merge_chapters(
    existing: Vec<ChapterProgress>,
    incoming: &[ChapterUpdate],
) -> Vec<ChapterProgress> {
    let mut merged = existing;
    let mut index: HashMap<String, usize> = merged
        .iter()
        .enumerate()
        .map(|(i, chapter)| (chapter.chapter_id.clone(), i))
        .collect();
    for update in incoming {
        match index.get(&update.chapter_id) {
            Some(&i) => {
                let chapter = &mut merged[i];
                if let Some(completed) = update.completed {
                    chapter.completed = completed;
                }
                chapter
                    .extra
                    .extend(update.extra.iter().map(|(k, v)| (k.clone(), v.clone())));
            }
            None => {
                index.insert(update.chapter_id.clone(), merged.len());
                merged.push(ChapterProgress::from(update));
            }
        }
    }
    merged
}

/// Completion ratio in [0, 100] over every chapter of every section,
/// 0 when there are no chapters yet
pub fn overall_progress(sections: &[SectionProgress]) -> f64 {
    let total: usize = sections.iter().map(|s| s.chapters.len()).sum();
    if total == 0 {
        return 0.0;
    }
    let completed = sections
        .iter()
        .flat_map(|s| &s.chapters)
        .filter(|c| c.completed)
        .count();
    completed as f64 / total as f64 * 100.0
}

impl From<&ChapterUpdate> for ChapterProgress {
    fn from(update: &ChapterUpdate) -> Self {
        Self {
            chapter_id: update.chapter_id.clone(),
            completed: update.completed.unwrap_or(false),
            extra: update.extra.clone(),
        }
    }
}

impl From<&SectionUpdate> for SectionProgress {
    fn from(update: &SectionUpdate) -> Self {
        Self {
            section_id: update.section_id.clone(),
            // run the chapters through the merge so duplicated ids in one
            // payload collapse instead of violating key uniqueness
            chapters: merge_chapters(Vec::new(), &update.chapters),
            extra: update.extra.clone(),
        }
    }
}

impl CourseProgress {
    /// First update for a (user, course) pair: the record is created from
    /// the payload directly, there is nothing to merge against
    pub fn enroll(
        user_id: impl Into<String>,
        course_id: impl Into<String>,
        incoming: &[SectionUpdate],
        now: OffsetDateTime,
    ) -> Self {
        let sections = merge_sections(Vec::new(), incoming);
        let overall = overall_progress(&sections);
        Self {
            user_id: user_id.into(),
            course_id: course_id.into(),
            enrollment_date: now,
            overall_progress: overall,
            last_accessed: now,
            sections,
        }
    }

    /// Merge an update in, re-derive the completion ratio and touch the
    /// access timestamp. `enrollment_date` never changes.
    pub fn apply_update(&mut self, incoming: &[SectionUpdate], now: OffsetDateTime) {
        let sections = take(&mut self.sections);
        self.sections = merge_sections(sections, incoming);
        self.overall_progress = overall_progress(&self.sections);
        self.last_accessed = now;
    }
}
