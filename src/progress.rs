pub mod merge;
pub mod model;

pub use merge::{merge_chapters, merge_sections, overall_progress, validate_sections};
pub use model::{ChapterProgress, ChapterUpdate, CourseProgress, SectionProgress, SectionUpdate};
