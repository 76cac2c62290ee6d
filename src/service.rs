use std::sync::Arc;

use tracing::{info, warn};

use crate::config::DEFAULT_UPDATE_ATTEMPTS;
use crate::error::ProgressError;
use crate::progress::merge::validate_sections;
use crate::progress::model::{CourseProgress, SectionUpdate};
use crate::store::ProgressStore;
use crate::utils::{Clock, SystemClock};

/// Update and fetch entrypoints the marketplace request handlers call.
///
/// Concurrent updates for the same (user, course) pair race on the
/// read-merge-write sequence, so every write is conditional on the version
/// read; a lost race re-fetches and re-merges. The merge itself is pure,
/// retrying it is safe.
pub struct ProgressService<S> {
    store: S,
    clock: Arc<dyn Clock>,
    max_attempts: u32,
}

impl<S: ProgressStore> ProgressService<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
            max_attempts: DEFAULT_UPDATE_ATTEMPTS,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Merge a partial sections payload into the stored record and return
    /// the full merged result. The record is created lazily on the first
    /// update for the pair.
    pub async fn update_progress(
        &self,
        user_id: &str,
        course_id: &str,
        incoming: &[SectionUpdate],
    ) -> Result<CourseProgress, ProgressError> {
        validate_sections(incoming)?;
        for attempt in 1..=self.max_attempts {
            let now = self.clock.now();
            match self.store.get(user_id, course_id).await? {
                None => {
                    let record = CourseProgress::enroll(user_id, course_id, incoming, now);
                    if self.store.insert(&record).await? {
                        info!(user_id, course_id, "created progress record on first update");
                        return Ok(record);
                    }
                }
                Some(stored) => {
                    let mut record = stored.progress;
                    record.apply_update(incoming, now);
                    if self.store.update(&record, stored.version).await? {
                        return Ok(record);
                    }
                }
            }
            warn!(user_id, course_id, attempt, "lost progress update race, re-merging");
        }
        Err(ProgressError::Storage(anyhow::anyhow!(
            "progress update for user {user_id} in course {course_id} still contended after {} attempts",
            self.max_attempts
        )))
    }

    /// Read-only fetch; unlike an update this does not create anything
    pub async fn fetch_progress(
        &self,
        user_id: &str,
        course_id: &str,
    ) -> Result<CourseProgress, ProgressError> {
        match self.store.get(user_id, course_id).await? {
            Some(stored) => Ok(stored.progress),
            None => Err(ProgressError::NotFound {
                user_id: user_id.to_string(),
                course_id: course_id.to_string(),
            }),
        }
    }
}
