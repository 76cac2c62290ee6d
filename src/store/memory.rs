use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use crate::error::ProgressError;
use crate::progress::model::CourseProgress;

use super::{ProgressStore, StoredProgress};

type UserCourseId = (String, String);

/// In-process store for tests and single-node embedding. Versioning works
/// the same way as the SQLite store so the service code paths are identical.
#[derive(Debug, Default)]
pub struct MemoryProgressStore {
    records: DashMap<UserCourseId, StoredProgress>,
}

impl MemoryProgressStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(progress: &CourseProgress) -> UserCourseId {
        (progress.user_id.clone(), progress.course_id.clone())
    }
}

#[async_trait]
impl ProgressStore for MemoryProgressStore {
    async fn get(
        &self,
        user_id: &str,
        course_id: &str,
    ) -> Result<Option<StoredProgress>, ProgressError> {
        let key = (user_id.to_string(), course_id.to_string());
        Ok(self.records.get(&key).map(|stored| stored.value().clone()))
    }

    async fn insert(&self, progress: &CourseProgress) -> Result<bool, ProgressError> {
        match self.records.entry(Self::key(progress)) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(entry) => {
                entry.insert(StoredProgress {
                    version: 1,
                    progress: progress.clone(),
                });
                Ok(true)
            }
        }
    }

    async fn update(
        &self,
        progress: &CourseProgress,
        expected_version: i64,
    ) -> Result<bool, ProgressError> {
        match self.records.entry(Self::key(progress)) {
            Entry::Occupied(mut entry) => {
                if entry.get().version != expected_version {
                    return Ok(false);
                }
                entry.insert(StoredProgress {
                    version: expected_version + 1,
                    progress: progress.clone(),
                });
                Ok(true)
            }
            Entry::Vacant(_) => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;

    fn record(user: &str, course: &str) -> CourseProgress {
        CourseProgress::enroll(user, course, &[], datetime!(2026-01-01 00:00 UTC))
    }

    #[tokio::test]
    async fn test_insert_is_create_if_absent() {
        let store = MemoryProgressStore::new();
        let progress = record("u1", "rust-101");
        assert!(store.insert(&progress).await.unwrap());
        assert!(!store.insert(&progress).await.unwrap());
        let stored = store.get("u1", "rust-101").await.unwrap().unwrap();
        assert_eq!(stored.version, 1);
    }

    #[tokio::test]
    async fn test_update_checks_version() {
        let store = MemoryProgressStore::new();
        let progress = record("u1", "rust-101");
        store.insert(&progress).await.unwrap();
        assert!(store.update(&progress, 1).await.unwrap());
        // stale writer loses
        assert!(!store.update(&progress, 1).await.unwrap());
        let stored = store.get("u1", "rust-101").await.unwrap().unwrap();
        assert_eq!(stored.version, 2);
    }

    #[tokio::test]
    async fn test_update_without_record_fails() {
        let store = MemoryProgressStore::new();
        assert!(!store.update(&record("u1", "rust-101"), 1).await.unwrap());
    }
}
