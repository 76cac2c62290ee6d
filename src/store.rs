pub mod memory;
pub mod sqlite;

use async_trait::async_trait;

use crate::error::ProgressError;
use crate::progress::model::CourseProgress;

/// A progress record together with the store-side version backing
/// conditional writes
#[derive(Debug, Clone, PartialEq)]
pub struct StoredProgress {
    pub version: i64,
    pub progress: CourseProgress,
}

/// Persistence contract for progress records.
///
/// Reads are strongly consistent for the same key from the same caller.
/// `insert` and `update` are the optimistic-concurrency primitives the
/// update service builds its read-merge-write loop on; neither retries
/// internally, driver failures surface as `Storage` unmodified.
#[async_trait]
pub trait ProgressStore: Send + Sync {
    async fn get(
        &self,
        user_id: &str,
        course_id: &str,
    ) -> Result<Option<StoredProgress>, ProgressError>;

    /// Create-if-absent. Returns false when the pair already has a record
    /// (a concurrent writer created it first).
    async fn insert(&self, progress: &CourseProgress) -> Result<bool, ProgressError>;

    /// Conditional write at `expected_version`. Returns false when the
    /// stored version has moved on and the caller must re-merge.
    async fn update(
        &self,
        progress: &CourseProgress,
        expected_version: i64,
    ) -> Result<bool, ProgressError>;
}
