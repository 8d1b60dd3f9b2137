//! Working-directory lifecycle manager.
//!
//! Owns the transient per-job directory tree. Deletion is guarded three
//! ways: an active-job set that blocks cleanup while work is in flight, a
//! settle delay with a double-check to tolerate late-arriving writes, and
//! a periodic sweep that force-deletes directories leaked by crashed
//! pipelines.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use tokio::time::interval;
use tracing::{debug, error, info, warn};

use crate::error::{PipelineError, PipelineResult};
use crate::retry::{retry_async, RetryConfig};

/// Timings for guarded directory deletion.
#[derive(Debug, Clone)]
pub struct CleanupPolicy {
    /// Delay before deleting, letting in-flight writes settle
    pub settle_delay: Duration,
    /// Total deletion attempts
    pub max_attempts: u32,
    /// Fixed delay between deletion attempts
    pub retry_delay: Duration,
}

impl Default for CleanupPolicy {
    fn default() -> Self {
        Self {
            settle_delay: Duration::from_secs(2),
            max_attempts: 3,
            retry_delay: Duration::from_secs(5),
        }
    }
}

/// Manager for the per-job working-directory tree.
pub struct WorkdirManager {
    root: PathBuf,
    active: Mutex<HashSet<String>>,
    policy: CleanupPolicy,
}

impl WorkdirManager {
    /// Create a manager rooted at `root`.
    pub fn new(root: impl Into<PathBuf>, policy: CleanupPolicy) -> Self {
        Self {
            root: root.into(),
            active: Mutex::new(HashSet::new()),
            policy,
        }
    }

    /// Root of the working-directory tree.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of a job's working directory.
    pub fn job_dir(&self, job_id: &str) -> PathBuf {
        self.root.join(job_id)
    }

    /// Create a job's working directory, idempotently.
    ///
    /// Job ids become path components and staged URL segments, so only
    /// filesystem-safe ASCII is accepted.
    pub async fn create_job_dir(&self, job_id: &str) -> PipelineResult<PathBuf> {
        if !is_safe_job_id(job_id) {
            return Err(PipelineError::resource(format!(
                "job id {:?} is not filesystem-safe",
                job_id
            )));
        }

        let dir = self.job_dir(job_id);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| PipelineError::resource(format!("failed to create {:?}: {}", dir, e)))?;

        debug!(job_id, dir = %dir.display(), "Created job directory");
        Ok(dir)
    }

    /// Mark a job as in flight: its directory must not be deleted.
    pub fn register_active(&self, job_id: &str) {
        self.active.lock().unwrap().insert(job_id.to_string());
    }

    /// Remove a job from the active set.
    pub fn unregister_active(&self, job_id: &str) {
        self.active.lock().unwrap().remove(job_id);
    }

    /// Check whether a job is currently active.
    pub fn is_active(&self, job_id: &str) -> bool {
        self.active.lock().unwrap().contains(job_id)
    }

    /// Delete a job's working directory, guarded and with retries.
    ///
    /// No-op when the directory is missing or the job is still active; the
    /// active check is repeated after the settle delay to tolerate a job
    /// re-registering while we waited. Deletion itself is attempted up to
    /// `max_attempts` times with a fixed delay; the last error is
    /// surfaced when all attempts fail.
    pub async fn cleanup(&self, job_id: &str) -> PipelineResult<()> {
        let dir = self.job_dir(job_id);
        if !dir.exists() || self.is_active(job_id) {
            return Ok(());
        }

        tokio::time::sleep(self.policy.settle_delay).await;

        if self.is_active(job_id) {
            debug!(job_id, "Job became active again, skipping cleanup");
            return Ok(());
        }

        let retry = RetryConfig::new(
            format!("cleanup {}", job_id),
            self.policy.max_attempts,
            self.policy.retry_delay,
        );

        retry_async(&retry, || tokio::fs::remove_dir_all(&dir))
            .await
            .map_err(|e| {
                PipelineError::resource(format!(
                    "failed to delete {:?} after {} attempts: {}",
                    dir, self.policy.max_attempts, e
                ))
            })?;

        info!(job_id, "Cleaned up job directory");
        Ok(())
    }

    /// Apply `cleanup` to every directory under the work root.
    ///
    /// Used at shutdown. Active jobs are skipped, per the cleanup guard.
    pub async fn cleanup_all(&self) -> PipelineResult<()> {
        if !self.root.exists() {
            return Ok(());
        }

        let mut entries = tokio::fs::read_dir(&self.root)
            .await
            .map_err(|e| PipelineError::resource(format!("failed to list work root: {}", e)))?;

        let mut last_error = None;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| PipelineError::resource(e.to_string()))?
        {
            let name = entry.file_name();
            let Some(job_id) = name.to_str() else {
                continue;
            };
            if let Err(e) = self.cleanup(job_id).await {
                error!(job_id, "Cleanup failed during cleanup_all: {}", e);
                last_error = Some(e);
            }
        }

        match last_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Force-delete directories older than `max_age` by mtime.
    ///
    /// Safety net against leaked state from crashed pipelines: ignores the
    /// active set on purpose. Returns the number of directories removed.
    pub async fn sweep_stale(&self, max_age: Duration) -> PipelineResult<u32> {
        if !self.root.exists() {
            return Ok(0);
        }

        let mut entries = tokio::fs::read_dir(&self.root)
            .await
            .map_err(|e| PipelineError::resource(format!("failed to list work root: {}", e)))?;

        let mut removed = 0u32;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| PipelineError::resource(e.to_string()))?
        {
            let path = entry.path();
            let Ok(metadata) = entry.metadata().await else {
                continue;
            };
            let Ok(modified) = metadata.modified() else {
                continue;
            };
            let age = modified.elapsed().unwrap_or_default();

            if age > max_age {
                warn!(
                    dir = %path.display(),
                    age_secs = age.as_secs(),
                    "Sweeping stale job directory"
                );
                if let Err(e) = tokio::fs::remove_dir_all(&path).await {
                    error!(dir = %path.display(), "Failed to sweep stale directory: {}", e);
                } else {
                    removed += 1;
                }
            }
        }

        Ok(removed)
    }

    /// Run the stale sweep on a fixed interval, for the life of the
    /// process. Spawn this as a background task.
    pub async fn run_sweeper(&self, sweep_interval: Duration, max_age: Duration) {
        info!(
            interval_secs = sweep_interval.as_secs(),
            max_age_secs = max_age.as_secs(),
            "Starting stale directory sweeper"
        );

        let mut ticker = interval(sweep_interval);
        // First tick fires immediately; skip it so a fresh process does not
        // sweep before jobs have a chance to register.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            match self.sweep_stale(max_age).await {
                Ok(0) => {}
                Ok(n) => info!("Sweeper removed {} stale directories", n),
                Err(e) => error!("Stale sweep error: {}", e),
            }
        }
    }
}

/// Job ids become path components: ASCII letters, digits, hyphen and
/// underscore only.
fn is_safe_job_id(job_id: &str) -> bool {
    !job_id.is_empty()
        && job_id.len() <= 128
        && job_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_policy() -> CleanupPolicy {
        CleanupPolicy {
            settle_delay: Duration::from_millis(10),
            max_attempts: 3,
            retry_delay: Duration::from_millis(10),
        }
    }

    #[test]
    fn test_safe_job_ids() {
        assert!(is_safe_job_id("job-123_abc"));
        assert!(is_safe_job_id("550e8400-e29b-41d4-a716-446655440000"));
        assert!(!is_safe_job_id(""));
        assert!(!is_safe_job_id("../escape"));
        assert!(!is_safe_job_id("job id"));
        assert!(!is_safe_job_id("jöb"));
    }

    #[tokio::test]
    async fn test_create_job_dir_idempotent() {
        let root = tempfile::tempdir().unwrap();
        let manager = WorkdirManager::new(root.path(), fast_policy());

        let a = manager.create_job_dir("job-1").await.unwrap();
        let b = manager.create_job_dir("job-1").await.unwrap();
        assert_eq!(a, b);
        assert!(a.exists());
    }

    #[tokio::test]
    async fn test_unsafe_job_id_rejected() {
        let root = tempfile::tempdir().unwrap();
        let manager = WorkdirManager::new(root.path(), fast_policy());

        let result = manager.create_job_dir("../evil").await;
        assert!(matches!(result, Err(PipelineError::Resource(_))));
    }

    #[tokio::test]
    async fn test_cleanup_is_noop_while_active() {
        let root = tempfile::tempdir().unwrap();
        let manager = WorkdirManager::new(root.path(), fast_policy());

        let dir = manager.create_job_dir("job-1").await.unwrap();
        manager.register_active("job-1");

        manager.cleanup("job-1").await.unwrap();
        assert!(dir.exists(), "active job directory must survive cleanup");

        manager.unregister_active("job-1");
        manager.cleanup("job-1").await.unwrap();
        assert!(!dir.exists(), "inactive job directory must be deleted");
    }

    #[tokio::test]
    async fn test_cleanup_noop_for_missing_dir() {
        let root = tempfile::tempdir().unwrap();
        let manager = WorkdirManager::new(root.path(), fast_policy());

        manager.cleanup("never-created").await.unwrap();
    }

    #[tokio::test]
    async fn test_cleanup_double_checks_after_settle() {
        let root = tempfile::tempdir().unwrap();
        let manager = std::sync::Arc::new(WorkdirManager::new(
            root.path(),
            CleanupPolicy {
                settle_delay: Duration::from_millis(100),
                max_attempts: 3,
                retry_delay: Duration::from_millis(10),
            },
        ));

        let dir = manager.create_job_dir("job-1").await.unwrap();

        // Re-register during the settle delay: cleanup must back off.
        let m = std::sync::Arc::clone(&manager);
        let register = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            m.register_active("job-1");
        });

        manager.cleanup("job-1").await.unwrap();
        register.await.unwrap();
        assert!(dir.exists());
    }

    #[tokio::test]
    async fn test_cleanup_retries_through_transient_failure() {
        let root = tempfile::tempdir().unwrap();
        let manager = std::sync::Arc::new(WorkdirManager::new(
            root.path(),
            CleanupPolicy {
                settle_delay: Duration::from_millis(10),
                max_attempts: 3,
                retry_delay: Duration::from_millis(200),
            },
        ));

        // A regular file where the job directory should be makes
        // remove_dir_all fail until it is swapped for a real directory.
        let path = manager.job_dir("job-1");
        tokio::fs::write(&path, b"blocker").await.unwrap();

        let m = std::sync::Arc::clone(&manager);
        let fixer = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(300)).await;
            let path = m.job_dir("job-1");
            tokio::fs::remove_file(&path).await.unwrap();
            tokio::fs::create_dir(&path).await.unwrap();
        });

        // First two attempts hit the file and fail; the third lands
        // after the swap and succeeds.
        manager.cleanup("job-1").await.unwrap();
        fixer.await.unwrap();
        assert!(!manager.job_dir("job-1").exists());
    }

    #[tokio::test]
    async fn test_cleanup_surfaces_error_when_attempts_exhausted() {
        let root = tempfile::tempdir().unwrap();
        let manager = WorkdirManager::new(root.path(), fast_policy());

        let path = manager.job_dir("job-1");
        tokio::fs::write(&path, b"blocker").await.unwrap();

        let result = manager.cleanup("job-1").await;
        assert!(matches!(result, Err(PipelineError::Resource(_))));
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_cleanup_all_skips_active() {
        let root = tempfile::tempdir().unwrap();
        let manager = WorkdirManager::new(root.path(), fast_policy());

        let kept = manager.create_job_dir("active-job").await.unwrap();
        let dropped = manager.create_job_dir("finished-job").await.unwrap();
        manager.register_active("active-job");

        manager.cleanup_all().await.unwrap();

        assert!(kept.exists());
        assert!(!dropped.exists());
    }

    #[tokio::test]
    async fn test_sweep_ignores_active_set() {
        let root = tempfile::tempdir().unwrap();
        let manager = WorkdirManager::new(root.path(), fast_policy());

        let dir = manager.create_job_dir("leaked-job").await.unwrap();
        manager.register_active("leaked-job");

        tokio::time::sleep(Duration::from_millis(50)).await;
        let removed = manager.sweep_stale(Duration::ZERO).await.unwrap();

        assert_eq!(removed, 1);
        assert!(!dir.exists(), "sweep force-deletes regardless of active set");
    }

    #[tokio::test]
    async fn test_sweep_keeps_fresh_dirs() {
        let root = tempfile::tempdir().unwrap();
        let manager = WorkdirManager::new(root.path(), fast_policy());

        let dir = manager.create_job_dir("fresh-job").await.unwrap();
        let removed = manager
            .sweep_stale(Duration::from_secs(3600))
            .await
            .unwrap();

        assert_eq!(removed, 0);
        assert!(dir.exists());
    }
}
