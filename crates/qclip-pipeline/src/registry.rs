//! In-memory job status registry.
//!
//! Process-local by design: jobs do not survive a restart, and the stale
//! sweep reclaims whatever a crashed process left on disk.

use std::collections::HashMap;

use tokio::sync::RwLock;

use qclip_models::{JobId, JobStatusEntry};

/// Thread-safe map of job id to status entry.
#[derive(Default)]
pub struct JobRegistry {
    jobs: RwLock<HashMap<String, JobStatusEntry>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a fresh entry in the processing state.
    pub async fn create(&self, job_id: &JobId) {
        let entry = JobStatusEntry::new(job_id.as_str());
        self.jobs
            .write()
            .await
            .insert(job_id.as_str().to_string(), entry);
    }

    /// Snapshot of a job's status, or `None` for unknown ids.
    pub async fn get(&self, job_id: &JobId) -> Option<JobStatusEntry> {
        self.jobs.read().await.get(job_id.as_str()).cloned()
    }

    /// Update a job's progress percentage.
    pub async fn set_progress(&self, job_id: &JobId, progress: u8) {
        if let Some(entry) = self.jobs.write().await.get_mut(job_id.as_str()) {
            entry.set_progress(progress);
        }
    }

    /// Mark a job completed with its result URL.
    pub async fn complete(&self, job_id: &JobId, url: impl Into<String>) {
        if let Some(entry) = self.jobs.write().await.get_mut(job_id.as_str()) {
            entry.complete(url);
        }
    }

    /// Mark a job failed with an error message.
    pub async fn fail(&self, job_id: &JobId, error: impl Into<String>) {
        if let Some(entry) = self.jobs.write().await.get_mut(job_id.as_str()) {
            entry.fail(error);
        }
    }

    /// Remove a job's entry. Returns it if it existed.
    pub async fn delete(&self, job_id: &JobId) -> Option<JobStatusEntry> {
        self.jobs.write().await.remove(job_id.as_str())
    }

    /// Number of tracked jobs.
    pub async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.jobs.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qclip_models::JobStatus;

    #[tokio::test]
    async fn test_create_and_get() {
        let registry = JobRegistry::new();
        let id = JobId::new();

        registry.create(&id).await;
        let entry = registry.get(&id).await.unwrap();
        assert_eq!(entry.status, JobStatus::Processing);
        assert_eq!(entry.progress, 0);
    }

    #[tokio::test]
    async fn test_unknown_job_is_none() {
        let registry = JobRegistry::new();
        assert!(registry.get(&JobId::from_string("nope")).await.is_none());
    }

    #[tokio::test]
    async fn test_lifecycle_updates() {
        let registry = JobRegistry::new();
        let id = JobId::new();
        registry.create(&id).await;

        registry.set_progress(&id, 40).await;
        assert_eq!(registry.get(&id).await.unwrap().progress, 40);

        registry.complete(&id, "https://cdn.example/video.mp4").await;
        let entry = registry.get(&id).await.unwrap();
        assert_eq!(entry.status, JobStatus::Completed);
        assert_eq!(
            entry.result_url.as_deref(),
            Some("https://cdn.example/video.mp4")
        );
    }

    #[tokio::test]
    async fn test_fail_records_message() {
        let registry = JobRegistry::new();
        let id = JobId::new();
        registry.create(&id).await;

        registry.fail(&id, "render failed: empty output").await;
        let entry = registry.get(&id).await.unwrap();
        assert_eq!(entry.status, JobStatus::Failed);
        assert_eq!(
            entry.error_message.as_deref(),
            Some("render failed: empty output")
        );
    }

    #[tokio::test]
    async fn test_delete() {
        let registry = JobRegistry::new();
        let id = JobId::new();
        registry.create(&id).await;

        assert!(registry.delete(&id).await.is_some());
        assert!(registry.get(&id).await.is_none());
        assert!(registry.delete(&id).await.is_none());
    }

    #[tokio::test]
    async fn test_updates_to_unknown_job_are_ignored() {
        let registry = JobRegistry::new();
        let id = JobId::from_string("ghost");

        registry.set_progress(&id, 50).await;
        registry.complete(&id, "url").await;
        registry.fail(&id, "err").await;

        assert!(registry.is_empty().await);
    }
}
