//! Shared job registry.

use super::job::{Job, JobStatus};
use crate::error::{Error, Result};
use parking_lot::RwLock;
use std::collections::HashMap;

#[derive(Debug, Default)]
struct JobRegistry {
    jobs: HashMap<String, Job>,
    /// Ids in creation order
    order: Vec<String>,
}

/// Thread-safe store of job records.
///
/// Constructed explicitly and shared through an `Arc`; each orchestrator
/// (and each test) owns its own store. Reads return clones taken under a
/// short read lock.
#[derive(Debug, Default)]
pub struct JobStore {
    inner: RwLock<JobRegistry>,
}

impl JobStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new job. Fails if the id is already taken.
    pub fn insert(&self, job: Job) -> Result<()> {
        let mut registry = self.inner.write();
        if registry.jobs.contains_key(&job.id) {
            return Err(Error::Internal(format!("duplicate job id {}", job.id)));
        }
        registry.order.push(job.id.clone());
        registry.jobs.insert(job.id.clone(), job);
        Ok(())
    }

    /// Snapshot of one job.
    pub fn get(&self, id: &str) -> Option<Job> {
        self.inner.read().jobs.get(id).cloned()
    }

    /// Snapshots in creation order, optionally filtered by status.
    pub fn list(&self, filter: Option<JobStatus>) -> Vec<Job> {
        let registry = self.inner.read();
        registry
            .order
            .iter()
            .filter_map(|id| registry.jobs.get(id))
            .filter(|job| filter.map_or(true, |status| job.status == status))
            .cloned()
            .collect()
    }

    /// Apply a change to a job record.
    ///
    /// The change runs on a copy that replaces the record only when it
    /// succeeds, so a rejected transition leaves the record untouched.
    pub fn update<F>(&self, id: &str, change: F) -> Result<Job>
    where
        F: FnOnce(&mut Job) -> Result<()>,
    {
        let mut registry = self.inner.write();
        let job = registry
            .jobs
            .get_mut(id)
            .ok_or_else(|| Error::JobNotFound(id.to_string()))?;
        let mut updated = job.clone();
        change(&mut updated)?;
        *job = updated.clone();
        Ok(updated)
    }

    /// Number of jobs.
    pub fn len(&self) -> usize {
        self.inner.read().jobs.len()
    }

    /// Whether the store holds no jobs.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::job::{JobInput, JobMetrics, JobOptions};
    use std::sync::Arc;
    use std::thread;

    fn job(id: &str) -> Job {
        Job::new(id, &JobInput::new("a.docx", vec![0]), JobOptions::default())
    }

    #[test]
    fn test_insert_and_list_order() {
        let store = JobStore::new();
        for id in ["c", "a", "b"] {
            store.insert(job(id)).unwrap();
        }
        let ids: Vec<String> = store.list(None).into_iter().map(|j| j.id).collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
        assert!(store.insert(job("a")).is_err());
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_list_filter() {
        let store = JobStore::new();
        store.insert(job("a")).unwrap();
        store.insert(job("b")).unwrap();
        store.update("b", Job::start).unwrap();

        let running = store.list(Some(JobStatus::Running));
        assert_eq!(running.len(), 1);
        assert_eq!(running[0].id, "b");
        assert_eq!(store.list(Some(JobStatus::Queued))[0].id, "a");
    }

    #[test]
    fn test_rejected_update_leaves_record() {
        let store = JobStore::new();
        store.insert(job("a")).unwrap();
        let result = store.update("a", |j| j.complete(Vec::new(), JobMetrics::default()));
        assert!(result.is_err());
        assert_eq!(store.get("a").unwrap().status, JobStatus::Queued);
    }

    #[test]
    fn test_update_missing() {
        let store = JobStore::new();
        assert!(matches!(
            store.update("nope", Job::start),
            Err(Error::JobNotFound(_))
        ));
    }

    #[test]
    fn test_single_claim_under_contention() {
        let store = Arc::new(JobStore::new());
        store.insert(job("a")).unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                thread::spawn(move || store.update("a", Job::start).is_ok())
            })
            .collect();
        let claims = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();
        assert_eq!(claims, 1);
    }
}
