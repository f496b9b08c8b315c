//! Aggregate statistics over the job history.

use super::job::{Job, JobStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Number of jobs listed under `recent_conversions`.
pub const RECENT_LIMIT: usize = 10;

/// Summary of one recent job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentConversion {
    /// Job id
    pub job_id: String,

    /// Input file name
    pub filename: String,

    /// Current state
    pub status: JobStatus,

    /// Submission time
    pub created_at: DateTime<Utc>,

    /// Seconds from submission to the terminal state
    pub duration_seconds: Option<f64>,
}

/// Dashboard statistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dashboard {
    /// All jobs
    pub total_conversions: usize,

    /// Jobs waiting for a worker
    pub queued: usize,

    /// Jobs being converted
    pub in_progress: usize,

    /// Completed jobs
    pub successful: usize,

    /// Failed jobs
    pub failed: usize,

    /// Images retained by completed jobs
    pub total_images_extracted: u64,

    /// Tables found by completed jobs
    pub total_tables_extracted: u64,

    /// Mean submission-to-completion time of completed jobs; 0 when none
    pub average_duration_seconds: f64,

    /// Most recent jobs, newest first
    pub recent_conversions: Vec<RecentConversion>,
}

impl Dashboard {
    /// Aggregate jobs given in creation order.
    pub fn from_jobs(jobs: &[Job]) -> Self {
        let mut dashboard = Dashboard {
            total_conversions: jobs.len(),
            ..Default::default()
        };
        let mut durations = Vec::new();

        for job in jobs {
            match job.status {
                JobStatus::Queued => dashboard.queued += 1,
                JobStatus::Running => dashboard.in_progress += 1,
                JobStatus::Completed => {
                    dashboard.successful += 1;
                    if let Some(duration) = job.duration_seconds() {
                        durations.push(duration);
                    }
                }
                JobStatus::Failed => dashboard.failed += 1,
            }
            if let Some(metrics) = &job.metrics {
                dashboard.total_images_extracted += u64::from(metrics.images);
                dashboard.total_tables_extracted += u64::from(metrics.tables);
            }
        }

        if !durations.is_empty() {
            dashboard.average_duration_seconds =
                durations.iter().sum::<f64>() / durations.len() as f64;
        }

        dashboard.recent_conversions = jobs
            .iter()
            .rev()
            .take(RECENT_LIMIT)
            .map(|job| RecentConversion {
                job_id: job.id.clone(),
                filename: job.input.filename.clone(),
                status: job.status,
                created_at: job.created_at,
                duration_seconds: job.duration_seconds(),
            })
            .collect();

        dashboard
    }
}
