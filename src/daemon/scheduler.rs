use super::repo_config::ProjectCfg;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JobId(u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobKind {
    ReloadConfig,
    Sync(ProjectCfg),
}

#[derive(Debug, Clone)]
pub struct Job {
    pub id: JobId,
    pub every: Duration,
    pub next_run: Instant,
    pub kind: JobKind,
}

impl Job {
    pub fn is_project(&self) -> bool {
        matches!(self.kind, JobKind::Sync(_))
    }
}

/// Recurring jobs kept in registration order.
#[derive(Debug, Default)]
pub struct Scheduler {
    jobs: Vec<Job>,
    next_id: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a job whose first run is one period after `now`.
    /// Returns `None` if that point in time cannot be represented.
    pub fn every(&mut self, every: Duration, now: Instant, kind: JobKind) -> Option<JobId> {
        let next_run = now.checked_add(every)?;
        let id = JobId(self.next_id);
        self.next_id += 1;
        self.jobs.push(Job { id, every, next_run, kind });
        Some(id)
    }

    /// Drop every project job, leaving the reload job alone.
    pub fn cancel_project_jobs(&mut self) -> usize {
        let before = self.jobs.len();
        self.jobs.retain(|job| !job.is_project());
        before - self.jobs.len()
    }

    pub fn due(&self, now: Instant) -> Vec<JobId> {
        self.jobs
            .iter()
            .filter(|job| job.next_run <= now)
            .map(|job| job.id)
            .collect()
    }

    pub fn get(&self, id: JobId) -> Option<&Job> {
        self.jobs.iter().find(|job| job.id == id)
    }

    /// Next run is one period after the job finished, so a slow tick pushes it back.
    /// A job whose next run would overflow the clock is dropped.
    pub fn mark_ran(&mut self, id: JobId, finished_at: Instant) {
        let Some(index) = self.jobs.iter().position(|job| job.id == id) else {
            return;
        };
        match finished_at.checked_add(self.jobs[index].every) {
            Some(next_run) => self.jobs[index].next_run = next_run,
            None => {
                self.jobs.remove(index);
            }
        }
    }

    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    pub fn project_job_count(&self) -> usize {
        self.jobs.iter().filter(|job| job.is_project()).count()
    }
}
