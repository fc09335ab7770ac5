use super::config::Config;
use super::repo_config::ProjectCfg;
use super::scheduler::{JobKind, Scheduler};
use super::sync::{commit_and_push, prepare_project, Collaborators};
use log::{debug, error, info};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime};
use tokio::time;

const TICK: Duration = Duration::from_secs(1);
pub const DEFAULT_RELOAD_EVERY: Duration = Duration::from_secs(60);

/// What a reload does with the running project jobs when the new document
/// cannot be loaded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReloadPolicy {
    /// Cancel project jobs before parsing. A bad document leaves nothing scheduled.
    #[default]
    CancelFirst,
    /// Parse first and only replace the jobs when the document loaded.
    KeepOnFailure,
}

/// Owns the job list and reloads it whenever the config file changes.
pub struct Daemon {
    config_path: PathBuf,
    reload_every: Duration,
    policy: ReloadPolicy,
    last_modified: Option<SystemTime>,
    scheduler: Scheduler,
    collaborators: Collaborators,
}

impl Daemon {
    pub fn new(config_path: impl Into<PathBuf>, collaborators: Collaborators) -> Self {
        Self {
            config_path: config_path.into(),
            reload_every: DEFAULT_RELOAD_EVERY,
            policy: ReloadPolicy::default(),
            last_modified: None,
            scheduler: Scheduler::new(),
            collaborators,
        }
    }

    pub fn with_reload_every(mut self, reload_every: Duration) -> Self {
        self.reload_every = reload_every;
        self
    }

    pub fn with_policy(mut self, policy: ReloadPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// First load, then the recurring config poll.
    pub async fn start(&mut self, now: Instant) {
        self.check_for_changes(now).await;
        if self.scheduler.every(self.reload_every, now, JobKind::ReloadConfig).is_none() {
            error!(
                "Reload period of {:?} is too large, config changes will not be picked up",
                self.reload_every
            );
        }
    }

    /// Reload the configuration if its modification time moved forward.
    pub async fn check_for_changes(&mut self, now: Instant) {
        let modified = match std::fs::metadata(&self.config_path).and_then(|meta| meta.modified()) {
            Ok(modified) => modified,
            Err(error) => {
                error!("Could not read config file {}: {error}", self.config_path.display());
                return;
            }
        };

        if self.last_modified.is_some_and(|seen| modified <= seen) {
            return;
        }

        info!("Config file {} changed, reloading", self.config_path.display());
        self.last_modified = Some(modified);

        let config = match self.policy {
            ReloadPolicy::CancelFirst => {
                self.cancel_project_jobs();
                match Config::load_config(&self.config_path) {
                    Ok(config) => config,
                    Err(error) => {
                        error!("Could not reload configuration: {error}");
                        return;
                    }
                }
            }
            ReloadPolicy::KeepOnFailure => match Config::load_config(&self.config_path) {
                Ok(config) => {
                    self.cancel_project_jobs();
                    config
                }
                Err(error) => {
                    error!(
                        "Could not reload configuration, keeping {} scheduled projects: {error}",
                        self.scheduler.project_job_count()
                    );
                    return;
                }
            },
        };

        self.apply(config, now).await;
    }

    fn cancel_project_jobs(&mut self) {
        let cancelled = self.scheduler.cancel_project_jobs();
        debug!("Cancelled {cancelled} project jobs");
    }

    async fn apply(&mut self, config: Config, now: Instant) {
        self.collaborators.host.configure(config.github_user, config.github_token);
        self.collaborators
            .generator
            .configure(config.google_api_key, config.gemini_model);

        for project in config.projects {
            self.register_project(project, now).await;
        }
        info!(
            "Configuration reloaded, {} projects scheduled",
            self.scheduler.project_job_count()
        );
    }

    /// Set the project up and schedule its cycle. Nothing is scheduled if
    /// the interval is out of range or setup fails.
    pub async fn register_project(&mut self, project: ProjectCfg, now: Instant) {
        info!("Syncing project {} in {}", project.repo_name, project.folder_path.display());
        let Some(period) = project.period().filter(|period| now.checked_add(*period).is_some()) else {
            error!(
                "Interval of {} minutes for {} is too large, skipping it",
                project.interval, project.repo_name
            );
            return;
        };
        if !prepare_project(&self.collaborators, &project).await {
            return;
        }

        let repo_name = project.repo_name.clone();
        match self.scheduler.every(period, now, JobKind::Sync(project)) {
            Some(_) => info!("Scheduled {repo_name} every {} minutes", period.as_secs() / 60),
            None => error!("Could not schedule {repo_name}"),
        }
    }

    /// Run every job due at `now`, in registration order.
    pub async fn run_pending(&mut self, now: Instant) {
        for id in self.scheduler.due(now) {
            // an earlier reload in this tick may have cancelled it
            let Some(job) = self.scheduler.get(id) else {
                continue;
            };

            match job.kind.clone() {
                JobKind::ReloadConfig => self.check_for_changes(now).await,
                JobKind::Sync(project) => {
                    let outcome = commit_and_push(&self.collaborators, &project).await;
                    debug!("Cycle for {} finished: {outcome:?}", project.repo_name);
                }
            }
            self.scheduler.mark_ran(id, Instant::now().max(now));
        }
    }

    /// Tick once per second until the future is dropped.
    pub async fn run(&mut self) {
        loop {
            self.run_pending(Instant::now()).await;
            time::sleep(TICK).await;
        }
    }
}
