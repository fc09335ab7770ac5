use super::errors::Result;
use super::genai::{CommitMessageGenerator, SYNTAX_ERROR_MARKER};
use super::git_ops::{RemoteStatus, VersionControl};
use super::github::{redact_url, RepoHost};
use super::repo_config::ProjectCfg;
use log::{debug, error, info, warn};

/// Commit message used when none could be generated.
pub const FALLBACK_MESSAGE: &str = "Auto commit";

/// The external services a project sync talks to.
pub struct Collaborators {
    pub vcs: Box<dyn VersionControl>,
    pub host: Box<dyn RepoHost>,
    pub generator: Box<dyn CommitMessageGenerator>,
}

#[derive(Debug)]
pub enum CycleOutcome {
    NothingToPush,
    Pushed,
    /// The generator flagged the diff, nothing was committed.
    SyntaxError,
    Aborted(super::errors::SyncError),
}

/// Make sure the folder is a repository wired to an existing remote.
/// Returns false when any step failed; the reason is already logged.
pub async fn prepare_project(collaborators: &Collaborators, project: &ProjectCfg) -> bool {
    let vcs = collaborators.vcs.as_ref();
    let folder = project.folder_path.as_path();

    if !vcs.has_metadata(folder).await {
        info!("Initializing git repository in {}", folder.display());
        if let Err(error) = vcs.init(folder).await {
            error!("Could not initialize git repository in {}: {error}", folder.display());
            return false;
        }
        if let Err(error) = vcs.configure_pull_rebase(folder).await {
            error!("Could not set pull.rebase in {}: {error}", folder.display());
            return false;
        }
    }

    let Some(remote_url) = collaborators.host.remote_url(&project.repo_name) else {
        error!("Could not resolve a remote URL for '{}'", project.repo_name);
        return false;
    };
    let shown_url = redact_url(&remote_url);

    match vcs.probe_remote(folder, &remote_url).await {
        RemoteStatus::Exists => debug!("Remote {shown_url} exists"),
        RemoteStatus::Absent => {
            info!("Remote {shown_url} does not exist, creating it");
            if let Err(error) =
                collaborators.host.create_repo(&project.repo_name, project.private).await
            {
                error!("Could not create repository '{}': {error}", project.repo_name);
                return false;
            }
        }
        RemoteStatus::Unknown(reason) => {
            error!("Could not tell whether {shown_url} exists: {reason}");
            return false;
        }
    }

    match vcs.origin_url(folder).await {
        Ok(Some(_)) => debug!("'origin' already set in {}", folder.display()),
        Ok(None) => {
            info!("Adding remote 'origin' -> {shown_url}");
            if let Err(error) = vcs.add_origin(folder, &remote_url).await {
                error!("Could not add remote 'origin' to {}: {error}", folder.display());
                return false;
            }
        }
        Err(error) => {
            error!("Could not read remotes of {}: {error}", folder.display());
            return false;
        }
    }

    true
}

/// One scheduled cycle: stage, describe, commit, pull, push.
pub async fn commit_and_push(collaborators: &Collaborators, project: &ProjectCfg) -> CycleOutcome {
    match try_commit_and_push(collaborators, project).await {
        Ok(CycleOutcome::NothingToPush) => {
            info!("Nothing to push for {}", project.repo_name);
            CycleOutcome::NothingToPush
        }
        Ok(outcome) => outcome,
        Err(error) => {
            error!("Commit and push failed for {}: {error}", project.repo_name);
            CycleOutcome::Aborted(error)
        }
    }
}

async fn try_commit_and_push(
    collaborators: &Collaborators,
    project: &ProjectCfg,
) -> Result<CycleOutcome> {
    let vcs = collaborators.vcs.as_ref();
    let folder = project.folder_path.as_path();

    vcs.add_all(folder).await?;

    let diff = vcs.staged_diff(folder).await?;
    if diff.trim().is_empty() {
        return Ok(CycleOutcome::NothingToPush);
    }

    let message = match collaborators.generator.generate_commit_message(&diff).await {
        Ok(message) if !message.trim().is_empty() => message,
        Ok(_) => {
            warn!("Generator returned an empty commit message, using fallback");
            FALLBACK_MESSAGE.to_string()
        }
        Err(error) => {
            warn!("Could not generate a commit message: {error}");
            FALLBACK_MESSAGE.to_string()
        }
    };

    if message.contains(SYNTAX_ERROR_MARKER) {
        error!("Commit message generator reported a syntax error for {}", project.repo_name);
        return Ok(CycleOutcome::SyntaxError);
    }
    info!("Commit message: {message}");

    vcs.commit(folder, &message).await?;

    vcs.pull(folder).await?;
    info!("Pulled changes for {}", project.repo_name);

    vcs.push(folder).await?;
    info!("Pushed changes to {}", project.repo_name);

    Ok(CycleOutcome::Pushed)
}
