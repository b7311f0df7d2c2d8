//! The few things we need from a local `git`.

use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::errors::RipioError;
use crate::names::RepoReference;

/// Local git tooling, treated as a black box.
pub trait GitTool {
    /// Clone `url` into `dest`, reporting progress messages as they arrive.
    fn clone_repo(
        &self,
        url: &str,
        dest: &Path,
        progress: &mut dyn FnMut(&str),
    ) -> Result<(), RipioError>;

    /// The URL of the `origin` remote of a working copy.
    fn origin_url(&self, working_copy: &Path) -> Result<String, RipioError>;
}

/// A [`GitTool`] which shells out to the `git` executable.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Git;

impl GitTool for Git {
    fn clone_repo(
        &self,
        url: &str,
        dest: &Path,
        progress: &mut dyn FnMut(&str),
    ) -> Result<(), RipioError> {
        let mut child = Command::new("git")
            .arg("clone")
            .arg("--progress")
            .arg(url)
            .arg(dest)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| failed("git clone", e.to_string()))?;

        // git rewrites its progress line in place with '\r'
        let mut complaints = Vec::new();
        if let Some(stderr) = child.stderr.take() {
            for chunk in BufReader::new(stderr).split(b'\r') {
                let chunk = chunk.map_err(|e| failed("git clone", e.to_string()))?;
                for line in String::from_utf8_lossy(&chunk).lines() {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    trace!("git: {}", line);
                    if is_complaint(line) {
                        complaints.push(line.to_string());
                    } else {
                        progress(line);
                    }
                }
            }
        }

        let status = child
            .wait()
            .map_err(|e| failed("git clone", e.to_string()))?;

        if status.success() {
            Ok(())
        } else if complaints.is_empty() {
            Err(failed("git clone", format!("exited with {}", status)))
        } else {
            Err(failed("git clone", complaints.join("\n")))
        }
    }

    fn origin_url(&self, working_copy: &Path) -> Result<String, RipioError> {
        let output = Command::new("git")
            .arg("remote")
            .arg("get-url")
            .arg("origin")
            .current_dir(working_copy)
            .output()
            .map_err(|e| failed("git remote get-url origin", e.to_string()))?;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
        } else {
            Err(failed(
                "git remote get-url origin",
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ))
        }
    }
}

fn failed<M: Into<String>>(command: &str, message: M) -> RipioError {
    RipioError::GitFailed {
        command: command.to_string(),
        message: message.into(),
    }
}

fn is_complaint(line: &str) -> bool {
    ["fatal:", "error:", "ERROR:", "remote: ERROR"]
        .iter()
        .any(|prefix| line.starts_with(prefix))
        || line.contains("Permission denied")
}

/// Make sure `reference` can be cloned into `dest`.
pub fn check_destination(
    dest: &Path,
    reference: &RepoReference,
    git: &dyn GitTool,
) -> Result<(), RipioError> {
    if !dest.exists() {
        return Ok(());
    }

    if !dest.join(".git").exists() {
        return Err(RipioError::DirectoryAlreadyExists(dest.display().to_string()));
    }

    let origin = git.origin_url(dest).unwrap_or_default();
    debug!("{} is a working copy of {:?}", dest.display(), origin);

    match RepoReference::from_origin(&origin) {
        Ok(ref existing) if existing == reference => Err(RipioError::RepositoryAlreadyCloned {
            reference: reference.global_name(),
            path: dest.display().to_string(),
        }),
        Ok(existing) => Err(RipioError::UnrelatedRepository {
            path: dest.display().to_string(),
            origin: existing.global_name(),
        }),
        Err(_) => Err(RipioError::UnrelatedRepository {
            path: dest.display().to_string(),
            origin,
        }),
    }
}

/// Walk up from `start` looking for the root of a git working copy.
pub fn find_working_copy(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(".git").exists())
        .map(Path::to_path_buf)
}
