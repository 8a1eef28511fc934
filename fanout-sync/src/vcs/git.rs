//! [`Vcs`] backed by the system `git` binary.

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;

use fanout_core::Hash;

use super::{Vcs, VcsError};

/// Runs `git` in a fixed working directory.
///
/// Children inherit no stdin, never prompt for credentials, and are killed
/// if the future awaiting them is dropped (e.g. by a probe timeout).
#[derive(Debug, Clone)]
pub struct GitCli {
    workdir: PathBuf,
}

impl GitCli {
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
        }
    }

    async fn run(&self, args: &[&str]) -> Result<String, VcsError> {
        let joined = args.join(" ");
        tracing::debug!(dir = %self.workdir.display(), "git {joined}");

        let output = Command::new("git")
            .args(args)
            .current_dir(&self.workdir)
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| VcsError::Spawn {
                args: joined.clone(),
                reason: e.to_string(),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(VcsError::Command {
                args: joined,
                stderr: if stderr.is_empty() {
                    format!("exited with {}", output.status)
                } else {
                    stderr
                },
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

/// First field of the first line of `git ls-remote` output, if any.
fn parse_ls_remote(args: &str, stdout: &str) -> Result<Option<Hash>, VcsError> {
    let Some(line) = stdout.lines().find(|l| !l.trim().is_empty()) else {
        return Ok(None);
    };
    match line.split_whitespace().next() {
        Some(hash) if hash.chars().all(|c| c.is_ascii_hexdigit()) => Ok(Some(Hash::from(hash))),
        _ => Err(VcsError::Parse {
            args: args.to_string(),
            output: line.to_string(),
        }),
    }
}

#[async_trait]
impl Vcs for GitCli {
    async fn is_repository(&self) -> bool {
        matches!(
            self.run(&["rev-parse", "--is-inside-work-tree"]).await.as_deref(),
            Ok("true")
        )
    }

    async fn remotes(&self) -> Result<Vec<String>, VcsError> {
        let out = self.run(&["remote"]).await?;
        Ok(out
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect())
    }

    async fn current_branch(&self) -> Result<String, VcsError> {
        let args = ["symbolic-ref", "--quiet", "--short", "HEAD"];
        let branch = self.run(&args).await.map_err(|e| match e {
            VcsError::Command { args, .. } => VcsError::Command {
                args,
                stderr: "HEAD is detached; pass --branch".to_string(),
            },
            other => other,
        })?;
        if branch.is_empty() {
            return Err(VcsError::Parse {
                args: args.join(" "),
                output: branch,
            });
        }
        Ok(branch)
    }

    async fn local_ref(&self, branch: &str) -> Result<Hash, VcsError> {
        let spec = format!("refs/heads/{branch}^{{commit}}");
        let out = self.run(&["rev-parse", "--verify", "--quiet", &spec]).await?;
        Ok(Hash::from(out))
    }

    async fn commit_subject(&self, commit: &Hash) -> Result<String, VcsError> {
        self.run(&["log", "-1", "--format=%s", commit.as_str()]).await
    }

    async fn remote_ref(&self, remote: &str, branch: &str) -> Result<Option<Hash>, VcsError> {
        let refname = format!("refs/heads/{branch}");
        let args = ["ls-remote", remote, refname.as_str()];
        let out = self.run(&args).await?;
        parse_ls_remote(&args.join(" "), &out)
    }

    async fn push(&self, remote: &str, branch: &str) -> Result<(), VcsError> {
        let refspec = format!("refs/heads/{branch}:refs/heads/{branch}");
        self.run(&["push", "--quiet", remote, &refspec]).await?;
        Ok(())
    }

    async fn force_push(&self, remote: &str, branch: &str) -> Result<(), VcsError> {
        let refspec = format!("refs/heads/{branch}:refs/heads/{branch}");
        self.run(&["push", "--quiet", "--force", remote, &refspec])
            .await?;
        Ok(())
    }

    async fn pull_rebase(&self, source: &str, branch: &str) -> Result<(), VcsError> {
        self.run(&["pull", "--rebase", "--quiet", source, branch])
            .await?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ls_remote_empty_output_is_absent() {
        assert_eq!(parse_ls_remote("ls-remote", "").unwrap(), None);
        assert_eq!(parse_ls_remote("ls-remote", "\n  \n").unwrap(), None);
    }

    #[test]
    fn ls_remote_takes_first_hash() {
        let out = "3f786850e387550fdab836ed7e6dc881de23001b\trefs/heads/main\n";
        assert_eq!(
            parse_ls_remote("ls-remote", out).unwrap(),
            Some(Hash::from("3f786850e387550fdab836ed7e6dc881de23001b"))
        );
    }

    #[test]
    fn ls_remote_garbage_is_a_parse_error() {
        let err = parse_ls_remote("ls-remote origin", "warning: something odd").unwrap_err();
        assert!(matches!(err, VcsError::Parse { .. }));
    }

    #[tokio::test]
    async fn plain_directory_is_not_a_repository() {
        let dir = tempfile::TempDir::new().expect("tempdir");
        let git = GitCli::new(dir.path());
        assert!(!git.is_repository().await);
    }
}
