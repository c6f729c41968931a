//! Read and append access to a repository's commit history.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::process::{Command, Output, Stdio};

use chrono::{NaiveDate, NaiveTime};
use tracing::{debug, info, warn};

use crate::error::{GitArtError, Result};

/// The only side-effecting dependency of the scheduler.
pub trait CommitHistory {
    /// Fails with [`GitArtError::Repository`] when no usable repository is present.
    fn ensure_ready(&mut self) -> Result<()>;

    /// Whether any commit is already authored on `date`.
    fn has_commit_on(&mut self, date: NaiveDate) -> Result<bool>;

    /// Record an empty commit authored and committed at `date` + `time`.
    fn create_empty_commit(&mut self, date: NaiveDate, time: NaiveTime, message: &str)
        -> Result<()>;
}

// --- git executable ---

/// History backed by the `git` binary, run from `root`.
///
/// Commits are written with `commit-tree` + `update-ref` on top of HEAD's own
/// tree, so whatever sits in the index never ends up in an art commit.
#[derive(Debug)]
pub struct GitRepository {
    root: PathBuf,
    env: Vec<(String, String)>,
    // Author dates of every commit reachable from HEAD; loaded on first query.
    dates: Option<BTreeSet<NaiveDate>>,
}

impl GitRepository {
    pub fn open(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            env: Vec::new(),
            dates: None,
        }
    }

    /// Extra environment for every git invocation (locale, config overrides).
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    fn run(&self, args: &[&str], env: &[(&str, &str)]) -> std::io::Result<Output> {
        let mut cmd = Command::new("git");
        cmd.current_dir(&self.root).args(args).stdin(Stdio::null());
        for (k, v) in &self.env {
            cmd.env(k, v);
        }
        for (k, v) in env {
            cmd.env(k, v);
        }
        debug!(?args, root = %self.root.display(), "running git");
        cmd.output()
    }

    /// Run git and return trimmed stdout, mapping any failure through `fail`.
    fn run_ok(
        &self,
        args: &[&str],
        env: &[(&str, &str)],
        fail: impl Fn(String) -> GitArtError,
    ) -> Result<String> {
        let output = self.run(args, env).map_err(|e| fail(e.to_string()))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stdout = String::from_utf8_lossy(&output.stdout);
            let detail = if stderr.trim().is_empty() { stdout } else { stderr };
            return Err(fail(format!("git {}: {}", args[0], detail.trim())));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    /// Commit id HEAD points at, or `None` on an unborn branch.
    ///
    /// Decided by exit status alone so it works in any git locale.
    fn head(&self) -> Result<Option<String>> {
        let output = self
            .run(&["rev-parse", "--verify", "-q", "HEAD^{commit}"], &[])
            .map_err(|e| GitArtError::Repository {
                message: format!("git executable not found ({e})"),
            })?;
        if !output.status.success() {
            return Ok(None);
        }
        let id = String::from_utf8_lossy(&output.stdout).trim().to_string();
        Ok((!id.is_empty()).then_some(id))
    }

    fn load_dates(&self) -> Result<BTreeSet<NaiveDate>> {
        if self.head()?.is_none() {
            info!("repository has no commits yet");
            return Ok(BTreeSet::new());
        }

        let stdout = self.run_ok(
            &["log", "--pretty=format:%ad", "--date=short"],
            &[],
            |message| GitArtError::Repository { message },
        )?;
        let dates: BTreeSet<NaiveDate> = stdout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .filter_map(|line| match NaiveDate::parse_from_str(line, "%Y-%m-%d") {
                Ok(date) => Some(date),
                Err(e) => {
                    warn!(line, error = %e, "could not parse commit date");
                    None
                }
            })
            .collect();
        info!(days = dates.len(), "loaded existing commit dates");
        Ok(dates)
    }
}

impl CommitHistory for GitRepository {
    fn ensure_ready(&mut self) -> Result<()> {
        let output = self
            .run(&["rev-parse", "--is-inside-work-tree"], &[])
            .map_err(|e| GitArtError::Repository {
                message: format!("git executable not found ({e}); is git installed and on PATH?"),
            })?;

        let inside = String::from_utf8_lossy(&output.stdout).trim() == "true";
        if !output.status.success() || !inside {
            return Err(GitArtError::Repository {
                message: format!("{} is not a git work tree", self.root.display()),
            });
        }
        Ok(())
    }

    fn has_commit_on(&mut self, date: NaiveDate) -> Result<bool> {
        if self.dates.is_none() {
            self.dates = Some(self.load_dates()?);
        }
        Ok(self.dates.as_ref().is_some_and(|d| d.contains(&date)))
    }

    fn create_empty_commit(
        &mut self,
        date: NaiveDate,
        time: NaiveTime,
        message: &str,
    ) -> Result<()> {
        let fail = |message: String| GitArtError::CommitCreation { date, message };
        let stamp = format!("{}T{}", date.format("%Y-%m-%d"), time.format("%H:%M:%S"));
        let dates_env = [
            ("GIT_AUTHOR_DATE", stamp.as_str()),
            ("GIT_COMMITTER_DATE", stamp.as_str()),
        ];

        let head = self.head().map_err(|e| fail(e.to_string()))?;
        let tree = match &head {
            Some(id) => {
                let rev = format!("{id}^{{tree}}");
                self.run_ok(&["rev-parse", rev.as_str()], &[], fail)?
            }
            // Empty stdin gives the empty tree.
            None => self.run_ok(&["mktree"], &[], fail)?,
        };

        let mut args = vec!["commit-tree", tree.as_str()];
        if let Some(id) = &head {
            args.extend(["-p", id.as_str()]);
        }
        args.extend(["-m", message]);
        let commit = self.run_ok(&args, &dates_env, fail)?;

        // Passing the old id makes the update fail if HEAD moved underneath us.
        let reflog = format!("commit-canvas: {message}");
        let mut update = vec!["update-ref", "-m", reflog.as_str(), "HEAD", commit.as_str()];
        if let Some(id) = &head {
            update.push(id.as_str());
        }
        self.run_ok(&update, &[], fail)?;
        debug!(%date, %commit, "wrote empty commit");

        if let Some(dates) = self.dates.as_mut() {
            dates.insert(date);
        }
        Ok(())
    }
}

// --- in-memory ---

/// History kept in a map; lets planning and partial-failure paths run without git.
#[derive(Debug, Default, Clone)]
pub struct MemoryHistory {
    commits: BTreeMap<NaiveDate, Vec<String>>,
    failing: BTreeSet<NaiveDate>,
    unavailable: bool,
    created: usize,
}

impl MemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pretend a commit already exists on `date`.
    pub fn with_commit(mut self, date: NaiveDate, message: &str) -> Self {
        self.commits.entry(date).or_default().push(message.to_string());
        self
    }

    /// Make `create_empty_commit` fail for `date`.
    pub fn failing_on(mut self, date: NaiveDate) -> Self {
        self.failing.insert(date);
        self
    }

    /// Make `ensure_ready` fail, as if outside a repository.
    pub fn unavailable(mut self) -> Self {
        self.unavailable = true;
        self
    }

    pub fn messages_on(&self, date: NaiveDate) -> &[String] {
        self.commits.get(&date).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Commits created through [`CommitHistory::create_empty_commit`].
    pub fn created(&self) -> usize {
        self.created
    }
}

impl CommitHistory for MemoryHistory {
    fn ensure_ready(&mut self) -> Result<()> {
        if self.unavailable {
            return Err(GitArtError::Repository {
                message: "no repository".into(),
            });
        }
        Ok(())
    }

    fn has_commit_on(&mut self, date: NaiveDate) -> Result<bool> {
        Ok(self.commits.get(&date).is_some_and(|m| !m.is_empty()))
    }

    fn create_empty_commit(
        &mut self,
        date: NaiveDate,
        _time: NaiveTime,
        message: &str,
    ) -> Result<()> {
        if self.failing.contains(&date) {
            return Err(GitArtError::CommitCreation {
                date,
                message: "simulated failure".into(),
            });
        }
        self.commits.entry(date).or_default().push(message.to_string());
        self.created += 1;
        Ok(())
    }
}
