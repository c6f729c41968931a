//! Turns mapped dates into backdated empty commits.
//!
//! Work is split in two so that dry-run and execute agree on every decision:
//! [`CommitScheduler::plan`] queries history and decides create-or-skip per
//! date, then [`CommitScheduler::apply`] (or [`CommitScheduler::dry_run`])
//! walks the plan in order. A failure on one date never stops the others.

use chrono::NaiveDate;
use tracing::{info, warn};

use crate::calendar::MappedDate;
use crate::config::ArtParams;
use crate::error::Result;
use crate::history::CommitHistory;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    DryRun,
    Execute,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// `forced` is set when a commit already existed and the guard was overridden.
    Create { forced: bool },
    SkipDuplicate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedCommit {
    pub target: MappedDate,
    pub action: Action,
    pub message: String,
}

impl PlannedCommit {
    pub fn date(&self) -> NaiveDate {
        self.target.date
    }

    pub fn creates(&self) -> bool {
        matches!(self.action, Action::Create { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateOutcome {
    Created,
    WouldCreate,
    SkippedDuplicate,
    Failed { reason: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub outcomes: Vec<(MappedDate, DateOutcome)>,
    pub created: usize,
    pub planned: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl RunReport {
    fn record(&mut self, target: MappedDate, outcome: DateOutcome) {
        match &outcome {
            DateOutcome::Created => self.created += 1,
            DateOutcome::WouldCreate => self.planned += 1,
            DateOutcome::SkippedDuplicate => self.skipped += 1,
            DateOutcome::Failed { .. } => self.failed += 1,
        }
        self.outcomes.push((target, outcome));
    }

    pub fn is_success(&self) -> bool {
        self.failed == 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Completed(RunReport),
    /// Confirmation was declined; nothing was written.
    Aborted { plan: Vec<PlannedCommit> },
}

/// Commit message for a cell: the prefix plus where the pixel came from.
pub fn commit_message(prefix: &str, target: &MappedDate) -> String {
    format!(
        "{prefix}: Pixel on {} (row {}, col {})",
        target.date.format("%Y-%m-%d"),
        target.row,
        target.col
    )
}

pub struct CommitScheduler<'a, H: CommitHistory> {
    history: &'a mut H,
    params: &'a ArtParams,
}

impl<'a, H: CommitHistory> CommitScheduler<'a, H> {
    pub fn new(history: &'a mut H, params: &'a ArtParams) -> Self {
        Self { history, params }
    }

    /// Decide create-or-skip for every date. Reads history, writes nothing.
    pub fn plan(&mut self, dates: &[MappedDate], force: bool) -> Result<Vec<PlannedCommit>> {
        let mut plan = Vec::with_capacity(dates.len());
        for target in dates {
            let exists = self.history.has_commit_on(target.date)?;
            let action = match (exists, force) {
                (true, false) => Action::SkipDuplicate,
                (exists, _) => Action::Create { forced: exists },
            };
            plan.push(PlannedCommit {
                target: *target,
                action,
                message: commit_message(&self.params.prefix, target),
            });
        }
        Ok(plan)
    }

    /// Report what [`CommitScheduler::apply`] would do with `plan`.
    pub fn dry_run(&self, plan: &[PlannedCommit]) -> RunReport {
        let mut report = RunReport::default();
        for entry in plan {
            let outcome = if entry.creates() {
                DateOutcome::WouldCreate
            } else {
                DateOutcome::SkippedDuplicate
            };
            report.record(entry.target, outcome);
        }
        report
    }

    /// Create every planned commit in order. Per-date failures are recorded, not raised.
    pub fn apply(&mut self, plan: &[PlannedCommit]) -> RunReport {
        let mut report = RunReport::default();
        for entry in plan {
            let outcome = match entry.action {
                Action::SkipDuplicate => {
                    info!(date = %entry.date(), "skipped: duplicate");
                    DateOutcome::SkippedDuplicate
                }
                Action::Create { forced } => {
                    match self.history.create_empty_commit(
                        entry.date(),
                        self.params.commit_time,
                        &entry.message,
                    ) {
                        Ok(()) => {
                            info!(date = %entry.date(), forced, "created commit");
                            DateOutcome::Created
                        }
                        Err(e) => {
                            warn!(date = %entry.date(), error = %e, "commit failed");
                            DateOutcome::Failed {
                                reason: e.to_string(),
                            }
                        }
                    }
                }
            };
            report.record(entry.target, outcome);
        }
        report
    }

    /// Check the repository, plan, then either report (dry-run) or ask
    /// `confirm` once and apply (execute).
    pub fn run<F>(
        &mut self,
        dates: &[MappedDate],
        force: bool,
        mode: Mode,
        confirm: F,
    ) -> Result<RunOutcome>
    where
        F: FnOnce(&[PlannedCommit]) -> bool,
    {
        self.history.ensure_ready()?;
        let plan = self.plan(dates, force)?;

        match mode {
            Mode::DryRun => Ok(RunOutcome::Completed(self.dry_run(&plan))),
            Mode::Execute => {
                if plan.iter().any(PlannedCommit::creates) && !confirm(&plan) {
                    info!("run aborted at confirmation");
                    return Ok(RunOutcome::Aborted { plan });
                }
                Ok(RunOutcome::Completed(self.apply(&plan)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::map_grid;
    use crate::error::GitArtError;
    use crate::grid::PixelGrid;
    use crate::history::MemoryHistory;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn strip_2024() -> Vec<MappedDate> {
        let grid =
            PixelGrid::from_rows(vec![vec![true, false, true]], &ArtParams::default()).unwrap();
        map_grid(&grid, 2024).unwrap()
    }

    fn completed(outcome: RunOutcome) -> RunReport {
        match outcome {
            RunOutcome::Completed(report) => report,
            RunOutcome::Aborted { .. } => panic!("run was aborted"),
        }
    }

    #[test]
    fn message_names_date_and_cell() {
        let dates = strip_2024();
        assert_eq!(
            commit_message("ArtCommit", &dates[1]),
            "ArtCommit: Pixel on 2024-01-21 (row 0, col 2)"
        );
    }

    #[test]
    fn dry_run_plans_without_writing() {
        let params = ArtParams::default();
        let mut history = MemoryHistory::new();
        let report = completed(
            CommitScheduler::new(&mut history, &params)
                .run(&strip_2024(), false, Mode::DryRun, |_| {
                    panic!("dry-run must not prompt")
                })
                .unwrap(),
        );

        assert_eq!(report.planned, 2);
        assert_eq!(report.created, 0);
        assert!(report
            .outcomes
            .iter()
            .all(|(_, o)| *o == DateOutcome::WouldCreate));
        assert_eq!(history.created(), 0);
    }

    #[test]
    fn execute_creates_then_second_run_skips() {
        let params = ArtParams::default();
        let dates = strip_2024();
        let mut history = MemoryHistory::new();

        let first = completed(
            CommitScheduler::new(&mut history, &params)
                .run(&dates, false, Mode::Execute, |_| true)
                .unwrap(),
        );
        assert_eq!((first.created, first.skipped, first.failed), (2, 0, 0));
        assert_eq!(
            history.messages_on(ymd(2024, 1, 7)),
            ["ArtCommit: Pixel on 2024-01-07 (row 0, col 0)".to_string()]
        );

        let second = completed(
            CommitScheduler::new(&mut history, &params)
                .run(&dates, false, Mode::Execute, |_| true)
                .unwrap(),
        );
        assert_eq!((second.created, second.skipped), (0, 2));
        assert_eq!(history.created(), 2);
    }

    #[test]
    fn dry_run_matches_execute_decisions() {
        let params = ArtParams::default();
        let dates = strip_2024();
        let seeded = MemoryHistory::new().with_commit(ymd(2024, 1, 21), "unrelated work");

        let mut dry_history = seeded.clone();
        let dry = completed(
            CommitScheduler::new(&mut dry_history, &params)
                .run(&dates, false, Mode::DryRun, |_| true)
                .unwrap(),
        );

        let mut exec_history = seeded;
        let exec = completed(
            CommitScheduler::new(&mut exec_history, &params)
                .run(&dates, false, Mode::Execute, |_| true)
                .unwrap(),
        );

        let as_flags = |r: &RunReport| -> Vec<bool> {
            r.outcomes
                .iter()
                .map(|(_, o)| matches!(o, DateOutcome::WouldCreate | DateOutcome::Created))
                .collect()
        };
        assert_eq!(as_flags(&dry), vec![true, false]);
        assert_eq!(as_flags(&dry), as_flags(&exec));
        assert_eq!(dry_history.created(), 0);
        assert_eq!(exec_history.created(), 1);
    }

    #[test]
    fn force_adds_alongside_existing_commit() {
        let params = ArtParams::default();
        let mut history = MemoryHistory::new().with_commit(ymd(2024, 1, 7), "existing");

        let mut scheduler = CommitScheduler::new(&mut history, &params);
        let plan = scheduler.plan(&strip_2024(), true).unwrap();
        assert_eq!(plan[0].action, Action::Create { forced: true });
        assert_eq!(plan[1].action, Action::Create { forced: false });

        let report = scheduler.apply(&plan);
        assert_eq!(report.created, 2);
        assert_eq!(history.messages_on(ymd(2024, 1, 7)).len(), 2);
        assert_eq!(history.messages_on(ymd(2024, 1, 7))[0], "existing");
    }

    #[test]
    fn one_failed_date_does_not_stop_the_rest() {
        let params = ArtParams::default();
        let mut history = MemoryHistory::new().failing_on(ymd(2024, 1, 7));

        let report = completed(
            CommitScheduler::new(&mut history, &params)
                .run(&strip_2024(), false, Mode::Execute, |_| true)
                .unwrap(),
        );
        assert_eq!((report.created, report.failed), (1, 1));
        assert!(!report.is_success());
        assert!(matches!(report.outcomes[0].1, DateOutcome::Failed { .. }));
        assert_eq!(report.outcomes[1].1, DateOutcome::Created);
    }

    #[test]
    fn declined_confirmation_writes_nothing() {
        let params = ArtParams::default();
        let mut history = MemoryHistory::new();
        let outcome = CommitScheduler::new(&mut history, &params)
            .run(&strip_2024(), false, Mode::Execute, |plan| {
                assert_eq!(plan.len(), 2);
                false
            })
            .unwrap();

        assert!(matches!(outcome, RunOutcome::Aborted { ref plan } if plan.len() == 2));
        assert_eq!(history.created(), 0);
    }

    #[test]
    fn missing_repository_fails_before_planning() {
        let params = ArtParams::default();
        let mut history = MemoryHistory::new().unavailable();
        let err = CommitScheduler::new(&mut history, &params)
            .run(&strip_2024(), false, Mode::DryRun, |_| true)
            .unwrap_err();
        assert!(matches!(err, GitArtError::Repository { .. }));
    }
}
