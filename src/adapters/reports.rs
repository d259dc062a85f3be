//! CSV reports written at the end of each phase.
//!
//! Four files under one output directory:
//! - `users.csv` — confidently matched users, consumed downstream;
//! - `dept-validation-errors-report.csv` — users needing manual review,
//!   with the best guess and its confidence;
//! - `user-successfully-sync.csv` — memberships confirmed this run;
//! - `user-not-synchronized.csv` — per-user failures; a non-empty file
//!   is the alerting signal for this run.

use crate::domain::model::{ClassifiedUser, MembershipOutcome};
use crate::utils::error::Result;
use std::fs;
use std::path::PathBuf;

pub const MATCHED_USERS_FILE: &str = "users.csv";
pub const REVIEW_REPORT_FILE: &str = "dept-validation-errors-report.csv";
pub const SUCCESS_REPORT_FILE: &str = "user-successfully-sync.csv";
pub const FAILURE_REPORT_FILE: &str = "user-not-synchronized.csv";

#[derive(Debug, Clone)]
pub struct ReportWriter {
    output_dir: PathBuf,
}

impl ReportWriter {
    /// Creating the output directory is a fatal setup error when it
    /// fails; nothing remote has been touched yet.
    pub fn new(output_dir: impl Into<PathBuf>) -> Result<Self> {
        let output_dir = output_dir.into();
        fs::create_dir_all(&output_dir)?;
        Ok(Self { output_dir })
    }

    pub fn path_of(&self, file: &str) -> PathBuf {
        self.output_dir.join(file)
    }

    pub fn write_matched_users(&self, users: &[ClassifiedUser]) -> Result<PathBuf> {
        let path = self.path_of(MATCHED_USERS_FILE);
        let mut writer = csv::Writer::from_path(&path)?;
        writer.write_record([
            "CN",
            "Email",
            "SAMAccountName",
            "Department",
            "Valid-Department",
        ])?;
        for user in users {
            writer.write_record([
                user.user.cn.as_str(),
                user.user.email.as_str(),
                user.user.account_name.as_str(),
                user.user.department.as_str(),
                user.matched.as_deref().unwrap_or(""),
            ])?;
        }
        writer.flush()?;
        Ok(path)
    }

    pub fn write_review_report(&self, users: &[ClassifiedUser]) -> Result<PathBuf> {
        let path = self.path_of(REVIEW_REPORT_FILE);
        let mut writer = csv::Writer::from_path(&path)?;
        writer.write_record([
            "CN",
            "Email",
            "SAMAccountName",
            "Department",
            "Predicted-Valid-Department",
            "Confidence-Score",
        ])?;
        for user in users {
            let score = format!("{:.2}%", user.confidence * 100.0);
            writer.write_record([
                user.user.cn.as_str(),
                user.user.email.as_str(),
                user.user.account_name.as_str(),
                user.user.department.as_str(),
                user.best_guess.as_str(),
                score.as_str(),
            ])?;
        }
        writer.flush()?;
        Ok(path)
    }

    /// Failures and successes land in separate files so a non-empty
    /// failure report can drive downstream alerting on its own.
    pub fn write_outcome_reports(&self, outcomes: &[MembershipOutcome]) -> Result<()> {
        let failure_path = self.path_of(FAILURE_REPORT_FILE);
        let mut failures = csv::Writer::from_path(&failure_path)?;
        failures.write_record(["name", "email", "status"])?;

        let success_path = self.path_of(SUCCESS_REPORT_FILE);
        let mut successes = csv::Writer::from_path(&success_path)?;
        successes.write_record(["name", "email", "team_id", "status"])?;

        for outcome in outcomes {
            let status = outcome.status.to_string();
            if outcome.is_success() {
                successes.write_record([
                    outcome.user.cn.as_str(),
                    outcome.user.email.as_str(),
                    outcome.team_id.as_deref().unwrap_or(""),
                    status.as_str(),
                ])?;
            } else {
                failures.write_record([
                    outcome.user.cn.as_str(),
                    outcome.user.email.as_str(),
                    status.as_str(),
                ])?;
            }
        }
        failures.flush()?;
        successes.flush()?;
        Ok(())
    }
}
