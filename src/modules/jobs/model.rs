use crate::common::error::DeepSeaError;
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use time::OffsetDateTime;

/// Shared by jobs and the media inside them: `QUEUED -> RUNNING -> SUCCESS | FAILED`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobStatus {
    Queued,
    Running,
    Success,
    Failed,
}

impl JobStatus {
    pub const ALL: [JobStatus; 4] = [
        JobStatus::Queued,
        JobStatus::Running,
        JobStatus::Success,
        JobStatus::Failed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "QUEUED",
            JobStatus::Running => "RUNNING",
            JobStatus::Success => "SUCCESS",
            JobStatus::Failed => "FAILED",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = DeepSeaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "QUEUED" => Ok(JobStatus::Queued),
            "RUNNING" => Ok(JobStatus::Running),
            "SUCCESS" => Ok(JobStatus::Success),
            "FAILED" => Ok(JobStatus::Failed),
            other => Err(DeepSeaError::Config(format!("unknown job status '{}'", other))),
        }
    }
}

// Rows as stored; status is TEXT in the database.
#[derive(Debug, Clone, FromRow)]
pub struct JobRow {
    pub name: String,
    pub processor: String,
    pub status: String,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, FromRow)]
pub struct MediaRow {
    pub job: String,
    pub name: String,
    pub status: String,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, FromRow)]
pub struct TransitionRow {
    pub job: String,
    pub media: Option<String>,
    pub status: String,
    pub at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub name: String,
    pub processor: String,
    pub media: Vec<String>,
    pub status: JobStatus,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaInJob {
    pub job: String,
    pub name: String,
    pub status: JobStatus,
    pub updated_at: OffsetDateTime,
}

/// One status write, in the order it happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub job: String,
    pub media: Option<String>,
    pub status: JobStatus,
    pub at: OffsetDateTime,
}

impl TryFrom<MediaRow> for MediaInJob {
    type Error = DeepSeaError;

    fn try_from(row: MediaRow) -> Result<Self, Self::Error> {
        Ok(Self {
            status: row.status.parse()?,
            job: row.job,
            name: row.name,
            updated_at: row.updated_at,
        })
    }
}

impl TryFrom<TransitionRow> for Transition {
    type Error = DeepSeaError;

    fn try_from(row: TransitionRow) -> Result<Self, Self::Error> {
        Ok(Self {
            status: row.status.parse()?,
            job: row.job,
            media: row.media,
            at: row.at,
        })
    }
}
