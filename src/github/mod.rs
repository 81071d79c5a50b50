pub mod client;
pub mod link;

use crate::error::{AppError, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A repository the authenticated user can access
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    /// Short name (`widgets`)
    pub name: String,
    /// Owner-qualified name (`acme/widgets`)
    pub full_name: String,
    pub description: Option<String>,
    /// Primary language as detected by GitHub
    pub language: Option<String>,
    pub is_fork: bool,
    pub is_private: bool,
    /// Web URL
    pub url: String,
}

/// A commit authored by the authenticated user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    pub sha: String,
    pub message: String,
    pub author: String,
    pub date: DateTime<Utc>,
}

impl Commit {
    /// First line of the commit message
    pub fn summary(&self) -> &str {
        self.message.lines().next().unwrap_or("").trim()
    }
}

/// Lifecycle state of a pull request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrState {
    Open,
    Closed,
    Merged,
}

impl PrState {
    /// Classify from GitHub's raw `state` and `merged_at`.
    ///
    /// GitHub reports merged pull requests as `closed`; a merge timestamp wins.
    pub fn from_upstream(state: &str, merged_at: Option<&DateTime<Utc>>) -> Self {
        if merged_at.is_some() {
            return Self::Merged;
        }
        match state {
            "open" => Self::Open,
            "merged" => Self::Merged,
            _ => Self::Closed,
        }
    }
}

impl fmt::Display for PrState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Open => "open",
            Self::Closed => "closed",
            Self::Merged => "merged",
        };
        f.write_str(s)
    }
}

/// A pull request opened by the authenticated user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    pub title: String,
    pub body: Option<String>,
    pub state: PrState,
    pub labels: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub merged_at: Option<DateTime<Utc>>,
}

/// One page of pull requests, as served to the UI
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestPage {
    pub items: Vec<PullRequest>,
    pub page: u32,
    pub per_page: u32,
    pub has_more: bool,
}

/// Inclusive date range; a missing bound is unbounded on that side
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    /// Start (inclusive)
    pub start: Option<DateTime<Utc>>,
    /// End (inclusive)
    pub end: Option<DateTime<Utc>>,
}

impl DateRange {
    /// Create a range, rejecting an inverted one
    pub fn new(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Result<Self> {
        if let (Some(s), Some(e)) = (start, end) {
            if s > e {
                return Err(AppError::validation(format!(
                    "start date {} is after end date {}",
                    s.format("%Y-%m-%d"),
                    e.format("%Y-%m-%d")
                )));
            }
        }
        Ok(Self { start, end })
    }

    /// Parse optional ISO-8601 bounds.
    ///
    /// Accepts `YYYY-MM-DD`, RFC 3339, or a naive `YYYY-MM-DDTHH:MM:SS` (read as UTC).
    /// A date-only end covers the whole day.
    pub fn parse(start: Option<&str>, end: Option<&str>) -> Result<Self> {
        let start = non_blank(start)
            .map(|s| parse_bound(s, Bound::Start))
            .transpose()?;
        let end = non_blank(end)
            .map(|s| parse_bound(s, Bound::End))
            .transpose()?;
        Self::new(start, end)
    }

    pub fn is_all_time(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    /// Check if a timestamp is within this range
    pub fn contains(&self, date: &DateTime<Utc>) -> bool {
        self.start.map_or(true, |s| *date >= s) && self.end.map_or(true, |e| *date <= e)
    }

    /// True when the timestamp falls before the lower bound
    pub fn is_before_start(&self, date: &DateTime<Utc>) -> bool {
        self.start.map_or(false, |s| *date < s)
    }

    /// Keep only the items whose timestamp is in range
    pub fn retain<T, F>(&self, items: &mut Vec<T>, timestamp: F)
    where
        F: Fn(&T) -> &DateTime<Utc>,
    {
        items.retain(|item| self.contains(timestamp(item)));
    }

    /// Human-readable form used in prompts
    pub fn describe(&self) -> String {
        let fmt = |d: &DateTime<Utc>| d.format("%Y-%m-%d").to_string();
        match (&self.start, &self.end) {
            (None, None) => "all time".to_string(),
            (Some(s), None) => format!("since {}", fmt(s)),
            (None, Some(e)) => format!("until {}", fmt(e)),
            (Some(s), Some(e)) => format!("{} to {}", fmt(s), fmt(e)),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Bound {
    Start,
    End,
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

fn parse_bound(raw: &str, bound: Bound) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(Utc.from_utc_datetime(&naive));
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        let time = match bound {
            Bound::Start => date.and_hms_opt(0, 0, 0),
            Bound::End => date.and_hms_nano_opt(23, 59, 59, 999_999_999),
        };
        if let Some(naive) = time {
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }
    Err(AppError::validation(format!(
        "'{}' is not an ISO-8601 date (expected YYYY-MM-DD)",
        raw
    )))
}

/// Read-only view of a user's activity on the hosting service
#[async_trait]
pub trait ActivitySource: Send + Sync {
    /// All accessible repositories, most recently updated first
    async fn list_repositories(&self) -> Result<Vec<Repository>>;

    /// One zero-based page of the user's pull requests, newest first
    async fn list_pull_requests(
        &self,
        repo_full_name: &str,
        page: u32,
        per_page: u32,
    ) -> Result<PullRequestPage>;

    /// The user's commits within the range
    async fn list_commits(&self, repo_full_name: &str, range: &DateRange) -> Result<Vec<Commit>>;

    /// The user's pull requests created within the range
    async fn list_pull_requests_in_range(
        &self,
        repo_full_name: &str,
        range: &DateRange,
    ) -> Result<Vec<PullRequest>>;
}
