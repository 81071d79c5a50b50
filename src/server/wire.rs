//! JSON bodies shared by the HTTP API and the terminal client.

use crate::ai::SummaryRequest;
use crate::error::{AppError, Result};
use crate::github::DateRange;
use serde::{Deserialize, Serialize};

/// Page size used when the caller doesn't pass `per_page`
pub const DEFAULT_PER_PAGE: u32 = 30;

/// `POST /api/generate-summary` body
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateSummaryBody {
    pub repo_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prioritized_pr_numbers: Option<Vec<u64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_prompt: Option<String>,
}

impl GenerateSummaryBody {
    /// Validate and convert into a domain request
    pub fn into_request(self) -> Result<SummaryRequest> {
        let repo_name = self.repo_name.trim().to_string();
        if repo_name.is_empty() {
            return Err(AppError::validation("repo_name is required"));
        }

        let date_range = DateRange::parse(self.start_date.as_deref(), self.end_date.as_deref())?;

        Ok(SummaryRequest {
            repo_name,
            date_range,
            prioritized_pr_numbers: self.prioritized_pr_numbers.unwrap_or_default(),
            custom_prompt: self.custom_prompt,
        })
    }
}

/// Query string of the pull request listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageQuery {
    #[serde(default)]
    pub page: u32,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

impl Default for PageQuery {
    fn default() -> Self {
        Self {
            page: 0,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

fn default_per_page() -> u32 {
    DEFAULT_PER_PAGE
}

/// `GET /api/default-prompt` body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptBody {
    pub prompt: String,
}
