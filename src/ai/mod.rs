pub mod openai;
pub mod prompt;

use crate::error::Result;
use crate::github::DateRange;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A single summary submission; built per request, never stored
#[derive(Debug, Clone, Default)]
pub struct SummaryRequest {
    /// Owner-qualified repository name
    pub repo_name: String,
    pub date_range: DateRange,
    /// Pull request numbers to feature, in the order the user picked them
    pub prioritized_pr_numbers: Vec<u64>,
    /// Replaces the default instruction header when non-blank
    pub custom_prompt: Option<String>,
}

/// Generated summary plus how much activity went into it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryResult {
    pub summary: String,
    pub repo_name: String,
    pub commits_analyzed: usize,
    pub prs_analyzed: usize,
}

impl SummaryResult {
    /// Format the result as markdown
    pub fn to_markdown(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!("# {}\n\n", self.repo_name));
        output.push_str(self.summary.trim());
        output.push_str("\n\n");
        output.push_str(&format!(
            "*Based on {} commits and {} pull requests*\n",
            self.commits_analyzed, self.prs_analyzed
        ));

        output
    }
}

/// A hosted text generation model
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Complete a single-turn conversation and return the generated text
    async fn complete(&self, system: &str, prompt: &str) -> Result<String>;
}
