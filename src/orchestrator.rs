use crate::ai::prompt::{generate_summary_prompt, SYSTEM_PROMPT};
use crate::ai::{LanguageModel, SummaryRequest, SummaryResult};
use crate::error::Result;
use crate::github::link::validate_full_name;
use crate::github::ActivitySource;
use std::sync::Arc;
use tracing::info;

/// Orchestrator for the fetch → prompt → generate pipeline
pub struct Orchestrator {
    activity: Arc<dyn ActivitySource>,
    model: Arc<dyn LanguageModel>,
}

impl Orchestrator {
    /// Create a new orchestrator
    pub fn new(activity: Arc<dyn ActivitySource>, model: Arc<dyn LanguageModel>) -> Self {
        Self { activity, model }
    }

    /// Generate a summary for one request.
    ///
    /// All or nothing: any upstream failure aborts without a partial result.
    pub async fn generate_summary(&self, request: &SummaryRequest) -> Result<SummaryResult> {
        validate_full_name(&request.repo_name)?;

        // Fetch activity within the range
        let commits = self
            .activity
            .list_commits(&request.repo_name, &request.date_range)
            .await?;
        let pull_requests = self
            .activity
            .list_pull_requests_in_range(&request.repo_name, &request.date_range)
            .await?;

        // Generate prompt
        let prompt = generate_summary_prompt(request, &commits, &pull_requests);

        // Call the model
        let summary = self.model.complete(SYSTEM_PROMPT, &prompt).await?;

        info!(
            repo = %request.repo_name,
            commits = commits.len(),
            pull_requests = pull_requests.len(),
            priority = request.prioritized_pr_numbers.len(),
            "generated summary"
        );

        Ok(SummaryResult {
            summary,
            repo_name: request.repo_name.clone(),
            commits_analyzed: commits.len(),
            prs_analyzed: pull_requests.len(),
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::github::{Commit, DateRange, PrState, PullRequest, PullRequestPage, Repository};
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use std::sync::Mutex;

    /// In-memory activity source; applies ranges the same way the GitHub client does
    #[derive(Default)]
    pub struct FakeActivity {
        pub repos: Vec<Repository>,
        pub commits: Vec<Commit>,
        pub pull_requests: Vec<PullRequest>,
        pub fail_with_auth: bool,
    }

    impl FakeActivity {
        fn check(&self) -> Result<()> {
            if self.fail_with_auth {
                return Err(AppError::UpstreamAuth(
                    "Invalid GitHub token. Please check your GITHUB_TOKEN.".to_string(),
                ));
            }
            Ok(())
        }

        fn known(&self, repo: &str) -> Result<()> {
            if self.repos.iter().any(|r| r.full_name == repo) {
                Ok(())
            } else {
                Err(AppError::NotFound(format!(
                    "Repository '{}' not found or you don't have access.",
                    repo
                )))
            }
        }
    }

    #[async_trait]
    impl ActivitySource for FakeActivity {
        async fn list_repositories(&self) -> Result<Vec<Repository>> {
            self.check()?;
            Ok(self.repos.clone())
        }

        async fn list_pull_requests(
            &self,
            repo: &str,
            page: u32,
            per_page: u32,
        ) -> Result<PullRequestPage> {
            self.check()?;
            self.known(repo)?;
            let start = (page * per_page) as usize;
            let items: Vec<PullRequest> = self
                .pull_requests
                .iter()
                .skip(start)
                .take(per_page as usize)
                .cloned()
                .collect();
            let has_more = self.pull_requests.len() > start + items.len();
            Ok(PullRequestPage {
                items,
                page,
                per_page,
                has_more,
            })
        }

        async fn list_commits(&self, repo: &str, range: &DateRange) -> Result<Vec<Commit>> {
            self.check()?;
            self.known(repo)?;
            let mut commits = self.commits.clone();
            range.retain(&mut commits, |c| &c.date);
            Ok(commits)
        }

        async fn list_pull_requests_in_range(
            &self,
            repo: &str,
            range: &DateRange,
        ) -> Result<Vec<PullRequest>> {
            self.check()?;
            self.known(repo)?;
            let mut prs = self.pull_requests.clone();
            range.retain(&mut prs, |p| &p.created_at);
            Ok(prs)
        }
    }

    /// Records the last prompt and echoes a canned reply
    #[derive(Default)]
    pub struct FakeModel {
        pub last_prompt: Mutex<Option<String>>,
        pub fail: bool,
    }

    #[async_trait]
    impl LanguageModel for FakeModel {
        async fn complete(&self, _system: &str, prompt: &str) -> Result<String> {
            if self.fail {
                return Err(AppError::upstream("OpenAI API error (500): boom"));
            }
            *self.last_prompt.lock().unwrap() = Some(prompt.to_string());
            Ok("- Built widgets".to_string())
        }
    }

    pub fn repo(full_name: &str) -> Repository {
        let name = full_name.split('/').last().unwrap().to_string();
        Repository {
            name,
            full_name: full_name.to_string(),
            description: None,
            language: Some("Rust".to_string()),
            is_fork: false,
            is_private: false,
            url: format!("https://github.com/{}", full_name),
        }
    }

    pub fn pr(number: u64, created: (i32, u32, u32), body: &str) -> PullRequest {
        PullRequest {
            number,
            title: format!("Pull request {}", number),
            body: Some(body.to_string()),
            state: PrState::Open,
            labels: vec![],
            created_at: Utc.with_ymd_and_hms(created.0, created.1, created.2, 12, 0, 0).unwrap(),
            merged_at: None,
        }
    }

    pub fn commit(sha: &str, created: (i32, u32, u32)) -> Commit {
        Commit {
            sha: sha.to_string(),
            message: format!("Commit {}", sha),
            author: "Jo".to_string(),
            date: Utc.with_ymd_and_hms(created.0, created.1, created.2, 9, 0, 0).unwrap(),
        }
    }

    pub fn widgets_activity() -> FakeActivity {
        FakeActivity {
            repos: vec![repo("acme/widgets")],
            commits: vec![
                commit("c1", (2024, 1, 15)),
                commit("c2", (2024, 3, 2)),
                commit("c3", (2024, 6, 1)),
            ],
            pull_requests: vec![
                pr(43, (2024, 5, 1), "May work"),
                pr(42, (2024, 2, 1), "Full body of forty-two"),
                pr(41, (2024, 1, 10), "January body"),
            ],
            fail_with_auth: false,
        }
    }

    fn orchestrator(activity: FakeActivity, model: Arc<FakeModel>) -> Orchestrator {
        Orchestrator::new(Arc::new(activity), model)
    }

    #[tokio::test]
    async fn test_all_time_counts_everything() {
        let model = Arc::new(FakeModel::default());
        let orchestrator = orchestrator(widgets_activity(), model.clone());

        let request = SummaryRequest {
            repo_name: "acme/widgets".to_string(),
            ..Default::default()
        };
        let result = orchestrator.generate_summary(&request).await.unwrap();

        assert_eq!(result.repo_name, "acme/widgets");
        assert_eq!(result.commits_analyzed, 3);
        assert_eq!(result.prs_analyzed, 3);
        assert_eq!(result.summary, "- Built widgets");
    }

    #[tokio::test]
    async fn test_date_range_excludes_out_of_range() {
        let model = Arc::new(FakeModel::default());
        let orchestrator = orchestrator(widgets_activity(), model.clone());

        let request = SummaryRequest {
            repo_name: "acme/widgets".to_string(),
            date_range: DateRange::parse(Some("2024-01-01"), Some("2024-03-31")).unwrap(),
            ..Default::default()
        };
        let result = orchestrator.generate_summary(&request).await.unwrap();

        assert_eq!(result.commits_analyzed, 2);
        assert_eq!(result.prs_analyzed, 2);
        let prompt = model.last_prompt.lock().unwrap().clone().unwrap();
        assert!(!prompt.contains("#43"));
        assert!(prompt.contains("Pull requests (2 total):"));
    }

    #[tokio::test]
    async fn test_priority_pr_in_prompt() {
        let model = Arc::new(FakeModel::default());
        let orchestrator = orchestrator(widgets_activity(), model.clone());

        let request = SummaryRequest {
            repo_name: "acme/widgets".to_string(),
            prioritized_pr_numbers: vec![42, 1000],
            ..Default::default()
        };
        let result = orchestrator.generate_summary(&request).await.unwrap();
        assert_eq!(result.prs_analyzed, 3);

        let prompt = model.last_prompt.lock().unwrap().clone().unwrap();
        assert!(prompt.contains("Full body of forty-two"));
        assert!(!prompt.contains("May work"));
        assert!(!prompt.contains("January body"));
    }

    #[tokio::test]
    async fn test_custom_prompt_used() {
        let model = Arc::new(FakeModel::default());
        let orchestrator = orchestrator(widgets_activity(), model.clone());

        let request = SummaryRequest {
            repo_name: "acme/widgets".to_string(),
            custom_prompt: Some("Write in third person".to_string()),
            ..Default::default()
        };
        orchestrator.generate_summary(&request).await.unwrap();

        let prompt = model.last_prompt.lock().unwrap().clone().unwrap();
        assert!(prompt.starts_with("Write in third person\n"));
    }

    #[tokio::test]
    async fn test_upstream_failure_is_all_or_nothing() {
        let model = Arc::new(FakeModel {
            fail: true,
            ..Default::default()
        });
        let orchestrator = orchestrator(widgets_activity(), model);

        let request = SummaryRequest {
            repo_name: "acme/widgets".to_string(),
            ..Default::default()
        };
        let err = orchestrator.generate_summary(&request).await.unwrap_err();
        assert!(matches!(err, AppError::Upstream(_)));
    }

    #[tokio::test]
    async fn test_unknown_repo_not_found() {
        let model = Arc::new(FakeModel::default());
        let orchestrator = orchestrator(widgets_activity(), model.clone());

        let request = SummaryRequest {
            repo_name: "acme/missing".to_string(),
            ..Default::default()
        };
        let err = orchestrator.generate_summary(&request).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        // the model is never called
        assert!(model.last_prompt.lock().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_invalid_repo_name_rejected() {
        let orchestrator = orchestrator(widgets_activity(), Arc::new(FakeModel::default()));
        let request = SummaryRequest {
            repo_name: "not-a-full-name".to_string(),
            ..Default::default()
        };
        let err = orchestrator.generate_summary(&request).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
