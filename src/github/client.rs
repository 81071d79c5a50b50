use super::link::{next_link, validate_full_name};
use super::{ActivitySource, Commit, DateRange, PrState, PullRequest, PullRequestPage, Repository};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::header::{HeaderMap, LINK, RETRY_AFTER};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

const API_VERSION: &str = "2022-11-28";
/// Page size requested from GitHub when walking collections
const UPSTREAM_PAGE_SIZE: &str = "100";
/// Largest page size the UI may ask for
pub const MAX_PAGE_SIZE: u32 = 100;

/// GitHub REST client scoped to the authenticated user's activity
pub struct GitHubClient {
    client: Client,
    base_url: String,
    token: String,
}

impl GitHubClient {
    /// Create a new GitHub client
    pub fn new(token: String, base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("repo2resume/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    /// GET one page, returning the body and the `rel="next"` URL if any
    async fn get_page<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
        subject: &str,
    ) -> Result<(T, Option<String>)> {
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.token)
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION)
            .query(query)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let throttled = is_throttled(response.headers());
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(status, throttled, &body, subject));
        }

        let next = response
            .headers()
            .get(LINK)
            .and_then(|v| v.to_str().ok())
            .and_then(next_link);
        let data = response.json().await?;
        Ok((data, next))
    }

    /// GET every page of a collection
    async fn get_all<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
        subject: &str,
    ) -> Result<Vec<T>> {
        let (mut items, mut next): (Vec<T>, _) = self.get_page(url, query, subject).await?;
        while let Some(url) = next {
            debug!(%url, "following next page");
            let (page, link): (Vec<T>, _) = self.get_page(&url, &[], subject).await?;
            items.extend(page);
            next = link;
        }
        Ok(items)
    }

    /// Login of the token's owner; contributions are scoped to it
    async fn viewer_login(&self) -> Result<String> {
        let url = format!("{}/user", self.base_url);
        let (user, _): (RawUser, _) = self.get_page(&url, &[], "Authenticated user").await?;
        Ok(user.login)
    }

    fn pulls_url(&self, repo_full_name: &str) -> String {
        format!("{}/repos/{}/pulls", self.base_url, repo_full_name)
    }

    fn pulls_query() -> Vec<(&'static str, String)> {
        vec![
            ("state", "all".to_string()),
            ("sort", "created".to_string()),
            ("direction", "desc".to_string()),
            ("per_page", UPSTREAM_PAGE_SIZE.to_string()),
        ]
    }
}

#[async_trait]
impl ActivitySource for GitHubClient {
    async fn list_repositories(&self) -> Result<Vec<Repository>> {
        let url = format!("{}/user/repos", self.base_url);
        let query = [
            ("affiliation", "owner,collaborator,organization_member".to_string()),
            ("visibility", "all".to_string()),
            ("sort", "updated".to_string()),
            ("direction", "desc".to_string()),
            ("per_page", UPSTREAM_PAGE_SIZE.to_string()),
        ];

        let raw: Vec<RawRepo> = self.get_all(&url, &query, "Repository list").await?;
        let repos: Vec<Repository> = raw.into_iter().map(Repository::from).collect();

        info!(count = repos.len(), "fetched repositories");
        Ok(repos)
    }

    async fn list_pull_requests(
        &self,
        repo_full_name: &str,
        page: u32,
        per_page: u32,
    ) -> Result<PullRequestPage> {
        validate_full_name(repo_full_name)?;
        let per_page = per_page.clamp(1, MAX_PAGE_SIZE);
        let subject = format!("Repository '{}'", repo_full_name);
        let login = self.viewer_login().await?;

        let mut collector = PageCollector::new(page, per_page);
        let (mut raw, mut next): (Vec<RawPull>, _) = self
            .get_page(&self.pulls_url(repo_full_name), &Self::pulls_query(), &subject)
            .await?;

        'pages: loop {
            for pr in raw {
                if pr.is_by(&login) && collector.push(pr.into_pull_request()) {
                    break 'pages;
                }
            }
            match next {
                Some(url) => {
                    debug!(%url, "scanning next pull request page");
                    (raw, next) = self.get_page(&url, &[], &subject).await?;
                }
                None => break,
            }
        }

        let (items, has_more) = collector.finish();
        info!(repo = repo_full_name, page, count = items.len(), has_more, "fetched pull request page");
        Ok(PullRequestPage {
            items,
            page,
            per_page,
            has_more,
        })
    }

    async fn list_commits(&self, repo_full_name: &str, range: &DateRange) -> Result<Vec<Commit>> {
        validate_full_name(repo_full_name)?;
        let subject = format!("Repository '{}'", repo_full_name);
        let login = self.viewer_login().await?;

        let url = format!("{}/repos/{}/commits", self.base_url, repo_full_name);
        let mut query = vec![
            ("author", login),
            ("per_page", UPSTREAM_PAGE_SIZE.to_string()),
        ];
        if let Some(start) = range.start {
            query.push(("since", start.to_rfc3339_opts(SecondsFormat::Secs, true)));
        }
        if let Some(end) = range.end {
            query.push(("until", end.to_rfc3339_opts(SecondsFormat::Secs, true)));
        }

        let raw: Vec<RawCommit> = self.get_all(&url, &query, &subject).await?;
        let mut commits: Vec<Commit> = raw.into_iter().filter_map(RawCommit::into_commit).collect();
        // since/until work on committer dates; re-check against the author date we report
        if !range.is_all_time() {
            range.retain(&mut commits, |c| &c.date);
        }

        info!(repo = repo_full_name, count = commits.len(), range = %range.describe(), "fetched commits");
        Ok(commits)
    }

    async fn list_pull_requests_in_range(
        &self,
        repo_full_name: &str,
        range: &DateRange,
    ) -> Result<Vec<PullRequest>> {
        validate_full_name(repo_full_name)?;
        let subject = format!("Repository '{}'", repo_full_name);
        let login = self.viewer_login().await?;

        let mut pulls = Vec::new();
        let (mut raw, mut next): (Vec<RawPull>, _) = self
            .get_page(&self.pulls_url(repo_full_name), &Self::pulls_query(), &subject)
            .await?;

        loop {
            let scan = scan_pulls(raw, &login, range);
            pulls.extend(scan.matched);
            if scan.reached_start {
                break;
            }
            match next {
                Some(url) => (raw, next) = self.get_page(&url, &[], &subject).await?,
                None => break,
            }
        }

        info!(repo = repo_full_name, count = pulls.len(), range = %range.describe(), "fetched pull requests");
        Ok(pulls)
    }
}

/// Primary limit spent, or a secondary limit asking us to back off
fn is_throttled(headers: &HeaderMap) -> bool {
    let exhausted = headers
        .get("x-ratelimit-remaining")
        .and_then(|v| v.to_str().ok())
        == Some("0");
    exhausted || headers.contains_key(RETRY_AFTER)
}

/// Map a non-success GitHub response to the error taxonomy
fn classify_status(status: StatusCode, throttled: bool, body: &str, subject: &str) -> AppError {
    match status {
        StatusCode::UNAUTHORIZED => {
            AppError::UpstreamAuth("Invalid GitHub token. Please check your GITHUB_TOKEN.".to_string())
        }
        StatusCode::TOO_MANY_REQUESTS => rate_limited(),
        StatusCode::FORBIDDEN if throttled => rate_limited(),
        StatusCode::NOT_FOUND => {
            AppError::NotFound(format!("{} not found or you don't have access.", subject))
        }
        _ => {
            let excerpt: String = body.chars().take(200).collect();
            AppError::upstream(format!("GitHub request failed ({}): {}", status, excerpt))
        }
    }
}

fn rate_limited() -> AppError {
    AppError::UpstreamRateLimit("GitHub API rate limit exceeded. Please try again later.".to_string())
}

/// Result of scanning one newest-first page of pull requests against a range
#[derive(Debug, Default)]
struct PullScan {
    matched: Vec<PullRequest>,
    /// An item older than the range start was seen; later pages are all older
    reached_start: bool,
}

fn scan_pulls(page: Vec<RawPull>, login: &str, range: &DateRange) -> PullScan {
    let mut scan = PullScan::default();
    for pr in page {
        if range.is_before_start(&pr.created_at) {
            scan.reached_start = true;
            break;
        }
        if pr.is_by(login) && range.contains(&pr.created_at) {
            scan.matched.push(pr.into_pull_request());
        }
    }
    scan
}

/// Collects one zero-based page out of a filtered stream, plus one lookahead item
#[derive(Debug)]
struct PageCollector {
    skip: usize,
    per_page: usize,
    seen: usize,
    items: Vec<PullRequest>,
}

impl PageCollector {
    fn new(page: u32, per_page: u32) -> Self {
        let per_page = per_page as usize;
        Self {
            skip: page as usize * per_page,
            per_page,
            seen: 0,
            items: Vec::with_capacity(per_page + 1),
        }
    }

    /// Offer the next item; returns true once the page and its lookahead are filled
    fn push(&mut self, pr: PullRequest) -> bool {
        if self.seen < self.skip {
            self.seen += 1;
            return false;
        }
        self.items.push(pr);
        self.items.len() > self.per_page
    }

    fn finish(mut self) -> (Vec<PullRequest>, bool) {
        let has_more = self.items.len() > self.per_page;
        self.items.truncate(self.per_page);
        (self.items, has_more)
    }
}

#[derive(Debug, Deserialize)]
struct RawUser {
    login: String,
}

#[derive(Debug, Deserialize)]
struct RawRepo {
    name: String,
    full_name: String,
    description: Option<String>,
    language: Option<String>,
    fork: bool,
    private: bool,
    html_url: String,
}

impl From<RawRepo> for Repository {
    fn from(raw: RawRepo) -> Self {
        Self {
            name: raw.name,
            full_name: raw.full_name,
            description: raw.description,
            language: raw.language,
            is_fork: raw.fork,
            is_private: raw.private,
            url: raw.html_url,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawCommit {
    sha: String,
    commit: RawCommitDetail,
}

#[derive(Debug, Deserialize)]
struct RawCommitDetail {
    message: String,
    author: Option<RawSignature>,
    committer: Option<RawSignature>,
}

#[derive(Debug, Deserialize)]
struct RawSignature {
    name: Option<String>,
    date: Option<DateTime<Utc>>,
}

impl RawCommit {
    /// Commits without any signature date can't be placed in time and are dropped
    fn into_commit(self) -> Option<Commit> {
        let RawCommitDetail {
            message,
            author,
            committer,
        } = self.commit;

        let date = author
            .as_ref()
            .and_then(|a| a.date)
            .or_else(|| committer.as_ref().and_then(|c| c.date))?;
        let author = author
            .and_then(|a| a.name)
            .unwrap_or_else(|| "Unknown".to_string());

        Some(Commit {
            sha: self.sha,
            message,
            author,
            date,
        })
    }
}

#[derive(Debug, Deserialize)]
struct RawPull {
    number: u64,
    title: String,
    body: Option<String>,
    state: String,
    #[serde(default)]
    labels: Vec<RawLabel>,
    created_at: DateTime<Utc>,
    merged_at: Option<DateTime<Utc>>,
    user: Option<RawUser>,
}

#[derive(Debug, Deserialize)]
struct RawLabel {
    name: String,
}

impl RawPull {
    fn is_by(&self, login: &str) -> bool {
        self.user
            .as_ref()
            .map_or(false, |u| u.login.eq_ignore_ascii_case(login))
    }

    fn into_pull_request(self) -> PullRequest {
        PullRequest {
            state: PrState::from_upstream(&self.state, self.merged_at.as_ref()),
            number: self.number,
            title: self.title,
            body: self.body,
            labels: self.labels.into_iter().map(|l| l.name).collect(),
            created_at: self.created_at,
            merged_at: self.merged_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw_pull(number: u64, login: &str, created_at: &str) -> RawPull {
        serde_json::from_value(json!({
            "number": number,
            "title": format!("PR {}", number),
            "body": null,
            "state": "open",
            "labels": [],
            "created_at": created_at,
            "merged_at": null,
            "user": { "login": login }
        }))
        .unwrap()
    }

    #[test]
    fn test_client_creation() {
        let client = GitHubClient::new(
            "ghp_test".to_string(),
            "https://api.github.com/",
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(client.base_url, "https://api.github.com");
        assert_eq!(
            client.pulls_url("acme/widgets"),
            "https://api.github.com/repos/acme/widgets/pulls"
        );
    }

    #[test]
    fn test_classify_status() {
        assert!(matches!(
            classify_status(StatusCode::UNAUTHORIZED, false, "", "x"),
            AppError::UpstreamAuth(_)
        ));
        assert!(matches!(
            classify_status(StatusCode::FORBIDDEN, true, "", "x"),
            AppError::UpstreamRateLimit(_)
        ));
        assert!(matches!(
            classify_status(StatusCode::TOO_MANY_REQUESTS, false, "", "x"),
            AppError::UpstreamRateLimit(_)
        ));
        assert!(matches!(
            classify_status(StatusCode::FORBIDDEN, false, "nope", "x"),
            AppError::Upstream(_)
        ));

        let err = classify_status(StatusCode::NOT_FOUND, false, "", "Repository 'acme/nope'");
        assert_eq!(
            err.to_string(),
            "Repository 'acme/nope' not found or you don't have access."
        );
    }

    #[test]
    fn test_raw_repo_mapping() {
        let raw: RawRepo = serde_json::from_value(json!({
            "name": "widgets",
            "full_name": "acme/widgets",
            "description": null,
            "language": "Rust",
            "fork": false,
            "private": true,
            "html_url": "https://github.com/acme/widgets",
            "stargazers_count": 12
        }))
        .unwrap();

        let repo = Repository::from(raw);
        assert_eq!(repo.full_name, "acme/widgets");
        assert!(repo.is_private);
        assert!(!repo.is_fork);
        assert_eq!(repo.language.as_deref(), Some("Rust"));
    }

    #[test]
    fn test_raw_commit_mapping() {
        let raw: RawCommit = serde_json::from_value(json!({
            "sha": "abc123",
            "commit": {
                "message": "Add cache layer\n\nLonger body",
                "author": { "name": "Jo", "date": "2024-02-10T12:00:00Z" },
                "committer": { "name": "GitHub", "date": "2024-02-11T12:00:00Z" }
            }
        }))
        .unwrap();

        let commit = raw.into_commit().unwrap();
        assert_eq!(commit.author, "Jo");
        assert_eq!(commit.summary(), "Add cache layer");
        assert_eq!(commit.date.to_rfc3339(), "2024-02-10T12:00:00+00:00");
    }

    #[test]
    fn test_raw_commit_without_dates_dropped() {
        let raw: RawCommit = serde_json::from_value(json!({
            "sha": "abc123",
            "commit": { "message": "x", "author": null, "committer": null }
        }))
        .unwrap();
        assert!(raw.into_commit().is_none());
    }

    #[test]
    fn test_raw_pull_merged_classification() {
        let raw: RawPull = serde_json::from_value(json!({
            "number": 42,
            "title": "Rewrite scheduler",
            "body": "Details",
            "state": "closed",
            "labels": [{ "name": "perf" }],
            "created_at": "2024-02-01T00:00:00Z",
            "merged_at": "2024-02-03T00:00:00Z",
            "user": { "login": "Octocat" }
        }))
        .unwrap();

        assert!(raw.is_by("octocat"));
        let pr = raw.into_pull_request();
        assert_eq!(pr.state, PrState::Merged);
        assert_eq!(pr.labels, vec!["perf".to_string()]);
    }

    #[test]
    fn test_scan_pulls_filters_and_stops() {
        let range = DateRange::parse(Some("2024-01-01"), Some("2024-03-31")).unwrap();
        let page = vec![
            raw_pull(5, "me", "2024-05-01T00:00:00Z"),
            raw_pull(4, "me", "2024-03-01T00:00:00Z"),
            raw_pull(3, "someone", "2024-02-01T00:00:00Z"),
            raw_pull(2, "me", "2023-12-01T00:00:00Z"),
            raw_pull(1, "me", "2023-11-01T00:00:00Z"),
        ];

        let scan = scan_pulls(page, "me", &range);
        let numbers: Vec<u64> = scan.matched.iter().map(|p| p.number).collect();
        assert_eq!(numbers, vec![4]);
        assert!(scan.reached_start);
    }

    #[test]
    fn test_scan_pulls_all_time() {
        let page = vec![
            raw_pull(2, "me", "2024-05-01T00:00:00Z"),
            raw_pull(1, "me", "2010-01-01T00:00:00Z"),
        ];
        let scan = scan_pulls(page, "me", &DateRange::default());
        assert_eq!(scan.matched.len(), 2);
        assert!(!scan.reached_start);
    }

    #[test]
    fn test_page_collector() {
        let prs: Vec<PullRequest> = (1..=7)
            .map(|n| raw_pull(n, "me", "2024-01-01T00:00:00Z").into_pull_request())
            .collect();

        // page 1 of size 3 => items 4,5,6 with 7 as lookahead
        let mut collector = PageCollector::new(1, 3);
        let mut filled = false;
        for pr in prs.iter().cloned() {
            if collector.push(pr) {
                filled = true;
                break;
            }
        }
        assert!(filled);
        let (items, has_more) = collector.finish();
        assert_eq!(items.iter().map(|p| p.number).collect::<Vec<_>>(), vec![4, 5, 6]);
        assert!(has_more);

        // last page
        let mut collector = PageCollector::new(2, 3);
        for pr in prs.iter().cloned() {
            collector.push(pr);
        }
        let (items, has_more) = collector.finish();
        assert_eq!(items.len(), 1);
        assert!(!has_more);
    }

    #[test]
    fn test_is_throttled() {
        use reqwest::header::HeaderValue;

        let mut headers = HeaderMap::new();
        headers.insert("x-ratelimit-remaining", HeaderValue::from_static("4999"));
        assert!(!is_throttled(&headers));

        // secondary limits keep quota but ask for a pause
        headers.insert(RETRY_AFTER, HeaderValue::from_static("60"));
        assert!(is_throttled(&headers));

        let mut headers = HeaderMap::new();
        headers.insert("x-ratelimit-remaining", HeaderValue::from_static("0"));
        assert!(is_throttled(&headers));
    }

    mod upstream {
        //! GitHub stand-in served on an ephemeral port.
        //!
        //! Pull requests for `acme/widgets` come newest first over two linked
        //! pages. A third page answers 500 and counts its hits.

        use axum::extract::{Path, Query, State};
        use axum::http::{header, HeaderValue, StatusCode};
        use axum::response::{IntoResponse, Response};
        use axum::routing::get;
        use axum::{Json, Router};
        use serde_json::{json, Value};
        use std::collections::HashMap;
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::{Arc, Mutex};

        #[derive(Clone, Default)]
        pub struct Upstream {
            pub base: String,
            pub last_page_hits: Arc<AtomicUsize>,
            pub commit_query: Arc<Mutex<HashMap<String, String>>>,
        }

        impl Upstream {
            pub fn last_page_hits(&self) -> usize {
                self.last_page_hits.load(Ordering::SeqCst)
            }
        }

        pub async fn spawn() -> Upstream {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            let upstream = Upstream {
                base: format!("http://{}", listener.local_addr().unwrap()),
                ..Default::default()
            };

            let app = Router::new()
                .route("/user", get(user))
                .route("/repos/:owner/:name/pulls", get(pulls))
                .route("/repos/:owner/:name/commits", get(commits))
                .with_state(upstream.clone());
            tokio::spawn(async move {
                axum::serve(listener, app).await.unwrap();
            });
            upstream
        }

        async fn user() -> Json<Value> {
            Json(json!({ "login": "me" }))
        }

        fn pull(number: u64, login: &str, created_at: &str) -> Value {
            json!({
                "number": number,
                "title": format!("PR {}", number),
                "body": null,
                "state": "open",
                "labels": [],
                "created_at": created_at,
                "merged_at": null,
                "user": { "login": login }
            })
        }

        fn throttled(headers: &[(&'static str, &'static str)]) -> Response {
            let mut response =
                (StatusCode::FORBIDDEN, Json(json!({ "message": "slow down" }))).into_response();
            for (name, value) in headers {
                response
                    .headers_mut()
                    .insert(*name, HeaderValue::from_static(*value));
            }
            response
        }

        async fn pulls(
            State(upstream): State<Upstream>,
            Path((_owner, name)): Path<(String, String)>,
            Query(query): Query<HashMap<String, String>>,
        ) -> Response {
            match name.as_str() {
                "limited" => return throttled(&[("x-ratelimit-remaining", "0")]),
                "secondary" => {
                    return throttled(&[("x-ratelimit-remaining", "4999"), ("retry-after", "60")])
                }
                _ => {}
            }

            let (items, next) = match query.get("page").map(String::as_str).unwrap_or("1") {
                "1" => (
                    vec![
                        pull(5, "me", "2024-05-01T10:00:00Z"),
                        pull(4, "someone", "2024-03-15T10:00:00Z"),
                        pull(3, "me", "2024-03-01T10:00:00Z"),
                    ],
                    Some(2),
                ),
                "2" => (
                    vec![
                        pull(2, "someone", "2024-02-10T10:00:00Z"),
                        pull(1, "me", "2023-12-20T10:00:00Z"),
                    ],
                    Some(3),
                ),
                _ => {
                    upstream.last_page_hits.fetch_add(1, Ordering::SeqCst);
                    return (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response();
                }
            };

            let mut response = Json(items).into_response();
            if let Some(next) = next {
                let link = format!(
                    "<{}/repos/acme/widgets/pulls?page={}>; rel=\"next\"",
                    upstream.base, next
                );
                response
                    .headers_mut()
                    .insert(header::LINK, HeaderValue::from_str(&link).unwrap());
            }
            response
        }

        fn commit(sha: &str, authored: &str, committed: &str) -> Value {
            json!({
                "sha": sha,
                "commit": {
                    "message": format!("Commit {}", sha),
                    "author": { "name": "Me", "date": authored },
                    "committer": { "name": "Me", "date": committed }
                }
            })
        }

        async fn commits(
            State(upstream): State<Upstream>,
            Query(query): Query<HashMap<String, String>>,
        ) -> Json<Value> {
            *upstream.commit_query.lock().unwrap() = query;
            Json(json!([
                commit("a1", "2024-02-01T09:00:00Z", "2024-02-01T09:00:00Z"),
                // authored before the range, committed inside it
                commit("a0", "2023-12-31T09:00:00Z", "2024-01-02T09:00:00Z"),
            ]))
        }
    }

    async fn github() -> (GitHubClient, upstream::Upstream) {
        let upstream = upstream::spawn().await;
        let client =
            GitHubClient::new("ghp_test".to_string(), &upstream.base, Duration::from_secs(5))
                .unwrap();
        (client, upstream)
    }

    fn first_quarter() -> DateRange {
        DateRange::parse(Some("2024-01-01"), Some("2024-03-31")).unwrap()
    }

    #[tokio::test]
    async fn test_pulls_in_range_follow_link_and_stop_at_start() {
        let (client, upstream) = github().await;
        let range = first_quarter();

        let pulls = client
            .list_pull_requests_in_range("acme/widgets", &range)
            .await
            .unwrap();

        let numbers: Vec<u64> = pulls.iter().map(|p| p.number).collect();
        assert_eq!(numbers, vec![3]);
        assert!(pulls.iter().all(|p| range.contains(&p.created_at)));
        assert_eq!(upstream.last_page_hits(), 0);
    }

    #[tokio::test]
    async fn test_pulls_all_time_fail_without_partial_result() {
        let (client, upstream) = github().await;

        let err = client
            .list_pull_requests_in_range("acme/widgets", &DateRange::default())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Upstream(_)));
        assert_eq!(upstream.last_page_hits(), 1);
    }

    #[tokio::test]
    async fn test_pull_request_pages_scoped_to_viewer() {
        let (client, upstream) = github().await;

        let first = client.list_pull_requests("acme/widgets", 0, 1).await.unwrap();
        let numbers: Vec<u64> = first.items.iter().map(|p| p.number).collect();
        assert_eq!(numbers, vec![5]);
        assert!(first.has_more);

        // the lookahead for page 1 lives on the second upstream page
        let second = client.list_pull_requests("acme/widgets", 1, 1).await.unwrap();
        let numbers: Vec<u64> = second.items.iter().map(|p| p.number).collect();
        assert_eq!(numbers, vec![3]);
        assert!(second.has_more);
        assert_eq!(second.page, 1);

        assert_eq!(upstream.last_page_hits(), 0);
    }

    #[tokio::test]
    async fn test_commits_filtered_by_author_date() {
        let (client, upstream) = github().await;
        let range = first_quarter();

        let commits = client.list_commits("acme/widgets", &range).await.unwrap();

        let shas: Vec<&str> = commits.iter().map(|c| c.sha.as_str()).collect();
        assert_eq!(shas, vec!["a1"]);
        assert!(commits.iter().all(|c| range.contains(&c.date)));

        let query = upstream.commit_query.lock().unwrap().clone();
        assert_eq!(query.get("author").map(String::as_str), Some("me"));
        assert_eq!(query.get("since").map(String::as_str), Some("2024-01-01T00:00:00Z"));
        assert_eq!(query.get("until").map(String::as_str), Some("2024-03-31T23:59:59Z"));
    }

    #[tokio::test]
    async fn test_commits_all_time() {
        let (client, upstream) = github().await;

        let commits = client
            .list_commits("acme/widgets", &DateRange::default())
            .await
            .unwrap();

        assert_eq!(commits.len(), 2);
        assert!(!upstream.commit_query.lock().unwrap().contains_key("since"));
    }

    #[tokio::test]
    async fn test_rate_limits_classified() {
        let (client, _upstream) = github().await;

        let err = client.list_pull_requests("acme/limited", 0, 30).await.unwrap_err();
        assert!(matches!(err, AppError::UpstreamRateLimit(_)));

        let err = client
            .list_pull_requests_in_range("acme/secondary", &DateRange::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::UpstreamRateLimit(_)));
    }
}
