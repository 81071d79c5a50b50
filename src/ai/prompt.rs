use crate::ai::SummaryRequest;
use crate::github::{Commit, PullRequest};

/// Framing sent as the system message on every request
pub const SYSTEM_PROMPT: &str = "You are a professional resume writer who turns software \
engineering activity into compelling, achievement-focused resume content.";

/// Instruction header used when the caller doesn't supply one
pub const DEFAULT_INSTRUCTIONS: &str = "\
Write a resume-ready summary of my contributions to the repository described below.

Guidelines:
- Use bullet points, one per significant accomplishment, each 2-4 sentences long.
- Write in the first person and open every bullet with a strong action verb \
(Built, Designed, Implemented, Optimized, Refactored, Led...).
- Feature every priority pull request prominently, with at least one bullet each.
- After the priority items, favor the largest and most technically demanding work: \
new features, hard bugs, performance gains, architecture changes.
- Name the technologies, frameworks and techniques involved and the problem each change solved.
- Merge related small changes into one meaningful accomplishment; skip trivial ones \
such as typo fixes or formatting.
- Do not add a preamble or closing remarks. Start directly with the first bullet.";

/// Commit lines rendered into the prompt
const MAX_COMMITS: usize = 100;
/// Non-priority pull requests rendered into the prompt
const MAX_REGULAR_PRS: usize = 50;

/// The instruction header: a non-blank custom prompt replaces the default verbatim
pub fn instruction_header(custom_prompt: Option<&str>) -> &str {
    match custom_prompt {
        Some(custom) if !custom.trim().is_empty() => custom,
        _ => DEFAULT_INSTRUCTIONS,
    }
}

/// Split pull requests into (priority, regular).
///
/// Priority items follow the caller's order; numbers that match nothing are ignored.
pub fn partition_pull_requests<'a>(
    pull_requests: &'a [PullRequest],
    prioritized: &[u64],
) -> (Vec<&'a PullRequest>, Vec<&'a PullRequest>) {
    let mut priority: Vec<&PullRequest> = Vec::new();
    for number in prioritized {
        if priority.iter().any(|pr| pr.number == *number) {
            continue;
        }
        if let Some(pr) = pull_requests.iter().find(|pr| pr.number == *number) {
            priority.push(pr);
        }
    }

    let regular = pull_requests
        .iter()
        .filter(|pr| !prioritized.contains(&pr.number))
        .collect();

    (priority, regular)
}

/// Generate the user prompt for a summary request
pub fn generate_summary_prompt(
    request: &SummaryRequest,
    commits: &[Commit],
    pull_requests: &[PullRequest],
) -> String {
    let mut prompt = String::new();

    prompt.push_str(instruction_header(request.custom_prompt.as_deref()));
    prompt.push_str("\n\n---\n\n");

    // Repository info
    prompt.push_str(&format!("Repository: {}\n", request.repo_name));
    prompt.push_str(&format!("Period: {}\n", request.date_range.describe()));

    // Commits
    prompt.push_str(&format!("\nCommits ({} total):\n", commits.len()));
    if commits.is_empty() {
        prompt.push_str("(none)\n");
    }
    for commit in commits.iter().take(MAX_COMMITS) {
        prompt.push_str(&format!("- {} (by {})\n", commit.summary(), commit.author));
    }
    if commits.len() > MAX_COMMITS {
        prompt.push_str(&format!(
            "(Showing first {} of {} commits)\n",
            MAX_COMMITS,
            commits.len()
        ));
    }

    let (priority, regular) =
        partition_pull_requests(pull_requests, &request.prioritized_pr_numbers);

    prompt.push_str(&format!("\nPull requests ({} total):\n", pull_requests.len()));

    // Priority PRs get their full description
    if !priority.is_empty() {
        prompt.push_str(&format!(
            "\nPRIORITY PULL REQUESTS ({}). These MUST be featured prominently, \
             with at least one dedicated bullet point each:\n",
            priority.len()
        ));
        for pr in &priority {
            prompt.push_str(&pr_heading(pr));
            match pr.body.as_deref().map(str::trim).filter(|b| !b.is_empty()) {
                Some(body) => {
                    prompt.push_str("  Description:\n");
                    for line in body.lines() {
                        prompt.push_str(&format!("    {}\n", line));
                    }
                }
                None => prompt.push_str("  Description: (none provided)\n"),
            }
        }
        prompt.push_str("\nOther pull requests:\n");
    }

    // Everything else is title-only to bound prompt size
    if regular.is_empty() {
        prompt.push_str("(none)\n");
    }
    for pr in regular.iter().take(MAX_REGULAR_PRS) {
        prompt.push_str(&pr_heading(pr));
    }
    if regular.len() > MAX_REGULAR_PRS {
        prompt.push_str(&format!(
            "(Showing first {} of {} other pull requests)\n",
            MAX_REGULAR_PRS,
            regular.len()
        ));
    }

    prompt
}

fn pr_heading(pr: &PullRequest) -> String {
    let labels = if pr.labels.is_empty() {
        "none".to_string()
    } else {
        pr.labels.join(", ")
    };
    format!(
        "- #{}: {} [{}] (labels: {})\n",
        pr.number, pr.title, pr.state, labels
    )
}
