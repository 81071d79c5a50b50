//! Client state for the terminal UI.
//!
//! Pure state: key handling and network responses mutate it, rendering reads it.
//! Transitions that need I/O return [`Command`]s for the event loop to run.
//!
//! Every network-backed slot hands out a [`Ticket`] when a request starts. A
//! response is applied only while its ticket is still the newest for that slot,
//! so a slow reply can't overwrite state written by a later action.

use crate::ai::SummaryResult;
use crate::github::{PullRequest, PullRequestPage, Repository};
use crate::server::wire::{GenerateSummaryBody, DEFAULT_PER_PAGE};

/// Shown in the prompt editor when the default prompt couldn't be fetched
pub const PROMPT_PLACEHOLDER: &str =
    "Default prompt unavailable. Type your own instructions or leave blank.";

/// Top-level lifecycle of the view
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Idle,
    FetchingRepos,
    Ready,
    Submitting,
}

/// State slots written by network responses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Repositories = 0,
    PullRequests = 1,
    DefaultPrompt = 2,
    Summary = 3,
}

const SLOT_COUNT: usize = 4;

/// Identifies one request against a slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    slot: Slot,
    generation: u64,
}

#[derive(Debug, Default)]
struct Generations([u64; SLOT_COUNT]);

impl Generations {
    fn issue(&mut self, slot: Slot) -> Ticket {
        let generation = &mut self.0[slot as usize];
        *generation += 1;
        Ticket {
            slot,
            generation: *generation,
        }
    }

    fn invalidate(&mut self, slot: Slot) {
        self.0[slot as usize] += 1;
    }

    fn is_current(&self, ticket: Ticket) -> bool {
        self.0[ticket.slot as usize] == ticket.generation
    }
}

/// Side effects requested by a state transition
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    FetchRepos(Ticket),
    FetchDefaultPrompt(Ticket),
    FetchPullRequests {
        ticket: Ticket,
        repo: String,
        page: u32,
        per_page: u32,
    },
    Generate {
        ticket: Ticket,
        body: GenerateSummaryBody,
    },
    Copy(String),
}

/// Completed network call, errors already rendered to display text
#[derive(Debug, Clone)]
pub enum Response {
    Repos(Ticket, Result<Vec<Repository>, String>),
    PullRequests(Ticket, Result<PullRequestPage, String>),
    DefaultPrompt(Ticket, Result<String, String>),
    Summary(Ticket, Result<SummaryResult, String>),
}

impl Response {
    fn ticket(&self) -> Ticket {
        match self {
            Self::Repos(t, _)
            | Self::PullRequests(t, _)
            | Self::DefaultPrompt(t, _)
            | Self::Summary(t, _) => *t,
        }
    }
}

/// What `r` re-runs after an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Retry {
    Repos,
    PullRequests,
    Summary,
}

/// Which panel receives keys
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    #[default]
    Repos,
    StartDate,
    EndDate,
    Priority,
    Prompt,
    Result,
}

impl Focus {
    const ORDER: [Focus; 6] = [
        Focus::Repos,
        Focus::StartDate,
        Focus::EndDate,
        Focus::Priority,
        Focus::Prompt,
        Focus::Result,
    ];

    fn index(self) -> usize {
        Self::ORDER.iter().position(|f| *f == self).unwrap_or(0)
    }

    pub fn next(self) -> Self {
        Self::ORDER[(self.index() + 1) % Self::ORDER.len()]
    }

    pub fn prev(self) -> Self {
        Self::ORDER[(self.index() + Self::ORDER.len() - 1) % Self::ORDER.len()]
    }

    pub fn is_text_input(self) -> bool {
        matches!(self, Focus::StartDate | Focus::EndDate | Focus::Prompt)
    }
}

/// Lazily loaded, paginated pull request selector
#[derive(Debug, Default)]
pub struct PriorityPicker {
    pub open: bool,
    pub items: Vec<PullRequest>,
    /// Chosen numbers, in the order they were picked
    pub selected: Vec<u64>,
    pub cursor: usize,
    pub has_more: bool,
    pub loading: bool,
    next_page: u32,
    loaded_any: bool,
}

impl PriorityPicker {
    pub fn is_selected(&self, number: u64) -> bool {
        self.selected.contains(&number)
    }

    pub fn can_load_more(&self) -> bool {
        !self.loading && (!self.loaded_any || self.has_more)
    }

    fn toggle(&mut self, number: u64) {
        if let Some(pos) = self.selected.iter().position(|n| *n == number) {
            self.selected.remove(pos);
        } else {
            self.selected.push(number);
        }
    }
}

/// All mutable UI state
#[derive(Debug, Default)]
pub struct App {
    pub phase: Phase,
    /// Error overlay; cleared by the next key press
    pub error: Option<String>,
    /// One-line transient message in the status bar
    pub status: Option<String>,
    pub focus: Focus,

    pub repos: Vec<Repository>,
    pub repo_cursor: usize,
    pub selected_repo: Option<String>,

    pub start_date: String,
    pub end_date: String,
    pub picker: PriorityPicker,

    pub prompt: String,
    pub prompt_unavailable: bool,
    default_prompt: Option<String>,

    pub result: Option<SummaryResult>,
    pub result_scroll: u16,

    pub should_quit: bool,
    generations: Generations,
    last_failed: Option<Retry>,
}

impl App {
    /// Initial fetches on load
    pub fn start(&mut self) -> Vec<Command> {
        let repos = self.fetch_repos();
        let prompt = Command::FetchDefaultPrompt(self.generations.issue(Slot::DefaultPrompt));
        vec![repos, prompt]
    }

    fn fetch_repos(&mut self) -> Command {
        self.phase = Phase::FetchingRepos;
        Command::FetchRepos(self.generations.issue(Slot::Repositories))
    }

    fn fail(&mut self, message: String, retry: Retry) {
        self.error = Some(message);
        self.last_failed = Some(retry);
    }

    /// Clear the error overlay; returns whether one was showing
    pub fn dismiss_error(&mut self) -> bool {
        self.error.take().is_some()
    }

    /// Re-run whatever failed last
    pub fn retry(&mut self) -> Option<Command> {
        match self.last_failed.take()? {
            Retry::Repos => Some(self.fetch_repos()),
            Retry::PullRequests => self.load_more(),
            Retry::Summary => self.submit(),
        }
    }

    pub fn move_repo_cursor(&mut self, delta: isize) {
        self.repo_cursor = step(self.repo_cursor, delta, self.repos.len());
    }

    /// Make the highlighted repository the selection
    pub fn select_highlighted_repo(&mut self) {
        let Some(full_name) = self.repos.get(self.repo_cursor).map(|r| r.full_name.clone()) else {
            return;
        };
        if self.selected_repo.as_deref() == Some(full_name.as_str()) {
            return;
        }

        self.selected_repo = Some(full_name);
        // Pull requests belong to the previous repository
        self.picker = PriorityPicker::default();
        self.generations.invalidate(Slot::PullRequests);
    }

    /// Open or close the priority selector, loading the first page on first open
    pub fn toggle_picker(&mut self) -> Option<Command> {
        if self.picker.open {
            self.picker.open = false;
            return None;
        }
        if self.selected_repo.is_none() {
            self.status = Some("Select a repository first".to_string());
            return None;
        }

        self.picker.open = true;
        if self.picker.loaded_any {
            None
        } else {
            self.load_more()
        }
    }

    /// Fetch the next page of pull requests, unless one is already loading
    pub fn load_more(&mut self) -> Option<Command> {
        let repo = self.selected_repo.clone()?;
        if !self.picker.can_load_more() {
            return None;
        }

        self.picker.loading = true;
        Some(Command::FetchPullRequests {
            ticket: self.generations.issue(Slot::PullRequests),
            repo,
            page: self.picker.next_page,
            per_page: DEFAULT_PER_PAGE,
        })
    }

    pub fn move_picker_cursor(&mut self, delta: isize) {
        self.picker.cursor = step(self.picker.cursor, delta, self.picker.items.len());
    }

    pub fn toggle_highlighted_priority(&mut self) {
        if let Some(number) = self.picker.items.get(self.picker.cursor).map(|pr| pr.number) {
            self.picker.toggle(number);
        }
    }

    /// Generate is enabled with a repository selected and nothing in flight
    pub fn can_generate(&self) -> bool {
        self.selected_repo.is_some() && self.phase != Phase::Submitting
    }

    /// Build and issue the summary request; refused without a repository
    pub fn submit(&mut self) -> Option<Command> {
        if self.phase == Phase::Submitting {
            return None;
        }
        let Some(repo_name) = self.selected_repo.clone() else {
            self.status = Some("Select a repository before generating".to_string());
            return None;
        };

        let body = GenerateSummaryBody {
            repo_name,
            start_date: non_blank(&self.start_date),
            end_date: non_blank(&self.end_date),
            prioritized_pr_numbers: if self.picker.selected.is_empty() {
                None
            } else {
                Some(self.picker.selected.clone())
            },
            custom_prompt: self.custom_prompt(),
        };

        self.phase = Phase::Submitting;
        self.status = None;
        Some(Command::Generate {
            ticket: self.generations.issue(Slot::Summary),
            body,
        })
    }

    /// The edited prompt, or None when it's blank or still the default
    fn custom_prompt(&self) -> Option<String> {
        let text = self.prompt.trim();
        if text.is_empty() || self.default_prompt.as_deref().map(str::trim) == Some(text) {
            None
        } else {
            Some(self.prompt.clone())
        }
    }

    pub fn copy_result(&self) -> Option<Command> {
        self.result
            .as_ref()
            .map(|result| Command::Copy(result.summary.clone()))
    }

    pub fn scroll_result(&mut self, delta: i32) {
        let next = i32::from(self.result_scroll) + delta;
        self.result_scroll = next.clamp(0, i32::from(u16::MAX)) as u16;
    }

    /// The text field with focus, if any
    pub fn active_text_mut(&mut self) -> Option<&mut String> {
        match self.focus {
            Focus::StartDate => Some(&mut self.start_date),
            Focus::EndDate => Some(&mut self.end_date),
            Focus::Prompt => Some(&mut self.prompt),
            _ => None,
        }
    }

    /// Apply a network response; stale ones are dropped and reported as `false`
    pub fn apply(&mut self, response: Response) -> bool {
        if !self.generations.is_current(response.ticket()) {
            return false;
        }

        match response {
            Response::Repos(_, Ok(repos)) => {
                self.repos = repos;
                self.repo_cursor = self.repo_cursor.min(self.repos.len().saturating_sub(1));
                self.phase = Phase::Ready;
            }
            Response::Repos(_, Err(e)) => {
                self.phase = Phase::Idle;
                self.fail(e, Retry::Repos);
            }
            Response::PullRequests(_, Ok(page)) => {
                self.picker.items.extend(page.items);
                self.picker.has_more = page.has_more;
                self.picker.next_page = page.page + 1;
                self.picker.loading = false;
                self.picker.loaded_any = true;
            }
            Response::PullRequests(_, Err(e)) => {
                self.picker.loading = false;
                self.fail(e, Retry::PullRequests);
            }
            Response::DefaultPrompt(_, Ok(prompt)) => {
                if self.prompt.trim().is_empty() {
                    self.prompt = prompt.clone();
                }
                self.default_prompt = Some(prompt);
            }
            // Best effort: the editor just shows a placeholder
            Response::DefaultPrompt(_, Err(_)) => {
                self.prompt_unavailable = true;
            }
            Response::Summary(_, Ok(result)) => {
                self.result = Some(result);
                self.result_scroll = 0;
                self.focus = Focus::Result;
                self.phase = Phase::Ready;
            }
            Response::Summary(_, Err(e)) => {
                self.phase = Phase::Ready;
                self.fail(e, Retry::Summary);
            }
        }
        true
    }
}

fn step(current: usize, delta: isize, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    current.saturating_add_signed(delta).min(len - 1)
}

fn non_blank(s: &str) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
