use super::app::{App, Focus, Phase, PROMPT_PLACEHOLDER};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Frame;

const ACCENT: Color = Color::Cyan;

/// Draw one frame
pub fn render(frame: &mut Frame, app: &App) {
    let outer = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(frame.size());
    let main = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(30), Constraint::Percentage(70)])
        .split(outer[0]);
    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(9),
            Constraint::Length(8),
            Constraint::Min(5),
        ])
        .split(main[1]);
    let dates = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(right[0]);

    render_repos(frame, main[0], app);
    render_text_field(frame, dates[0], app, Focus::StartDate, " Start date ", &app.start_date);
    render_text_field(frame, dates[1], app, Focus::EndDate, " End date ", &app.end_date);
    render_priority(frame, right[1], app);
    render_prompt(frame, right[2], app);
    render_result(frame, right[3], app);
    render_status_bar(frame, outer[1], app);

    if let Some(error) = &app.error {
        render_error(frame, error);
    }
}

fn panel(title: &str, focused: bool) -> Block<'_> {
    let style = if focused {
        Style::default().fg(ACCENT)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    Block::default()
        .borders(Borders::ALL)
        .border_style(style)
        .title(title)
}

fn hint(text: &str) -> Paragraph<'_> {
    Paragraph::new(text).style(Style::default().fg(Color::DarkGray))
}

fn render_repos(frame: &mut Frame, area: Rect, app: &App) {
    let block = panel(" Repositories ", app.focus == Focus::Repos);

    if app.phase == Phase::FetchingRepos {
        frame.render_widget(hint("Loading repositories...").block(block), area);
        return;
    }
    if app.repos.is_empty() {
        frame.render_widget(hint("No repositories").block(block), area);
        return;
    }

    let items: Vec<ListItem> = app
        .repos
        .iter()
        .map(|repo| {
            let selected = app.selected_repo.as_deref() == Some(repo.full_name.as_str());
            let marker = if selected { "● " } else { "  " };
            let mut spans = vec![
                Span::styled(marker, Style::default().fg(Color::Green)),
                Span::raw(repo.full_name.clone()),
            ];
            if repo.is_private {
                spans.push(Span::styled(" (private)", Style::default().fg(Color::DarkGray)));
            }
            ListItem::new(Line::from(spans))
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
    let mut state = ListState::default().with_selected(Some(app.repo_cursor));
    frame.render_stateful_widget(list, area, &mut state);
}

fn render_text_field(frame: &mut Frame, area: Rect, app: &App, focus: Focus, title: &str, value: &str) {
    let focused = app.focus == focus;
    let block = panel(title, focused);
    let widget = if value.is_empty() && !focused {
        hint("YYYY-MM-DD (optional)")
    } else if focused {
        Paragraph::new(format!("{}▏", value))
    } else {
        Paragraph::new(value)
    };
    frame.render_widget(widget.block(block), area);
}

fn render_priority(frame: &mut Frame, area: Rect, app: &App) {
    let picker = &app.picker;
    let title = format!(" Priority pull requests ({} selected) ", picker.selected.len());
    let block = panel(&title, app.focus == Focus::Priority);

    if !picker.open {
        let text = if app.selected_repo.is_some() {
            "Enter: choose pull requests to highlight"
        } else {
            "Select a repository first"
        };
        frame.render_widget(hint(text).block(block), area);
        return;
    }

    let mut items: Vec<ListItem> = picker
        .items
        .iter()
        .map(|pr| {
            let check = if picker.is_selected(pr.number) { "[x] " } else { "[ ] " };
            ListItem::new(Line::from(vec![
                Span::styled(check, Style::default().fg(ACCENT)),
                Span::styled(format!("#{} ", pr.number), Style::default().fg(Color::Yellow)),
                Span::raw(pr.title.clone()),
                Span::styled(format!(" ({})", pr.state), Style::default().fg(Color::DarkGray)),
            ]))
        })
        .collect();

    let footer = if picker.loading {
        Some("Loading...")
    } else if picker.has_more {
        Some("m: load more")
    } else if picker.items.is_empty() {
        Some("No pull requests")
    } else {
        None
    };
    if let Some(text) = footer {
        items.push(ListItem::new(Span::styled(text, Style::default().fg(Color::DarkGray))));
    }

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
    let selected = (!picker.items.is_empty()).then_some(picker.cursor);
    let mut state = ListState::default().with_selected(selected);
    frame.render_stateful_widget(list, area, &mut state);
}

fn render_prompt(frame: &mut Frame, area: Rect, app: &App) {
    let focused = app.focus == Focus::Prompt;
    let block = panel(" Instructions ", focused);

    let widget = if app.prompt.is_empty() && app.prompt_unavailable && !focused {
        hint(PROMPT_PLACEHOLDER)
    } else if focused {
        Paragraph::new(format!("{}▏", app.prompt))
    } else {
        Paragraph::new(app.prompt.as_str())
    };
    frame.render_widget(widget.block(block).wrap(Wrap { trim: false }), area);
}

fn render_result(frame: &mut Frame, area: Rect, app: &App) {
    let block = panel(" Summary ", app.focus == Focus::Result);

    let widget = match (&app.result, app.phase) {
        (_, Phase::Submitting) => hint("Generating summary..."),
        (Some(result), _) => {
            let mut lines = vec![
                Line::from(Span::styled(
                    format!(
                        "{}: {} commits, {} pull requests analyzed",
                        result.repo_name, result.commits_analyzed, result.prs_analyzed
                    ),
                    Style::default().fg(Color::DarkGray),
                )),
                Line::default(),
            ];
            lines.extend(result.summary.lines().map(|l| Line::from(l.to_string())));
            Paragraph::new(lines).scroll((app.result_scroll, 0))
        }
        (None, _) => hint("Select a repository and press g to generate"),
    };
    frame.render_widget(widget.block(block).wrap(Wrap { trim: false }), area);
}

fn render_status_bar(frame: &mut Frame, area: Rect, app: &App) {
    let phase = match app.phase {
        Phase::Idle => "idle",
        Phase::FetchingRepos => "loading",
        Phase::Ready => "ready",
        Phase::Submitting => "generating",
    };
    let generate_style = if app.can_generate() {
        Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let mut spans = vec![
        Span::styled(format!(" {} ", phase), Style::default().fg(Color::Black).bg(ACCENT)),
        Span::raw(" "),
        Span::styled("g: generate", generate_style),
        Span::raw("  tab: next panel  y: copy  q: quit"),
    ];
    if let Some(status) = &app.status {
        spans.push(Span::styled(format!("  {}", status), Style::default().fg(Color::Yellow)));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_error(frame: &mut Frame, message: &str) {
    let area = centered(frame.size(), 60, 30);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red))
        .title(" Error ");
    let text = vec![
        Line::from(message.to_string()),
        Line::default(),
        Line::from(Span::styled(
            "r: retry   any other key: dismiss",
            Style::default().fg(Color::DarkGray),
        )),
    ];

    frame.render_widget(Clear, area);
    frame.render_widget(Paragraph::new(text).block(block).wrap(Wrap { trim: true }), area);
}

/// Rectangle of the given percentages centred in `area`
fn centered(area: Rect, percent_x: u16, percent_y: u16) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::SummaryResult;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    fn draw(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 40)).unwrap();
        terminal.draw(|frame| render(frame, app)).unwrap();
        let buffer = terminal.backend().buffer().clone();
        buffer.content.iter().map(|cell| cell.symbol()).collect()
    }

    #[test]
    fn test_renders_error_overlay() {
        let mut app = App::default();
        app.error = Some("Invalid GitHub token.".to_string());
        let screen = draw(&app);
        assert!(screen.contains("Invalid GitHub token."));
        assert!(screen.contains("r: retry"));
    }

    #[test]
    fn test_renders_result() {
        let mut app = App::default();
        app.phase = Phase::Ready;
        app.result = Some(SummaryResult {
            summary: "- Shipped the widget API".to_string(),
            repo_name: "acme/widgets".to_string(),
            commits_analyzed: 3,
            prs_analyzed: 2,
        });
        let screen = draw(&app);
        assert!(screen.contains("Shipped the widget API"));
        assert!(screen.contains("3 commits, 2 pull requests analyzed"));
    }

    #[test]
    fn test_renders_placeholder_prompt() {
        let mut app = App::default();
        app.prompt_unavailable = true;
        assert!(draw(&app).contains("Default prompt unavailable"));
    }
}
