//! Terminal lifecycle.
//!
//! The UI draws to stderr so `repo2resume ui > file` leaves stdout clean.

use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use std::io::{stderr, BufWriter, Stderr};
use std::panic;

pub type Tui = Terminal<CrosstermBackend<BufWriter<Stderr>>>;

/// Enter raw mode and the alternate screen. Pair with [`restore_tui`].
pub fn init_tui() -> std::io::Result<Tui> {
    let mut out = BufWriter::new(stderr());
    enable_raw_mode()?;
    execute!(out, EnterAlternateScreen)?;
    Terminal::new(CrosstermBackend::new(out))
}

/// Leave the alternate screen and raw mode. Safe to call twice.
pub fn restore_tui() -> std::io::Result<()> {
    disable_raw_mode()?;
    execute!(stderr(), LeaveAlternateScreen)?;
    Ok(())
}

/// Restore the terminal before the panic message prints.
///
/// Install before [`init_tui`].
pub fn install_panic_hook() {
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = restore_tui();
        original_hook(panic_info);
    }));
}
