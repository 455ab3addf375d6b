//! Terminal application loop.
//!
//! Drives a [`Repl`] interactively: a `select!` multiplexes plugin-load
//! completions against a frame tick, terminal events are drained with
//! non-blocking polls, and a frame is rendered only when something changed.
//! The terminal is restored on exit and on panic.

use std::io::{self, Write};
use std::time::Duration;

use crossterm::cursor::{Hide, Show};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::{execute, terminal};
use tokio::sync::mpsc;
use tokio::time::interval;

use crate::error::ReplError;
use crate::loader::LoadOutcome;
use crate::repl::Repl;
use crate::view::{draw, option_rows, render_frame};

/// Which panel receives keyboard input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    Editor,
    Options,
}

/// Interactive playground app.
pub struct PlaygroundApp {
    repl: Repl,
    completions: mpsc::UnboundedReceiver<LoadOutcome>,
    focus: Focus,
    cursor: usize,
    fps: u32,
}

impl PlaygroundApp {
    /// Wrap a built repl and its completion channel.
    pub fn new(repl: Repl, completions: mpsc::UnboundedReceiver<LoadOutcome>) -> Self {
        Self {
            repl,
            completions,
            focus: Focus::Editor,
            cursor: 0,
            fps: 30,
        }
    }

    /// Set target frames per second.
    pub fn fps(mut self, fps: u32) -> Self {
        self.fps = fps.max(1);
        self
    }

    /// Run until the user quits (Ctrl+C or Ctrl+Q).
    pub async fn run(mut self) -> Result<(), ReplError> {
        install_panic_hook();
        let _guard = TerminalGuard::enter()?;

        self.repl.boot();

        let mut tick = interval(Duration::from_secs_f64(1.0 / f64::from(self.fps)));
        let mut needs_render = true;
        let mut should_quit = false;

        loop {
            tokio::select! {
                biased;

                Some(outcome) = self.completions.recv() => {
                    self.repl.plugin_loaded(outcome);
                    needs_render = true;
                }

                _ = tick.tick() => {}
            }

            // Drain terminal events without blocking the frame
            while event::poll(Duration::ZERO)? {
                match event::read()? {
                    Event::Key(key) if key.kind != KeyEventKind::Release => {
                        if self.handle_key(&key) {
                            should_quit = true;
                            break;
                        }
                        needs_render = true;
                    }
                    Event::Paste(text) => {
                        self.repl.push_source(&text);
                        needs_render = true;
                    }
                    Event::Resize(_, _) => needs_render = true,
                    _ => {}
                }
            }

            if should_quit {
                break;
            }

            if needs_render {
                let (width, height) = terminal::size()?;
                let cursor = (self.focus == Focus::Options).then_some(self.cursor);
                let lines = render_frame(self.repl.state(), width, cursor);
                let mut out = io::stdout();
                draw(&mut out, &lines, height)?;
                needs_render = false;
            }
        }

        Ok(())
    }

    /// Handle one key press. Returns `true` to quit.
    fn handle_key(&mut self, key: &KeyEvent) -> bool {
        if key.modifiers.contains(KeyModifiers::CONTROL)
            && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('q'))
        {
            return true;
        }

        if key.code == KeyCode::Tab {
            self.focus = match self.focus {
                Focus::Editor => Focus::Options,
                Focus::Options => Focus::Editor,
            };
            return false;
        }

        match self.focus {
            Focus::Editor => match key.code {
                KeyCode::Char(c) => self.repl.push_source(&c.to_string()),
                KeyCode::Enter => self.repl.push_source("\n"),
                KeyCode::Backspace => self.repl.pop_source(),
                _ => {}
            },
            Focus::Options => {
                let rows = option_rows(self.repl.state());
                match key.code {
                    KeyCode::Up => self.cursor = self.cursor.saturating_sub(1),
                    KeyCode::Down => {
                        self.cursor = (self.cursor + 1).min(rows.len().saturating_sub(1));
                    }
                    KeyCode::Char(' ') | KeyCode::Enter => {
                        if let Some(row) = rows.get(self.cursor) {
                            let name = row.name.clone();
                            self.repl.flip(&name);
                        }
                    }
                    _ => {}
                }
            }
        }
        false
    }
}

/// Raw-mode/alternate-screen guard; restores the terminal on drop.
struct TerminalGuard;

impl TerminalGuard {
    fn enter() -> io::Result<Self> {
        enable_raw_mode()?;
        execute!(io::stdout(), EnterAlternateScreen, Hide)?;
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = restore_terminal();
    }
}

/// Install a panic hook that restores the terminal before the default hook
/// prints, so the message is readable.
fn install_panic_hook() {
    let hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = restore_terminal();
        hook(info);
    }));
}

fn restore_terminal() -> io::Result<()> {
    let mut out = io::stdout();
    execute!(out, LeaveAlternateScreen, Show)?;
    out.flush()?;
    disable_raw_mode()
}
