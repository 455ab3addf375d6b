//! Frame rendering for the playground.
//!
//! Rendering is split in two: a pure core that turns state into text lines
//! (snapshot-testable, no terminal needed) and a thin crossterm writer that
//! puts those lines on screen.
//!
//! The frame stacks three sections: the source panel (honoring the
//! `lineWrap` flag), the output panel (compiled text plus inline error
//! lines), and the options panel (one toggle row per setting, plugin, and
//! preset, with load-status markers).

use std::io::{self, Write};

use crossterm::cursor::MoveTo;
use crossterm::style::Print;
use crossterm::terminal::{Clear, ClearType};
use crossterm::QueueableCommand;
use unicode_width::UnicodeWidthChar;

use crate::state::{PluginEntry, ReplState};

/// One row of the options panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionRow {
    /// Toggle name to pass to [`Repl::toggle`](crate::repl::Repl::toggle).
    pub name: String,
    /// Label shown in the panel.
    pub label: String,
    /// Whether the toggle is on.
    pub enabled: bool,
    /// Status marker: `' '` idle, `'…'` loading, `'!'` load failed.
    pub status: char,
}

/// Flatten the toggleable settings into panel rows: the two top-level
/// flags, then plugins, then presets, in registry order.
pub fn option_rows(state: &ReplState) -> Vec<OptionRow> {
    let flag = |name: &str, enabled: bool| OptionRow {
        name: name.to_string(),
        label: name.to_string(),
        enabled,
        status: ' ',
    };
    let entry_row = |entry: &PluginEntry| OptionRow {
        name: entry.config.package.to_string(),
        label: entry.config.label.to_string(),
        enabled: entry.is_enabled,
        status: if entry.is_loading {
            '…'
        } else if entry.did_error {
            '!'
        } else {
            ' '
        },
    };

    let mut rows = vec![
        flag("evaluate", state.evaluate),
        flag("lineWrap", state.line_wrap),
    ];
    rows.extend(state.plugins.values().map(entry_row));
    rows.extend(state.presets.values().map(entry_row));
    rows
}

/// Render the whole frame as text lines of at most `width` columns.
///
/// `cursor` highlights one options row (the app's selection); `None` leaves
/// the panel unhighlighted.
pub fn render_frame(state: &ReplState, width: u16, cursor: Option<usize>) -> Vec<String> {
    let width = width as usize;
    let mut lines = Vec::new();

    lines.push(section_header("Source", width));
    for line in state.source.lines() {
        if state.line_wrap {
            lines.extend(wrap_to_width(line, width));
        } else {
            lines.push(truncate_to_width(line, width));
        }
    }

    lines.push(section_header("Output", width));
    if let Some(compiled) = &state.compiled {
        for line in compiled.lines() {
            lines.push(truncate_to_width(line, width));
        }
    }
    if let Some(error) = &state.compile_error {
        lines.push(truncate_to_width(&error.to_string(), width));
    }
    if let Some(error) = &state.eval_error {
        lines.push(truncate_to_width(&error.to_string(), width));
    }

    lines.push(section_header("Options", width));
    for (index, row) in option_rows(state).iter().enumerate() {
        let pointer = if cursor == Some(index) { '>' } else { ' ' };
        let mark = if row.enabled { 'x' } else { ' ' };
        let status = match row.status {
            ' ' => String::new(),
            other => format!(" {other}"),
        };
        lines.push(truncate_to_width(
            &format!("{pointer} [{mark}] {}{status}", row.label),
            width,
        ));
    }

    lines
}

/// Write frame lines to the terminal, clearing each line first.
pub fn draw(out: &mut impl Write, lines: &[String], height: u16) -> io::Result<()> {
    out.queue(Clear(ClearType::All))?;
    for (y, line) in lines.iter().take(height as usize).enumerate() {
        out.queue(MoveTo(0, y as u16))?
            .queue(Clear(ClearType::CurrentLine))?
            .queue(Print(line))?;
    }
    out.flush()
}

fn section_header(title: &str, width: usize) -> String {
    let mut header = format!("── {title} ");
    let used: usize = header.chars().map(|c| c.width().unwrap_or(0)).sum();
    header.extend(std::iter::repeat('─').take(width.saturating_sub(used)));
    header
}

/// Truncate to at most `width` columns, unicode-width aware.
fn truncate_to_width(line: &str, width: usize) -> String {
    let mut used = 0;
    let mut out = String::new();
    for c in line.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > width {
            break;
        }
        used += w;
        out.push(c);
    }
    out
}

/// Hard-wrap into chunks of at most `width` columns.
fn wrap_to_width(line: &str, width: usize) -> Vec<String> {
    if line.is_empty() {
        return vec![String::new()];
    }
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut used = 0;
    for c in line.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > width && !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
            used = 0;
        }
        used += w;
        current.push(c);
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::persist::PersistedState;
    use crate::CompileError;

    fn base_state() -> ReplState {
        ReplState::from_persisted(&PersistedState::default())
    }

    #[test]
    fn test_option_rows_order() {
        let state = base_state();
        let rows = option_rows(&state);

        assert_eq!(rows[0].name, "evaluate");
        assert_eq!(rows[1].name, "lineWrap");
        assert_eq!(rows[2].name, "babili-standalone");
        assert_eq!(rows[2].label, "babili");
        assert_eq!(rows[3].name, "prettier");
        assert_eq!(rows[4].name, "babel-preset-es2015");
        assert_eq!(rows.len(), 2 + 2 + 10);
    }

    #[test]
    fn test_option_row_status_markers() {
        let mut state = base_state();
        state.plugins.get_mut("prettier").unwrap().is_loading = true;
        state.plugins.get_mut("babili-standalone").unwrap().did_error = true;

        let rows = option_rows(&state);
        let prettier = rows.iter().find(|r| r.name == "prettier").unwrap();
        let babili = rows.iter().find(|r| r.name == "babili-standalone").unwrap();
        assert_eq!(prettier.status, '…');
        assert_eq!(babili.status, '!');
    }

    #[test]
    fn test_frame_contains_error_line() {
        let mut state = base_state();
        state.compile_error = Some(CompileError("boom".to_string()));

        let lines = render_frame(&state, 40, None);
        assert!(lines.iter().any(|l| l == "compile error: boom"));
    }

    #[test]
    fn test_line_wrap_vs_truncate() {
        let mut state = base_state();
        state.source = "abcdefgh".to_string();

        state.line_wrap = true;
        let wrapped = render_frame(&state, 4, None);
        assert!(wrapped.contains(&"abcd".to_string()));
        assert!(wrapped.contains(&"efgh".to_string()));

        state.line_wrap = false;
        let truncated = render_frame(&state, 4, None);
        assert!(truncated.contains(&"abcd".to_string()));
        assert!(!truncated.contains(&"efgh".to_string()));
    }

    #[test]
    fn test_truncate_is_width_aware() {
        // '猫' is two columns wide
        assert_eq!(truncate_to_width("猫猫猫", 4), "猫猫");
        assert_eq!(truncate_to_width("猫猫猫", 5), "猫猫");
    }

    #[test]
    fn test_section_header_fills_width() {
        let header = section_header("Source", 24);
        assert_eq!(header.chars().count(), 24);
        assert!(header.starts_with("── Source "));
    }
}
