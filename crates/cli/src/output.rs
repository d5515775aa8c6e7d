// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared text/JSON rendering for `pal`'s read commands.
//!
//! Every list/show command picks between a human-readable table (default,
//! colorized per `color.rs` when stdout is a TTY) and a `--json` array or
//! object a host assistant can parse. The two helpers below,
//! [`handle_list`] and [`format_or_json`], are the generic shape every
//! command's output funnels through.

use crate::color;
use crate::exit_error::ExitError;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Renders `items` as a JSON array under `--json`, or as an aligned table
/// with `headers` and one `to_row` line per item otherwise. `empty_message`
/// is printed (not an error) when `items` is empty in text mode.
pub fn handle_list<T, F>(
    format: OutputFormat,
    items: &[T],
    empty_message: &str,
    headers: &[&str],
    to_row: F,
) -> Result<(), ExitError>
where
    T: Serialize,
    F: Fn(&T) -> Vec<String>,
{
    match format {
        OutputFormat::Json => print_json(items),
        OutputFormat::Text => {
            if items.is_empty() {
                println!("{}", color::muted(empty_message));
                return Ok(());
            }
            let rows: Vec<Vec<String>> = items.iter().map(&to_row).collect();
            print_table(headers, &rows);
            Ok(())
        }
    }
}

/// Renders a single value as JSON under `--json`, or via `to_text`
/// otherwise. `to_text` is only invoked in text mode, so it may assume
/// fields irrelevant to JSON output.
pub fn format_or_json<T, F>(format: OutputFormat, value: &T, to_text: F) -> Result<(), ExitError>
where
    T: Serialize,
    F: FnOnce(&T) -> String,
{
    match format {
        OutputFormat::Json => print_json(value),
        OutputFormat::Text => {
            println!("{}", to_text(value));
            Ok(())
        }
    }
}

pub fn print_json<T: Serialize>(value: &T) -> Result<(), ExitError> {
    let json = serde_json::to_string_pretty(value).map_err(|e| ExitError::new(2, format!("failed to serialize output: {e}")))?;
    println!("{json}");
    Ok(())
}

/// A minimal fixed-width table, column widths derived from the data itself
/// rather than a terminal-width query — good enough for the row counts this
/// CLI deals in (ports/sessions/pipelines per project, not per fleet).
fn print_table(headers: &[&str], rows: &[Vec<String>]) {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(w) = widths.get_mut(i) {
                *w = (*w).max(cell.len());
            }
        }
    }

    let header_line: Vec<String> =
        headers.iter().enumerate().map(|(i, h)| format!("{:width$}", h, width = widths[i])).collect();
    println!("{}", color::header(&header_line.join("  ")));

    for row in rows {
        let line: Vec<String> = row
            .iter()
            .enumerate()
            .map(|(i, cell)| format!("{:width$}", cell, width = widths.get(i).copied().unwrap_or(cell.len())))
            .collect();
        println!("{}", color::literal(&line.join("  ")));
    }
}

/// Renders milliseconds-since-epoch as a rough "Ns ago" / "Nm ago" / date
/// string for table cells, since every timestamp field in the data model is
/// `*_ms: u64` rather than a `chrono` type.
pub fn format_ago(now_ms: u64, at_ms: u64) -> String {
    if at_ms > now_ms {
        return "just now".to_string();
    }
    let delta_s = (now_ms - at_ms) / 1000;
    if delta_s < 60 {
        format!("{delta_s}s ago")
    } else if delta_s < 3600 {
        format!("{}m ago", delta_s / 60)
    } else if delta_s < 86_400 {
        format!("{}h ago", delta_s / 3600)
    } else {
        format!("{}d ago", delta_s / 86_400)
    }
}

#[cfg(test)]
#[path = "output_tests.rs"]
mod tests;
