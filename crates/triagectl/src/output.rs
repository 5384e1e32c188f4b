//! Output formatting - ASCII-only terminal output
//!
//! `render_*` build strings so they can be tested; `display_*` print.

use chrono::{DateTime, Local};
use owo_colors::OwoColorize;
use std::fmt::Write;
use triage_shared::{ColumnKey, ExclusionSnapshot, GroupRow, ResultRow, ViewState};

use crate::store::StoreSnapshot;

pub const THIN_SEPARATOR: &str = "------------------------------------------------------------";

/// Widest a table cell may get before it is cut
const MAX_CELL: usize = 40;
const OUTPUT_WIDTH: usize = 100;

fn cell(text: &str) -> String {
    if text.chars().count() > MAX_CELL {
        let cut: String = text.chars().take(MAX_CELL - 3).collect();
        format!("{}...", cut)
    } else {
        text.to_string()
    }
}

/// Numbered table of `rows` restricted to the visible columns
pub fn render_rows(rows: &[ResultRow], view: &ViewState) -> String {
    let columns: Vec<ColumnKey> = view
        .filter
        .columns()
        .iter()
        .filter(|c| c.visible)
        .map(|c| c.key)
        .collect();

    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| columns.iter().map(|k| cell(&row.text_or_empty(*k))).collect())
        .collect();

    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(i, key)| {
            cells
                .iter()
                .map(|r| r[i].chars().count())
                .chain(std::iter::once(key.label().len()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut out = String::new();
    let header: Vec<String> = columns
        .iter()
        .zip(&widths)
        .map(|(k, w)| format!("{:width$}", k.label(), width = *w))
        .collect();
    let _ = writeln!(out, "{:>4}  {}", "#", header.join("  ").bold());

    for (n, row) in cells.iter().enumerate() {
        let line: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(c, w)| format!("{:width$}", c, width = *w))
            .collect();
        let _ = writeln!(out, "{:>4}  {}", n + 1, line.join("  ").trim_end());
    }
    out
}

pub fn render_groups(groups: &[GroupRow], field: ColumnKey) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "[GROUPS by {}]", field.label());
    if groups.is_empty() {
        let _ = writeln!(out, "  (none)");
    }
    for group in groups {
        let fields: Vec<String> = group
            .fields()
            .into_iter()
            .map(|(k, v)| if k.is_empty() { v } else { format!("{}={}", k, cell(&v)) })
            .collect();
        let _ = writeln!(out, "  * {}", fields.join("  "));
    }
    out
}

pub fn render_filters(view: &ViewState) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "field={}  compare={}  level={}",
        view.active_field, view.compare, view.build_level
    );
    for column in view.filter.columns() {
        let marker = if column.visible { "x" } else { " " };
        let search = if column.search_text.is_empty() {
            String::new()
        } else {
            format!("= {}", column.search_text)
        };
        let _ = writeln!(
            out,
            "  [{}] {:14} {:15} {}",
            marker,
            column.key.as_str(),
            column.label,
            search
        );
    }
    out
}

pub fn render_hidden(hidden: &[ExclusionSnapshot]) -> String {
    let mut out = String::new();
    if hidden.is_empty() {
        let _ = writeln!(out, "[HIDDEN] none");
        return out;
    }
    let _ = writeln!(out, "[HIDDEN]");
    for (i, snapshot) in hidden.iter().enumerate() {
        let terms: Vec<String> = snapshot
            .terms()
            .map(|(k, v)| format!("{}{}={}", k, i, cell(v)))
            .collect();
        let _ = writeln!(out, "  {}: {}", i, terms.join(" "));
    }
    out
}

/// Executor output is an HTML fragment
pub fn render_build_output(html: &str) -> String {
    html2text::from_read(html.as_bytes(), OUTPUT_WIDTH)
}

pub fn display_summary(snapshot: &StoreSnapshot, in_flight: usize) {
    let count = snapshot.count.to_string();
    print!("[COUNT] {}", count.bold());
    if in_flight > 0 {
        print!("   [BUILDING] {}", in_flight.to_string().yellow());
    }
    println!();
    if snapshot.stale {
        let reason = snapshot.last_error.as_deref().unwrap_or("unknown error");
        println!("[STALE] {}", reason.yellow());
    }
}

pub fn display_banner(host: &str, started_at: DateTime<Local>) {
    println!("{}", "triagectl - error triage".bold());
    println!("server  {}", host.cyan());
    println!("session {}", started_at.format("%a %b %e %Y %H:%M:%S"));
    println!("{}", THIN_SEPARATOR.dimmed());
    println!("Type 'help' for commands.");
}

pub fn display_error(message: &str) {
    eprintln!("[ERROR] {}", message.red());
}

pub fn display_success(message: &str) {
    println!("[OK] {}", message.green());
}

pub fn display_info(message: &str) {
    println!("[INFO] {}", message);
}

pub fn display_warning(message: &str) {
    println!("[WARNING] {}", message.yellow());
}
