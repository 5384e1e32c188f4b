//! REPL - interactive triage session
//!
//! Reads one command per line from stdin and drives a `Dashboard`.
//! Builds run in the background; the prompt shows how many are in flight.

use anyhow::{anyhow, bail, Result};
use std::io::{self, BufRead, Write};
use triage_shared::{BuildLevel, ColumnKey, CompareMode, ResultRow, SortSpec};

use crate::dashboard::{Dashboard, SearchOutcome};
use crate::output;
use crate::store::FetchOutcome;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Search,
    Set(ColumnKey, String),
    Unset(ColumnKey),
    Clear,
    Field(ColumnKey),
    Compare(CompareMode),
    Hide(String),
    Unhide,
    UnhideAll,
    Level(String),
    /// `index` is 1-based into the displayed rows; `None` builds them all
    Build { index: Option<usize>, clean: bool },
    Rows,
    Groups,
    Count,
    Query,
    Filters,
    Output,
    Sort(SortSpec),
    Toggle(ColumnKey),
    ToggleOutput,
    Open { index: usize, child: bool },
    Source(usize),
    Wait,
    Help,
    Quit,
}

/// Parse one input line. Blank lines are rejected by the caller.
pub fn parse_command(line: &str) -> Result<ReplCommand> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };
    let args: Vec<&str> = rest.split_whitespace().collect();

    let command = match word.to_ascii_lowercase().as_str() {
        "search" | "s" => ReplCommand::Search,
        "set" => {
            let (column, text) = rest
                .split_once(char::is_whitespace)
                .ok_or_else(|| anyhow!("usage: set <column> <text>"))?;
            ReplCommand::Set(column.parse()?, text.trim().to_string())
        }
        "unset" => ReplCommand::Unset(one_column(&args, "unset <column>")?),
        "clear" => ReplCommand::Clear,
        "field" => ReplCommand::Field(one_column(&args, "field <column>")?),
        "compare" => match args.as_slice() {
            [mode] => ReplCommand::Compare(mode.parse()?),
            _ => bail!("usage: compare <newer|older>"),
        },
        "hide" => {
            if rest.is_empty() {
                bail!("usage: hide <content>");
            }
            ReplCommand::Hide(rest.to_string())
        }
        "unhide" => match args.as_slice() {
            [] => ReplCommand::Unhide,
            ["all"] => ReplCommand::UnhideAll,
            _ => bail!("usage: unhide [all]"),
        },
        "level" => match args.as_slice() {
            [token] => ReplCommand::Level(token.to_string()),
            _ => bail!("usage: level <token>"),
        },
        "build" => parse_build(&args)?,
        "rows" | "r" => ReplCommand::Rows,
        "groups" | "g" => ReplCommand::Groups,
        "count" => ReplCommand::Count,
        "query" => ReplCommand::Query,
        "filters" | "f" => ReplCommand::Filters,
        "output" | "o" => ReplCommand::Output,
        "sort" => match args.as_slice() {
            [column] => ReplCommand::Sort(SortSpec {
                column: column.parse()?,
                ascending: true,
            }),
            [column, direction] => ReplCommand::Sort(SortSpec {
                column: column.parse()?,
                ascending: match *direction {
                    "asc" => true,
                    "desc" => false,
                    other => bail!("unknown sort direction: {}", other),
                },
            }),
            _ => bail!("usage: sort <column> [asc|desc]"),
        },
        "toggle" => match args.as_slice() {
            ["output"] => ReplCommand::ToggleOutput,
            _ => ReplCommand::Toggle(one_column(&args, "toggle <column|output>")?),
        },
        "open" => match args.as_slice() {
            [n] => ReplCommand::Open {
                index: row_index(n)?,
                child: false,
            },
            [n, "child"] => ReplCommand::Open {
                index: row_index(n)?,
                child: true,
            },
            _ => bail!("usage: open <n> [child]"),
        },
        "source" => match args.as_slice() {
            [n] => ReplCommand::Source(row_index(n)?),
            _ => bail!("usage: source <n>"),
        },
        "wait" => ReplCommand::Wait,
        "help" | "?" => ReplCommand::Help,
        "quit" | "exit" | "q" => ReplCommand::Quit,
        other => bail!("unknown command '{}', type 'help'", other),
    };
    Ok(command)
}

fn parse_build(args: &[&str]) -> Result<ReplCommand> {
    let command = match args {
        [] => ReplCommand::Build {
            index: None,
            clean: false,
        },
        ["clean"] => ReplCommand::Build {
            index: None,
            clean: true,
        },
        [n] => ReplCommand::Build {
            index: Some(row_index(n)?),
            clean: false,
        },
        [n, "clean"] => ReplCommand::Build {
            index: Some(row_index(n)?),
            clean: true,
        },
        _ => bail!("usage: build [<n>] [clean]"),
    };
    Ok(command)
}

fn one_column(args: &[&str], usage: &str) -> Result<ColumnKey> {
    match args {
        [column] => Ok(column.parse()?),
        _ => bail!("usage: {}", usage),
    }
}

fn row_index(text: &str) -> Result<usize> {
    match text.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => bail!("expected a row number, got '{}'", text),
    }
}

const HELP: &str = "\
search                     refresh count, groups and rows
set <col> <text>           set a column filter
unset <col>                clear a column filter
clear                      clear every column filter
field <col>                choose the grouped column
compare <newer|older>      date comparison for 'modified'
hide <content>             hide the cluster whose grouped column equals content
unhide [all]               un-hide the last (or every) hidden cluster
level <token>              build level used by 'build'
build [<n>] [clean]        build or clean one row or every matching row
rows | groups | count      show loaded data
query                      show the encoded query
filters                    show columns, filters and hidden clusters
output                     show the last build output
sort <col> [asc|desc]      sort displayed rows
toggle <col|output>        show or hide a column or the build output
open <n> [child]           print the content URL of row n
source <n>                 print the source URL of row n
wait                       wait for running builds
quit";

/// Command list followed by the columns `field` accepts
pub fn help_text() -> String {
    let groupable: Vec<&str> = ColumnKey::groupable().map(|k| k.as_str()).collect();
    format!("{}\n\ngroupable columns: {}", HELP, groupable.join(", "))
}

/// Whether the loop continues after a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Run the interactive loop until `quit` or EOF
pub async fn run(dashboard: Dashboard) -> Result<()> {
    output::display_banner(&dashboard.base_url(), dashboard.started_at());
    report_search(&dashboard, dashboard.search().await).await;

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        prompt(dashboard.in_flight());

        let input = match lines.next() {
            Some(Ok(line)) => line.trim().to_string(),
            Some(Err(e)) => {
                output::display_error(&format!("Error reading input: {}", e));
                continue;
            }
            None => break,
        };

        if input.is_empty() {
            continue;
        }

        let command = match parse_command(&input) {
            Ok(command) => command,
            Err(e) => {
                output::display_error(&e.to_string());
                continue;
            }
        };

        match execute(&dashboard, command).await {
            Ok(Flow::Quit) => break,
            Ok(Flow::Continue) => {}
            Err(e) => output::display_error(&e.to_string()),
        }
    }

    if dashboard.in_flight() > 0 {
        output::display_info("waiting for running builds");
        dashboard.wait_idle().await;
    }
    Ok(())
}

fn prompt(in_flight: usize) {
    if in_flight > 0 {
        print!("triage [{} building]> ", in_flight);
    } else {
        print!("triage> ");
    }
    let _ = io::stdout().flush();
}

pub async fn execute(dashboard: &Dashboard, command: ReplCommand) -> Result<Flow> {
    match command {
        ReplCommand::Search => report_search(dashboard, dashboard.search().await).await,
        ReplCommand::Set(column, text) => {
            dashboard.set_search_text(column, text).await;
            report_search(dashboard, dashboard.search().await).await;
        }
        ReplCommand::Unset(column) => {
            dashboard.set_search_text(column, "").await;
            report_search(dashboard, dashboard.search().await).await;
        }
        ReplCommand::Clear => {
            dashboard.clear_filters().await;
            report_search(dashboard, dashboard.search().await).await;
        }
        ReplCommand::Field(column) => {
            dashboard.set_active_field(column).await?;
            report_fetch("groups", &dashboard.group().await);
            print!(
                "{}",
                output::render_groups(&dashboard.groups().await, column)
            );
        }
        ReplCommand::Compare(mode) => {
            dashboard.set_compare(mode).await;
            report_search(dashboard, dashboard.search().await).await;
        }
        ReplCommand::Hide(content) => {
            let outcome = dashboard.hide(&content).await?;
            output::display_success(&format!("hidden '{}'", content));
            report_search(dashboard, outcome).await;
        }
        ReplCommand::Unhide => {
            let (popped, outcome) = dashboard.clear_last_hidden().await;
            if popped.is_none() {
                output::display_info("nothing hidden");
            }
            report_search(dashboard, outcome).await;
        }
        ReplCommand::UnhideAll => {
            report_search(dashboard, dashboard.clear_hidden().await).await;
        }
        ReplCommand::Level(token) => {
            dashboard.set_build_level(BuildLevel::new(token)).await;
        }
        ReplCommand::Build { index, clean } => {
            let started = match index {
                Some(n) => {
                    let row = displayed_row(dashboard, n).await?;
                    let _ = dashboard.build_one(row, clean).await;
                    1
                }
                None => dashboard.build_all(clean).await.len(),
            };
            let verb = if clean { "clean" } else { "build" };
            output::display_success(&format!("started {} {} action(s)", started, verb));
        }
        ReplCommand::Rows => {
            let view = dashboard.view().await;
            print!(
                "{}",
                output::render_rows(&dashboard.visible_results().await, &view)
            );
        }
        ReplCommand::Groups => {
            print!(
                "{}",
                output::render_groups(&dashboard.groups().await, dashboard.active_field().await)
            );
        }
        ReplCommand::Count => {
            report_fetch("count", &dashboard.count().await);
            output::display_summary(&dashboard.snapshot().await, dashboard.in_flight());
        }
        ReplCommand::Query => println!("{}", dashboard.rows_query().await),
        ReplCommand::Filters => {
            let view = dashboard.view().await;
            print!("{}", output::render_filters(&view));
            print!("{}", output::render_hidden(&dashboard.hidden().await));
        }
        ReplCommand::Output => show_output(dashboard).await,
        ReplCommand::Sort(spec) => {
            dashboard.set_sort(spec).await;
            let view = dashboard.view().await;
            print!(
                "{}",
                output::render_rows(&dashboard.visible_results().await, &view)
            );
        }
        ReplCommand::Toggle(column) => {
            let visible = dashboard.toggle_visible(column).await;
            let state = if visible { "shown" } else { "hidden" };
            output::display_info(&format!("column '{}' {}", column.label(), state));
        }
        ReplCommand::ToggleOutput => {
            let show = !dashboard.view().await.show_build_result;
            dashboard.set_show_build_result(show).await;
            let state = if show { "shown" } else { "hidden" };
            output::display_info(&format!("build output {}", state));
        }
        ReplCommand::Open { index, child } => {
            let row = displayed_row(dashboard, index).await?;
            let path = row
                .text(ColumnKey::FileLink)
                .or_else(|| row.text(ColumnKey::FileName))
                .ok_or_else(|| anyhow!("row {} has no file", index))?;
            println!("{}", dashboard.file_url(&path, child));
        }
        ReplCommand::Source(index) => {
            let row = displayed_row(dashboard, index).await?;
            let path = row
                .text(ColumnKey::SourceRef)
                .ok_or_else(|| anyhow!("row {} has no source reference", index))?;
            println!("{}", dashboard.source_url(&path));
        }
        ReplCommand::Wait => {
            dashboard.wait_idle().await;
            output::display_success("no builds running");
            show_output(dashboard).await;
        }
        ReplCommand::Help => println!("{}", help_text()),
        ReplCommand::Quit => return Ok(Flow::Quit),
    }
    Ok(Flow::Continue)
}

async fn displayed_row(dashboard: &Dashboard, index: usize) -> Result<ResultRow> {
    let rows = dashboard.visible_results().await;
    rows.get(index - 1)
        .cloned()
        .ok_or_else(|| anyhow!("no row {} ({} displayed)", index, rows.len()))
}

async fn show_output(dashboard: &Dashboard) {
    if !dashboard.view().await.show_build_result {
        output::display_info("build output hidden, 'toggle output' to show it");
        return;
    }
    let text = dashboard.output_text().await;
    if text.is_empty() {
        output::display_info("no build output");
    } else {
        println!("{}", output::render_build_output(&text).trim_end());
    }
}

fn report_fetch(what: &str, outcome: &FetchOutcome) {
    if let FetchOutcome::Failed(message) = outcome {
        output::display_warning(&format!("{} not refreshed: {}", what, message));
    }
}

async fn report_search(dashboard: &Dashboard, outcome: SearchOutcome) {
    report_fetch("count", &outcome.count);
    report_fetch("groups", &outcome.groups);
    report_fetch("rows", &outcome.rows);
    output::display_summary(&dashboard.snapshot().await, dashboard.in_flight());
}
