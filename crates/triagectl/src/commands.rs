//! One-shot subcommands: search, build, query and init-config.

use anyhow::{Context, Result};
use clap::Args;
use std::path::Path;
use triage_shared::{
    BuildLevel, ColumnKey, CompareMode, ExclusionSnapshot, TriageConfig, ViewState,
};

use crate::dashboard::Dashboard;
use crate::output;
use crate::store::FetchOutcome;

/// `col=text` pair from the command line
pub fn parse_assignment(arg: &str) -> Result<(ColumnKey, String), String> {
    let (column, text) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected <column>=<text>, got '{}'", arg))?;
    let column = column.parse::<ColumnKey>().map_err(|e| e.to_string())?;
    Ok((column, text.to_string()))
}

#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Column filter, repeatable (e.g. --filter repo=mathhub)
    #[arg(long = "filter", value_name = "COL=TEXT", value_parser = parse_assignment)]
    pub filters: Vec<(ColumnKey, String)>,

    /// Hide rows whose column contains text; each use is its own hidden cluster
    #[arg(long = "exclude", value_name = "COL=TEXT", value_parser = parse_assignment)]
    pub excludes: Vec<(ColumnKey, String)>,

    /// Date comparison for the modified column
    #[arg(long)]
    pub compare: Option<CompareMode>,

    /// Grouped column
    #[arg(long)]
    pub field: Option<ColumnKey>,
}

impl FilterArgs {
    /// Apply to an offline view
    pub fn apply_to_view(&self, view: &mut ViewState) -> Result<()> {
        for (column, text) in &self.filters {
            view.filter.set_search_text(*column, text.clone());
        }
        for (column, text) in &self.excludes {
            view.exclusions
                .push(ExclusionSnapshot::from_pairs([(*column, text.as_str())]));
        }
        if let Some(mode) = self.compare {
            view.compare = mode;
        }
        if let Some(field) = self.field {
            if !field.is_groupable() {
                anyhow::bail!("column '{}' cannot be grouped", field);
            }
            view.active_field = field;
        }
        Ok(())
    }

    pub async fn apply(&self, dashboard: &Dashboard) -> Result<()> {
        for (column, text) in &self.filters {
            dashboard.set_search_text(*column, text.clone()).await;
        }
        for (column, text) in &self.excludes {
            dashboard
                .push_hidden(ExclusionSnapshot::from_pairs([(*column, text.as_str())]))
                .await;
        }
        if let Some(mode) = self.compare {
            dashboard.set_compare(mode).await;
        }
        if let Some(field) = self.field {
            dashboard.set_active_field(field).await?;
        }
        Ok(())
    }
}

fn check(what: &str, outcome: &FetchOutcome) -> Result<()> {
    match outcome {
        FetchOutcome::Failed(message) => anyhow::bail!("{} request failed: {}", what, message),
        _ => Ok(()),
    }
}

/// Print count, groups and rows for the given filters
pub async fn search(dashboard: &Dashboard, args: &FilterArgs) -> Result<()> {
    args.apply(dashboard).await?;
    let outcome = dashboard.search().await;
    check("count", &outcome.count)?;
    check("groups", &outcome.groups)?;
    check("rows", &outcome.rows)?;

    let view = dashboard.view().await;
    output::display_summary(&dashboard.snapshot().await, 0);
    print!(
        "{}",
        output::render_groups(&dashboard.groups().await, view.active_field)
    );
    print!(
        "{}",
        output::render_rows(&dashboard.visible_results().await, &view)
    );
    Ok(())
}

/// Build (or clean) every matching row and print the final output
pub async fn build(
    dashboard: &Dashboard,
    args: &FilterArgs,
    clean: bool,
    level: Option<String>,
) -> Result<()> {
    args.apply(dashboard).await?;
    if let Some(level) = level {
        dashboard.set_build_level(BuildLevel::new(level)).await;
    }
    check("rows", &dashboard.search().await.rows)?;

    let handles = dashboard.build_all(clean).await;
    output::display_info(&format!("started {} action(s)", handles.len()));
    for handle in handles {
        handle.await.context("build task panicked")?;
    }
    dashboard.wait_idle().await;

    let text = dashboard.output_text().await;
    if text.is_empty() {
        output::display_success("done, no output");
    } else {
        println!("{}", output::render_build_output(&text).trim_end());
    }
    Ok(())
}

/// Print the encoded query without touching the network
pub fn query(view: &mut ViewState, args: &FilterArgs, limit: usize) -> Result<String> {
    args.apply_to_view(view)?;
    Ok(view.query(limit, true))
}

/// Write `config` to `path`. An existing file is kept unless `force`.
pub fn init_config(config: &TriageConfig, path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "{} already exists, pass --force to overwrite",
            path.display()
        );
    }
    config
        .save_to(path)
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_init_config_writes_loadable_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("triagectl").join("config.toml");

        let mut config = TriageConfig::default();
        config.server.base_url = "http://mathhub.info:8080".to_string();
        config.view.max_groups = 12;
        init_config(&config, &path, false).unwrap();

        let loaded = TriageConfig::load(Some(&path)).unwrap();
        assert_eq!(loaded.server.base_url, "http://mathhub.info:8080");
        assert_eq!(loaded.view.max_groups, 12);
    }

    #[test]
    fn test_init_config_keeps_existing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[log]\nlevel = \"warn\"\n").unwrap();

        assert!(init_config(&TriageConfig::default(), &path, false).is_err());
        assert_eq!(TriageConfig::load(Some(&path)).unwrap().log.level, "warn");

        init_config(&TriageConfig::default(), &path, true).unwrap();
        assert_eq!(TriageConfig::load(Some(&path)).unwrap().log.level, "info");
    }

    #[test]
    fn test_parse_assignment() {
        assert_eq!(
            parse_assignment("repo=mathhub").unwrap(),
            (ColumnKey::Repo, "mathhub".to_string())
        );
        assert_eq!(
            parse_assignment("shortMsg=a=b").unwrap(),
            (ColumnKey::ShortMsg, "a=b".to_string())
        );
        assert!(parse_assignment("repo").is_err());
        assert!(parse_assignment("nope=x").is_err());
    }

    #[test]
    fn test_query_is_offline() {
        let args = FilterArgs {
            filters: vec![(ColumnKey::Repo, "r".into())],
            excludes: vec![(ColumnKey::FileName, "x.mmt".into())],
            compare: Some(CompareMode::Older),
            field: None,
        };
        let mut view = ViewState::default();
        assert_eq!(
            query(&mut view, &args, 100).unwrap(),
            "?limit=100&repo=r&fileName0=x.mmt&compare=older"
        );
    }

    #[test]
    fn test_query_rejects_ungroupable_field() {
        let args = FilterArgs {
            field: Some(ColumnKey::ErrChild),
            ..FilterArgs::default()
        };
        assert!(query(&mut ViewState::default(), &args, 100).is_err());
    }
}
