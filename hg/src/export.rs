//! Export and import of grid documents

use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use eyre::{Context, Result};
use tracing::debug;

use crate::domain::Grid;
use crate::render::{RenderOptions, render_grid};

/// Longest slug kept in a file name
const MAX_SLUG_LEN: usize = 48;

/// Export file format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ExportFormat {
    /// The JSON exchange document
    #[default]
    Json,
    /// Headings and task lists
    #[value(alias = "md")]
    Markdown,
    /// The 9x9 grid as plain text
    #[value(alias = "txt")]
    Text,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Markdown => "md",
            ExportFormat::Text => "txt",
        }
    }
}

/// Lowercased goal with runs of non-alphanumerics collapsed to `-`
pub fn slugify(goal: &str) -> String {
    let mut slug = String::new();
    let mut pending_dash = false;

    for c in goal.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
            if slug.len() >= MAX_SLUG_LEN {
                break;
            }
        } else {
            pending_dash = true;
        }
    }

    if slug.is_empty() { "grid".to_string() } else { slug }
}

/// `harada-<slug>-<YYYYMMDD-HHMMSS>.<ext>`
pub fn export_filename(goal: &str, timestamp: DateTime<Utc>, format: ExportFormat) -> String {
    format!(
        "harada-{}-{}.{}",
        slugify(goal),
        timestamp.format("%Y%m%d-%H%M%S"),
        format.extension()
    )
}

/// Serialize a grid in the requested format
pub fn export(grid: &Grid, format: ExportFormat) -> Result<String> {
    debug!(?format, goal = %grid.goal, "export: called");
    match format {
        ExportFormat::Json => serde_json::to_string_pretty(grid).context("Failed to serialize grid"),
        ExportFormat::Markdown => Ok(to_markdown(grid)),
        ExportFormat::Text => Ok(render_grid(grid, RenderOptions::plain())),
    }
}

fn to_markdown(grid: &Grid) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# {}\n", grid.goal);
    let _ = writeln!(
        out,
        "_Created {} · updated {}_",
        grid.created_at.format("%Y-%m-%d %H:%M UTC"),
        grid.updated_at.format("%Y-%m-%d %H:%M UTC")
    );

    for (i, pillar) in grid.pillars.iter().enumerate() {
        let title = if pillar.title.is_empty() { "(untitled)" } else { &pillar.title };
        let _ = writeln!(out, "\n## {}. {}\n", i + 1, title);
        for task in &pillar.tasks {
            if task.is_empty() {
                let _ = writeln!(out, "- [ ] _(pending)_");
            } else {
                let _ = writeln!(out, "- [ ] {}", task);
            }
        }
    }
    out
}

/// Parse and validate a JSON exchange document
pub fn import_json(content: &str) -> Result<Grid> {
    let grid: Grid = serde_json::from_str(content).context("Not a grid document")?;
    grid.validate().map_err(|e| eyre::eyre!("Invalid grid document: {}", e))?;
    Ok(grid)
}
