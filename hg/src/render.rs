//! Terminal rendering of a grid

use std::fmt::Write as _;
use std::io::{self, Write};

use colored::Colorize;
use tracing::debug;

use crate::domain::{Grid, Slot};
use crate::layout::{self, AnimationTiming, Cell, GRID_DIM, Position};

/// Placeholder for slots not yet generated
const EMPTY: &str = "·";

#[derive(Debug, Clone, Copy)]
pub struct RenderOptions {
    /// Characters per cell
    pub cell_width: usize,
    /// Style goal and pillars with ANSI colors
    pub color: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            cell_width: 14,
            color: true,
        }
    }
}

impl RenderOptions {
    pub fn plain() -> Self {
        Self {
            color: false,
            ..Self::default()
        }
    }
}

/// Text content of a layout cell
fn cell_text(grid: &Grid, cell: Cell) -> &str {
    match cell {
        Cell::Goal => &grid.goal,
        Cell::Pillar(p) => grid.get(Slot::Pillar(p)).unwrap_or(""),
        Cell::Task { pillar, task } => grid.get(Slot::Task { pillar, task }).unwrap_or(""),
    }
}

/// Truncate or pad `text` to exactly `width` characters
fn fit(text: &str, width: usize) -> String {
    let text = text.trim();
    let len = text.chars().count();
    if len <= width {
        let pad = width - len;
        let left = pad / 2;
        format!("{}{}{}", " ".repeat(left), text, " ".repeat(pad - left))
    } else if width == 0 {
        String::new()
    } else {
        let mut cut: String = text.chars().take(width - 1).collect();
        cut.push('…');
        cut
    }
}

fn style(fitted: String, cell: Cell, empty: bool, color: bool) -> String {
    if !color {
        return fitted;
    }
    if empty {
        return fitted.dimmed().to_string();
    }
    match cell {
        Cell::Goal => fitted.bold().yellow().to_string(),
        Cell::Pillar(_) => fitted.bold().cyan().to_string(),
        Cell::Task { .. } => fitted,
    }
}

fn separator(out: &mut String, width: usize, section_edge: bool) {
    let fill = if section_edge { "=" } else { "-" };
    for col in 0..GRID_DIM {
        out.push(if col % 3 == 0 { '#' } else { '+' });
        out.push_str(&fill.repeat(width));
    }
    out.push_str("#\n");
}

/// Render the 9x9 sectioned grid as a text table
pub fn render_grid(grid: &Grid, options: RenderOptions) -> String {
    debug!(goal = %grid.goal, ?options, "render_grid: called");
    let table = layout::table();
    let width = options.cell_width;
    let mut out = String::new();

    for (row, cells) in table.iter().enumerate() {
        separator(&mut out, width, row % 3 == 0);
        for (col, cell) in cells.iter().enumerate() {
            out.push(if col % 3 == 0 { '#' } else { '|' });
            let text = cell_text(grid, *cell);
            let empty = text.trim().is_empty();
            let fitted = fit(if empty { EMPTY } else { text }, width);
            out.push_str(&style(fitted, *cell, empty, options.color));
        }
        out.push_str("#\n");
    }
    separator(&mut out, width, true);
    out
}

/// Goal, then each pillar with its numbered tasks
pub fn render_outline(grid: &Grid) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Goal: {}", grid.goal);

    for (i, pillar) in grid.pillars.iter().enumerate() {
        let title = if pillar.title.is_empty() { "(pending)" } else { &pillar.title };
        let _ = writeln!(out, "\n{}. {}", i + 1, title);
        for (t, task) in pillar.tasks.iter().enumerate() {
            let task = if task.is_empty() { "(pending)" } else { task };
            let _ = writeln!(out, "   {}) {}", t + 1, task);
        }
    }
    out
}

/// Print the outline one cell at a time, staggered by the animation timing
pub async fn reveal<W: Write>(grid: &Grid, timing: AnimationTiming, out: &mut W) -> io::Result<()> {
    let mut cells: Vec<(Cell, Position)> = Vec::new();
    cells.push((Cell::Goal, layout::goal_position()));
    for p in 0..grid.pillars.len() {
        if let Some(pos) = layout::layout(p, None) {
            cells.push((Cell::Pillar(p), pos));
        }
        for t in 0..grid.pillars[p].tasks.len() {
            if let Some(pos) = layout::layout(p, Some(t)) {
                cells.push((Cell::Task { pillar: p, task: t }, pos));
            }
        }
    }
    cells.sort_by_key(|(cell, _)| timing.cell_delay(*cell));

    let mut elapsed = std::time::Duration::ZERO;
    for (cell, pos) in cells {
        let due = timing.cell_delay(cell);
        if due > elapsed {
            tokio::time::sleep(due - elapsed).await;
            elapsed = due;
        }

        let text = cell_text(grid, cell);
        let text = if text.is_empty() { EMPTY } else { text };
        let line = match cell {
            Cell::Goal => format!("{}", text.bold().yellow()),
            Cell::Pillar(p) => format!("  [{}] {}", p + 1, text.bold().cyan()),
            Cell::Task { task, .. } => format!("      {}. {}", task + 1, text),
        };
        writeln!(out, "{:<60} (r{} c{})", line, pos.row + 1, pos.col + 1)?;
        out.flush()?;
    }
    Ok(())
}
