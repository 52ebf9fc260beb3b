//! Positional layout of the 9x9 sectioned grid
//!
//! The grid is nine 3x3 sections. The center section holds the goal with the
//! 8 pillar titles around it. Each outer section repeats one pillar title at
//! its center, surrounded by that pillar's 8 tasks. Pillars and tasks are
//! placed around their center in reading order, skipping the center itself,
//! so a pillar's ring cell points in the same direction as its section.

use std::time::Duration;

use crate::domain::{PILLAR_COUNT, TASKS_PER_PILLAR};

/// Cells per side
pub const GRID_DIM: usize = 9;

const SECTION_DIM: usize = 3;

/// Offsets around a 3x3 center in placement order
const NEIGHBOURS: [(usize, usize); 8] = [(0, 0), (0, 1), (0, 2), (1, 0), (1, 2), (2, 0), (2, 1), (2, 2)];

/// Row/column in the display grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

impl Position {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

/// What a display cell shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cell {
    Goal,
    /// A pillar title; each pillar occupies two cells
    Pillar(usize),
    Task { pillar: usize, task: usize },
}

pub fn goal_position() -> Position {
    Position::new(4, 4)
}

/// Pillar title cell inside the center section
pub fn ring_position(pillar: usize) -> Option<Position> {
    let (r, c) = *NEIGHBOURS.get(pillar)?;
    Some(Position::new(SECTION_DIM + r, SECTION_DIM + c))
}

/// Position of a pillar's section center (`task = None`) or of one of its tasks
pub fn layout(pillar: usize, task: Option<usize>) -> Option<Position> {
    let (sr, sc) = *NEIGHBOURS.get(pillar)?;
    let (top, left) = (sr * SECTION_DIM, sc * SECTION_DIM);

    match task {
        None => Some(Position::new(top + 1, left + 1)),
        Some(t) => {
            let (r, c) = *NEIGHBOURS.get(t)?;
            Some(Position::new(top + r, left + c))
        }
    }
}

/// Index into `NEIGHBOURS` of a non-center local offset
fn neighbour_index(r: usize, c: usize) -> usize {
    let idx = r * SECTION_DIM + c;
    if idx > 4 { idx - 1 } else { idx }
}

/// Inverse of the layout: what belongs at `pos`
pub fn cell_at(pos: Position) -> Option<Cell> {
    if pos.row >= GRID_DIM || pos.col >= GRID_DIM {
        return None;
    }

    let (sr, sc) = (pos.row / SECTION_DIM, pos.col / SECTION_DIM);
    let (lr, lc) = (pos.row % SECTION_DIM, pos.col % SECTION_DIM);
    let local_center = lr == 1 && lc == 1;

    let cell = match ((sr, sc), local_center) {
        ((1, 1), true) => Cell::Goal,
        ((1, 1), false) => Cell::Pillar(neighbour_index(lr, lc)),
        (_, true) => Cell::Pillar(neighbour_index(sr, sc)),
        (_, false) => Cell::Task {
            pillar: neighbour_index(sr, sc),
            task: neighbour_index(lr, lc),
        },
    };
    Some(cell)
}

/// The full lookup table, row-major
pub fn table() -> [[Cell; GRID_DIM]; GRID_DIM] {
    let mut table = [[Cell::Goal; GRID_DIM]; GRID_DIM];
    for (row, cells) in table.iter_mut().enumerate() {
        for (col, cell) in cells.iter_mut().enumerate() {
            if let Some(c) = cell_at(Position::new(row, col)) {
                *cell = c;
            }
        }
    }
    table
}

/// Staggered reveal timing
///
/// `pillar_delay(p) = base + p * pillar_step` and
/// `task_delay(p, t) = pillar_delay(p) + task_offset + t * task_step`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimationTiming {
    pub base: Duration,
    pub pillar_step: Duration,
    pub task_offset: Duration,
    pub task_step: Duration,
}

impl Default for AnimationTiming {
    fn default() -> Self {
        Self {
            base: Duration::from_millis(200),
            pillar_step: Duration::from_millis(150),
            task_offset: Duration::from_millis(300),
            task_step: Duration::from_millis(100),
        }
    }
}

impl AnimationTiming {
    pub fn pillar_delay(&self, pillar: usize) -> Duration {
        self.base + self.pillar_step * pillar as u32
    }

    pub fn task_delay(&self, pillar: usize, task: usize) -> Duration {
        self.pillar_delay(pillar) + self.task_offset + self.task_step * task as u32
    }

    /// Delay for any cell; the goal shows immediately
    pub fn cell_delay(&self, cell: Cell) -> Duration {
        match cell {
            Cell::Goal => Duration::ZERO,
            Cell::Pillar(p) => self.pillar_delay(p),
            Cell::Task { pillar, task } => self.task_delay(pillar, task),
        }
    }
}

// Layout tables assume the 8-around-1 shape
const _: () = assert!(PILLAR_COUNT == NEIGHBOURS.len() && TASKS_PER_PILLAR == NEIGHBOURS.len());
