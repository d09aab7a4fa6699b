use serde::{Deserialize, Serialize};

/// Standard playfield dimensions.
pub const GRID_WIDTH: usize = 10;
pub const GRID_HEIGHT: usize = 20;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cell {
    #[default]
    Empty,
    /// Holds the color tag of the piece that was locked here.
    Filled(u32),
}

impl Cell {
    pub fn color(&self) -> Option<u32> {
        match self {
            Cell::Filled(c) => Some(*c),
            Cell::Empty => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }
}

/// Occupancy grid for one player, stored as `rows[row][col]` with row 0 at the top.
///
/// Dimensions never change after construction. Line clearing removes a row
/// and prepends an empty one, so the row count is preserved.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Playfield {
    width: usize,
    height: usize,
    rows: Vec<Vec<Cell>>,
}

impl Default for Playfield {
    fn default() -> Self {
        Self::new(GRID_WIDTH, GRID_HEIGHT)
    }
}

impl Playfield {
    /// Create an empty playfield.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            rows: vec![vec![Cell::Empty; width]; height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    /// Cell at (col, row), or `None` when outside the grid.
    pub fn get(&self, col: i32, row: i32) -> Option<Cell> {
        if col < 0 || row < 0 {
            return None;
        }
        self.rows
            .get(row as usize)
            .and_then(|r| r.get(col as usize))
            .copied()
    }

    /// Write a cell. Returns false if (col, row) is outside the grid.
    pub fn set(&mut self, col: i32, row: i32, cell: Cell) -> bool {
        if col < 0 || row < 0 {
            return false;
        }
        match self
            .rows
            .get_mut(row as usize)
            .and_then(|r| r.get_mut(col as usize))
        {
            Some(slot) => {
                *slot = cell;
                true
            }
            None => false,
        }
    }

    pub fn is_row_full(&self, row: usize) -> bool {
        self.rows[row].iter().all(|c| !c.is_empty())
    }

    /// Remove every full row, scanning bottom to top, and prepend an empty
    /// row for each one removed. Returns the number of rows cleared.
    ///
    /// After a removal the same row index is checked again, since the rows
    /// above have shifted down into it.
    pub fn clear_full_rows(&mut self) -> u32 {
        let mut cleared = 0u32;
        let mut row = self.height;
        while row > 0 {
            let y = row - 1;
            if self.is_row_full(y) {
                self.rows.remove(y);
                self.rows.insert(0, vec![Cell::Empty; self.width]);
                cleared += 1;
            } else {
                row -= 1;
            }
        }
        cleared
    }

    /// Wire format: `None` for empty, the color tag otherwise.
    pub fn to_wire(&self) -> Vec<Vec<Option<u32>>> {
        self.rows
            .iter()
            .map(|row| row.iter().map(|cell| cell.color()).collect())
            .collect()
    }
}
