use rand::RngExt;
use serde::{Deserialize, Serialize};

use crate::shape::{ShapeKind, all_shapes};

/// No shape's matrix is wider or taller than this in any rotation.
pub const MAX_MATRIX_SIDE: usize = 4;

/// A falling piece. `x`/`y` is the grid position of the matrix's top-left cell.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Piece {
    pub kind: ShapeKind,
    /// Occupancy matrix for the current rotation, `shape[row][col]`.
    pub shape: Vec<Vec<u8>>,
    pub color: u32,
    pub x: i32,
    pub y: i32,
}

impl Piece {
    /// Spawn a piece of the given kind centered at the top of a grid.
    pub fn from_kind(kind: ShapeKind, grid_width: usize) -> Self {
        let def = kind.definition();
        let shape: Vec<Vec<u8>> = def.matrix.iter().map(|row| row.to_vec()).collect();
        let matrix_width = shape.first().map_or(0, Vec::len);
        Self {
            kind,
            shape,
            color: def.color,
            x: (grid_width / 2) as i32 - (matrix_width / 2) as i32,
            y: 0,
        }
    }

    /// Spawn a uniformly random kind using the thread-local generator.
    pub fn spawn(grid_width: usize) -> Self {
        Self::spawn_with(&mut rand::rng(), grid_width)
    }

    pub fn spawn_with<R: RngExt>(rng: &mut R, grid_width: usize) -> Self {
        let shapes = all_shapes();
        let idx = rng.random_range(0..shapes.len());
        Self::from_kind(shapes[idx].kind, grid_width)
    }

    /// Width of the current matrix in columns.
    pub fn matrix_width(&self) -> usize {
        self.shape.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// Clockwise rotation of the matrix. The origin is unchanged.
    pub fn rotated(&self) -> Self {
        let height = self.shape.len();
        let width = self.matrix_width();
        let shape = (0..width)
            .map(|col| {
                (0..height)
                    .rev()
                    .map(|row| self.shape[row].get(col).copied().unwrap_or(0))
                    .collect()
            })
            .collect();
        Self {
            shape,
            ..self.clone()
        }
    }

    /// Shift the origin. No bounds checking; coordinates saturate.
    pub fn translated(&self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
            ..self.clone()
        }
    }

    /// A matrix of 1 to 4 rows and columns with at least one occupied cell,
    /// and an origin within two grid sizes of the playfield.
    pub fn is_well_formed(&self, grid_width: usize, grid_height: usize) -> bool {
        let height = self.shape.len();
        let width = self.matrix_width();
        let x_reach = 2 * grid_width as i32;
        let y_reach = 2 * grid_height as i32;
        (1..=MAX_MATRIX_SIDE).contains(&height)
            && (1..=MAX_MATRIX_SIDE).contains(&width)
            && self.shape.iter().flatten().any(|&c| c != 0)
            && (-x_reach..=x_reach).contains(&self.x)
            && (-y_reach..=y_reach).contains(&self.y)
    }

    /// Absolute (col, row) of every occupied cell.
    pub fn cells(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        self.shape.iter().enumerate().flat_map(move |(r, row)| {
            row.iter()
                .enumerate()
                .filter(|(_, cell)| **cell != 0)
                .map(move |(c, _)| {
                    (
                        self.x.saturating_add(c as i32),
                        self.y.saturating_add(r as i32),
                    )
                })
        })
    }

    /// Move back to the spawn origin, keeping the current rotation.
    pub fn reset_origin(&mut self, grid_width: usize) {
        self.x = (grid_width / 2) as i32 - (self.matrix_width() / 2) as i32;
        self.y = 0;
    }
}
