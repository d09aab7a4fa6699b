use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShapeKind {
    I,
    O,
    T,
    L,
    J,
    S,
    Z,
}

/// Static definition of one piece kind: its spawn matrix and color tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ShapeDefinition {
    pub kind: ShapeKind,
    pub matrix: &'static [&'static [u8]],
    /// Opaque to the engine; clients map it to a color.
    pub color: u32,
}

static CATALOG: [ShapeDefinition; 7] = [
    ShapeDefinition {
        kind: ShapeKind::I,
        matrix: &[&[1, 1, 1, 1]],
        color: 0x00FFFF,
    },
    ShapeDefinition {
        kind: ShapeKind::O,
        matrix: &[&[1, 1], &[1, 1]],
        color: 0xFFFF00,
    },
    ShapeDefinition {
        kind: ShapeKind::T,
        matrix: &[&[1, 1, 1], &[0, 1, 0]],
        color: 0x800080,
    },
    ShapeDefinition {
        kind: ShapeKind::L,
        matrix: &[&[1, 1, 1], &[1, 0, 0]],
        color: 0xFFA500,
    },
    ShapeDefinition {
        kind: ShapeKind::J,
        matrix: &[&[1, 1, 1], &[0, 0, 1]],
        color: 0x0000FF,
    },
    ShapeDefinition {
        kind: ShapeKind::S,
        matrix: &[&[1, 1, 0], &[0, 1, 1]],
        color: 0x00FF00,
    },
    ShapeDefinition {
        kind: ShapeKind::Z,
        matrix: &[&[0, 1, 1], &[1, 1, 0]],
        color: 0xFF0000,
    },
];

/// All seven shape definitions.
pub fn all_shapes() -> &'static [ShapeDefinition] {
    &CATALOG
}

impl ShapeKind {
    pub fn definition(&self) -> &'static ShapeDefinition {
        match self {
            ShapeKind::I => &CATALOG[0],
            ShapeKind::O => &CATALOG[1],
            ShapeKind::T => &CATALOG[2],
            ShapeKind::L => &CATALOG[3],
            ShapeKind::J => &CATALOG[4],
            ShapeKind::S => &CATALOG[5],
            ShapeKind::Z => &CATALOG[6],
        }
    }

    pub fn all() -> &'static [ShapeKind] {
        &[
            ShapeKind::I,
            ShapeKind::O,
            ShapeKind::T,
            ShapeKind::L,
            ShapeKind::J,
            ShapeKind::S,
            ShapeKind::Z,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_has_every_kind_once() {
        let shapes = all_shapes();
        assert_eq!(shapes.len(), 7);
        for kind in ShapeKind::all() {
            assert_eq!(shapes.iter().filter(|s| s.kind == *kind).count(), 1);
            assert_eq!(kind.definition().kind, *kind);
        }
    }

    #[test]
    fn every_shape_has_four_cells() {
        for shape in all_shapes() {
            let cells: u32 = shape
                .matrix
                .iter()
                .map(|row| row.iter().map(|&c| c as u32).sum::<u32>())
                .sum();
            assert_eq!(cells, 4, "{:?} should have 4 cells", shape.kind);
        }
    }

    #[test]
    fn matrices_are_rectangular() {
        for shape in all_shapes() {
            let width = shape.matrix[0].len();
            assert!(shape.matrix.iter().all(|row| row.len() == width));
        }
    }
}
