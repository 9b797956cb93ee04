//! Index arithmetic for a 3-D grid of cells.
//!
//! Cells are addressed either by a subscript `(ix, iy, iz)` or by a linear
//! index in `0..len`, with x varying fastest.

#![warn(missing_docs)]

use crate::error::NavigationError;
use nalgebra::SVector;

/// Per-axis cell subscript `(ix, iy, iz)`.
pub type Subscript = SVector<usize, 3>;

/// Signed per-axis step between two subscripts.
pub type Offset = SVector<isize, 3>;

/// Which cells count as directly linked for graph edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Connectivity {
    /// Shared faces only.
    #[default]
    Six,
    /// The planar 8-neighborhood plus straight up and down.
    Ten,
    /// Shared faces and edges.
    Eighteen,
    /// Shared faces, edges and corners.
    TwentySix,
}

impl Connectivity {
    /// Offsets to the linked cells, in ascending linear-index order.
    pub fn offsets(self) -> Vec<Offset> {
        let mut out = Vec::with_capacity(self.degree());
        for dz in -1isize..=1 {
            for dy in -1isize..=1 {
                for dx in -1isize..=1 {
                    let manhattan = dx.abs() + dy.abs() + dz.abs();
                    if manhattan == 0 {
                        continue;
                    }
                    let linked = match self {
                        Connectivity::Six => manhattan == 1,
                        Connectivity::Ten => dz == 0 || (dx == 0 && dy == 0),
                        Connectivity::Eighteen => manhattan <= 2,
                        Connectivity::TwentySix => true,
                    };
                    if linked {
                        out.push(Offset::new(dx, dy, dz));
                    }
                }
            }
        }
        out
    }

    /// Number of links an interior cell has.
    pub fn degree(self) -> usize {
        match self {
            Connectivity::Six => 6,
            Connectivity::Ten => 10,
            Connectivity::Eighteen => 18,
            Connectivity::TwentySix => 26,
        }
    }
}

/// Cell counts along each axis, with the conversions between subscripts and
/// linear indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GridShape {
    dims: Subscript,
    len: usize,
}

impl GridShape {
    /// Creates a shape with `dims` cells along x, y and z.
    ///
    /// # Returns
    /// * `Result<Self, NavigationError>` - The shape, or an error if any axis is empty
    ///   or the total cell count does not fit in `usize`
    pub fn new(dims: Subscript) -> Result<Self, NavigationError> {
        if dims.iter().any(|&d| d == 0) {
            return Err(NavigationError::InvalidDimensions(
                "All dimensions must be non-zero",
            ));
        }

        let len = dims
            .iter()
            .try_fold(1usize, |acc, &dim| acc.checked_mul(dim))
            .ok_or(NavigationError::InvalidDimensions(
                "Map dimensions too large, would cause overflow",
            ))?;

        Ok(Self { dims, len })
    }

    /// Cell counts along each axis.
    pub fn dims(&self) -> &Subscript {
        &self.dims
    }

    /// Total number of cells.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Always false; a shape has at least one cell.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns true if every component of `sub` is within its axis.
    pub fn contains(&self, sub: &Subscript) -> bool {
        sub.iter().zip(self.dims.iter()).all(|(s, d)| s < d)
    }

    /// Converts a subscript to its linear index.
    pub fn subscript_to_index(&self, sub: &Subscript) -> Option<usize> {
        if !self.contains(sub) {
            return None;
        }
        Some(sub[0] + self.dims[0] * (sub[1] + self.dims[1] * sub[2]))
    }

    /// Converts a linear index back to its subscript.
    pub fn index_to_subscript(&self, index: usize) -> Option<Subscript> {
        if index >= self.len {
            return None;
        }
        let x = index % self.dims[0];
        let y = (index / self.dims[0]) % self.dims[1];
        let z = index / (self.dims[0] * self.dims[1]);
        Some(Subscript::new(x, y, z))
    }

    /// Applies `offset` to `sub`, or `None` if the result leaves the grid.
    pub fn offset(&self, sub: &Subscript, offset: &Offset) -> Option<Subscript> {
        let mut out = Subscript::zeros();
        for axis in 0..3 {
            out[axis] = sub[axis].checked_add_signed(offset[axis])?;
        }
        self.contains(&out).then_some(out)
    }

    /// All cells within `levels[axis]` steps of `index` along every axis,
    /// the cell itself included, in ascending index order.
    pub fn neighbors(&self, index: usize, levels: &Subscript) -> Vec<usize> {
        let Some(sub) = self.index_to_subscript(index) else {
            return Vec::new();
        };

        let lo = Subscript::from_fn(|axis, _| sub[axis].saturating_sub(levels[axis]));
        let hi = Subscript::from_fn(|axis, _| {
            sub[axis].saturating_add(levels[axis]).min(self.dims[axis] - 1)
        });

        let capacity = (0..3).map(|axis| hi[axis] - lo[axis] + 1).product();
        let mut out = Vec::with_capacity(capacity);
        for z in lo[2]..=hi[2] {
            for y in lo[1]..=hi[1] {
                for x in lo[0]..=hi[0] {
                    out.push(x + self.dims[0] * (y + self.dims[1] * z));
                }
            }
        }
        out
    }

    /// Cells directly linked to `index` under `connectivity`, clipped to the
    /// grid, in ascending index order.
    pub fn links(&self, index: usize, connectivity: Connectivity) -> Vec<usize> {
        let Some(sub) = self.index_to_subscript(index) else {
            return Vec::new();
        };
        connectivity
            .offsets()
            .iter()
            .filter_map(|offset| self.offset(&sub, offset))
            .filter_map(|linked| self.subscript_to_index(&linked))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shape(x: usize, y: usize, z: usize) -> GridShape {
        GridShape::new(Subscript::new(x, y, z)).unwrap()
    }

    #[test]
    fn test_invalid_shape() {
        assert!(matches!(
            GridShape::new(Subscript::new(0, 3, 3)),
            Err(NavigationError::InvalidDimensions(_))
        ));
        assert!(matches!(
            GridShape::new(Subscript::new(usize::MAX, 2, 1)),
            Err(NavigationError::InvalidDimensions(_))
        ));
    }

    #[test]
    fn test_index_subscript_round_trip() {
        let grid = shape(3, 4, 5);
        assert_eq!(grid.len(), 60);
        for index in 0..grid.len() {
            let sub = grid.index_to_subscript(index).unwrap();
            assert_eq!(grid.subscript_to_index(&sub), Some(index));
        }
        for z in 0..5 {
            for y in 0..4 {
                for x in 0..3 {
                    let sub = Subscript::new(x, y, z);
                    let index = grid.subscript_to_index(&sub).unwrap();
                    assert_eq!(grid.index_to_subscript(index), Some(sub));
                }
            }
        }
        assert_eq!(grid.subscript_to_index(&Subscript::new(1, 0, 0)), Some(1));
        assert_eq!(grid.subscript_to_index(&Subscript::new(0, 1, 0)), Some(3));
        assert_eq!(grid.subscript_to_index(&Subscript::new(0, 0, 1)), Some(12));
    }

    #[test]
    fn test_out_of_range() {
        let grid = shape(3, 4, 5);
        assert_eq!(grid.index_to_subscript(60), None);
        assert_eq!(grid.subscript_to_index(&Subscript::new(3, 0, 0)), None);
        assert_eq!(grid.subscript_to_index(&Subscript::new(0, 0, 5)), None);
        assert!(grid.neighbors(60, &Subscript::new(1, 1, 1)).is_empty());
        assert!(grid.links(60, Connectivity::Six).is_empty());
    }

    #[test]
    fn test_neighbors_box() {
        let grid = shape(5, 5, 5);
        let center = grid.subscript_to_index(&Subscript::new(2, 2, 2)).unwrap();
        let corner = 0;

        assert_eq!(grid.neighbors(center, &Subscript::zeros()), vec![center]);
        assert_eq!(grid.neighbors(center, &Subscript::new(1, 1, 1)).len(), 27);
        assert_eq!(grid.neighbors(center, &Subscript::new(2, 2, 0)).len(), 25);
        assert_eq!(grid.neighbors(corner, &Subscript::new(1, 1, 1)).len(), 8);
        // levels larger than the grid clip to it
        assert_eq!(grid.neighbors(corner, &Subscript::new(9, 9, 9)).len(), 125);

        let box_cells = grid.neighbors(center, &Subscript::new(1, 1, 1));
        assert!(box_cells.windows(2).all(|w| w[0] < w[1]));
        assert!(box_cells.contains(&center));
    }

    #[test]
    fn test_link_counts() {
        let grid = shape(3, 3, 3);
        let center = 13;
        for connectivity in [
            Connectivity::Six,
            Connectivity::Ten,
            Connectivity::Eighteen,
            Connectivity::TwentySix,
        ] {
            assert_eq!(
                grid.links(center, connectivity).len(),
                connectivity.degree(),
                "{:?} interior",
                connectivity
            );
        }

        assert_eq!(grid.links(0, Connectivity::Six).len(), 3);
        assert_eq!(grid.links(0, Connectivity::Ten).len(), 4);
        assert_eq!(grid.links(0, Connectivity::Eighteen).len(), 6);
        assert_eq!(grid.links(0, Connectivity::TwentySix).len(), 7);
    }

    #[test]
    fn test_links_are_symmetric() {
        let grid = shape(4, 3, 2);
        for connectivity in [Connectivity::Six, Connectivity::Ten, Connectivity::TwentySix] {
            for a in 0..grid.len() {
                for b in grid.links(a, connectivity) {
                    assert_ne!(a, b);
                    assert!(
                        grid.links(b, connectivity).contains(&a),
                        "{} -> {} has no way back under {:?}",
                        a,
                        b,
                        connectivity
                    );
                }
            }
        }
    }

    #[test]
    fn test_six_links_are_faces() {
        let grid = shape(3, 3, 3);
        assert_eq!(grid.links(13, Connectivity::Six), vec![4, 10, 12, 14, 16, 22]);
    }
}
