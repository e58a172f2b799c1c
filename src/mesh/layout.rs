//! Dimension-derived addressing for the extractor
//!
//! Everything here is a pure function of the field dimensions: flat corner
//! offsets for reading a cube's samples, and the edge-to-vertex-slot scheme
//! that gives every grid edge exactly one output slot. Two cubes sharing an
//! edge always resolve to the same slot, which is what deduplicates surface
//! vertices and lets parallel workers write without coordination.

use glam::{IVec3, UVec3};

use crate::core::error::Error;
use crate::core::types::Result;
use crate::mesh::tables::CUBE_CORNERS;

/// Axis a cube edge runs along
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EdgeAxis {
    X,
    Y,
    Z,
}

/// Axis of each of the 12 cube edges
pub const EDGE_AXES: [EdgeAxis; 12] = [
    EdgeAxis::X,
    EdgeAxis::Y,
    EdgeAxis::X,
    EdgeAxis::Y,
    EdgeAxis::X,
    EdgeAxis::Y,
    EdgeAxis::X,
    EdgeAxis::Y,
    EdgeAxis::Z,
    EdgeAxis::Z,
    EdgeAxis::Z,
    EdgeAxis::Z,
];

/// Offset from a cube's min corner to each edge's lower end
pub const EDGE_ORIGINS: [IVec3; 12] = [
    IVec3::new(0, 0, 0),
    IVec3::new(1, 0, 0),
    IVec3::new(0, 1, 0),
    IVec3::new(0, 0, 0),
    IVec3::new(0, 0, 1),
    IVec3::new(1, 0, 1),
    IVec3::new(0, 1, 1),
    IVec3::new(0, 0, 1),
    IVec3::new(0, 0, 0),
    IVec3::new(1, 0, 0),
    IVec3::new(1, 1, 0),
    IVec3::new(0, 1, 0),
];

/// Corner pair of each edge ordered along its axis (lower end first)
pub const EDGE_ENDPOINTS: [[usize; 2]; 12] = [
    [0, 1],
    [1, 2],
    [3, 2],
    [0, 3],
    [4, 5],
    [5, 6],
    [7, 6],
    [4, 7],
    [0, 4],
    [1, 5],
    [2, 6],
    [3, 7],
];

/// Precomputed addressing for one set of field dimensions.
///
/// Must be rebuilt whenever the field is resized; the extractor refuses to
/// run against a layout built for different dimensions.
#[derive(Clone, Debug)]
pub struct GridLayout {
    dims: UVec3,
    cube_dims: UVec3,
    /// Flat sample offsets of the 8 cube corners
    corner_offsets: [usize; 8],
    /// Slot block starts: X edges at 0, then Y, then Z
    y_slot_base: usize,
    z_slot_base: usize,
    slot_count: usize,
}

impl GridLayout {
    /// Build the addressing tables for a field of the given dimensions
    pub fn new(dims: UVec3) -> Result<Self> {
        if dims.x < 2 || dims.y < 2 || dims.z < 2 {
            return Err(Error::InvalidDimensions { dims });
        }

        let (nx, ny, nz) = (dims.x as usize, dims.y as usize, dims.z as usize);
        let mut corner_offsets = [0usize; 8];
        for (corner, offset) in CUBE_CORNERS.iter().enumerate() {
            corner_offsets[corner] =
                offset.x as usize + offset.z as usize * nx + offset.y as usize * nx * nz;
        }

        let x_edges = (nx - 1) * ny * nz;
        let y_edges = nx * (ny - 1) * nz;
        let z_edges = nx * ny * (nz - 1);

        Ok(Self {
            dims,
            cube_dims: dims - UVec3::ONE,
            corner_offsets,
            y_slot_base: x_edges,
            z_slot_base: x_edges + y_edges,
            slot_count: x_edges + y_edges + z_edges,
        })
    }

    pub fn dims(&self) -> UVec3 {
        self.dims
    }

    /// Check this layout against a field's dimensions
    pub fn matches(&self, dims: UVec3) -> bool {
        self.dims == dims
    }

    /// Number of unit cubes in the field
    pub fn cube_count(&self) -> usize {
        (self.cube_dims.x * self.cube_dims.y * self.cube_dims.z) as usize
    }

    /// One vertex slot per grid edge
    pub fn vertex_slot_count(&self) -> usize {
        self.slot_count
    }

    /// Cube position for a cube index (x fastest, then z, then y)
    #[inline]
    pub fn cube_pos(&self, cube_index: usize) -> UVec3 {
        let cx = self.cube_dims.x as usize;
        let floor = cx * self.cube_dims.z as usize;
        UVec3::new(
            (cube_index % cx) as u32,
            (cube_index / floor) as u32,
            ((cube_index % floor) / cx) as u32,
        )
    }

    /// Flat sample index of a cube's min corner
    #[inline]
    pub fn cube_base_index(&self, pos: UVec3) -> usize {
        (pos.x + pos.z * self.dims.x + pos.y * self.dims.x * self.dims.z) as usize
    }

    /// Flat sample index of one corner of a cube
    #[inline]
    pub fn corner_index(&self, base: usize, corner: usize) -> usize {
        base + self.corner_offsets[corner]
    }

    /// Vertex slot owned by a cube edge; shared edges of adjacent cubes map
    /// to the same slot
    #[inline]
    pub fn edge_slot(&self, cube: UVec3, edge: usize) -> usize {
        let origin = EDGE_ORIGINS[edge];
        let x = cube.x as usize + origin.x as usize;
        let y = cube.y as usize + origin.y as usize;
        let z = cube.z as usize + origin.z as usize;
        let (nx, nz) = (self.dims.x as usize, self.dims.z as usize);

        match EDGE_AXES[edge] {
            EdgeAxis::X => x + z * (nx - 1) + y * (nx - 1) * nz,
            EdgeAxis::Y => self.y_slot_base + x + z * nx + y * nx * nz,
            EdgeAxis::Z => self.z_slot_base + x + z * nx + y * nx * (nz - 1),
        }
    }

    /// Decode a vertex slot back to the lattice edge it belongs to.
    /// Returns the flat sample indices of its two endpoints (lower end
    /// first) and their positions.
    pub fn slot_edge(&self, slot: usize) -> (usize, usize, UVec3, UVec3) {
        let (nx, nz) = (self.dims.x as usize, self.dims.z as usize);
        let (pos, axis) = if slot < self.y_slot_base {
            let i = slot;
            let w = nx - 1;
            (
                UVec3::new((i % w) as u32, (i / (w * nz)) as u32, ((i % (w * nz)) / w) as u32),
                EdgeAxis::X,
            )
        } else if slot < self.z_slot_base {
            let i = slot - self.y_slot_base;
            (
                UVec3::new(
                    (i % nx) as u32,
                    (i / (nx * nz)) as u32,
                    ((i % (nx * nz)) / nx) as u32,
                ),
                EdgeAxis::Y,
            )
        } else {
            let i = slot - self.z_slot_base;
            let w = nz - 1;
            (
                UVec3::new(
                    (i % nx) as u32,
                    (i / (nx * w)) as u32,
                    ((i % (nx * w)) / nx) as u32,
                ),
                EdgeAxis::Z,
            )
        };

        let step = match axis {
            EdgeAxis::X => UVec3::new(1, 0, 0),
            EdgeAxis::Y => UVec3::new(0, 1, 0),
            EdgeAxis::Z => UVec3::new(0, 0, 1),
        };
        let far = pos + step;
        (self.cube_base_index(pos), self.cube_base_index(far), pos, far)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::tables::EDGE_CORNERS;

    #[test]
    fn test_rejects_small_dims() {
        assert!(GridLayout::new(UVec3::new(1, 3, 3)).is_err());
        assert!(GridLayout::new(UVec3::new(2, 2, 2)).is_ok());
    }

    #[test]
    fn test_edge_origins_agree_with_corner_table() {
        // Each edge's origin is the componentwise min of its two corners
        for edge in 0..12 {
            let [a, b] = EDGE_CORNERS[edge];
            let min = CUBE_CORNERS[a].min(CUBE_CORNERS[b]);
            assert_eq!(EDGE_ORIGINS[edge], min, "edge {}", edge);
            let [lo, hi] = EDGE_ENDPOINTS[edge];
            assert_eq!(CUBE_CORNERS[lo], min, "edge {} lower end", edge);
            assert_eq!(
                CUBE_CORNERS[hi],
                CUBE_CORNERS[a].max(CUBE_CORNERS[b]),
                "edge {} upper end",
                edge
            );
        }
    }

    #[test]
    fn test_every_edge_gets_unique_slot() {
        let layout = GridLayout::new(UVec3::new(3, 4, 5)).unwrap();
        let mut seen = vec![false; layout.vertex_slot_count()];
        for cube_index in 0..layout.cube_count() {
            let cube = layout.cube_pos(cube_index);
            for edge in 0..12 {
                let slot = layout.edge_slot(cube, edge);
                assert!(slot < layout.vertex_slot_count());
                seen[slot] = true;
            }
        }
        // Every lattice edge is touched by at least one cube
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn test_shared_edge_same_slot() {
        let layout = GridLayout::new(UVec3::new(4, 4, 4)).unwrap();
        // Edge 1 of cube (0,0,0) runs along +y at x=1, z=0; its neighbor
        // (1,0,0) addresses the same lattice edge as edge 3.
        let a = layout.edge_slot(UVec3::new(0, 0, 0), 1);
        let b = layout.edge_slot(UVec3::new(1, 0, 0), 3);
        assert_eq!(a, b);

        // Vertical edge 10 of (0,0,0) is edge 8 of (1,1,0)
        let c = layout.edge_slot(UVec3::new(0, 0, 0), 10);
        let d = layout.edge_slot(UVec3::new(1, 1, 0), 8);
        assert_eq!(c, d);
    }

    #[test]
    fn test_slot_edge_round_trip() {
        let layout = GridLayout::new(UVec3::new(3, 5, 4)).unwrap();
        for cube_index in 0..layout.cube_count() {
            let cube = layout.cube_pos(cube_index);
            let base = layout.cube_base_index(cube);
            for edge in 0..12 {
                let slot = layout.edge_slot(cube, edge);
                let (lo, hi, _, _) = layout.slot_edge(slot);
                let [a, b] = EDGE_ENDPOINTS[edge];
                assert_eq!(lo, layout.corner_index(base, a), "edge {}", edge);
                assert_eq!(hi, layout.corner_index(base, b), "edge {}", edge);
            }
        }
    }

    #[test]
    fn test_cube_pos_order() {
        let layout = GridLayout::new(UVec3::new(3, 3, 3)).unwrap();
        assert_eq!(layout.cube_pos(0), UVec3::new(0, 0, 0));
        assert_eq!(layout.cube_pos(1), UVec3::new(1, 0, 0));
        assert_eq!(layout.cube_pos(2), UVec3::new(0, 0, 1));
        assert_eq!(layout.cube_pos(4), UVec3::new(0, 1, 0));
    }
}
