//! Marching cubes surface extraction
//!
//! Converts the density field into a triangle mesh under a threshold, with
//! two interchangeable execution strategies that produce the same mesh: a
//! sequential per-cube scan, and a rayon-backed pass where every worker owns
//! a disjoint output region (one per lattice edge, then one per cube), so no
//! locking is needed.

use glam::UVec3;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::core::error::Error;
use crate::core::types::{Result, Vec3};
use crate::field::grid::VoxelField;
use crate::mesh::layout::{EdgeAxis, EDGE_AXES, EDGE_ENDPOINTS, EDGE_ORIGINS, GridLayout};
use crate::mesh::tables::{
    CUBE_CORNERS, CUBE_EDGE_FLAGS, MAX_TRIANGLES_PER_CUBE, TRIANGLE_CONNECTION_TABLE,
};

/// Slot entries per cube in the parallel triangle scratch buffer
const TRI_SLOTS_PER_CUBE: usize = MAX_TRIANGLES_PER_CUBE * 3;

/// Sentinel for unused entries in the parallel triangle scratch buffer
const NO_SLOT: u32 = u32::MAX;

/// Execution strategy for extraction
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Strategy {
    /// Single-threaded scan in deterministic cube order
    Sequential,
    /// Data-parallel over lattice edges and cubes
    #[default]
    Parallel,
}

/// Parameters for one extraction pass
#[derive(Clone, Copy, Debug)]
pub struct ExtractParams {
    /// Isosurface threshold; a sample is inside when density >= threshold
    pub threshold: f32,
    /// Interpolate crossings along edges; false pins them to edge midpoints
    pub interpolate: bool,
    /// Read border samples as empty so the mesh is capped at the domain edge
    pub enforce_empty_border: bool,
    /// Truncate the final triangle list to this budget. None = unbounded.
    pub max_triangles: Option<u32>,
    pub strategy: Strategy,
}

impl Default for ExtractParams {
    fn default() -> Self {
        Self {
            threshold: 0.5,
            interpolate: true,
            enforce_empty_border: true,
            max_triangles: None,
            strategy: Strategy::default(),
        }
    }
}

/// Observable outcome of an extraction pass
#[derive(Clone, Copy, Debug, Default)]
pub struct ExtractStats {
    pub vertex_count: usize,
    pub triangle_count: usize,
    /// True when the triangle budget cut the output short
    pub truncated: bool,
}

/// Reusable mesh output buffers.
///
/// Owned by the extractor and recycled across passes; reallocation only
/// happens when the capacity requirement grows.
#[derive(Clone, Debug, Default)]
pub struct MeshBuffers {
    vertices: Vec<Vec3>,
    indices: Vec<u32>,
}

impl MeshBuffers {
    /// Vertex positions, one per surface-crossing lattice edge
    pub fn positions(&self) -> &[Vec3] {
        &self.vertices
    }

    /// Triangle index triples into [`positions`](Self::positions)
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// True when indices no longer fit a 16-bit index buffer
    pub fn wide_indices(&self) -> bool {
        self.vertices.len() > u16::MAX as usize
    }

    /// Positions as raw bytes for upload to a rendering pipeline
    pub fn position_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }
}

/// Marching cubes extractor with reusable output buffers
#[derive(Default)]
pub struct Extractor {
    layout: Option<GridLayout>,
    /// Crossing position per lattice edge slot
    edge_verts: Vec<Vec3>,
    /// Which slots hold a crossing this pass
    slot_used: Vec<bool>,
    /// Slot to compacted vertex index
    slot_remap: Vec<u32>,
    /// Emitted triangles as flat slot triples, in cube order
    tri_slots: Vec<u32>,
    /// Parallel scratch: fixed-size triangle region per cube
    cube_tris: Vec<u32>,
    mesh: MeshBuffers,
}

impl Extractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the dimension-derived tables and scratch buffers.
    ///
    /// Must be called after every field resize, before the next extraction.
    pub fn prepare(&mut self, dims: UVec3) -> Result<()> {
        if self.layout.as_ref().is_some_and(|l| l.matches(dims)) {
            return Ok(());
        }
        let layout = GridLayout::new(dims)?;
        let slots = layout.vertex_slot_count();
        self.edge_verts.resize(slots, Vec3::ZERO);
        self.slot_used.resize(slots, false);
        self.slot_remap.resize(slots, NO_SLOT);
        log::debug!(
            "extractor prepared for {}: {} cubes, {} edge slots",
            dims,
            layout.cube_count(),
            slots
        );
        self.layout = Some(layout);
        Ok(())
    }

    /// The mesh produced by the most recent extraction
    pub fn mesh(&self) -> &MeshBuffers {
        &self.mesh
    }

    /// Run one extraction pass over the field.
    ///
    /// Fails fast with [`Error::StaleGeometryTables`] when the field has
    /// been resized since [`prepare`](Self::prepare); never silently meshes
    /// against mismatched offset tables.
    pub fn extract(&mut self, field: &VoxelField, params: &ExtractParams) -> Result<ExtractStats> {
        let layout = match &self.layout {
            Some(layout) if layout.matches(field.dims()) => layout.clone(),
            other => {
                return Err(Error::StaleGeometryTables {
                    layout_dims: other.as_ref().map_or(UVec3::ZERO, |l| l.dims()),
                    field_dims: field.dims(),
                });
            }
        };

        self.slot_used.fill(false);
        self.tri_slots.clear();

        match params.strategy {
            Strategy::Sequential => self.march_sequential(field, &layout, params),
            Strategy::Parallel => self.march_parallel(field, &layout, params),
        }

        let stats = self.compact(params);
        if stats.triangle_count == 0 {
            log::debug!("extraction produced no triangles (field fully empty or fully solid)");
        }
        Ok(stats)
    }

    /// Classic per-cube scan: corner mask, edge flags, crossing vertices on
    /// first touch, triangles straight off the connection table.
    fn march_sequential(&mut self, field: &VoxelField, layout: &GridLayout, params: &ExtractParams) {
        let dims = field.dims();
        for cube_index in 0..layout.cube_count() {
            let cube = layout.cube_pos(cube_index);
            let base = layout.cube_base_index(cube);

            let mut densities = [0.0f32; 8];
            let mut mask = 0usize;
            for corner in 0..8 {
                let d = corner_density(field, layout, base, cube, corner, params, dims);
                densities[corner] = d;
                if d >= params.threshold {
                    mask |= 1 << corner;
                }
            }

            let flags = CUBE_EDGE_FLAGS[mask];
            if flags == 0 {
                continue;
            }

            for edge in 0..12 {
                if flags >> edge & 1 == 0 {
                    continue;
                }
                let slot = layout.edge_slot(cube, edge);
                if !self.slot_used[slot] {
                    let [lo, hi] = EDGE_ENDPOINTS[edge];
                    let p_lo = (cube.as_ivec3() + EDGE_ORIGINS[edge]).as_vec3();
                    self.edge_verts[slot] = crossing_point(
                        p_lo,
                        edge_step(edge),
                        densities[lo],
                        densities[hi],
                        params,
                    );
                    self.slot_used[slot] = true;
                }
            }

            for triple in TRIANGLE_CONNECTION_TABLE[mask].chunks_exact(3) {
                if triple[0] < 0 {
                    break;
                }
                for &edge in triple {
                    self.tri_slots.push(layout.edge_slot(cube, edge as usize) as u32);
                }
            }
        }
    }

    /// Data-parallel pass: phase one gives every lattice edge its own worker
    /// and output slot, phase two gives every cube a fixed triangle region.
    /// Slot addressing is a pure function of cube index and edge id, so no
    /// two workers ever write the same location.
    fn march_parallel(&mut self, field: &VoxelField, layout: &GridLayout, params: &ExtractParams) {
        let dims = field.dims();

        // Phase 1: crossing vertex per lattice edge
        self.slot_used
            .par_iter_mut()
            .zip(self.edge_verts.par_iter_mut())
            .enumerate()
            .for_each(|(slot, (used, vert))| {
                let (lo_index, hi_index, lo_pos, hi_pos) = layout.slot_edge(slot);
                let d_lo = sample_density(field, lo_index, lo_pos, params, dims);
                let d_hi = sample_density(field, hi_index, hi_pos, params, dims);

                let crossed = (d_lo >= params.threshold) != (d_hi >= params.threshold);
                *used = crossed;
                if crossed {
                    let step = (hi_pos - lo_pos).as_vec3();
                    *vert = crossing_point(lo_pos.as_vec3(), step, d_lo, d_hi, params);
                }
            });

        // Phase 2: triangles into cube-index-addressed regions
        let cube_count = layout.cube_count();
        self.cube_tris.resize(cube_count * TRI_SLOTS_PER_CUBE, NO_SLOT);
        self.cube_tris
            .par_chunks_exact_mut(TRI_SLOTS_PER_CUBE)
            .enumerate()
            .for_each(|(cube_index, region)| {
                region.fill(NO_SLOT);

                let cube = layout.cube_pos(cube_index);
                let base = layout.cube_base_index(cube);
                let mut mask = 0usize;
                for corner in 0..8 {
                    let d = corner_density(field, layout, base, cube, corner, params, dims);
                    if d >= params.threshold {
                        mask |= 1 << corner;
                    }
                }

                if CUBE_EDGE_FLAGS[mask] == 0 {
                    return;
                }

                for (i, &edge) in TRIANGLE_CONNECTION_TABLE[mask].iter().take(15).enumerate() {
                    if edge < 0 {
                        break;
                    }
                    region[i] = layout.edge_slot(cube, edge as usize) as u32;
                }
            });

        // Stitch regions back into one deterministic triangle list
        for region in self.cube_tris.chunks_exact(TRI_SLOTS_PER_CUBE) {
            for triple in region.chunks_exact(3) {
                if triple[0] == NO_SLOT {
                    break;
                }
                self.tri_slots.extend_from_slice(triple);
            }
        }
    }

    /// Compact used slots into a dense vertex buffer, remap triangles, and
    /// apply the triangle budget to the final list.
    fn compact(&mut self, params: &ExtractParams) -> ExtractStats {
        self.mesh.vertices.clear();
        for (slot, &used) in self.slot_used.iter().enumerate() {
            if used {
                self.slot_remap[slot] = self.mesh.vertices.len() as u32;
                self.mesh.vertices.push(self.edge_verts[slot]);
            }
        }

        let full_triangles = self.tri_slots.len() / 3;
        let kept = match params.max_triangles {
            Some(max) => full_triangles.min(max as usize),
            None => full_triangles,
        };

        self.mesh.indices.clear();
        self.mesh.indices.extend(
            self.tri_slots[..kept * 3]
                .iter()
                .map(|&slot| self.slot_remap[slot as usize]),
        );

        ExtractStats {
            vertex_count: self.mesh.vertices.len(),
            triangle_count: kept,
            truncated: kept < full_triangles,
        }
    }
}

/// Density of one cube corner, honoring the empty-border transform without
/// mutating the field
#[inline]
fn corner_density(
    field: &VoxelField,
    layout: &GridLayout,
    base: usize,
    cube: UVec3,
    corner: usize,
    params: &ExtractParams,
    dims: UVec3,
) -> f32 {
    let index = layout.corner_index(base, corner);
    let pos = (cube.as_ivec3() + CUBE_CORNERS[corner]).as_uvec3();
    sample_density(field, index, pos, params, dims)
}

#[inline]
fn sample_density(
    field: &VoxelField,
    index: usize,
    pos: UVec3,
    params: &ExtractParams,
    dims: UVec3,
) -> f32 {
    if params.enforce_empty_border
        && (pos.x == 0
            || pos.y == 0
            || pos.z == 0
            || pos.x == dims.x - 1
            || pos.y == dims.y - 1
            || pos.z == dims.z - 1)
    {
        return 0.0;
    }
    field.sample(index).density()
}

/// Unit step along an edge's axis
#[inline]
fn edge_step(edge: usize) -> Vec3 {
    match EDGE_AXES[edge] {
        EdgeAxis::X => Vec3::X,
        EdgeAxis::Y => Vec3::Y,
        EdgeAxis::Z => Vec3::Z,
    }
}

/// Crossing point along an edge from its lower end.
///
/// The interpolation parameter is clamped to [0, 1] and a vanishing density
/// delta falls back to the midpoint, so a degenerate edge can never produce
/// NaN or infinite coordinates.
#[inline]
fn crossing_point(p_lo: Vec3, step: Vec3, d_lo: f32, d_hi: f32, params: &ExtractParams) -> Vec3 {
    let t = if !params.interpolate {
        0.5
    } else {
        let delta = d_hi - d_lo;
        if delta.abs() < f32::EPSILON {
            0.5
        } else {
            ((params.threshold - d_lo) / delta).clamp(0.0, 1.0)
        }
    };
    p_lo + step * t
}
