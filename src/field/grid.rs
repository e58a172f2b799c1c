//! Dense voxel field storage

use glam::UVec3;

use crate::core::error::Error;
use crate::core::types::{Result, Vec3};
use crate::field::voxel::Voxel;
use crate::math::Aabb;

/// Dense 3D grid of packed voxel samples.
///
/// Storage is a single flat array in floor-major order:
/// `index = x + z * nx + y * (nx * nz)`. Every in-range position maps to a
/// unique index and back. The field is single-writer by contract; extraction
/// reads it immutably and no mutation may happen concurrently.
pub struct VoxelField {
    dims: UVec3,
    samples: Vec<Voxel>,
}

impl VoxelField {
    /// Create an empty field. Every extent must be at least 2.
    pub fn new(dims: UVec3) -> Result<Self> {
        Self::validate_dims(dims)?;
        let len = (dims.x * dims.y * dims.z) as usize;
        Ok(Self {
            dims,
            samples: vec![Voxel::EMPTY; len],
        })
    }

    fn validate_dims(dims: UVec3) -> Result<()> {
        if dims.x < 2 || dims.y < 2 || dims.z < 2 {
            return Err(Error::InvalidDimensions { dims });
        }
        Ok(())
    }

    /// Field extents in samples
    pub fn dims(&self) -> UVec3 {
        self.dims
    }

    /// Total number of samples
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// World-space bounding box of the sample lattice
    pub fn bounds(&self) -> Aabb {
        Aabb::new(
            Vec3::ZERO,
            Vec3::new(
                (self.dims.x - 1) as f32,
                (self.dims.y - 1) as f32,
                (self.dims.z - 1) as f32,
            ),
        )
    }

    /// Reallocate storage for new dimensions.
    ///
    /// Contents are not preserved; callers wanting the old state back go
    /// through the history manager. No-op when the dimensions already match.
    pub fn resize(&mut self, dims: UVec3) -> Result<()> {
        Self::validate_dims(dims)?;
        if dims == self.dims {
            return Ok(());
        }
        log::debug!("resizing field {} -> {}", self.dims, dims);
        self.dims = dims;
        let len = (dims.x * dims.y * dims.z) as usize;
        self.samples.clear();
        self.samples.resize(len, Voxel::EMPTY);
        Ok(())
    }

    /// Flat index for an in-range position
    #[inline]
    pub fn index_of(&self, x: u32, y: u32, z: u32) -> usize {
        (x + z * self.dims.x + y * self.dims.x * self.dims.z) as usize
    }

    /// Position for a flat index (inverse of [`index_of`](Self::index_of))
    #[inline]
    pub fn pos_of(&self, index: usize) -> UVec3 {
        let floor = (self.dims.x * self.dims.z) as usize;
        UVec3::new(
            (index % self.dims.x as usize) as u32,
            (index / floor) as u32,
            ((index % floor) / self.dims.x as usize) as u32,
        )
    }

    #[inline]
    pub fn in_bounds(&self, x: u32, y: u32, z: u32) -> bool {
        x < self.dims.x && y < self.dims.y && z < self.dims.z
    }

    /// Read a sample, bounds-checked
    pub fn voxel(&self, x: u32, y: u32, z: u32) -> Result<Voxel> {
        if !self.in_bounds(x, y, z) {
            return Err(Error::OutOfBounds { x, y, z, dims: self.dims });
        }
        Ok(self.samples[self.index_of(x, y, z)])
    }

    /// Write a sample, bounds-checked. Density is already clamped by the
    /// packed representation.
    pub fn set_voxel(&mut self, x: u32, y: u32, z: u32, voxel: Voxel) -> Result<()> {
        if !self.in_bounds(x, y, z) {
            return Err(Error::OutOfBounds { x, y, z, dims: self.dims });
        }
        let index = self.index_of(x, y, z);
        self.samples[index] = voxel;
        Ok(())
    }

    /// Unchecked hot-path read; caller guarantees the index is in range
    #[inline]
    pub fn sample(&self, index: usize) -> Voxel {
        self.samples[index]
    }

    /// Unchecked hot-path write; caller guarantees the index is in range
    #[inline]
    pub fn set_sample(&mut self, index: usize, voxel: Voxel) {
        self.samples[index] = voxel;
    }

    /// All samples as a slice
    pub fn samples(&self) -> &[Voxel] {
        &self.samples
    }

    /// True when any coordinate sits on the outer shell
    #[inline]
    pub fn is_border(&self, pos: UVec3) -> bool {
        pos.x == 0 || pos.y == 0 || pos.z == 0
            || pos.x == self.dims.x - 1
            || pos.y == self.dims.y - 1
            || pos.z == self.dims.z - 1
    }

    /// Visit every border cell (any coordinate 0 or extent-1)
    pub fn for_each_border(&self, mut visit: impl FnMut(usize, UVec3)) {
        for index in 0..self.samples.len() {
            let pos = self.pos_of(index);
            if self.is_border(pos) {
                visit(index, pos);
            }
        }
    }

    /// Trilinear density sample at a fractional position.
    ///
    /// Positions outside the lattice clamp to the nearest cell, so the value
    /// is always defined; the raycaster bails on the AABB before relying on
    /// that.
    pub fn sample_density(&self, pos: Vec3) -> f32 {
        let max = self.dims.as_vec3() - Vec3::ONE;
        let p = pos.clamp(Vec3::ZERO, max);

        let base = p.floor().min(max - Vec3::ONE).max(Vec3::ZERO);
        let t = p - base;
        let (x0, y0, z0) = (base.x as u32, base.y as u32, base.z as u32);

        let d = |dx: u32, dy: u32, dz: u32| -> f32 {
            self.samples[self.index_of(x0 + dx, y0 + dy, z0 + dz)].density()
        };

        let c00 = d(0, 0, 0) * (1.0 - t.x) + d(1, 0, 0) * t.x;
        let c01 = d(0, 0, 1) * (1.0 - t.x) + d(1, 0, 1) * t.x;
        let c10 = d(0, 1, 0) * (1.0 - t.x) + d(1, 1, 0) * t.x;
        let c11 = d(0, 1, 1) * (1.0 - t.x) + d(1, 1, 1) * t.x;

        let c0 = c00 * (1.0 - t.z) + c01 * t.z;
        let c1 = c10 * (1.0 - t.z) + c11 * t.z;

        c0 * (1.0 - t.y) + c1 * t.y
    }

    /// Raw sample bytes for the persistence collaborator. Layout is the flat
    /// sample array; file format and compression are the caller's concern.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.samples)
    }

    /// Restore from a blob previously produced by [`as_bytes`](Self::as_bytes)
    pub fn copy_from_bytes(&mut self, dims: UVec3, bytes: &[u8]) -> Result<()> {
        Self::validate_dims(dims)?;
        let expected = (dims.x * dims.y * dims.z) as usize * std::mem::size_of::<Voxel>();
        if bytes.len() != expected {
            return Err(Error::BlobSizeMismatch {
                expected,
                actual: bytes.len(),
            });
        }
        self.resize(dims)?;
        self.samples.copy_from_slice(bytemuck::cast_slice(bytes));
        Ok(())
    }

    /// Overwrite all samples from a slice of equal length
    pub(crate) fn copy_from_samples(&mut self, dims: UVec3, samples: &[Voxel]) -> Result<()> {
        self.resize(dims)?;
        self.samples.copy_from_slice(samples);
        Ok(())
    }

    /// Fill the whole field with one sample value
    pub fn fill(&mut self, voxel: Voxel) {
        self.samples.fill(voxel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_small_dims() {
        assert!(VoxelField::new(UVec3::new(1, 4, 4)).is_err());
        assert!(VoxelField::new(UVec3::new(4, 4, 1)).is_err());
        assert!(VoxelField::new(UVec3::new(2, 2, 2)).is_ok());
    }

    #[test]
    fn test_index_mapping_bijection() {
        let field = VoxelField::new(UVec3::new(3, 4, 5)).unwrap();
        let mut seen = vec![false; field.len()];
        for y in 0..4 {
            for z in 0..5 {
                for x in 0..3 {
                    let index = field.index_of(x, y, z);
                    assert!(!seen[index], "index {} hit twice", index);
                    seen[index] = true;
                    assert_eq!(field.pos_of(index), UVec3::new(x, y, z));
                }
            }
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn test_floor_major_order() {
        let field = VoxelField::new(UVec3::new(4, 3, 2)).unwrap();
        // x advances fastest, then z, then y
        assert_eq!(field.index_of(1, 0, 0), 1);
        assert_eq!(field.index_of(0, 0, 1), 4);
        assert_eq!(field.index_of(0, 1, 0), 8);
    }

    #[test]
    fn test_out_of_bounds_is_error() {
        let mut field = VoxelField::new(UVec3::new(4, 4, 4)).unwrap();
        assert!(field.voxel(4, 0, 0).is_err());
        assert!(field.set_voxel(0, 0, 4, Voxel::EMPTY).is_err());
        assert!(field.voxel(3, 3, 3).is_ok());
    }

    #[test]
    fn test_resize_reallocates_and_clears() {
        let mut field = VoxelField::new(UVec3::new(4, 4, 4)).unwrap();
        field.set_voxel(1, 1, 1, Voxel::from_density(1.0)).unwrap();
        field.resize(UVec3::new(5, 4, 4)).unwrap();
        assert_eq!(field.len(), 80);
        assert_eq!(field.voxel(1, 1, 1).unwrap(), Voxel::EMPTY);
    }

    #[test]
    fn test_border_enumeration() {
        let field = VoxelField::new(UVec3::new(3, 3, 3)).unwrap();
        let mut count = 0;
        field.for_each_border(|_, pos| {
            assert!(field.is_border(pos));
            count += 1;
        });
        // 27 cells, only the center is interior
        assert_eq!(count, 26);
    }

    #[test]
    fn test_blob_round_trip() {
        let mut field = VoxelField::new(UVec3::new(3, 3, 3)).unwrap();
        field.set_voxel(1, 2, 0, Voxel::new(0.7, 255, 0, 0)).unwrap();
        let blob = field.as_bytes().to_vec();

        let mut restored = VoxelField::new(UVec3::new(2, 2, 2)).unwrap();
        restored.copy_from_bytes(field.dims(), &blob).unwrap();
        assert_eq!(restored.as_bytes(), &blob[..]);
        assert_eq!(
            restored.voxel(1, 2, 0).unwrap(),
            Voxel::new(0.7, 255, 0, 0)
        );
    }

    #[test]
    fn test_blob_size_mismatch() {
        let mut field = VoxelField::new(UVec3::new(2, 2, 2)).unwrap();
        let result = field.copy_from_bytes(UVec3::new(3, 3, 3), &[0u8; 4]);
        assert!(matches!(result, Err(Error::BlobSizeMismatch { .. })));
    }

    #[test]
    fn test_trilinear_sample_midpoint() {
        let mut field = VoxelField::new(UVec3::new(2, 2, 2)).unwrap();
        // Bottom layer solid, top layer empty
        for z in 0..2 {
            for x in 0..2 {
                field.set_voxel(x, 0, z, Voxel::from_density(1.0)).unwrap();
            }
        }
        let mid = field.sample_density(Vec3::new(0.5, 0.5, 0.5));
        assert!((mid - 0.5).abs() < 1e-4);
        assert!((field.sample_density(Vec3::new(0.5, 0.0, 0.5)) - 1.0).abs() < 1e-4);
    }
}
