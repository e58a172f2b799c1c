//! Initial field content generation

use noise::{NoiseFn, Perlin};

use crate::field::grid::VoxelField;
use crate::field::voxel::Voxel;

/// Parameters for the starting terrain fill
#[derive(Clone, Debug)]
pub struct InitParams {
    pub seed: u32,
    /// Height of the noise ridge above the half-fill plane
    pub scale: f32,
    /// Horizontal noise frequency
    pub frequency: f32,
}

impl Default for InitParams {
    fn default() -> Self {
        Self {
            seed: 0,
            scale: 2.0,
            frequency: 2.0,
        }
    }
}

/// Fill a field so the lower half is solid with a Perlin-offset boundary.
///
/// Gives a freshly created canvas a sculptable ground plane instead of an
/// empty (and therefore invisible) volume.
pub fn fill_half_terrain(field: &mut VoxelField, params: &InitParams) {
    let perlin = Perlin::new(params.seed);
    let dims = field.dims();
    let half_height = dims.y as f32 / 2.0;

    for y in 0..dims.y {
        for z in 0..dims.z {
            for x in 0..dims.x {
                let n = perlin.get([
                    (z as f32 * params.frequency / 51.16) as f64,
                    (x as f32 * params.frequency / 87.18) as f64,
                ]) as f32;
                // Perlin is [-1, 1]; bias to [0, 1] like a heightmap
                let offset = params.scale * (n + 1.0) * 0.5;
                let value = if (y as f32) < half_height + offset { 1.0 } else { 0.0 };
                let index = field.index_of(x, y, z);
                field.set_sample(index, Voxel::from_density(value));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::UVec3;

    #[test]
    fn test_fill_is_deterministic() {
        let mut a = VoxelField::new(UVec3::new(8, 8, 8)).unwrap();
        let mut b = VoxelField::new(UVec3::new(8, 8, 8)).unwrap();
        let params = InitParams { seed: 7, ..Default::default() };
        fill_half_terrain(&mut a, &params);
        fill_half_terrain(&mut b, &params);
        assert_eq!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn test_bottom_solid_top_empty() {
        let mut field = VoxelField::new(UVec3::new(8, 16, 8)).unwrap();
        fill_half_terrain(&mut field, &InitParams::default());
        // Bottom layer always solid, top layer always empty for default scale
        for z in 0..8 {
            for x in 0..8 {
                assert_eq!(field.voxel(x, 0, z).unwrap().density(), 1.0);
                assert_eq!(field.voxel(x, 15, z).unwrap().density(), 0.0);
            }
        }
    }
}
