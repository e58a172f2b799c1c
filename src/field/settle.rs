//! Gravity settle pass over the field

use crate::field::grid::VoxelField;

/// Deterministic 3D hash for lateral spill ordering
fn hash_3d(x: i32, y: i32, z: i32, seed: u32) -> u32 {
    let mut h = seed;
    h ^= x as u32;
    h = h.wrapping_mul(0x45d9f3b);
    h ^= h >> 16;
    h ^= y as u32;
    h = h.wrapping_mul(0x45d9f3b);
    h ^= h >> 16;
    h ^= z as u32;
    h = h.wrapping_mul(0x45d9f3b);
    h ^= h >> 16;
    h
}

const LATERAL: [(i32, i32); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

/// Let solid material fall into emptier cells below, one cell per call.
///
/// A sample counts as solid when its density is at or above `threshold`.
/// Solid samples drop straight down when the cell below is non-solid, or
/// spill into a diagonal-below cell chosen by a hash of the frame seed, so a
/// frame is reproducible given the same seed. Samples swap wholesale (density
/// and color), so total density is conserved exactly.
///
/// Returns the number of moved voxels; the caller typically re-extracts when
/// it is non-zero.
pub fn settle_pass(field: &mut VoxelField, threshold: f32, frame_seed: u32) -> usize {
    let dims = field.dims();
    let mut moved = 0;

    // Bottom-up so a column collapses by one cell per pass
    for y in 1..dims.y {
        for z in 0..dims.z {
            for x in 0..dims.x {
                let index = field.index_of(x, y, z);
                if field.sample(index).density() < threshold {
                    continue;
                }

                let below = field.index_of(x, y - 1, z);
                if field.sample(below).density() < threshold {
                    swap(field, index, below);
                    moved += 1;
                    continue;
                }

                // Diagonal spill: hash picks where to start probing
                let start = hash_3d(x as i32, y as i32, z as i32, frame_seed) as usize;
                for k in 0..4 {
                    let (dx, dz) = LATERAL[(start + k) % 4];
                    let nx = x as i64 + dx as i64;
                    let nz = z as i64 + dz as i64;
                    if nx < 0 || nz < 0 || nx >= dims.x as i64 || nz >= dims.z as i64 {
                        continue;
                    }
                    let side = field.index_of(nx as u32, y - 1, nz as u32);
                    if field.sample(side).density() < threshold {
                        swap(field, index, side);
                        moved += 1;
                        break;
                    }
                }
            }
        }
    }

    if moved > 0 {
        log::trace!("settle pass moved {} voxels", moved);
    }
    moved
}

fn swap(field: &mut VoxelField, a: usize, b: usize) {
    let va = field.sample(a);
    let vb = field.sample(b);
    field.set_sample(a, vb);
    field.set_sample(b, va);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::voxel::Voxel;
    use glam::UVec3;

    fn column_field() -> VoxelField {
        let mut field = VoxelField::new(UVec3::new(4, 4, 4)).unwrap();
        field.set_voxel(1, 3, 1, Voxel::from_density(1.0)).unwrap();
        field
    }

    #[test]
    fn test_solid_falls_one_cell_per_pass() {
        let mut field = column_field();
        assert_eq!(settle_pass(&mut field, 0.5, 1), 1);
        assert_eq!(field.voxel(1, 3, 1).unwrap().density(), 0.0);
        assert_eq!(field.voxel(1, 2, 1).unwrap().density(), 1.0);
    }

    #[test]
    fn test_settled_field_stops_moving() {
        let mut field = column_field();
        for frame in 0..4 {
            settle_pass(&mut field, 0.5, frame);
        }
        assert_eq!(field.voxel(1, 0, 1).unwrap().density(), 1.0);
        assert_eq!(settle_pass(&mut field, 0.5, 99), 0);
    }

    #[test]
    fn test_total_density_conserved() {
        let mut field = VoxelField::new(UVec3::new(5, 5, 5)).unwrap();
        for i in 0..field.len() {
            if i % 3 == 0 {
                field.set_sample(i, Voxel::from_density(0.9));
            }
        }
        let total_before: f32 = field.samples().iter().map(|v| v.density()).sum();
        settle_pass(&mut field, 0.5, 42);
        let total_after: f32 = field.samples().iter().map(|v| v.density()).sum();
        assert!((total_before - total_after).abs() < 1e-4);
    }

    #[test]
    fn test_same_seed_same_result() {
        let mut a = VoxelField::new(UVec3::new(6, 6, 6)).unwrap();
        for i in 0..a.len() {
            if i % 4 == 0 {
                a.set_sample(i, Voxel::from_density(1.0));
            }
        }
        let mut b = VoxelField::new(UVec3::new(6, 6, 6)).unwrap();
        b.copy_from_bytes(a.dims(), a.as_bytes()).unwrap();

        settle_pass(&mut a, 0.5, 1234);
        settle_pass(&mut b, 0.5, 1234);
        assert_eq!(a.as_bytes(), b.as_bytes());
    }
}
