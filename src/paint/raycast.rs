//! Surface picking by ray marching
//!
//! Marches a ray in fixed steps through the field, sampling trilinear
//! density, and reports the first threshold crossing in either direction.
//! The march is clamped to the field's bounding box up front, so rays that
//! never touch the volume cost one slab test.

use glam::Vec3;

use crate::field::grid::VoxelField;
use crate::math::Ray;

#[derive(Clone, Copy, Debug, Default)]
pub struct RaycastOptions {
    /// Report the box exit point as a (non-surface) hit instead of a miss
    pub hit_exit_walls: bool,
}

/// Result of a march. `voxel_index` is only meaningful when `is_hit` is set.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RayHit {
    pub point: Vec3,
    pub voxel_index: usize,
    pub is_hit: bool,
    /// Set when the hit is the box exit wall rather than a surface crossing
    pub is_exit_hit: bool,
}

impl RayHit {
    pub fn miss() -> Self {
        Self::default()
    }

    fn at(field: &VoxelField, point: Vec3, is_exit_hit: bool) -> Self {
        let dims = field.dims();
        let p = point
            .round()
            .clamp(Vec3::ZERO, (dims - glam::UVec3::ONE).as_vec3());
        Self {
            point,
            voxel_index: field.index_of(p.x as u32, p.y as u32, p.z as u32),
            is_hit: true,
            is_exit_hit,
        }
    }
}

/// March `ray` through the field and return the first threshold crossing.
pub fn ray_march(
    ray: &Ray,
    step_size: f32,
    threshold: f32,
    field: &VoxelField,
    options: &RaycastOptions,
) -> RayHit {
    if step_size <= 0.0 {
        return RayHit::miss();
    }
    let Some((t_near, t_far)) = ray.intersects_aabb(&field.bounds()) else {
        return RayHit::miss();
    };

    let mut t = t_near;
    let mut inside = field.sample_density(ray.at(t)) >= threshold;
    if inside {
        // The ray enters the box already in solid material
        return RayHit::at(field, ray.at(t), false);
    }

    while t < t_far {
        t = (t + step_size).min(t_far);
        let point = ray.at(t);
        let now_inside = field.sample_density(point) >= threshold;
        if now_inside != inside {
            return RayHit::at(field, point, false);
        }
        inside = now_inside;
    }

    if options.hit_exit_walls {
        return RayHit::at(field, ray.at(t_far), true);
    }
    RayHit::miss()
}
