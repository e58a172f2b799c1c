//! Spherical sculpting brush
//!
//! Applies a smooth falloff over the voxels inside the brush sphere. Add and
//! Subtract shift density, Paint blends color and leaves density alone. The
//! scan only touches the integer bounding box of the brush, clipped to the
//! field.

use glam::{IVec3, Vec3};

use crate::field::grid::VoxelField;
use crate::field::voxel::Voxel;

/// What the brush does to the voxels it covers
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BrushMode {
    #[default]
    Add,
    Subtract,
    /// Recolor without changing density
    Paint,
}

/// One brush application
#[derive(Clone, Copy, Debug)]
pub struct BrushStroke {
    /// Center in voxel coordinates; may lie outside the field
    pub center: Vec3,
    pub radius: f32,
    /// Widens the falloff skirt; effective radius is `radius * (1 + fuzziness)`
    pub fuzziness: f32,
    /// Per-application strength in [0, 1]
    pub intensity: f32,
    pub mode: BrushMode,
    /// Target color for Add and Paint
    pub color: (u8, u8, u8),
}

impl Default for BrushStroke {
    fn default() -> Self {
        Self {
            center: Vec3::ZERO,
            radius: 5.0,
            fuzziness: 2.0,
            intensity: 1.0,
            mode: BrushMode::Add,
            color: (200, 200, 200),
        }
    }
}

impl BrushStroke {
    pub fn effective_radius(&self) -> f32 {
        self.radius * (1.0 + self.fuzziness.max(0.0))
    }

    /// Signed density weight for a voxel at `distance` from the center.
    ///
    /// Quartic falloff, full strength at the center, zero at the effective
    /// radius; clamped so a single application never moves density by more
    /// than 1.
    pub fn weight(&self, distance: f32) -> f32 {
        let reach = self.effective_radius();
        if distance >= reach {
            return 0.0;
        }
        let falloff = 1.0 - (distance / reach).powi(4);
        let signed = match self.mode {
            BrushMode::Subtract => -self.intensity,
            _ => self.intensity,
        };
        (signed * falloff).clamp(-1.0, 1.0)
    }
}

/// Apply one stroke to the field. Returns the number of voxels changed.
pub fn apply(field: &mut VoxelField, stroke: &BrushStroke) -> usize {
    let reach = stroke.effective_radius();
    if reach <= 0.0 || stroke.intensity == 0.0 {
        return 0;
    }

    let dims = field.dims().as_ivec3();
    let lo = (stroke.center - Vec3::splat(reach)).floor().as_ivec3();
    let hi = (stroke.center + Vec3::splat(reach)).ceil().as_ivec3();
    let lo = lo.clamp(IVec3::ZERO, dims - IVec3::ONE);
    let hi = hi.clamp(IVec3::ZERO, dims - IVec3::ONE);

    let mut changed = 0usize;
    for y in lo.y..=hi.y {
        for z in lo.z..=hi.z {
            for x in lo.x..=hi.x {
                let pos = Vec3::new(x as f32, y as f32, z as f32);
                let w = stroke.weight(pos.distance(stroke.center));
                if w == 0.0 {
                    continue;
                }

                let index = field.index_of(x as u32, y as u32, z as u32);
                let voxel = field.sample(index);
                let updated = apply_to_voxel(voxel, stroke, w);
                if updated != voxel {
                    field.set_sample(index, updated);
                    changed += 1;
                }
            }
        }
    }

    log::trace!("brush {:?} touched {} voxels", stroke.mode, changed);
    changed
}

fn apply_to_voxel(voxel: Voxel, stroke: &BrushStroke, w: f32) -> Voxel {
    match stroke.mode {
        BrushMode::Add | BrushMode::Subtract => {
            let updated = voxel.with_density(voxel.density() + w);
            // Material added out of thin air takes the brush color
            if stroke.mode == BrushMode::Add && voxel.density() == 0.0 && w > 0.0 {
                let (r, g, b) = stroke.color;
                updated.with_rgb(r, g, b)
            } else {
                updated
            }
        }
        BrushMode::Paint => {
            if w >= 0.0 {
                blend_toward(voxel, stroke.color, w)
            } else {
                voxel.desaturated(-w)
            }
        }
    }
}

fn blend_toward(voxel: Voxel, target: (u8, u8, u8), amount: f32) -> Voxel {
    let amount = amount.clamp(0.0, 1.0);
    let (r, g, b) = voxel.rgb();
    let mix = |from: u8, to: u8| (from as f32 + (to as f32 - from as f32) * amount).round() as u8;
    voxel.with_rgb(mix(r, target.0), mix(g, target.1), mix(b, target.2))
}
