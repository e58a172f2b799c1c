//! Packed voxel sample type

use bytemuck::{Pod, Zeroable};

/// Fixed-point density scale: 65535 = density 1.0
const DENSITY_SCALE: f32 = u16::MAX as f32;

/// Convert RGB888 to RGB555
pub fn rgb_to_555(r: u8, g: u8, b: u8) -> u16 {
    let r5 = (r as u16 >> 3) & 0x1F;
    let g5 = (g as u16 >> 3) & 0x1F;
    let b5 = (b as u16 >> 3) & 0x1F;
    (r5 << 10) | (g5 << 5) | b5
}

/// Convert RGB555 to RGB888
pub fn rgb555_to_rgb(color: u16) -> (u8, u8, u8) {
    let r5 = (color >> 10) & 0x1F;
    let g5 = (color >> 5) & 0x1F;
    let b5 = color & 0x1F;
    (
        ((r5 << 3) | (r5 >> 2)) as u8,
        ((g5 << 3) | (g5 >> 2)) as u8,
        ((b5 << 3) | (b5 >> 2)) as u8,
    )
}

/// Single voxel sample - exactly 4 bytes
///
/// Packs a fixed-point density in [0, 1] (quantization error below 1/65536)
/// and an RGB555 color. Densities are clamped on construction; an
/// out-of-range value can never be stored.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct Voxel {
    /// Fixed-point density, 0 = empty, 65535 = full
    density: u16,
    /// RGB555 encoded color (top bit unused)
    color: u16,
}

impl Voxel {
    /// Empty/air voxel
    pub const EMPTY: Voxel = Voxel { density: 0, color: 0 };

    /// Create a sample from a density in [0, 1]; out-of-range values clamp
    pub fn from_density(density: f32) -> Self {
        Self {
            density: quantize(density),
            color: 0,
        }
    }

    /// Create a sample from a density and an RGB888 color
    pub fn new(density: f32, r: u8, g: u8, b: u8) -> Self {
        Self {
            density: quantize(density),
            color: rgb_to_555(r, g, b),
        }
    }

    /// Density as f32 in [0, 1]
    pub fn density(self) -> f32 {
        self.density as f32 / DENSITY_SCALE
    }

    /// Raw fixed-point density
    pub fn density_raw(self) -> u16 {
        self.density
    }

    /// RGB888 color
    pub fn rgb(self) -> (u8, u8, u8) {
        rgb555_to_rgb(self.color)
    }

    /// Raw RGB555 color
    pub fn color_raw(self) -> u16 {
        self.color
    }

    /// Copy with a new density, keeping the color; clamps to [0, 1]
    pub fn with_density(self, density: f32) -> Self {
        Self {
            density: quantize(density),
            ..self
        }
    }

    /// Copy with a new RGB888 color, keeping the density
    pub fn with_rgb(self, r: u8, g: u8, b: u8) -> Self {
        Self {
            color: rgb_to_555(r, g, b),
            ..self
        }
    }

    /// Copy with the color pulled toward its grayscale luminance.
    ///
    /// `amount` is clamped to [0, 1]; 1 is fully gray.
    pub fn desaturated(self, amount: f32) -> Self {
        let amount = amount.clamp(0.0, 1.0);
        let (r, g, b) = self.rgb();
        let luma = 0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32;
        let mix = |c: u8| (c as f32 + (luma - c as f32) * amount).round() as u8;
        self.with_rgb(mix(r), mix(g), mix(b))
    }
}

fn quantize(density: f32) -> u16 {
    (density.clamp(0.0, 1.0) * DENSITY_SCALE).round() as u16
}
