//! Voxsculpt - interactive voxel sculpting core

pub mod core;
pub mod field;
pub mod math;
pub mod mesh;
pub mod paint;
