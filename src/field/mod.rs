//! Voxel field storage and field-level operations

pub mod grid;
pub mod procgen;
pub mod settle;
pub mod voxel;

pub use grid::VoxelField;
pub use voxel::Voxel;
