//! Isosurface meshing: marching cubes tables, grid addressing, extraction

pub mod extract;
pub mod layout;
pub mod tables;

pub use extract::{ExtractParams, ExtractStats, Extractor, MeshBuffers, Strategy};
pub use layout::GridLayout;
