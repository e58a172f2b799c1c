//! Interactive editing: brush application, undo history, surface picking

pub mod brush;
pub mod history;
pub mod raycast;

pub use brush::{BrushMode, BrushStroke};
pub use history::{FieldSnapshot, HistoryManager};
pub use raycast::{ray_march, RaycastOptions, RayHit};
