//! Undo/redo over full-field snapshots
//!
//! History is linear: every committed stroke pushes a snapshot, undoing walks
//! back one snapshot at a time, and committing after an undo discards the
//! redo branch. Snapshots are byte-exact copies of the sample array, so a
//! restore reproduces the field exactly.

use glam::UVec3;

use crate::core::types::Result;
use crate::field::grid::VoxelField;
use crate::field::voxel::Voxel;

/// One recorded field state
#[derive(Clone, Debug)]
pub struct FieldSnapshot {
    dims: UVec3,
    samples: Vec<Voxel>,
}

impl FieldSnapshot {
    pub fn capture(field: &VoxelField) -> Self {
        Self {
            dims: field.dims(),
            samples: field.samples().to_vec(),
        }
    }

    /// Restore this snapshot into the field, resizing if needed
    pub fn restore(&self, field: &mut VoxelField) -> Result<()> {
        field.copy_from_samples(self.dims, &self.samples)
    }
}

/// Linear undo/redo stacks. The first snapshot pushed is the floor state;
/// undo never walks past it.
#[derive(Default)]
pub struct HistoryManager {
    undo: Vec<FieldSnapshot>,
    redo: Vec<FieldSnapshot>,
}

impl HistoryManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the baseline state before any editing happens
    pub fn record_initial(&mut self, field: &VoxelField) {
        self.undo.clear();
        self.redo.clear();
        self.undo.push(FieldSnapshot::capture(field));
    }

    /// A new stroke is starting; any redo branch is now unreachable
    pub fn begin_stroke(&mut self) {
        self.redo.clear();
    }

    /// Commit the field state after a finished stroke
    pub fn end_stroke(&mut self, field: &VoxelField) {
        self.undo.push(FieldSnapshot::capture(field));
        log::trace!("history: {} undo entries", self.undo.len());
    }

    /// Step back one committed state. No-op with fewer than two entries.
    pub fn undo(&mut self, field: &mut VoxelField) -> Result<bool> {
        if self.undo.len() < 2 {
            return Ok(false);
        }
        let Some(current) = self.undo.pop() else {
            return Ok(false);
        };
        self.redo.push(current);
        let Some(top) = self.undo.last() else {
            return Ok(false);
        };
        top.restore(field)?;
        Ok(true)
    }

    /// Re-apply the most recently undone state. No-op with an empty redo
    /// stack.
    pub fn redo(&mut self, field: &mut VoxelField) -> Result<bool> {
        let Some(snapshot) = self.redo.pop() else {
            return Ok(false);
        };
        snapshot.restore(field)?;
        self.undo.push(snapshot);
        Ok(true)
    }

    pub fn undo_count(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_count(&self) -> usize {
        self.redo.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paint::brush::{self, BrushMode, BrushStroke};
    use glam::Vec3;

    fn field() -> VoxelField {
        VoxelField::new(UVec3::new(8, 8, 8)).unwrap()
    }

    fn poke(field: &mut VoxelField, x: f32) {
        let stroke = BrushStroke {
            center: Vec3::new(x, 4.0, 4.0),
            radius: 1.5,
            fuzziness: 0.0,
            mode: BrushMode::Add,
            ..Default::default()
        };
        brush::apply(field, &stroke);
    }

    #[test]
    fn test_undo_restores_previous_state() {
        let mut f = field();
        let mut history = HistoryManager::new();
        history.record_initial(&f);

        let before = f.as_bytes().to_vec();
        history.begin_stroke();
        poke(&mut f, 4.0);
        history.end_stroke(&f);
        assert_ne!(f.as_bytes(), &before[..]);

        assert!(history.undo(&mut f).unwrap());
        assert_eq!(f.as_bytes(), &before[..]);
    }

    #[test]
    fn test_undo_redo_round_trip() {
        let mut f = field();
        let mut history = HistoryManager::new();
        history.record_initial(&f);

        history.begin_stroke();
        poke(&mut f, 4.0);
        history.end_stroke(&f);
        let edited = f.as_bytes().to_vec();

        history.undo(&mut f).unwrap();
        assert!(history.redo(&mut f).unwrap());
        assert_eq!(f.as_bytes(), &edited[..]);
    }

    #[test]
    fn test_undo_stops_at_floor() {
        let mut f = field();
        let mut history = HistoryManager::new();
        history.record_initial(&f);

        // Only the baseline exists: nothing to undo
        assert!(!history.undo(&mut f).unwrap());
        assert!(!history.redo(&mut f).unwrap());

        history.begin_stroke();
        poke(&mut f, 4.0);
        history.end_stroke(&f);

        assert!(history.undo(&mut f).unwrap());
        assert!(!history.undo(&mut f).unwrap());
        assert_eq!(history.undo_count(), 1);
    }

    #[test]
    fn test_new_stroke_discards_redo_branch() {
        let mut f = field();
        let mut history = HistoryManager::new();
        history.record_initial(&f);

        history.begin_stroke();
        poke(&mut f, 3.0);
        history.end_stroke(&f);
        history.undo(&mut f).unwrap();
        assert_eq!(history.redo_count(), 1);

        history.begin_stroke();
        poke(&mut f, 5.0);
        history.end_stroke(&f);
        assert_eq!(history.redo_count(), 0);
        assert!(!history.redo(&mut f).unwrap());
    }

    #[test]
    fn test_restore_resizes_field() {
        let mut f = field();
        let mut history = HistoryManager::new();
        history.record_initial(&f);

        history.begin_stroke();
        f.resize(UVec3::new(12, 12, 12)).unwrap();
        history.end_stroke(&f);

        history.undo(&mut f).unwrap();
        assert_eq!(f.dims(), UVec3::new(8, 8, 8));
        history.redo(&mut f).unwrap();
        assert_eq!(f.dims(), UVec3::new(12, 12, 12));
    }
}
