//! Sculpting session configuration.

use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::error::Error;
use crate::core::types::Result;
use crate::mesh::extract::{ExtractParams, Strategy};

/// Full configuration for a sculpting session.
///
/// Covers the extraction surface (threshold, interpolation, border policy,
/// triangle budget), the field dimensions, and the interaction defaults the
/// hosting application feeds back into the brush and raycaster.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SculptConfig {
    /// Isosurface threshold, exclusive (0, 1).
    pub threshold: f32,
    /// Interpolate edge crossings; false gives the blocky midpoint look.
    pub interpolate: bool,
    /// Read border samples as empty so the mesh is capped at the domain edge.
    pub enforce_empty_border: bool,
    /// Triangle budget for the output mesh. None = unbounded.
    pub max_triangles: Option<u32>,
    /// Field extents, each at least 2.
    pub dimensions: [u32; 3],
    /// Extraction strategy.
    pub strategy: Strategy,
    /// Default brush radius in field units.
    pub brush_radius: f32,
    /// Brush falloff widening beyond the nominal radius.
    pub brush_fuzziness: f32,
    /// Ray march step size for surface picking.
    pub raycast_step: f32,
}

impl Default for SculptConfig {
    fn default() -> Self {
        Self {
            threshold: 0.5,
            interpolate: true,
            enforce_empty_border: true,
            max_triangles: None,
            dimensions: [50, 50, 50],
            strategy: Strategy::Parallel,
            brush_radius: 5.0,
            brush_fuzziness: 2.0,
            raycast_step: 0.5,
        }
    }
}

impl SculptConfig {
    /// Check the configuration for values the core cannot operate on.
    pub fn validate(&self) -> Result<()> {
        if !(self.threshold > 0.0 && self.threshold < 1.0) {
            return Err(Error::Config(format!(
                "threshold {} outside (0, 1)",
                self.threshold
            )));
        }
        if self.dimensions.iter().any(|&d| d < 2) {
            return Err(Error::Config(format!(
                "dimensions {:?} too small: every extent must be at least 2",
                self.dimensions
            )));
        }
        if self.raycast_step <= 0.0 {
            return Err(Error::Config(format!(
                "raycast step {} must be positive",
                self.raycast_step
            )));
        }
        if self.brush_radius < 0.0 || self.brush_fuzziness < 0.0 {
            return Err(Error::Config(
                "brush radius and fuzziness must be non-negative".to_string(),
            ));
        }
        Ok(())
    }

    /// Extraction parameters derived from this configuration.
    pub fn extract_params(&self) -> ExtractParams {
        ExtractParams {
            threshold: self.threshold,
            interpolate: self.interpolate,
            enforce_empty_border: self.enforce_empty_border,
            max_triangles: self.max_triangles,
            strategy: self.strategy,
        }
    }

    /// Save to file as JSON.
    pub fn save_sync(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load from a JSON file and validate.
    pub fn load_sync(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&json)
            .map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(SculptConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_threshold_at_bounds() {
        let mut cfg = SculptConfig::default();
        cfg.threshold = 0.0;
        assert!(cfg.validate().is_err());
        cfg.threshold = 1.0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_rejects_degenerate_dimensions() {
        let mut cfg = SculptConfig::default();
        cfg.dimensions = [1, 50, 50];
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_json_round_trip() {
        let cfg = SculptConfig {
            threshold: 0.4,
            max_triangles: Some(10_000),
            ..Default::default()
        };
        let json = serde_json::to_string(&cfg).unwrap();
        let back: SculptConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.threshold, 0.4);
        assert_eq!(back.max_triangles, Some(10_000));
    }
}
