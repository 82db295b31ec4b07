//! Engine configuration and its validation.

use crate::geom::{
    BvhOptions, ControlGrid, MAX_DEPTH, Point3, QueryOptions, SamplingOptions, SurfaceError,
};

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Rejected configuration values. Raised once, before anything is built.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid control grid: {0}")]
    Surface(#[from] SurfaceError),
    #[error("sampling resolution must be positive")]
    ZeroResolution,
    #[error("sampling stride must be positive")]
    ZeroStride,
    #[error("sampling stride {stride} exceeds resolution {resolution}")]
    StrideExceedsResolution { stride: u32, resolution: u32 },
    #[error("point size must be finite and non-negative, got {0}")]
    InvalidPointSize(f64),
    #[error("bvh depth {depth} exceeds the supported maximum of {max}")]
    DepthTooLarge { depth: usize, max: usize },
    #[error("bvh split depth {split} exceeds capacity depth {capacity}")]
    SplitDepthExceedsCapacity { split: usize, capacity: usize },
    #[error("query margin must be finite and non-negative, got {0}")]
    InvalidMargin(f64),
}

/// Everything needed to sample a patch and build its BVH.
#[derive(Debug, Clone, PartialEq)]
pub struct PatchConfig {
    pub rows: usize,
    pub cols: usize,
    /// Row-major control points, `rows * cols` of them.
    pub control_points: Vec<Point3>,
    pub sampling: SamplingOptions,
    pub bvh: BvhOptions,
    pub query: QueryOptions,
}

impl Default for PatchConfig {
    /// A 3x4 flat rectangle spanning `[0, 300] x [0, 400]` at `z = 0`.
    fn default() -> Self {
        let rows = 3;
        let cols = 4;
        let control_points = ControlGrid::flat_rectangle(rows, cols, 300.0, 400.0)
            .map(|grid| grid.points().to_vec())
            .unwrap_or_default();

        Self {
            rows,
            cols,
            control_points,
            sampling: SamplingOptions::default(),
            bvh: BvhOptions::default(),
            query: QueryOptions::default(),
        }
    }
}

impl PatchConfig {
    /// Configuration with default options around an existing grid.
    #[must_use]
    pub fn with_grid(grid: &ControlGrid) -> Self {
        Self {
            rows: grid.rows(),
            cols: grid.cols(),
            control_points: grid.points().to_vec(),
            ..Self::default()
        }
    }

    /// Checks every option and assembles the control grid.
    pub fn validate(&self) -> ConfigResult<ControlGrid> {
        let grid = ControlGrid::new(self.rows, self.cols, self.control_points.clone())?;

        let sampling = &self.sampling;
        if sampling.resolution == 0 {
            return Err(ConfigError::ZeroResolution);
        }
        if sampling.stride == 0 {
            return Err(ConfigError::ZeroStride);
        }
        if sampling.stride > sampling.resolution {
            return Err(ConfigError::StrideExceedsResolution {
                stride: sampling.stride,
                resolution: sampling.resolution,
            });
        }
        if !sampling.point_size.is_finite() || sampling.point_size < 0.0 {
            return Err(ConfigError::InvalidPointSize(sampling.point_size));
        }

        if self.bvh.depth > MAX_DEPTH {
            return Err(ConfigError::DepthTooLarge {
                depth: self.bvh.depth,
                max: MAX_DEPTH,
            });
        }
        if self.bvh.split_depth > self.bvh.depth {
            return Err(ConfigError::SplitDepthExceedsCapacity {
                split: self.bvh.split_depth,
                capacity: self.bvh.depth,
            });
        }

        if !self.query.margin.is_finite() || self.query.margin < 0.0 {
            return Err(ConfigError::InvalidMargin(self.query.margin));
        }

        Ok(grid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::BoundaryRule;

    #[test]
    fn default_config_is_valid() {
        let config = PatchConfig::default();
        let grid = config.validate().expect("default config validates");

        assert_eq!((grid.rows(), grid.cols()), (3, 4));
        assert_eq!(config.sampling.resolution, 1024);
        assert_eq!(config.sampling.stride, 4);
        assert!(!config.sampling.include_end);
        assert_eq!(config.bvh.depth, 3);
        assert_eq!(config.bvh.split_depth, 2);
        assert_eq!(config.bvh.boundary, BoundaryRule::HalfOpen);
        assert_eq!(config.query.margin, 0.0);
    }

    #[test]
    fn grid_larger_than_table_is_rejected() {
        let config = PatchConfig {
            rows: 11,
            cols: 4,
            control_points: vec![Point3::ORIGIN; 44],
            ..PatchConfig::default()
        };

        assert_eq!(
            config.validate(),
            Err(ConfigError::Surface(SurfaceError::GridTooLarge {
                rows: 11,
                cols: 4,
                max: 10
            }))
        );
    }

    #[test]
    fn ten_by_ten_grid_is_accepted() {
        let config = PatchConfig {
            rows: 10,
            cols: 10,
            control_points: vec![Point3::ORIGIN; 100],
            ..PatchConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn point_count_must_match_dimensions() {
        let config = PatchConfig {
            control_points: vec![Point3::ORIGIN; 5],
            ..PatchConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Surface(SurfaceError::ControlPointCount {
                expected: 12,
                actual: 5,
                ..
            }))
        ));
    }

    #[test]
    fn sampling_and_bvh_options_are_checked() {
        let mut config = PatchConfig::default();
        config.sampling.stride = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroStride));

        let mut config = PatchConfig::default();
        config.sampling.resolution = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroResolution));

        let mut config = PatchConfig::default();
        config.sampling.stride = 2048;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::StrideExceedsResolution { .. })
        ));

        let mut config = PatchConfig::default();
        config.bvh.split_depth = 4;
        assert_eq!(
            config.validate(),
            Err(ConfigError::SplitDepthExceedsCapacity {
                split: 4,
                capacity: 3
            })
        );

        let mut config = PatchConfig::default();
        config.bvh.depth = MAX_DEPTH + 1;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::DepthTooLarge { .. })
        ));

        let mut config = PatchConfig::default();
        config.query.margin = -1.0;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidMargin(_))));
    }

    #[test]
    fn with_grid_copies_dimensions() {
        let grid = ControlGrid::flat_rectangle(2, 5, 10.0, 20.0).expect("grid");
        let config = PatchConfig::with_grid(&grid);
        assert_eq!((config.rows, config.cols), (2, 5));
        assert_eq!(config.validate().expect("valid"), grid);
    }
}
