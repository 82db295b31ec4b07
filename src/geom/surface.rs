//! Tensor-product Bezier patch over a row-major control grid.
//!
//! The patch is evaluated at integer time steps in `[0, resolution]`. Steps are
//! mapped into `[0, 1]` by dividing by the resolution, and the two extremes are
//! pinned so only the corner basis function is active there.

use super::bernstein::{MAX_BASIS_SIZE, coefficient};
use super::core::{BBox, Point3};

/// Errors raised while assembling a control grid.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SurfaceError {
    #[error("control grid must have at least one row and one column, got {rows}x{cols}")]
    EmptyGrid { rows: usize, cols: usize },
    #[error("control grid {rows}x{cols} exceeds the supported maximum of {max}x{max}")]
    GridTooLarge { rows: usize, cols: usize, max: usize },
    #[error("control grid {rows}x{cols} needs {expected} points, got {actual}")]
    ControlPointCount {
        rows: usize,
        cols: usize,
        expected: usize,
        actual: usize,
    },
    #[error("control point {index} has non-finite coordinates")]
    NonFiniteControlPoint { index: usize },
}

/// A surface that can be evaluated over a rectangular parameter domain.
pub trait Surface {
    fn point_at(&self, u: f64, v: f64) -> Point3;

    #[must_use]
    fn domain_u(&self) -> (f64, f64) {
        (0.0, 1.0)
    }

    #[must_use]
    fn domain_v(&self) -> (f64, f64) {
        (0.0, 1.0)
    }
}

/// Row-major grid of control points, `index(row, col) = row * cols + col`.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlGrid {
    rows: usize,
    cols: usize,
    points: Vec<Point3>,
}

impl ControlGrid {
    /// Builds a grid after checking its dimensions against the Bernstein table.
    pub fn new(rows: usize, cols: usize, points: Vec<Point3>) -> Result<Self, SurfaceError> {
        if rows == 0 || cols == 0 {
            return Err(SurfaceError::EmptyGrid { rows, cols });
        }
        if rows > MAX_BASIS_SIZE || cols > MAX_BASIS_SIZE {
            return Err(SurfaceError::GridTooLarge {
                rows,
                cols,
                max: MAX_BASIS_SIZE,
            });
        }
        let expected = rows * cols;
        if points.len() != expected {
            return Err(SurfaceError::ControlPointCount {
                rows,
                cols,
                expected,
                actual: points.len(),
            });
        }
        if let Some(index) = points.iter().position(|p| !p.is_finite()) {
            return Err(SurfaceError::NonFiniteControlPoint { index });
        }

        Ok(Self { rows, cols, points })
    }

    /// A planar grid at `z = 0` spanning `[0, width] x [0, height]`. Columns run
    /// along X and rows along Y, evenly spaced.
    pub fn flat_rectangle(
        rows: usize,
        cols: usize,
        width: f64,
        height: f64,
    ) -> Result<Self, SurfaceError> {
        let mut points = Vec::with_capacity(rows * cols);
        for row in 0..rows {
            for col in 0..cols {
                points.push(Point3::new(
                    width * grid_fraction(col, cols),
                    height * grid_fraction(row, rows),
                    0.0,
                ));
            }
        }
        Self::new(rows, cols, points)
    }

    #[must_use]
    pub const fn rows(&self) -> usize {
        self.rows
    }

    #[must_use]
    pub const fn cols(&self) -> usize {
        self.cols
    }

    #[must_use]
    pub fn points(&self) -> &[Point3] {
        &self.points
    }

    /// Control point at `(row, col)`.
    ///
    /// # Panics
    ///
    /// Panics if `row >= rows` or `col >= cols`.
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> Point3 {
        assert!(row < self.rows && col < self.cols, "control index out of range");
        self.points[row * self.cols + col]
    }

    #[must_use]
    pub fn bounds(&self) -> BBox {
        // `new` guarantees at least one point.
        BBox::from_points(&self.points).unwrap_or(BBox::new(Point3::ORIGIN, Point3::ORIGIN))
    }
}

#[allow(clippy::cast_precision_loss)]
fn grid_fraction(index: usize, count: usize) -> f64 {
    if count <= 1 {
        0.0
    } else {
        index as f64 / (count - 1) as f64
    }
}

/// Bernstein weight `C(size-1, index) * (1-t)^(size-1-index) * t^index` for a
/// continuous parameter `t` in `[0, 1]`.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
pub fn bernstein_weight(size: usize, index: usize, t: f64) -> f64 {
    let degree = size - 1;
    let mut weight = f64::from(coefficient(degree, index));
    weight *= (1.0 - t).powi((degree - index) as i32);
    weight *= t.powi(index as i32);
    weight
}

/// Bernstein weight at integer time step `step` of `resolution`.
///
/// At `step == 0` only `index == 0` is active and at `step == resolution` only
/// `index == size - 1` is; everything else there is exactly zero. Steps past
/// `resolution` are clamped to it.
#[must_use]
pub fn basis(size: usize, index: usize, step: u32, resolution: u32) -> f64 {
    debug_assert!(size >= 1 && index < size, "basis index out of range");
    let step = step.min(resolution);

    if step == 0 {
        return if index == 0 { 1.0 } else { 0.0 };
    }
    if step == resolution {
        return if index == size - 1 { 1.0 } else { 0.0 };
    }

    let first = f64::from(resolution - step) / f64::from(resolution);
    let second = f64::from(step) / f64::from(resolution);
    let degree = size - 1;

    let mut weight = f64::from(coefficient(degree, index));
    weight *= powu(first, degree - index);
    weight *= powu(second, index);
    weight
}

#[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
fn powu(base: f64, exponent: usize) -> f64 {
    base.powi(exponent as i32)
}

/// Bezier patch evaluated on an integer step lattice of `resolution` steps per
/// axis.
#[derive(Debug, Clone, PartialEq)]
pub struct BezierPatch {
    grid: ControlGrid,
    resolution: u32,
}

impl BezierPatch {
    #[must_use]
    pub const fn new(grid: ControlGrid, resolution: u32) -> Self {
        Self { grid, resolution }
    }

    #[must_use]
    pub const fn grid(&self) -> &ControlGrid {
        &self.grid
    }

    #[must_use]
    pub const fn resolution(&self) -> u32 {
        self.resolution
    }

    /// Surface point at `(row_step, col_step)`, both in `[0, resolution]`.
    #[must_use]
    pub fn evaluate_point(&self, row_step: u32, col_step: u32) -> Point3 {
        let rows = self.grid.rows();
        let cols = self.grid.cols();

        let row_weights: Vec<f64> = (0..rows)
            .map(|i| basis(rows, i, row_step, self.resolution))
            .collect();
        let col_weights: Vec<f64> = (0..cols)
            .map(|j| basis(cols, j, col_step, self.resolution))
            .collect();

        self.blend(&row_weights, &col_weights)
    }

    fn blend(&self, row_weights: &[f64], col_weights: &[f64]) -> Point3 {
        let mut result = Point3::ORIGIN;
        for (i, row_weight) in row_weights.iter().enumerate() {
            for (j, col_weight) in col_weights.iter().enumerate() {
                result += self.grid.get(i, j) * (row_weight * col_weight);
            }
        }
        result
    }
}

impl Surface for BezierPatch {
    fn point_at(&self, u: f64, v: f64) -> Point3 {
        let u = u.clamp(0.0, 1.0);
        let v = v.clamp(0.0, 1.0);
        let rows = self.grid.rows();
        let cols = self.grid.cols();

        let row_weights: Vec<f64> = (0..rows).map(|i| bernstein_weight(rows, i, u)).collect();
        let col_weights: Vec<f64> = (0..cols).map(|j| bernstein_weight(cols, j, v)).collect();

        self.blend(&row_weights, &col_weights)
    }
}
