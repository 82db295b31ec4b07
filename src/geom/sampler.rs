//! Dense sampling of a [`BezierPatch`] on a strided step lattice.

use super::core::Point3;
use super::surface::BezierPatch;
use crate::debug_draw::{Color, DebugPoint, DebugSink};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// How the parameter axes are walked.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingOptions {
    /// Number of time steps spanning `[0, 1]` on each axis.
    pub resolution: u32,
    /// Distance in steps between consecutive samples.
    pub stride: u32,
    /// Visit `step == resolution` when the stride lands on it. Off by default,
    /// so the far edges of the patch are never sampled.
    pub include_end: bool,
    /// Point size handed to the sink.
    pub point_size: f64,
}

impl Default for SamplingOptions {
    fn default() -> Self {
        Self {
            resolution: 1024,
            stride: 4,
            include_end: false,
            point_size: 2.0,
        }
    }
}

impl SamplingOptions {
    /// Step values visited on each axis, ascending.
    #[must_use]
    pub fn steps(&self) -> Vec<u32> {
        let stride = self.stride.max(1) as usize;
        if self.include_end {
            (0..=self.resolution).step_by(stride).collect()
        } else {
            (0..self.resolution).step_by(stride).collect()
        }
    }
}

/// Sample cache addressed by time-step pairs.
///
/// Only the stride lattice is stored; lookups off the lattice return `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleGrid {
    resolution: u32,
    stride: u32,
    steps: Vec<u32>,
    points: Vec<Point3>,
}

impl SampleGrid {
    #[must_use]
    pub const fn resolution(&self) -> u32 {
        self.resolution
    }

    #[must_use]
    pub const fn stride(&self) -> u32 {
        self.stride
    }

    /// Number of samples along each axis.
    #[must_use]
    pub fn samples_per_axis(&self) -> usize {
        self.steps.len()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    #[must_use]
    pub fn steps(&self) -> &[u32] {
        &self.steps
    }

    /// Row-major sample points.
    #[must_use]
    pub fn points(&self) -> &[Point3] {
        &self.points
    }

    #[must_use]
    pub fn get(&self, row_step: u32, col_step: u32) -> Option<Point3> {
        let row = self.lattice_index(row_step)?;
        let col = self.lattice_index(col_step)?;
        self.points.get(row * self.steps.len() + col).copied()
    }

    /// Iterates `(row_step, col_step, point)` in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, u32, Point3)> + '_ {
        let per_axis = self.steps.len();
        self.points.iter().enumerate().map(move |(idx, point)| {
            (self.steps[idx / per_axis], self.steps[idx % per_axis], *point)
        })
    }

    fn lattice_index(&self, step: u32) -> Option<usize> {
        if self.stride == 0 || step % self.stride != 0 {
            return None;
        }
        let idx = (step / self.stride) as usize;
        (idx < self.steps.len()).then_some(idx)
    }
}

/// Evaluates `patch` on every lattice cell, then forwards each sample to `sink`
/// in row-major order.
pub fn build_sample_grid<S: DebugSink>(
    patch: &BezierPatch,
    options: &SamplingOptions,
    sink: &mut S,
) -> SampleGrid {
    let steps = options.steps();
    let points = evaluate_rows(patch, &steps);

    for point in &points {
        sink.draw_point(&DebugPoint {
            position: *point,
            size: options.point_size,
            color: Color::SAMPLE,
            persistent: true,
        });
    }

    log::debug!(
        "sampled {} points ({} per axis, stride {}, resolution {})",
        points.len(),
        steps.len(),
        options.stride,
        options.resolution
    );

    SampleGrid {
        resolution: options.resolution,
        stride: options.stride,
        steps,
        points,
    }
}

#[cfg(feature = "parallel")]
fn evaluate_rows(patch: &BezierPatch, steps: &[u32]) -> Vec<Point3> {
    steps
        .par_iter()
        .flat_map_iter(|&row| steps.iter().map(move |&col| patch.evaluate_point(row, col)))
        .collect()
}

#[cfg(not(feature = "parallel"))]
fn evaluate_rows(patch: &BezierPatch, steps: &[u32]) -> Vec<Point3> {
    steps
        .iter()
        .flat_map(|&row| steps.iter().map(move |&col| patch.evaluate_point(row, col)))
        .collect()
}
