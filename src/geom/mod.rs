mod bernstein;
mod bvh;
mod core;
mod sampler;
mod surface;

pub use bernstein::{BERNSTEIN_TABLE, MAX_BASIS_SIZE, MAX_DEGREE, coefficient};
pub use bvh::{
    BRANCHING, BoundaryRule, Bvh, BvhOptions, MAX_DEPTH, QueryOptions, TreeNode, child_index,
    level_of, nodes_through_level, parent_index,
};
pub use self::core::{BBox, Point3, Tolerance, Vec3};
pub use sampler::{SampleGrid, SamplingOptions, build_sample_grid};
pub use surface::{
    BezierPatch, ControlGrid, Surface, SurfaceError, basis, bernstein_weight,
};

#[cfg(test)]
mod tests;
