use crate::geom::{
    BezierPatch, ControlGrid, MAX_BASIS_SIZE, Point3, Surface, SurfaceError, Tolerance, basis,
    bernstein_weight,
};

const RESOLUTION: u32 = 1024;

fn warped_grid() -> ControlGrid {
    let mut points = Vec::new();
    for row in 0..3 {
        for col in 0..4 {
            let x = f64::from(col) * 100.0 + f64::from(row) * 7.0;
            let y = f64::from(row) * 200.0 - f64::from(col) * 3.0;
            let z = f64::from((row * 4 + col) % 5) * 11.0 - 20.0;
            points.push(Point3::new(x, y, z));
        }
    }
    ControlGrid::new(3, 4, points).expect("3x4 grid")
}

#[test]
fn corners_interpolate_control_points() {
    let grid = warped_grid();
    let patch = BezierPatch::new(grid.clone(), RESOLUTION);

    assert_eq!(patch.evaluate_point(0, 0), grid.get(0, 0));
    assert_eq!(patch.evaluate_point(0, RESOLUTION), grid.get(0, 3));
    assert_eq!(patch.evaluate_point(RESOLUTION, 0), grid.get(2, 0));
    assert_eq!(patch.evaluate_point(RESOLUTION, RESOLUTION), grid.get(2, 3));
}

#[test]
fn basis_is_a_partition_of_unity() {
    let tol = Tolerance::new(1e-12);
    let steps = [0, 1, 3, 256, 511, 512, 700, 1023, RESOLUTION];

    for size in 1..=MAX_BASIS_SIZE {
        for &step in &steps {
            let sum: f64 = (0..size).map(|i| basis(size, i, step, RESOLUTION)).sum();
            assert!(tol.approx_eq_f64(sum, 1.0), "size {size}, step {step}: sum {sum}");
        }
    }
}

#[test]
fn boundary_steps_activate_only_corner_functions() {
    for size in 1..=MAX_BASIS_SIZE {
        for index in 0..size {
            let at_start = basis(size, index, 0, RESOLUTION);
            let at_end = basis(size, index, RESOLUTION, RESOLUTION);

            assert_eq!(at_start, if index == 0 { 1.0 } else { 0.0 });
            assert_eq!(at_end, if index == size - 1 { 1.0 } else { 0.0 });
        }
    }
}

#[test]
fn interior_basis_matches_closed_form() {
    // Cubic at t = 1/4: (3/4)^3, 3*(3/4)^2*(1/4), 3*(3/4)*(1/4)^2, (1/4)^3
    let expected = [27.0 / 64.0, 27.0 / 64.0, 9.0 / 64.0, 1.0 / 64.0];
    let tol = Tolerance::new(1e-15);
    for (index, want) in expected.iter().enumerate() {
        assert!(tol.approx_eq_f64(basis(4, index, 256, RESOLUTION), *want));
        assert!(tol.approx_eq_f64(bernstein_weight(4, index, 0.25), *want));
    }
}

#[test]
fn step_evaluation_agrees_with_continuous_evaluation() {
    let patch = BezierPatch::new(warped_grid(), RESOLUTION);
    let tol = Tolerance::new(1e-9);

    for &(row, col) in &[(0, 0), (4, 1000), (512, 512), (100, 900), (1024, 1024), (1020, 8)] {
        let stepped = patch.evaluate_point(row, col);
        let continuous = patch.point_at(
            f64::from(row) / f64::from(RESOLUTION),
            f64::from(col) / f64::from(RESOLUTION),
        );
        assert!(
            tol.approx_eq_point3(stepped, continuous),
            "({row}, {col}): {stepped:?} vs {continuous:?}"
        );
    }
}

#[test]
fn evenly_spaced_flat_grid_reproduces_linear_map() {
    let grid = ControlGrid::flat_rectangle(3, 4, 300.0, 400.0).expect("grid");
    let patch = BezierPatch::new(grid, RESOLUTION);
    let tol = Tolerance::new(1e-9);

    for &(row, col) in &[(0, 0), (4, 4), (256, 768), (1000, 12), (1020, 1020)] {
        let p = patch.evaluate_point(row, col);
        let expected = Point3::new(
            300.0 * f64::from(col) / f64::from(RESOLUTION),
            400.0 * f64::from(row) / f64::from(RESOLUTION),
            0.0,
        );
        assert!(tol.approx_eq_point3(p, expected), "({row}, {col}): {p:?}");
    }
}

#[test]
fn single_point_grid_is_constant() {
    let p = Point3::new(3.0, -2.0, 9.0);
    let grid = ControlGrid::new(1, 1, vec![p]).expect("1x1 grid");
    let patch = BezierPatch::new(grid, RESOLUTION);

    for &(row, col) in &[(0, 0), (17, 900), (RESOLUTION, RESOLUTION)] {
        assert_eq!(patch.evaluate_point(row, col), p);
    }
}

#[test]
fn control_grid_validation() {
    assert_eq!(
        ControlGrid::new(0, 3, Vec::new()),
        Err(SurfaceError::EmptyGrid { rows: 0, cols: 3 })
    );
    assert!(matches!(
        ControlGrid::new(3, 11, vec![Point3::ORIGIN; 33]),
        Err(SurfaceError::GridTooLarge { cols: 11, .. })
    ));
    assert!(matches!(
        ControlGrid::new(2, 2, vec![Point3::ORIGIN; 3]),
        Err(SurfaceError::ControlPointCount { expected: 4, actual: 3, .. })
    ));

    let mut points = vec![Point3::ORIGIN; 4];
    points[2] = Point3::new(0.0, f64::NAN, 0.0);
    assert_eq!(
        ControlGrid::new(2, 2, points),
        Err(SurfaceError::NonFiniteControlPoint { index: 2 })
    );
}

#[test]
fn control_grid_is_row_major() {
    let points: Vec<Point3> = (0..6).map(|i| Point3::new(f64::from(i), 0.0, 0.0)).collect();
    let grid = ControlGrid::new(2, 3, points).expect("grid");

    assert_eq!(grid.get(0, 2).x, 2.0);
    assert_eq!(grid.get(1, 0).x, 3.0);
    assert_eq!(grid.get(1, 2).x, 5.0);

    let bounds = grid.bounds();
    assert_eq!(bounds.min, Point3::new(0.0, 0.0, 0.0));
    assert_eq!(bounds.max, Point3::new(5.0, 0.0, 0.0));
}

#[test]
fn steps_past_resolution_clamp_to_far_edge() {
    let grid = warped_grid();
    let patch = BezierPatch::new(grid.clone(), RESOLUTION);

    for index in 0..4 {
        assert_eq!(
            basis(4, index, RESOLUTION + 100, RESOLUTION),
            basis(4, index, RESOLUTION, RESOLUTION)
        );
    }
    assert_eq!(patch.evaluate_point(u32::MAX, u32::MAX), grid.get(2, 3));
    assert_eq!(patch.evaluate_point(0, RESOLUTION * 2), grid.get(0, 3));
}
