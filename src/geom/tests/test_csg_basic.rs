use crate::geom::{BooleanOperation, CsgError, Point3, VertexData, boolean, point_in_mesh};

/// Axis-aligned cube as a plain indexed buffer, outward winding.
fn cube(center: [f64; 3], size: f64) -> VertexData {
    let h = size * 0.5;
    let [cx, cy, cz] = center;
    let positions = vec![
        [cx - h, cy - h, cz - h],
        [cx + h, cy - h, cz - h],
        [cx + h, cy + h, cz - h],
        [cx - h, cy + h, cz - h],
        [cx - h, cy - h, cz + h],
        [cx + h, cy - h, cz + h],
        [cx + h, cy + h, cz + h],
        [cx - h, cy + h, cz + h],
    ];
    let indices = vec![
        0, 3, 2, 0, 2, 1, // -z
        4, 5, 6, 4, 6, 7, // +z
        0, 1, 5, 0, 5, 4, // -y
        3, 7, 6, 3, 6, 2, // +y
        0, 4, 7, 0, 7, 3, // -x
        1, 2, 6, 1, 6, 5, // +x
    ];
    VertexData::new(positions, indices)
}

fn extent(mesh: &VertexData) -> ([f64; 3], [f64; 3]) {
    let bbox = mesh.bounding_box().expect("non-empty result");
    (bbox.min.to_array(), bbox.max.to_array())
}

fn assert_arrays_close(a: [f64; 3], b: [f64; 3]) {
    for i in 0..3 {
        assert!((a[i] - b[i]).abs() < 1e-6, "component {i}: {a:?} vs {b:?}");
    }
}

#[test]
fn union_of_disjoint_cubes_covers_both() {
    let a = cube([0.0, 0.0, 0.0], 1.0);
    let b = cube([3.0, 0.0, 0.0], 1.0);
    let result = boolean(&a, &b, BooleanOperation::Union).expect("union");

    result.validate().expect("result consistent");
    let (min, max) = extent(&result);
    assert_arrays_close(min, [-0.5, -0.5, -0.5]);
    assert_arrays_close(max, [3.5, 0.5, 0.5]);
}

#[test]
fn union_with_self_keeps_extent() {
    let a = cube([0.0, 0.0, 0.0], 2.0);
    let result = boolean(&a, &a.clone(), BooleanOperation::Union).expect("union");

    assert!(result.triangle_count() > 0);
    let (min, max) = extent(&result);
    assert_arrays_close(min, [-1.0, -1.0, -1.0]);
    assert_arrays_close(max, [1.0, 1.0, 1.0]);
}

#[test]
fn subtract_with_self_is_empty() {
    let a = cube([0.0, 0.0, 0.0], 2.0);
    let result = boolean(&a, &a.clone(), BooleanOperation::Subtract).expect("subtract");
    assert_eq!(result.triangle_count(), 0);
}

#[test]
fn subtract_carves_overlap() {
    let a = cube([0.0, 0.0, 0.0], 2.0);
    let b = cube([1.0, 0.0, 0.0], 2.0);
    let result = boolean(&a, &b, BooleanOperation::Subtract).expect("subtract");

    result.validate().expect("result consistent");
    let (min, max) = extent(&result);
    assert_arrays_close(min, [-1.0, -1.0, -1.0]);
    // Everything beyond x = 0 was removed by b.
    assert_arrays_close(max, [0.0, 1.0, 1.0]);
}

#[test]
fn intersect_keeps_overlap_region() {
    let a = cube([0.0, 0.0, 0.0], 2.0);
    let b = cube([1.0, 1.0, 0.0], 2.0);
    let result = boolean(&a, &b, BooleanOperation::Intersect).expect("intersect");

    result.validate().expect("result consistent");
    let (min, max) = extent(&result);
    assert_arrays_close(min, [0.0, 0.0, -1.0]);
    assert_arrays_close(max, [1.0, 1.0, 1.0]);
}

#[test]
fn boolean_rejects_empty_operand() {
    let a = cube([0.0, 0.0, 0.0], 1.0);
    let empty = VertexData::default();
    assert_eq!(
        boolean(&a, &empty, BooleanOperation::Union),
        Err(CsgError::EmptyOperand)
    );
}

#[test]
fn result_carries_normals_and_optional_uvs() {
    let mut a = cube([0.0, 0.0, 0.0], 2.0);
    a.uvs = Some(vec![[0.25, 0.75]; a.vertex_count()]);
    let b = cube([1.0, 0.0, 0.0], 2.0);

    let result = boolean(&a, &b, BooleanOperation::Subtract).expect("subtract");
    assert!(result.normals.is_some());
    assert!(result.uvs.is_some());
    assert!(result.colors.is_none());
}

#[test]
fn point_in_mesh_parity() {
    let a = cube([0.0, 0.0, 0.0], 2.0);
    assert!(point_in_mesh(Point3::new(0.0, 0.0, 0.0), &a));
    assert!(point_in_mesh(Point3::new(0.9, 0.8, -0.7), &a));
    assert!(!point_in_mesh(Point3::new(2.0, 0.0, 0.0), &a));
    assert!(!point_in_mesh(Point3::new(-5.0, 3.0, 1.0), &a));
}
