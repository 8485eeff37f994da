use nodegeo_engine::components::{ComponentError, ComponentKind, ComponentRegistry};
use nodegeo_engine::geom::{
    Axis, BendOptions, ElementKind, Point3, SelectOptions, SelectionCriterion, SolidTopology,
    Vec3,
};
use nodegeo_engine::graph::node::{MetaMap, MetaValue};
use nodegeo_engine::graph::value::Value;
use nodegeo_engine::{
    BendRequest, GridInput, Operand, SelectRequest, SolidInput, VectorMathRequest, run_bend,
    run_select, run_vector_math,
};

fn flat_rows(rows: usize, columns: usize, size: f64, z: f64) -> Vec<Vec<[f64; 3]>> {
    (0..rows)
        .map(|i| {
            (0..columns)
                .map(|j| {
                    [
                        size * i as f64 / (rows - 1) as f64,
                        size * j as f64 / (columns - 1) as f64,
                        z,
                    ]
                })
                .collect()
        })
        .collect()
}

fn grid_value(rows: &[Vec<[f64; 3]>]) -> Value {
    Value::List(
        rows.iter()
            .map(|row| Value::List(row.iter().map(|&p| Value::Point(p)).collect()))
            .collect(),
    )
}

#[test]
fn bend_request_on_flat_surface() {
    let request = BendRequest {
        vertices: GridInput::Single(flat_rows(3, 3, 1.0, 0.5)),
        surface: GridInput::Single(flat_rows(4, 4, 1.0, 0.0)),
        options: BendOptions::default(),
    };
    let response = run_bend(request).expect("bend succeeds");

    assert_eq!(response.vertices.len(), 1);
    assert_eq!(response.diagnostics[0].point_count, 9);
    assert_eq!(response.diagnostics[0].surface_shape, [4, 4]);
    let centre = response.vertices[0][1][1];
    assert!((centre[0] - 0.5).abs() < 1e-9);
    assert!((centre[1] - 0.5).abs() < 1e-9);
    assert!((centre[2] - 0.5).abs() < 1e-9);
}

#[test]
fn bend_request_batch_repeats_surface() {
    let request = BendRequest {
        vertices: GridInput::Batch(vec![flat_rows(2, 2, 1.0, 0.0), flat_rows(3, 2, 1.0, 1.0)]),
        surface: GridInput::Single(flat_rows(3, 3, 2.0, 0.0)),
        options: BendOptions::default().auto_scale(true).orientation(Axis::Z),
    };
    let response = run_bend(request).expect("bend succeeds");

    assert_eq!(response.vertices.len(), 2);
    assert_eq!(response.vertices[1].len(), 3);
    assert!((response.diagnostics[1].scale - 2.0).abs() < 1e-9);
    assert!((response.diagnostics[1].max_displacement - 2.0).abs() < 1e-9);
}

#[test]
fn bend_request_rejects_ragged_grid() {
    let mut ragged = flat_rows(3, 3, 1.0, 0.0);
    ragged[1].pop();
    let request = BendRequest {
        vertices: GridInput::Single(ragged),
        surface: GridInput::Single(flat_rows(3, 3, 1.0, 0.0)),
        options: BendOptions::default(),
    };
    assert!(run_bend(request).is_err());
}

#[test]
fn select_request_on_polygon_solid() {
    // Triangular prism: bottom at z=0, top at z=1.
    let vertices = vec![
        [0.0, 0.0, 0.0],
        [1.0, 0.0, 0.0],
        [0.0, 1.0, 0.0],
        [0.0, 0.0, 1.0],
        [1.0, 0.0, 1.0],
        [0.0, 1.0, 1.0],
    ];
    let faces = vec![
        vec![0, 2, 1],
        vec![3, 4, 5],
        vec![0, 1, 4, 3],
        vec![1, 2, 5, 4],
        vec![2, 0, 3, 5],
    ];
    let request = SelectRequest {
        solid: SolidInput::Polygons { vertices, faces },
        options: SelectOptions::new(ElementKind::Faces, SelectionCriterion::Normal)
            .direction(Vec3::Z)
            .percent(0.0),
    };
    let masks = run_select(request).expect("selection succeeds");

    assert_eq!(masks.faces, vec![false, true, false, false, false]);
    assert_eq!(masks.vertices, vec![false, false, false, true, true, true]);
    assert_eq!(masks.count(ElementKind::Edges), 3);
}

#[test]
fn select_request_reports_unsupported_criterion() {
    let request = SelectRequest {
        solid: SolidInput::Cuboid {
            min: [0.0; 3],
            max: [1.0; 3],
        },
        options: SelectOptions::new(ElementKind::Vertices, SelectionCriterion::Direction),
    };
    assert!(run_select(request).is_err());
}

#[test]
fn vector_math_request_round_trip() {
    let request = VectorMathRequest {
        op: "Cross product".to_owned(),
        a: Operand::List(vec![Operand::Triple([1.0, 0.0, 0.0]), Operand::Triple([0.0, 1.0, 0.0])]),
        b: Some(Operand::Triple([0.0, 0.0, 1.0])),
    };
    let result = run_vector_math(request).expect("cross succeeds");
    assert_eq!(
        result,
        Operand::List(vec![
            Operand::Triple([0.0, -1.0, 0.0]),
            Operand::Triple([1.0, 0.0, 0.0]),
        ])
    );

    let unknown = VectorMathRequest {
        op: "NOISE-V".to_owned(),
        a: Operand::Triple([0.0; 3]),
        b: None,
    };
    assert!(run_vector_math(unknown).is_err());
}

#[test]
fn registry_dispatches_all_components() {
    let registry = ComponentRegistry::default();

    let bend = registry.resolve("bend along surface").expect("bend registered");
    let outputs = bend
        .evaluate(
            &[
                grid_value(&flat_rows(2, 2, 1.0, 0.25)),
                grid_value(&flat_rows(3, 3, 1.0, 0.0)),
            ],
            &MetaMap::new(),
        )
        .expect("bend evaluates");
    assert_eq!(outputs["Vertices"].expect_list().unwrap().len(), 1);

    let select = registry.resolve("Select Solid Elements").expect("select registered");
    let mut meta = MetaMap::new();
    meta.insert("element".to_owned(), MetaValue::from("EDGES"));
    meta.insert("criteria".to_owned(), MetaValue::from("DIRECTION"));
    let cylinder = SolidTopology::cylinder(Point3::ORIGIN, 1.0, 2.0).unwrap();
    let outputs = select
        .evaluate(
            &[Value::from(cylinder), Value::Vector([0.0, 0.0, 1.0]), Value::List(vec![]), Value::Number(0.0)],
            &meta,
        )
        .expect("select evaluates");
    let edges = outputs["EdgesMask"].expect_list().unwrap()[0].clone();
    assert_eq!(edges, Value::from(vec![false, false, true]));

    let length = ComponentKind::from_name("LEN").expect("LEN registered");
    let outputs = length
        .evaluate(&[Value::Vector([3.0, 4.0, 12.0])], &MetaMap::new())
        .expect("length evaluates");
    assert_eq!(outputs["Out"], Value::Number(13.0));
}

#[test]
fn component_errors_are_not_swallowed() {
    let inverse = ComponentKind::from_name("1/SCALAR").unwrap();
    let err = inverse
        .evaluate(
            &[
                Value::List(vec![Value::Vector([1.0, 2.0, 3.0]), Value::Vector([1.0, 1.0, 1.0])]),
                Value::List(vec![Value::Number(2.0), Value::Number(0.0)]),
            ],
            &MetaMap::new(),
        )
        .unwrap_err();
    assert!(matches!(err, ComponentError::Message(_)));

    let bend = ComponentKind::from_name("Bend").unwrap();
    let err = bend
        .evaluate(&[Value::Number(1.0), Value::Number(2.0)], &MetaMap::new())
        .unwrap_err();
    assert!(!err.message().is_empty());
}
