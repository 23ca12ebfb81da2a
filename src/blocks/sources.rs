//! Bron-blokken die primitieve geometrie produceren.
//!
//! Elke bron stempelt een vers geometry-id op zijn uitvoer en klemt
//! ontaarde parameters op een minimale waarde in plaats van te falen.

use serde::{Deserialize, Serialize};

use crate::geom::VertexData;
use crate::graph::Graph;
use crate::graph::block::{Block, InputPin, OutputPin};
use crate::graph::context::EvalContext;
use crate::graph::evaluator::GeometryBuild;
use crate::graph::value::{PointType, Value};

use super::coerce::{coerce_float, coerce_int, coerce_vector3};
use super::{BuildResult, Registration, single_output};

pub const PIN_OUTPUT: &str = "output";
const PIN_SIZE: &str = "size";
const PIN_WIDTH: &str = "width";
const PIN_HEIGHT: &str = "height";
const PIN_DEPTH: &str = "depth";
const PIN_SEGMENTS: &str = "segments";
const PIN_DIAMETER: &str = "diameter";
const PIN_ROWS: &str = "rows";
const PIN_COLUMNS: &str = "columns";

/// Kleinste toegestane afmeting voor een bron.
const MIN_SIZE: f64 = 1e-6;

/// Eigenschappen van een `BoxBlock`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct BoxBlock {
    pub evaluate_context: bool,
}

impl Default for BoxBlock {
    fn default() -> Self {
        Self {
            evaluate_context: true,
        }
    }
}

/// Eigenschappen van een `PlaneBlock`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct PlaneBlock {
    pub evaluate_context: bool,
}

impl Default for PlaneBlock {
    fn default() -> Self {
        Self {
            evaluate_context: true,
        }
    }
}

/// Eigenschappen van een `SphereBlock`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct SphereBlock {
    pub evaluate_context: bool,
}

impl Default for SphereBlock {
    fn default() -> Self {
        Self {
            evaluate_context: true,
        }
    }
}

/// Eigenschappen van een `GridBlock`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct GridBlock {
    pub evaluate_context: bool,
}

impl Default for GridBlock {
    fn default() -> Self {
        Self {
            evaluate_context: true,
        }
    }
}

/// Beschikbare bron-blokken.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BlockKind {
    Box(BoxBlock),
    Plane(PlaneBlock),
    Sphere(SphereBlock),
    Grid(GridBlock),
}

pub const REGISTRATIONS: &[Registration] = &[
    Registration {
        class_name: "BoxBlock",
        make: || super::BlockKind::Source(BlockKind::Box(BoxBlock { evaluate_context: true })),
    },
    Registration {
        class_name: "PlaneBlock",
        make: || super::BlockKind::Source(BlockKind::Plane(PlaneBlock { evaluate_context: true })),
    },
    Registration {
        class_name: "SphereBlock",
        make: || super::BlockKind::Source(BlockKind::Sphere(SphereBlock { evaluate_context: true })),
    },
    Registration {
        class_name: "GridBlock",
        make: || super::BlockKind::Source(BlockKind::Grid(GridBlock { evaluate_context: true })),
    },
];

impl BlockKind {
    #[must_use]
    pub fn class_name(&self) -> &'static str {
        match self {
            Self::Box(_) => "BoxBlock",
            Self::Plane(_) => "PlaneBlock",
            Self::Sphere(_) => "SphereBlock",
            Self::Grid(_) => "GridBlock",
        }
    }

    #[must_use]
    pub fn input_pins(&self) -> Vec<InputPin> {
        match self {
            Self::Box(_) => vec![
                InputPin::new(PIN_SIZE, PointType::Vector3, Value::Vector3([1.0, 1.0, 1.0])),
                InputPin::new(PIN_WIDTH, PointType::Float, Value::Float(0.0)).as_optional(),
                InputPin::new(PIN_HEIGHT, PointType::Float, Value::Float(0.0)).as_optional(),
                InputPin::new(PIN_DEPTH, PointType::Float, Value::Float(0.0)).as_optional(),
            ],
            Self::Plane(_) => vec![
                InputPin::new(PIN_WIDTH, PointType::Float, Value::Float(1.0)),
                InputPin::new(PIN_HEIGHT, PointType::Float, Value::Float(1.0)),
            ],
            Self::Sphere(_) => vec![
                InputPin::new(PIN_SEGMENTS, PointType::Int, Value::Int(16)).with_min(2.0),
                InputPin::new(PIN_DIAMETER, PointType::Float, Value::Float(1.0)),
            ],
            Self::Grid(_) => vec![
                InputPin::new(PIN_WIDTH, PointType::Float, Value::Float(1.0)),
                InputPin::new(PIN_HEIGHT, PointType::Float, Value::Float(1.0)),
                InputPin::new(PIN_ROWS, PointType::Int, Value::Int(10)).with_min(1.0),
                InputPin::new(PIN_COLUMNS, PointType::Int, Value::Int(10)).with_min(1.0),
            ],
        }
    }

    #[must_use]
    pub fn output_pins(&self) -> Vec<OutputPin> {
        vec![OutputPin::new(PIN_OUTPUT, PointType::Geometry)]
    }

    #[must_use]
    pub fn evaluate_context(&self) -> bool {
        match self {
            Self::Box(settings) => settings.evaluate_context,
            Self::Plane(settings) => settings.evaluate_context,
            Self::Sphere(settings) => settings.evaluate_context,
            Self::Grid(settings) => settings.evaluate_context,
        }
    }

    pub fn build(
        &self,
        graph: &Graph,
        block: &Block,
        state: &mut GeometryBuild,
        ctx: &EvalContext<'_>,
    ) -> BuildResult {
        let mut data = match self {
            Self::Box(_) => {
                let size = coerce_vector3(&state.input_value(graph, block, PIN_SIZE, ctx)?);
                let width = coerce_float(&state.input_value(graph, block, PIN_WIDTH, ctx)?);
                let height = coerce_float(&state.input_value(graph, block, PIN_HEIGHT, ctx)?);
                let depth = coerce_float(&state.input_value(graph, block, PIN_DEPTH, ctx)?);
                make_box(
                    clamp_size(override_or(width, size[0])),
                    clamp_size(override_or(height, size[1])),
                    clamp_size(override_or(depth, size[2])),
                )
            }
            Self::Plane(_) => {
                let width = coerce_float(&state.input_value(graph, block, PIN_WIDTH, ctx)?);
                let height = coerce_float(&state.input_value(graph, block, PIN_HEIGHT, ctx)?);
                make_plane(clamp_size(width), clamp_size(height))
            }
            Self::Sphere(_) => {
                let segments = coerce_int(&state.input_value(graph, block, PIN_SEGMENTS, ctx)?);
                let diameter = coerce_float(&state.input_value(graph, block, PIN_DIAMETER, ctx)?);
                make_sphere(segments.max(2) as usize, clamp_size(diameter))
            }
            Self::Grid(_) => {
                let width = coerce_float(&state.input_value(graph, block, PIN_WIDTH, ctx)?);
                let height = coerce_float(&state.input_value(graph, block, PIN_HEIGHT, ctx)?);
                let rows = coerce_int(&state.input_value(graph, block, PIN_ROWS, ctx)?);
                let columns = coerce_int(&state.input_value(graph, block, PIN_COLUMNS, ctx)?);
                make_grid(
                    clamp_size(width),
                    clamp_size(height),
                    rows.max(1) as usize,
                    columns.max(1) as usize,
                )
            }
        };
        data.metadata.unique_id = state.fresh_geometry_id();
        Ok(single_output(PIN_OUTPUT, Value::Geometry(data)))
    }

    pub fn serialize_properties(&self) -> serde_json::Result<serde_json::Value> {
        match self {
            Self::Box(settings) => serde_json::to_value(settings),
            Self::Plane(settings) => serde_json::to_value(settings),
            Self::Sphere(settings) => serde_json::to_value(settings),
            Self::Grid(settings) => serde_json::to_value(settings),
        }
    }

    pub fn apply_properties(&mut self, properties: &serde_json::Value) -> serde_json::Result<()> {
        match self {
            Self::Box(settings) => *settings = serde_json::from_value(properties.clone())?,
            Self::Plane(settings) => *settings = serde_json::from_value(properties.clone())?,
            Self::Sphere(settings) => *settings = serde_json::from_value(properties.clone())?,
            Self::Grid(settings) => *settings = serde_json::from_value(properties.clone())?,
        }
        Ok(())
    }
}

/// Een expliciete as-maat van 0 betekent: gebruik de `size`-component.
fn override_or(value: f64, fallback: f64) -> f64 {
    if value == 0.0 { fallback } else { value }
}

fn clamp_size(value: f64) -> f64 {
    if value <= 0.0 { MIN_SIZE } else { value }
}

/// Doos rond de oorsprong: 24 vertices, 12 driehoeken, vlakke normalen.
fn make_box(width: f64, height: f64, depth: f64) -> VertexData {
    let hx = width / 2.0;
    let hy = height / 2.0;
    let hz = depth / 2.0;

    let mut positions: Vec<[f64; 3]> = Vec::with_capacity(24);
    let mut normals: Vec<[f64; 3]> = Vec::with_capacity(24);
    let mut uvs: Vec<[f64; 2]> = Vec::with_capacity(24);
    let mut indices: Vec<u32> = Vec::with_capacity(36);

    let mut add_face = |origin: [f64; 3], u: [f64; 3], v: [f64; 3], normal: [f64; 3]| {
        let base = positions.len() as u32;
        let corners = [
            origin,
            [origin[0] + u[0], origin[1] + u[1], origin[2] + u[2]],
            [
                origin[0] + u[0] + v[0],
                origin[1] + u[1] + v[1],
                origin[2] + u[2] + v[2],
            ],
            [origin[0] + v[0], origin[1] + v[1], origin[2] + v[2]],
        ];
        positions.extend_from_slice(&corners);
        normals.extend_from_slice(&[normal; 4]);
        uvs.extend_from_slice(&[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]]);
        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    };

    let w = [2.0 * hx, 0.0, 0.0];
    let h = [0.0, 2.0 * hy, 0.0];
    let d = [0.0, 0.0, 2.0 * hz];

    add_face([hx, -hy, -hz], h, d, [1.0, 0.0, 0.0]);
    add_face([-hx, -hy, -hz], d, h, [-1.0, 0.0, 0.0]);
    add_face([-hx, hy, -hz], d, w, [0.0, 1.0, 0.0]);
    add_face([-hx, -hy, -hz], w, d, [0.0, -1.0, 0.0]);
    add_face([-hx, -hy, hz], w, h, [0.0, 0.0, 1.0]);
    add_face([-hx, -hy, -hz], h, w, [0.0, 0.0, -1.0]);

    let mut data = VertexData::new(positions, indices);
    data.normals = Some(normals);
    data.uvs = Some(uvs);
    data
}

/// Enkele quad in het XY-vlak, normaal +Z.
fn make_plane(width: f64, height: f64) -> VertexData {
    let hx = width / 2.0;
    let hy = height / 2.0;

    let positions = vec![
        [-hx, -hy, 0.0],
        [hx, -hy, 0.0],
        [hx, hy, 0.0],
        [-hx, hy, 0.0],
    ];
    let indices = vec![0, 1, 2, 0, 2, 3];

    let mut data = VertexData::new(positions, indices);
    data.normals = Some(vec![[0.0, 0.0, 1.0]; 4]);
    data.uvs = Some(vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]]);
    data
}

/// Bol met een inclusief (rings+1)×(2·rings+1) rooster en radiale normalen.
fn make_sphere(segments: usize, diameter: f64) -> VertexData {
    let rows = segments;
    let cols = segments * 2;
    let radius = diameter / 2.0;

    let mut positions = Vec::with_capacity((rows + 1) * (cols + 1));
    let mut normals = Vec::with_capacity((rows + 1) * (cols + 1));
    let mut uvs = Vec::with_capacity((rows + 1) * (cols + 1));

    for i in 0..=rows {
        let v = i as f64 / rows as f64;
        let phi = std::f64::consts::PI * v;
        let (sin_phi, cos_phi) = phi.sin_cos();
        for j in 0..=cols {
            let u = j as f64 / cols as f64;
            let lambda = std::f64::consts::TAU * u;
            let (sin_lambda, cos_lambda) = lambda.sin_cos();
            let normal = [sin_phi * cos_lambda, cos_phi, sin_phi * sin_lambda];
            positions.push([normal[0] * radius, normal[1] * radius, normal[2] * radius]);
            normals.push(normal);
            uvs.push([u, 1.0 - v]);
        }
    }

    let mut indices = Vec::with_capacity(rows * cols * 6);
    let stride = (cols + 1) as u32;
    for i in 0..rows {
        for j in 0..cols {
            let a = i as u32 * stride + j as u32;
            let b = a + 1;
            let c = a + stride;
            let d = c + 1;
            indices.extend_from_slice(&[a, b, d, a, d, c]);
        }
    }

    let mut data = VertexData::new(positions, indices);
    data.normals = Some(normals);
    data.uvs = Some(uvs);
    data
}

/// Vlak rooster in het XZ-grondvlak, normaal +Y.
fn make_grid(width: f64, height: f64, rows: usize, columns: usize) -> VertexData {
    let mut positions = Vec::with_capacity((rows + 1) * (columns + 1));
    let mut uvs = Vec::with_capacity((rows + 1) * (columns + 1));

    for i in 0..=rows {
        let v = i as f64 / rows as f64;
        for j in 0..=columns {
            let u = j as f64 / columns as f64;
            positions.push([width * (u - 0.5), 0.0, height * (v - 0.5)]);
            uvs.push([u, v]);
        }
    }

    let mut indices = Vec::with_capacity(rows * columns * 6);
    let stride = (columns + 1) as u32;
    for i in 0..rows {
        for j in 0..columns {
            let a = i as u32 * stride + j as u32;
            let b = a + 1;
            let c = a + stride;
            let d = c + 1;
            indices.extend_from_slice(&[a, c, b, b, c, d]);
        }
    }

    let count = positions.len();
    let mut data = VertexData::new(positions, indices);
    data.normals = Some(vec![[0.0, 1.0, 0.0]; count]);
    data.uvs = Some(uvs);
    data
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn box_has_flat_faces_and_full_extent() {
        let data = make_box(2.0, 1.0, 4.0);
        assert_eq!(data.vertex_count(), 24);
        assert_eq!(data.triangle_count(), 12);
        data.validate().expect("geldige doos");

        let bbox = data.bounding_box().expect("bbox");
        let size = bbox.size();
        assert!((size.x - 2.0).abs() < 1e-12);
        assert!((size.y - 1.0).abs() < 1e-12);
        assert!((size.z - 4.0).abs() < 1e-12);
    }

    #[test]
    fn plane_is_a_single_quad_facing_up_z() {
        let data = make_plane(3.0, 2.0);
        assert_eq!(data.vertex_count(), 4);
        assert_eq!(data.triangle_count(), 2);
        data.validate().expect("geldig vlak");
        for normal in data.normals.as_deref().unwrap() {
            assert_eq!(*normal, [0.0, 0.0, 1.0]);
        }
    }

    #[test]
    fn sphere_grid_is_inclusive_and_radial() {
        let segments = 4;
        let data = make_sphere(segments, 2.0);
        let rows = segments;
        let cols = segments * 2;
        assert_eq!(data.vertex_count(), (rows + 1) * (cols + 1));
        assert_eq!(data.triangle_count(), rows * cols * 2);
        data.validate().expect("geldige bol");

        for position in &data.positions {
            let length = (position[0] * position[0]
                + position[1] * position[1]
                + position[2] * position[2])
                .sqrt();
            assert!((length - 1.0).abs() < 1e-9, "straal wijkt af: {length}");
        }
    }

    #[test]
    fn grid_lies_flat_in_the_ground_plane() {
        let data = make_grid(4.0, 2.0, 2, 3);
        assert_eq!(data.vertex_count(), 3 * 4);
        assert_eq!(data.triangle_count(), 2 * 3 * 2);
        data.validate().expect("geldig rooster");
        for position in &data.positions {
            assert_eq!(position[1], 0.0);
        }
    }

    #[test]
    fn zero_axis_override_falls_back_to_size() {
        assert_eq!(override_or(0.0, 2.5), 2.5);
        assert_eq!(override_or(3.0, 2.5), 3.0);
        assert_eq!(clamp_size(-1.0), MIN_SIZE);
        assert_eq!(clamp_size(0.0), MIN_SIZE);
    }
}
