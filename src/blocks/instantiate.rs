//! Instantiatieblokken: herhalen een instantie langs een teller, de
//! vertices of faces van een brongeometrie, of een volume.
//!
//! Alle varianten delen hetzelfde skelet: frames opbouwen, de instantie
//! binnen de lus pullen (zodat contextuele invoer per iteratie kan
//! verschillen), transformeren en samenvoegen. Een lege of `Null`-instantie
//! slaat de iteratie over zonder de loop-index te verbruiken.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::geom::{
    BBox, Point3, Quat, Tolerance, Transform, Vec3, VertexData, dedup_positions, point_in_mesh,
};
use crate::graph::Graph;
use crate::graph::block::{Block, InputPin, OutputPin};
use crate::graph::context::{EvalContext, ExecutionFrame};
use crate::graph::evaluator::{EvaluationError, GeometryBuild};
use crate::graph::value::{PointType, Value};

use super::coerce::{coerce_float, coerce_geometry, coerce_int, coerce_matrix, coerce_vector3};
use super::{BuildResult, Registration, single_output};

pub const PIN_OUTPUT: &str = "output";
const PIN_INSTANCE: &str = "instance";
const PIN_COUNT: &str = "count";
const PIN_GEOMETRY: &str = "geometry";
const PIN_MATRIX: &str = "matrix";
const PIN_POSITION: &str = "position";
const PIN_ROTATION: &str = "rotation";
const PIN_SCALING: &str = "scaling";
const PIN_DIRECTION: &str = "direction";
const PIN_DENSITY: &str = "density";
const PIN_OFFSET: &str = "offset";

/// Zoveel verworpen trekkingen per gevraagde instantie krijgt het
/// volumeblok voordat het opgeeft.
const MAX_REJECTIONS_PER_INSTANCE: u32 = 64;

/// Eigenschappen van een `InstantiateBlock`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct InstantiateBlock {
    pub evaluate_context: bool,
}

impl Default for InstantiateBlock {
    fn default() -> Self {
        Self {
            evaluate_context: true,
        }
    }
}

/// Eigenschappen van een `InstantiateLinearBlock`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct InstantiateLinearBlock {
    pub evaluate_context: bool,
}

impl Default for InstantiateLinearBlock {
    fn default() -> Self {
        Self {
            evaluate_context: true,
        }
    }
}

/// Eigenschappen van een `InstantiateOnVerticesBlock`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct InstantiateOnVerticesBlock {
    pub remove_duplicated_positions: bool,
    pub evaluate_context: bool,
}

impl Default for InstantiateOnVerticesBlock {
    fn default() -> Self {
        Self {
            remove_duplicated_positions: true,
            evaluate_context: true,
        }
    }
}

/// Eigenschappen van een `InstantiateOnFacesBlock`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct InstantiateOnFacesBlock {
    pub evaluate_context: bool,
}

impl Default for InstantiateOnFacesBlock {
    fn default() -> Self {
        Self {
            evaluate_context: true,
        }
    }
}

/// Eigenschappen van een `InstantiateOnVolumeBlock`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct InstantiateOnVolumeBlock {
    pub evaluate_context: bool,
}

impl Default for InstantiateOnVolumeBlock {
    fn default() -> Self {
        Self {
            evaluate_context: true,
        }
    }
}

/// Beschikbare instantiatieblokken.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BlockKind {
    Base(InstantiateBlock),
    Linear(InstantiateLinearBlock),
    OnVertices(InstantiateOnVerticesBlock),
    OnFaces(InstantiateOnFacesBlock),
    OnVolume(InstantiateOnVolumeBlock),
}

pub const REGISTRATIONS: &[Registration] = &[
    Registration {
        class_name: "InstantiateBlock",
        make: || super::BlockKind::Instantiate(BlockKind::Base(InstantiateBlock::default())),
    },
    Registration {
        class_name: "InstantiateLinearBlock",
        make: || super::BlockKind::Instantiate(BlockKind::Linear(InstantiateLinearBlock::default())),
    },
    Registration {
        class_name: "InstantiateOnVerticesBlock",
        make: || {
            super::BlockKind::Instantiate(BlockKind::OnVertices(
                InstantiateOnVerticesBlock::default(),
            ))
        },
    },
    Registration {
        class_name: "InstantiateOnFacesBlock",
        make: || {
            super::BlockKind::Instantiate(BlockKind::OnFaces(InstantiateOnFacesBlock::default()))
        },
    },
    Registration {
        class_name: "InstantiateOnVolumeBlock",
        make: || {
            super::BlockKind::Instantiate(BlockKind::OnVolume(InstantiateOnVolumeBlock::default()))
        },
    },
];

impl BlockKind {
    #[must_use]
    pub fn class_name(&self) -> &'static str {
        match self {
            Self::Base(_) => "InstantiateBlock",
            Self::Linear(_) => "InstantiateLinearBlock",
            Self::OnVertices(_) => "InstantiateOnVerticesBlock",
            Self::OnFaces(_) => "InstantiateOnFacesBlock",
            Self::OnVolume(_) => "InstantiateOnVolumeBlock",
        }
    }

    #[must_use]
    pub fn input_pins(&self) -> Vec<InputPin> {
        let instance = InputPin::new(PIN_INSTANCE, PointType::Geometry, Value::Null);
        let source = InputPin::new(PIN_GEOMETRY, PointType::Geometry, Value::Null);
        let count = InputPin::new(PIN_COUNT, PointType::Int, Value::Int(1)).with_min(0.0);
        let rotation = InputPin::new(PIN_ROTATION, PointType::Vector3, Value::Vector3([0.0; 3]));
        let scaling = InputPin::new(PIN_SCALING, PointType::Vector3, Value::Vector3([1.0; 3]))
            .accepting(&[PointType::Float]);
        let offset = InputPin::new(PIN_OFFSET, PointType::Vector3, Value::Vector3([0.0; 3]));

        match self {
            Self::Base(_) => vec![
                instance,
                count,
                InputPin::new(
                    PIN_MATRIX,
                    PointType::Matrix,
                    Value::Matrix(Transform::identity()),
                )
                .as_optional(),
                InputPin::new(PIN_POSITION, PointType::Vector3, Value::Vector3([0.0; 3])),
                rotation,
                scaling,
            ],
            Self::Linear(_) => vec![
                instance,
                count,
                InputPin::new(
                    PIN_DIRECTION,
                    PointType::Vector3,
                    Value::Vector3([1.0, 0.0, 0.0]),
                ),
                rotation,
                InputPin::new(PIN_SCALING, PointType::Vector3, Value::Vector3([0.0; 3]))
                    .accepting(&[PointType::Float]),
            ],
            Self::OnVertices(_) => vec![
                source,
                instance,
                InputPin::new(PIN_DENSITY, PointType::Float, Value::Float(1.0))
                    .with_range(0.0, 1.0),
                rotation,
                scaling,
                offset,
            ],
            Self::OnFaces(_) => vec![source, instance, rotation, scaling, offset],
            Self::OnVolume(_) => vec![source, instance, count, rotation, scaling],
        }
    }

    #[must_use]
    pub fn output_pins(&self) -> Vec<OutputPin> {
        vec![OutputPin::new(PIN_OUTPUT, PointType::Geometry)]
    }

    #[must_use]
    pub fn evaluate_context(&self) -> bool {
        match self {
            Self::Base(settings) => settings.evaluate_context,
            Self::Linear(settings) => settings.evaluate_context,
            Self::OnVertices(settings) => settings.evaluate_context,
            Self::OnFaces(settings) => settings.evaluate_context,
            Self::OnVolume(settings) => settings.evaluate_context,
        }
    }

    pub fn build(
        &self,
        graph: &Graph,
        block: &Block,
        state: &mut GeometryBuild,
        ctx: &EvalContext<'_>,
    ) -> BuildResult {
        let value = match self {
            Self::Base(_) => build_counted(graph, block, state, ctx)?,
            Self::Linear(_) => build_linear(graph, block, state, ctx)?,
            Self::OnVertices(settings) => build_on_vertices(settings, graph, block, state, ctx)?,
            Self::OnFaces(_) => build_on_faces(graph, block, state, ctx)?,
            Self::OnVolume(_) => build_on_volume(graph, block, state, ctx)?,
        };
        Ok(single_output(PIN_OUTPUT, value))
    }

    pub fn serialize_properties(&self) -> serde_json::Result<serde_json::Value> {
        match self {
            Self::Base(settings) => serde_json::to_value(settings),
            Self::Linear(settings) => serde_json::to_value(settings),
            Self::OnVertices(settings) => serde_json::to_value(settings),
            Self::OnFaces(settings) => serde_json::to_value(settings),
            Self::OnVolume(settings) => serde_json::to_value(settings),
        }
    }

    pub fn apply_properties(&mut self, properties: &serde_json::Value) -> serde_json::Result<()> {
        match self {
            Self::Base(settings) => *settings = serde_json::from_value(properties.clone())?,
            Self::Linear(settings) => *settings = serde_json::from_value(properties.clone())?,
            Self::OnVertices(settings) => *settings = serde_json::from_value(properties.clone())?,
            Self::OnFaces(settings) => *settings = serde_json::from_value(properties.clone())?,
            Self::OnVolume(settings) => *settings = serde_json::from_value(properties.clone())?,
        }
        Ok(())
    }
}

/// Verzamelt geplaatste instanties; de eerste kloon is de basis waar de
/// rest in samenvloeit. `placed` is tegelijk de loop-index.
#[derive(Default)]
struct Accumulated {
    merged: Option<VertexData>,
    placed: i64,
}

impl Accumulated {
    fn push(&mut self, mut instance: VertexData, transform: &Transform) {
        instance.transform(transform);
        match self.merged.as_mut() {
            Some(base) => base.merge(&instance),
            None => self.merged = Some(instance),
        }
        self.placed += 1;
    }

    /// Klonen behouden het geometry-id van hun bron; het samengevoegde
    /// resultaat draagt dus het id van de eerste instantie.
    fn finish(self) -> Value {
        self.merged.map_or(Value::Null, Value::Geometry)
    }
}

/// Schalen, dan roteren (Euler-XYZ), dan verplaatsen.
fn place(position: [f64; 3], rotation: [f64; 3], scaling: [f64; 3]) -> Transform {
    Transform::compose_trs(
        Vec3::from_array(position),
        Quat::from_euler_xyz(rotation[0], rotation[1], rotation[2]),
        Vec3::from_array(scaling),
    )
}

fn requested_count(
    graph: &Graph,
    block: &Block,
    state: &mut GeometryBuild,
    ctx: &EvalContext<'_>,
) -> Result<usize, EvaluationError> {
    let count = coerce_int(&state.input_value(graph, block, PIN_COUNT, ctx)?);
    Ok(usize::try_from(count.max(0)).unwrap_or(0))
}

fn build_counted(
    graph: &Graph,
    block: &Block,
    state: &mut GeometryBuild,
    ctx: &EvalContext<'_>,
) -> Result<Value, EvaluationError> {
    let count = requested_count(graph, block, state, ctx)?;
    let matrix_connected = state.has_connection(block.id, PIN_MATRIX);
    let mut acc = Accumulated::default();

    for index in 0..count {
        let index = index as i64;
        let exec_ctx = ctx.with_execution(ExecutionFrame::new(index, acc.placed));
        let inst_ctx = exec_ctx.with_instancing(index);

        let instance = state.input_value(graph, block, PIN_INSTANCE, &inst_ctx)?;
        let Some(instance) = coerce_geometry(instance) else {
            continue;
        };

        let transform = if matrix_connected {
            coerce_matrix(&state.input_value(graph, block, PIN_MATRIX, &inst_ctx)?)
        } else {
            let position =
                coerce_vector3(&state.input_value(graph, block, PIN_POSITION, &inst_ctx)?);
            let rotation =
                coerce_vector3(&state.input_value(graph, block, PIN_ROTATION, &inst_ctx)?);
            let scaling = coerce_vector3(&state.input_value(graph, block, PIN_SCALING, &inst_ctx)?);
            place(position, rotation, scaling)
        };
        acc.push(instance, &transform);
    }
    Ok(acc.finish())
}

fn build_linear(
    graph: &Graph,
    block: &Block,
    state: &mut GeometryBuild,
    ctx: &EvalContext<'_>,
) -> Result<Value, EvaluationError> {
    let count = requested_count(graph, block, state, ctx)?;
    let mut acc = Accumulated::default();

    for index in 0..count {
        let step = index as f64;
        let index = index as i64;
        let exec_ctx = ctx.with_execution(ExecutionFrame::new(index, acc.placed));
        let inst_ctx = exec_ctx.with_instancing(index);

        let instance = state.input_value(graph, block, PIN_INSTANCE, &inst_ctx)?;
        let Some(instance) = coerce_geometry(instance) else {
            continue;
        };

        let direction = coerce_vector3(&state.input_value(graph, block, PIN_DIRECTION, &inst_ctx)?);
        let rotation = coerce_vector3(&state.input_value(graph, block, PIN_ROTATION, &inst_ctx)?);
        let scaling = coerce_vector3(&state.input_value(graph, block, PIN_SCALING, &inst_ctx)?);

        // Stap 0 is de identiteit; elke volgende stap schuift, draait en
        // schaalt lineair verder.
        let translation = [
            direction[0] * step,
            direction[1] * step,
            direction[2] * step,
        ];
        let rotation = [rotation[0] * step, rotation[1] * step, rotation[2] * step];
        let scaling = [
            1.0 + scaling[0] * step,
            1.0 + scaling[1] * step,
            1.0 + scaling[2] * step,
        ];
        acc.push(instance, &place(translation, rotation, scaling));
    }
    Ok(acc.finish())
}

fn build_on_vertices(
    settings: &InstantiateOnVerticesBlock,
    graph: &Graph,
    block: &Block,
    state: &mut GeometryBuild,
    ctx: &EvalContext<'_>,
) -> Result<Value, EvaluationError> {
    let source = state.input_value(graph, block, PIN_GEOMETRY, ctx)?;
    let Some(source) = coerce_geometry(source) else {
        return Ok(Value::Null);
    };

    // (positie, oorspronkelijke vertex-index); na wellen wijst de index nog
    // steeds naar de oorspronkelijke vertex.
    let candidates: Vec<([f64; 3], i64)> = if settings.remove_duplicated_positions {
        let dedup = dedup_positions(&source.positions, Tolerance::WELD.eps);
        dedup
            .kept
            .iter()
            .zip(&dedup.kept_source)
            .map(|(&position, &original)| (position, original as i64))
            .collect()
    } else {
        source
            .positions
            .iter()
            .enumerate()
            .map(|(index, &position)| (position, index as i64))
            .collect()
    };

    let geometry_ctx = ctx.with_geometry(&source);
    let mut acc = Accumulated::default();

    for (position, index) in candidates {
        let frame = ExecutionFrame::new(index, acc.placed).with_position(position);
        let exec_ctx = geometry_ctx.with_execution(frame);
        let inst_ctx = exec_ctx.with_instancing(index);

        let density = coerce_float(&state.input_value(graph, block, PIN_DENSITY, &inst_ctx)?)
            .clamp(0.0, 1.0);
        let draw: f64 = state.rng().random();
        if draw > density {
            continue;
        }

        let instance = state.input_value(graph, block, PIN_INSTANCE, &inst_ctx)?;
        let Some(instance) = coerce_geometry(instance) else {
            continue;
        };

        let rotation = coerce_vector3(&state.input_value(graph, block, PIN_ROTATION, &inst_ctx)?);
        let scaling = coerce_vector3(&state.input_value(graph, block, PIN_SCALING, &inst_ctx)?);
        let offset = coerce_vector3(&state.input_value(graph, block, PIN_OFFSET, &inst_ctx)?);
        let target = [
            position[0] + offset[0],
            position[1] + offset[1],
            position[2] + offset[2],
        ];
        acc.push(instance, &place(target, rotation, scaling));
    }
    Ok(acc.finish())
}

fn build_on_faces(
    graph: &Graph,
    block: &Block,
    state: &mut GeometryBuild,
    ctx: &EvalContext<'_>,
) -> Result<Value, EvaluationError> {
    let source = state.input_value(graph, block, PIN_GEOMETRY, ctx)?;
    let Some(source) = coerce_geometry(source) else {
        return Ok(Value::Null);
    };

    let samples = face_samples(&source);
    let geometry_ctx = ctx.with_geometry(&source);
    let mut acc = Accumulated::default();

    for sample in samples {
        let mut frame = ExecutionFrame::new(sample.index, acc.placed)
            .with_face(sample.index)
            .with_position(sample.centroid);
        if let Some(normal) = sample.normal {
            frame = frame.with_normal(normal);
        }
        if let Some(uv) = sample.uv {
            frame = frame.with_uv(uv);
        }
        let exec_ctx = geometry_ctx.with_execution(frame);
        let inst_ctx = exec_ctx.with_instancing(sample.index);

        let instance = state.input_value(graph, block, PIN_INSTANCE, &inst_ctx)?;
        let Some(instance) = coerce_geometry(instance) else {
            continue;
        };

        let rotation = coerce_vector3(&state.input_value(graph, block, PIN_ROTATION, &inst_ctx)?);
        let scaling = coerce_vector3(&state.input_value(graph, block, PIN_SCALING, &inst_ctx)?);
        let offset = coerce_vector3(&state.input_value(graph, block, PIN_OFFSET, &inst_ctx)?);
        let target = [
            sample.centroid[0] + offset[0],
            sample.centroid[1] + offset[1],
            sample.centroid[2] + offset[2],
        ];
        acc.push(instance, &place(target, rotation, scaling));
    }
    Ok(acc.finish())
}

fn build_on_volume(
    graph: &Graph,
    block: &Block,
    state: &mut GeometryBuild,
    ctx: &EvalContext<'_>,
) -> Result<Value, EvaluationError> {
    let source = state.input_value(graph, block, PIN_GEOMETRY, ctx)?;
    let Some(source) = coerce_geometry(source) else {
        return Ok(Value::Null);
    };
    let Some(bbox) = source.bounding_box() else {
        return Ok(Value::Null);
    };

    let count = requested_count(graph, block, state, ctx)?;
    let geometry_ctx = ctx.with_geometry(&source);
    let mut acc = Accumulated::default();

    for index in 0..count {
        let index = index as i64;

        let mut accepted = None;
        for _ in 0..MAX_REJECTIONS_PER_INSTANCE {
            let candidate = sample_in_bbox(state.rng(), &bbox);
            if point_in_mesh(Point3::from_array(candidate), &source) {
                accepted = Some(candidate);
                break;
            }
        }
        let Some(position) = accepted else {
            log::warn!(
                "volume-instantiatie op blok {}: geen binnenpunt na {MAX_REJECTIONS_PER_INSTANCE} pogingen",
                block.id
            );
            break;
        };

        let frame = ExecutionFrame::new(index, acc.placed).with_position(position);
        let exec_ctx = geometry_ctx.with_execution(frame);
        let inst_ctx = exec_ctx.with_instancing(index);

        let instance = state.input_value(graph, block, PIN_INSTANCE, &inst_ctx)?;
        let Some(instance) = coerce_geometry(instance) else {
            continue;
        };

        let rotation = coerce_vector3(&state.input_value(graph, block, PIN_ROTATION, &inst_ctx)?);
        let scaling = coerce_vector3(&state.input_value(graph, block, PIN_SCALING, &inst_ctx)?);
        acc.push(instance, &place(position, rotation, scaling));
    }
    Ok(acc.finish())
}

struct FaceSample {
    index: i64,
    centroid: [f64; 3],
    normal: Option<[f64; 3]>,
    uv: Option<[f64; 2]>,
}

/// Eén kandidaat per driehoek: zwaartepunt, facenormaal en gemiddelde uv.
fn face_samples(source: &VertexData) -> Vec<FaceSample> {
    let mut samples = Vec::with_capacity(source.triangle_count());
    for (face, tri) in source.indices.chunks_exact(3).enumerate() {
        let (ia, ib, ic) = (tri[0] as usize, tri[1] as usize, tri[2] as usize);
        let (Some(&pa), Some(&pb), Some(&pc)) = (
            source.positions.get(ia),
            source.positions.get(ib),
            source.positions.get(ic),
        ) else {
            continue;
        };

        let centroid = [
            (pa[0] + pb[0] + pc[0]) / 3.0,
            (pa[1] + pb[1] + pc[1]) / 3.0,
            (pa[2] + pb[2] + pc[2]) / 3.0,
        ];
        let a = Vec3::from_array(pa);
        let b = Vec3::from_array(pb);
        let c = Vec3::from_array(pc);
        let normal = (b - a).cross(c - a).normalized().map(Vec3::to_array);
        let uv = source.uvs.as_ref().and_then(|uvs| {
            let ua = uvs.get(ia)?;
            let ub = uvs.get(ib)?;
            let uc = uvs.get(ic)?;
            Some([
                (ua[0] + ub[0] + uc[0]) / 3.0,
                (ua[1] + ub[1] + uc[1]) / 3.0,
            ])
        });

        samples.push(FaceSample {
            index: face as i64,
            centroid,
            normal,
            uv,
        });
    }
    samples
}

fn sample_in_bbox<R: Rng>(rng: &mut R, bbox: &BBox) -> [f64; 3] {
    [
        bbox.min.x + rng.random::<f64>() * (bbox.max.x - bbox.min.x),
        bbox.min.y + rng.random::<f64>() * (bbox.max.y - bbox.min.y),
        bbox.min.z + rng.random::<f64>() * (bbox.max.z - bbox.min.z),
    ]
}
