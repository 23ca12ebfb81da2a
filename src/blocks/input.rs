//! Input-blokken: literalen en contextuele bronnen.
//!
//! Een literal draagt zijn waarde zelf en wordt gretig gecached; een
//! contextuele bron leest het actieve frame tijdens een instantiatie-lus
//! en is daarom altijd contextueel.

use serde::{Deserialize, Serialize};

use crate::graph::Graph;
use crate::graph::block::{Block, InputPin, OutputPin};
use crate::graph::context::EvalContext;
use crate::graph::evaluator::GeometryBuild;
use crate::graph::value::{PointType, Value};

use super::{BuildResult, Registration, single_output};

pub const PIN_OUTPUT: &str = "output";

/// Contextuele bron die tijdens een instantiatie-lus wordt uitgelezen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContextualSource {
    Positions,
    Normals,
    Colors,
    Uvs,
    VertexId,
    FaceId,
    LoopId,
    InstanceId,
    GeometryId,
    CollectionId,
}

impl ContextualSource {
    #[must_use]
    pub const fn point_type(self) -> PointType {
        match self {
            Self::Positions | Self::Normals => PointType::Vector3,
            Self::Uvs => PointType::Vector2,
            Self::Colors => PointType::Vector4,
            Self::VertexId
            | Self::FaceId
            | Self::LoopId
            | Self::InstanceId
            | Self::GeometryId
            | Self::CollectionId => PointType::Int,
        }
    }
}

/// Eigenschappen van een `GeometryInputBlock`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct InputBlock {
    pub value: Value,
    pub contextual: Option<ContextualSource>,
}

impl Default for InputBlock {
    fn default() -> Self {
        Self {
            value: Value::Null,
            contextual: None,
        }
    }
}

pub const REGISTRATIONS: &[Registration] = &[Registration {
    class_name: "GeometryInputBlock",
    make: || super::BlockKind::Input(InputBlock::default()),
}];

impl InputBlock {
    #[must_use]
    pub fn literal(value: Value) -> Self {
        Self {
            value,
            contextual: None,
        }
    }

    #[must_use]
    pub fn contextual(source: ContextualSource) -> Self {
        Self {
            value: Value::Null,
            contextual: Some(source),
        }
    }

    pub fn set_value(&mut self, value: Value) {
        self.value = value;
    }

    #[must_use]
    pub fn class_name(&self) -> &'static str {
        "GeometryInputBlock"
    }

    #[must_use]
    pub fn input_pins(&self) -> Vec<InputPin> {
        Vec::new()
    }

    #[must_use]
    pub fn output_pins(&self) -> Vec<OutputPin> {
        let point_type = match self.contextual {
            Some(source) => source.point_type(),
            None => PointType::of_kind(self.value.kind()).unwrap_or(PointType::AutoDetect),
        };
        vec![OutputPin::new(PIN_OUTPUT, point_type)]
    }

    #[must_use]
    pub fn evaluate_context(&self) -> bool {
        self.contextual.is_some()
    }

    pub fn build(
        &self,
        _graph: &Graph,
        _block: &Block,
        _state: &mut GeometryBuild,
        ctx: &EvalContext<'_>,
    ) -> BuildResult {
        let value = match self.contextual {
            None => self.value.clone(),
            Some(source) => resolve_contextual(source, ctx),
        };
        Ok(single_output(PIN_OUTPUT, value))
    }

    pub fn serialize_properties(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }

    pub fn apply_properties(&mut self, properties: &serde_json::Value) -> serde_json::Result<()> {
        *self = serde_json::from_value(properties.clone())?;
        Ok(())
    }
}

fn vertex_index(ctx: &EvalContext<'_>) -> Option<usize> {
    let index = ctx.execution()?.index;
    usize::try_from(index).ok()
}

fn resolve_contextual(source: ContextualSource, ctx: &EvalContext<'_>) -> Value {
    match source {
        ContextualSource::Positions => {
            if let Some(position) = ctx.execution().and_then(|frame| frame.position) {
                return Value::Vector3(position);
            }
            match (ctx.geometry(), vertex_index(ctx)) {
                (Some(data), Some(index)) => data
                    .positions
                    .get(index)
                    .map_or(Value::Null, |p| Value::Vector3(*p)),
                _ => Value::Null,
            }
        }
        ContextualSource::Normals => {
            if let Some(normal) = ctx.execution().and_then(|frame| frame.normal) {
                return Value::Vector3(normal);
            }
            match (ctx.geometry().and_then(|d| d.normals.as_deref()), vertex_index(ctx)) {
                (Some(normals), Some(index)) => normals
                    .get(index)
                    .map_or(Value::Null, |n| Value::Vector3(*n)),
                _ => Value::Null,
            }
        }
        ContextualSource::Uvs => {
            if let Some(uv) = ctx.execution().and_then(|frame| frame.uv) {
                return Value::Vector2(uv);
            }
            match (ctx.geometry().and_then(|d| d.uvs.as_deref()), vertex_index(ctx)) {
                (Some(uvs), Some(index)) => {
                    uvs.get(index).map_or(Value::Null, |uv| Value::Vector2(*uv))
                }
                _ => Value::Null,
            }
        }
        ContextualSource::Colors => {
            match (ctx.geometry().and_then(|d| d.colors.as_deref()), vertex_index(ctx)) {
                (Some(colors), Some(index)) => colors
                    .get(index)
                    .map_or(Value::Null, |c| Value::Vector4(*c)),
                _ => Value::Null,
            }
        }
        ContextualSource::VertexId => ctx
            .execution()
            .map_or(Value::Null, |frame| Value::Int(frame.index)),
        ContextualSource::FaceId => ctx
            .execution()
            .and_then(|frame| frame.face_index)
            .map_or(Value::Null, Value::Int),
        ContextualSource::LoopId => ctx
            .execution()
            .map_or(Value::Null, |frame| Value::Int(frame.loop_index)),
        ContextualSource::InstanceId => ctx.instance_index().map_or(Value::Null, Value::Int),
        ContextualSource::GeometryId => ctx.geometry().map_or(Value::Null, |data| {
            Value::Int(i64::try_from(data.metadata.unique_id).unwrap_or(i64::MAX))
        }),
        ContextualSource::CollectionId => ctx.geometry().map_or(Value::Null, |data| {
            Value::Int(data.metadata.collection_id.unwrap_or(0))
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::context::ExecutionFrame;
    use crate::geom::VertexData;

    fn resolve(source: ContextualSource, ctx: &EvalContext<'_>) -> Value {
        resolve_contextual(source, ctx)
    }

    #[test]
    fn literal_reports_its_value_kind() {
        let block = InputBlock::literal(Value::Vector3([1.0, 2.0, 3.0]));
        assert_eq!(block.output_pins()[0].point_type, PointType::Vector3);
        assert!(!block.evaluate_context());

        let block = InputBlock::contextual(ContextualSource::LoopId);
        assert_eq!(block.output_pins()[0].point_type, PointType::Int);
        assert!(block.evaluate_context());
    }

    #[test]
    fn contextual_sources_yield_null_outside_a_loop() {
        let root = EvalContext::root();
        assert_eq!(resolve(ContextualSource::Positions, &root), Value::Null);
        assert_eq!(resolve(ContextualSource::VertexId, &root), Value::Null);
        assert_eq!(resolve(ContextualSource::InstanceId, &root), Value::Null);
        assert_eq!(resolve(ContextualSource::GeometryId, &root), Value::Null);
    }

    #[test]
    fn contextual_sources_read_the_active_frames() {
        let mut data = VertexData::new(
            vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            vec![0, 1, 2],
        );
        data.metadata.unique_id = 42;
        data.metadata.collection_id = Some(3);

        let root = EvalContext::root();
        let with_geometry = root.with_geometry(&data);
        let with_execution = with_geometry.with_execution(ExecutionFrame::new(1, 0));
        let ctx = with_execution.with_instancing(7);

        assert_eq!(
            resolve(ContextualSource::Positions, &ctx),
            Value::Vector3([1.0, 0.0, 0.0])
        );
        assert_eq!(resolve(ContextualSource::VertexId, &ctx), Value::Int(1));
        assert_eq!(resolve(ContextualSource::LoopId, &ctx), Value::Int(0));
        assert_eq!(resolve(ContextualSource::InstanceId, &ctx), Value::Int(7));
        assert_eq!(resolve(ContextualSource::GeometryId, &ctx), Value::Int(42));
        assert_eq!(resolve(ContextualSource::CollectionId, &ctx), Value::Int(3));
        // Geen normals op de bron: Null, geen fout.
        assert_eq!(resolve(ContextualSource::Normals, &ctx), Value::Null);
    }

    #[test]
    fn execution_overrides_win_over_buffers() {
        let data = VertexData::new(
            vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            vec![0, 1, 2],
        );
        let root = EvalContext::root();
        let with_geometry = root.with_geometry(&data);
        let frame = ExecutionFrame::new(0, 0)
            .with_position([9.0, 9.0, 9.0])
            .with_normal([0.0, 0.0, 1.0])
            .with_uv([0.25, 0.75]);
        let ctx = with_geometry.with_execution(frame);

        assert_eq!(
            resolve(ContextualSource::Positions, &ctx),
            Value::Vector3([9.0, 9.0, 9.0])
        );
        assert_eq!(
            resolve(ContextualSource::Normals, &ctx),
            Value::Vector3([0.0, 0.0, 1.0])
        );
        assert_eq!(
            resolve(ContextualSource::Uvs, &ctx),
            Value::Vector2([0.25, 0.75])
        );
    }

    #[test]
    fn out_of_range_lookups_yield_null() {
        let data = VertexData::new(
            vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            vec![0, 1, 2],
        );
        let root = EvalContext::root();
        let with_geometry = root.with_geometry(&data);
        let ctx = with_geometry.with_execution(ExecutionFrame::new(99, 0));
        assert_eq!(resolve(ContextualSource::Positions, &ctx), Value::Null);
    }
}
