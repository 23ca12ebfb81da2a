//! Immutabele evaluatie-context.
//!
//! Tijdens een pull bouwen instantiatie-blokken een keten van frames op:
//! een kind-context leent zijn ouder, en het verlaten van de scope is het
//! "poppen". Lookups lopen de keten van binnen naar buiten af; buiten elk
//! frame leveren contextuele bronnen `Null`.

use crate::geom::VertexData;

/// Frame voor een lopende instantiatie-iteratie.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ExecutionFrame {
    /// Vertex-, face- of instantie-index, al vertaald door een eventuele
    /// dedup-map naar de oorspronkelijke vertex.
    pub index: i64,
    /// Teller die alleen bij een geslaagde iteratie doorloopt.
    pub loop_index: i64,
    pub face_index: Option<i64>,
    pub position: Option<[f64; 3]>,
    pub normal: Option<[f64; 3]>,
    pub uv: Option<[f64; 2]>,
}

impl ExecutionFrame {
    #[must_use]
    pub fn new(index: i64, loop_index: i64) -> Self {
        Self {
            index,
            loop_index,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_face(mut self, face_index: i64) -> Self {
        self.face_index = Some(face_index);
        self
    }

    #[must_use]
    pub fn with_position(mut self, position: [f64; 3]) -> Self {
        self.position = Some(position);
        self
    }

    #[must_use]
    pub fn with_normal(mut self, normal: [f64; 3]) -> Self {
        self.normal = Some(normal);
        self
    }

    #[must_use]
    pub fn with_uv(mut self, uv: [f64; 2]) -> Self {
        self.uv = Some(uv);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstancingFrame {
    pub instance_index: i64,
}

#[derive(Debug, Clone, Copy)]
pub struct GeometryFrame<'a> {
    pub geometry: &'a VertexData,
}

#[derive(Debug, Clone, Copy)]
pub enum Frame<'a> {
    Execution(ExecutionFrame),
    Instancing(InstancingFrame),
    Geometry(GeometryFrame<'a>),
}

/// Keten van frames; de wortel is leeg.
#[derive(Debug, Clone, Copy, Default)]
pub struct EvalContext<'a> {
    parent: Option<&'a EvalContext<'a>>,
    frame: Option<Frame<'a>>,
}

impl<'a> EvalContext<'a> {
    #[must_use]
    pub const fn root() -> Self {
        Self {
            parent: None,
            frame: None,
        }
    }

    #[must_use]
    pub fn with_execution(&'a self, frame: ExecutionFrame) -> EvalContext<'a> {
        self.child(Frame::Execution(frame))
    }

    #[must_use]
    pub fn with_instancing(&'a self, instance_index: i64) -> EvalContext<'a> {
        self.child(Frame::Instancing(InstancingFrame { instance_index }))
    }

    #[must_use]
    pub fn with_geometry(&'a self, geometry: &'a VertexData) -> EvalContext<'a> {
        self.child(Frame::Geometry(GeometryFrame { geometry }))
    }

    fn child(&'a self, frame: Frame<'a>) -> EvalContext<'a> {
        EvalContext {
            parent: Some(self),
            frame: Some(frame),
        }
    }

    /// Binnenste execution-frame, als dat er is.
    #[must_use]
    pub fn execution(&self) -> Option<&ExecutionFrame> {
        let mut cursor = Some(self);
        while let Some(ctx) = cursor {
            if let Some(Frame::Execution(frame)) = &ctx.frame {
                return Some(frame);
            }
            cursor = ctx.parent;
        }
        None
    }

    /// Binnenste instancing-index, als die er is.
    #[must_use]
    pub fn instance_index(&self) -> Option<i64> {
        let mut cursor = Some(self);
        while let Some(ctx) = cursor {
            if let Some(Frame::Instancing(frame)) = &ctx.frame {
                return Some(frame.instance_index);
            }
            cursor = ctx.parent;
        }
        None
    }

    /// Binnenste geometry-snapshot, als dat er is.
    #[must_use]
    pub fn geometry(&self) -> Option<&'a VertexData> {
        let mut cursor = Some(self);
        while let Some(ctx) = cursor {
            if let Some(Frame::Geometry(frame)) = &ctx.frame {
                return Some(frame.geometry);
            }
            cursor = ctx.parent;
        }
        None
    }
}
