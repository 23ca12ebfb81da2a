use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{BBox, Point3, Tolerance, Transform, Vec3};

// ─────────────────────────────────────────────────────────────────────────────
// Errors
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Error, PartialEq, Eq)]
pub enum VertexDataError {
    #[error("index buffer length {count} is not a multiple of 3")]
    IndicesNotTriangles { count: usize },
    #[error("index {index} out of range for {vertex_count} vertices")]
    IndexOutOfRange { index: u32, vertex_count: usize },
    #[error("attribute `{attribute}` has {found} entries, expected {expected}")]
    AttributeLength {
        attribute: &'static str,
        expected: usize,
        found: usize,
    },
}

// ─────────────────────────────────────────────────────────────────────────────
// VertexData
// ─────────────────────────────────────────────────────────────────────────────

/// Identity attached to a geometry buffer. The unique id is minted when the
/// buffer is created and survives cloning and transformation; the collection
/// id is set when a collection block hands the buffer out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GeometryMetadata {
    pub unique_id: u64,
    pub collection_id: Option<i64>,
}

/// Triangle-soup geometry buffers: positions plus an index buffer, with
/// optional per-vertex normals, uvs and colors. Attribute vectors, when
/// present, run parallel to `positions`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct VertexData {
    pub positions: Vec<[f64; 3]>,
    pub indices: Vec<u32>,
    pub normals: Option<Vec<[f64; 3]>>,
    pub uvs: Option<Vec<[f64; 2]>>,
    pub colors: Option<Vec<[f64; 4]>>,
    pub metadata: GeometryMetadata,
}

impl VertexData {
    #[must_use]
    pub fn new(positions: Vec<[f64; 3]>, indices: Vec<u32>) -> Self {
        Self {
            positions,
            indices,
            normals: None,
            uvs: None,
            colors: None,
            metadata: GeometryMetadata::default(),
        }
    }

    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty() || self.indices.is_empty()
    }

    /// Check buffer consistency: triangle indices, index range, attribute
    /// lengths parallel to positions.
    pub fn validate(&self) -> Result<(), VertexDataError> {
        if self.indices.len() % 3 != 0 {
            return Err(VertexDataError::IndicesNotTriangles {
                count: self.indices.len(),
            });
        }
        let vertex_count = self.positions.len();
        for &index in &self.indices {
            if index as usize >= vertex_count {
                return Err(VertexDataError::IndexOutOfRange {
                    index,
                    vertex_count,
                });
            }
        }
        check_attribute("normals", self.normals.as_deref(), vertex_count)?;
        check_attribute("uvs", self.uvs.as_deref(), vertex_count)?;
        check_attribute("colors", self.colors.as_deref(), vertex_count)?;
        Ok(())
    }

    #[must_use]
    pub fn bounding_box(&self) -> Option<BBox> {
        let points: Vec<Point3> = self
            .positions
            .iter()
            .map(|&p| Point3::from_array(p))
            .collect();
        BBox::from_points(&points)
    }

    /// Apply a transform in place: positions as points, normals as directions
    /// (renormalized afterwards).
    pub fn transform(&mut self, t: &Transform) {
        for position in &mut self.positions {
            *position = t.apply_point(Point3::from_array(*position)).to_array();
        }
        if let Some(normals) = &mut self.normals {
            for normal in normals.iter_mut() {
                let mapped = t.apply_vec(Vec3::from_array(*normal));
                *normal = mapped.normalized().unwrap_or(Vec3::ZERO).to_array();
            }
        }
    }

    /// Append `other` onto this buffer. Index values are offset; when one
    /// side misses an attribute the other side has, the gap is zero-filled so
    /// both sides end up with the same layout.
    pub fn merge(&mut self, other: &Self) {
        let base = self.positions.len();
        let offset = base as u32;
        let total = base + other.positions.len();

        merge_attribute(&mut self.normals, other.normals.as_deref(), base, total, [0.0; 3]);
        merge_attribute(&mut self.uvs, other.uvs.as_deref(), base, total, [0.0; 2]);
        merge_attribute(&mut self.colors, other.colors.as_deref(), base, total, [0.0; 4]);

        self.positions.extend_from_slice(&other.positions);
        self.indices.reserve(other.indices.len());
        self.indices.extend(other.indices.iter().map(|&i| i + offset));
    }

    /// Recompute smooth per-vertex normals, weighting each incident face by
    /// its area (the unnormalized cross product).
    pub fn compute_normals(&mut self) {
        let mut accum = vec![Vec3::ZERO; self.positions.len()];
        for tri in self.indices.chunks_exact(3) {
            let (ia, ib, ic) = (tri[0] as usize, tri[1] as usize, tri[2] as usize);
            let (Some(&pa), Some(&pb), Some(&pc)) = (
                self.positions.get(ia),
                self.positions.get(ib),
                self.positions.get(ic),
            ) else {
                continue;
            };
            let a = Vec3::from_array(pa);
            let b = Vec3::from_array(pb);
            let c = Vec3::from_array(pc);
            let face = (b - a).cross(c - a);
            accum[ia] = accum[ia] + face;
            accum[ib] = accum[ib] + face;
            accum[ic] = accum[ic] + face;
        }
        self.normals = Some(
            accum
                .into_iter()
                .map(|n| n.normalized().unwrap_or(Vec3::ZERO).to_array())
                .collect(),
        );
    }

    /// Weld positions within `epsilon` and rewrite the index buffer. The
    /// first occurrence of a welded group keeps its attributes; metadata is
    /// preserved.
    #[must_use]
    pub fn optimized(&self, epsilon: f64) -> Self {
        let dedup = dedup_positions(&self.positions, epsilon);
        Self {
            indices: self
                .indices
                .iter()
                .map(|&i| dedup.remap.get(i as usize).copied().unwrap_or(0))
                .collect(),
            normals: remap_attribute(self.normals.as_deref(), &dedup.kept_source, [0.0; 3]),
            uvs: remap_attribute(self.uvs.as_deref(), &dedup.kept_source, [0.0; 2]),
            colors: remap_attribute(self.colors.as_deref(), &dedup.kept_source, [0.0; 4]),
            positions: dedup.kept,
            metadata: self.metadata,
        }
    }
}

fn check_attribute<T>(
    attribute: &'static str,
    values: Option<&[T]>,
    expected: usize,
) -> Result<(), VertexDataError> {
    match values {
        Some(values) if values.len() != expected => Err(VertexDataError::AttributeLength {
            attribute,
            expected,
            found: values.len(),
        }),
        _ => Ok(()),
    }
}

fn merge_attribute<T: Copy>(
    own: &mut Option<Vec<T>>,
    other: Option<&[T]>,
    base: usize,
    total: usize,
    zero: T,
) {
    match (own.as_mut(), other) {
        (None, None) => {}
        (Some(values), Some(extra)) => values.extend_from_slice(extra),
        (Some(values), None) => values.resize(total, zero),
        (None, Some(extra)) => {
            let mut values = vec![zero; base];
            values.extend_from_slice(extra);
            *own = Some(values);
        }
    }
}

fn remap_attribute<T: Copy>(
    values: Option<&[T]>,
    kept_source: &[usize],
    zero: T,
) -> Option<Vec<T>> {
    values.map(|values| {
        kept_source
            .iter()
            .map(|&i| values.get(i).copied().unwrap_or(zero))
            .collect()
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Position dedup
// ─────────────────────────────────────────────────────────────────────────────

/// Result of welding a position list.
///
/// `kept_source[k]` is the index the k-th kept position had in the original
/// list; `remap[i]` is the kept slot the original index `i` folded into.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionDedup {
    pub kept: Vec<[f64; 3]>,
    pub kept_source: Vec<usize>,
    pub remap: Vec<u32>,
}

/// Weld positions closer than `epsilon` together, first occurrence wins.
/// Quadratic scan; position lists in block graphs stay small.
#[must_use]
pub fn dedup_positions(positions: &[[f64; 3]], epsilon: f64) -> PositionDedup {
    let eps = epsilon.max(Tolerance::ZERO_LENGTH.eps);
    let eps_sq = eps * eps;
    let mut kept: Vec<[f64; 3]> = Vec::new();
    let mut kept_source: Vec<usize> = Vec::new();
    let mut remap: Vec<u32> = Vec::with_capacity(positions.len());

    for (index, p) in positions.iter().enumerate() {
        match kept.iter().position(|q| distance_squared(*p, *q) <= eps_sq) {
            Some(slot) => remap.push(slot as u32),
            None => {
                remap.push(kept.len() as u32);
                kept.push(*p);
                kept_source.push(index);
            }
        }
    }

    PositionDedup {
        kept,
        kept_source,
        remap,
    }
}

fn distance_squared(a: [f64; 3], b: [f64; 3]) -> f64 {
    let dx = a[0] - b[0];
    let dy = a[1] - b[1];
    let dz = a[2] - b[2];
    dx * dx + dy * dy + dz * dz
}
