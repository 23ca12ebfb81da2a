//! Boolean operations on triangle meshes via BSP-tree clipping, plus the
//! ray-parity containment test used for volume sampling.
//!
//! The clipping structure is the classic solid-modeling one: build a BSP per
//! operand, clip each tree against the other, invert as the operation
//! requires, and re-emit the surviving polygons as an indexed buffer.
//! Normals, uvs and colors ride along through every split.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::vertex_data::VertexData;
use super::{Point3, Tolerance, Vec3};

/// Plane-side classification tolerance for BSP splits.
const PLANE_EPSILON: f64 = 1e-5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BooleanOperation {
    Intersect,
    Subtract,
    Union,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CsgError {
    #[error("operand mesh is empty")]
    EmptyOperand,
    #[error("operand mesh has no usable triangles")]
    NoTriangles,
}

/// Boolean-combine two triangle meshes.
///
/// Both operands must be closed for the result to be meaningful; open meshes
/// degrade rather than error. Attribute layouts may differ: missing normals
/// fall back to face normals, and uvs/colors appear in the output when either
/// operand carries them.
pub fn boolean(
    a: &VertexData,
    b: &VertexData,
    op: BooleanOperation,
) -> Result<VertexData, CsgError> {
    if a.is_empty() || b.is_empty() {
        return Err(CsgError::EmptyOperand);
    }
    let polygons_a = mesh_polygons(a);
    let polygons_b = mesh_polygons(b);
    if polygons_a.is_empty() || polygons_b.is_empty() {
        return Err(CsgError::NoTriangles);
    }

    let with_uvs = a.uvs.is_some() || b.uvs.is_some();
    let with_colors = a.colors.is_some() || b.colors.is_some();

    let mut na = BspNode::new(polygons_a);
    let mut nb = BspNode::new(polygons_b);

    match op {
        BooleanOperation::Union => {
            na.clip_to(&nb);
            nb.clip_to(&na);
            nb.invert();
            nb.clip_to(&na);
            nb.invert();
            na.build(nb.all_polygons());
        }
        BooleanOperation::Subtract => {
            na.invert();
            na.clip_to(&nb);
            nb.clip_to(&na);
            nb.invert();
            nb.clip_to(&na);
            nb.invert();
            na.build(nb.all_polygons());
            na.invert();
        }
        BooleanOperation::Intersect => {
            na.invert();
            nb.clip_to(&na);
            nb.invert();
            na.clip_to(&nb);
            nb.clip_to(&na);
            na.build(nb.all_polygons());
            na.invert();
        }
    }

    Ok(polygons_to_vertex_data(
        &na.all_polygons(),
        with_uvs,
        with_colors,
    ))
}

// ─────────────────────────────────────────────────────────────────────────────
// Containment
// ─────────────────────────────────────────────────────────────────────────────

/// Parity containment test: cast one ray in a fixed skewed direction and
/// count crossings. The direction avoids the axis planes most meshes align
/// with, so grazing hits stay rare.
#[must_use]
pub fn point_in_mesh(point: Point3, mesh: &VertexData) -> bool {
    let dir = Vec3::new(1.0, 0.234_567_89, 0.345_678_91)
        .normalized()
        .unwrap_or(Vec3::X);
    let tol = Tolerance::DEFAULT;

    let mut crossings = 0usize;
    for tri in mesh.indices.chunks_exact(3) {
        let (Some(&a), Some(&b), Some(&c)) = (
            mesh.positions.get(tri[0] as usize),
            mesh.positions.get(tri[1] as usize),
            mesh.positions.get(tri[2] as usize),
        ) else {
            continue;
        };
        let hit = ray_triangle_intersection(
            point,
            dir,
            Point3::from_array(a),
            Point3::from_array(b),
            Point3::from_array(c),
            tol,
        );
        if let Some(t) = hit {
            if t > tol.eps {
                crossings += 1;
            }
        }
    }

    crossings % 2 == 1
}

fn ray_triangle_intersection(
    origin: Point3,
    dir: Vec3,
    a: Point3,
    b: Point3,
    c: Point3,
    tol: Tolerance,
) -> Option<f64> {
    let edge1 = b.sub_point(a);
    let edge2 = c.sub_point(a);
    let h = dir.cross(edge2);
    let det = edge1.dot(h);
    if !det.is_finite() || det.abs() <= tol.eps {
        return None;
    }

    let inv_det = 1.0 / det;
    let s = origin.sub_point(a);
    let u = inv_det * s.dot(h);
    if u < -tol.eps || u > 1.0 + tol.eps {
        return None;
    }

    let q = s.cross(edge1);
    let v = inv_det * dir.dot(q);
    if v < -tol.eps || u + v > 1.0 + tol.eps {
        return None;
    }

    let t = inv_det * edge2.dot(q);
    if !t.is_finite() || t < -tol.eps {
        return None;
    }
    Some(t)
}

// ─────────────────────────────────────────────────────────────────────────────
// CSG vertices and polygons
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
struct CsgVertex {
    pos: Vec3,
    normal: Vec3,
    uv: [f64; 2],
    color: [f64; 4],
}

impl CsgVertex {
    fn interpolate(self, other: Self, t: f64) -> Self {
        Self {
            pos: lerp_vec(self.pos, other.pos, t),
            normal: lerp_vec(self.normal, other.normal, t),
            uv: [
                lerp(self.uv[0], other.uv[0], t),
                lerp(self.uv[1], other.uv[1], t),
            ],
            color: [
                lerp(self.color[0], other.color[0], t),
                lerp(self.color[1], other.color[1], t),
                lerp(self.color[2], other.color[2], t),
                lerp(self.color[3], other.color[3], t),
            ],
        }
    }

    fn flipped(self) -> Self {
        Self {
            normal: -self.normal,
            ..self
        }
    }
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

fn lerp_vec(a: Vec3, b: Vec3, t: f64) -> Vec3 {
    a + (b - a) * t
}

#[derive(Debug, Clone, Copy)]
struct CsgPlane {
    normal: Vec3,
    w: f64,
}

const COPLANAR: u8 = 0;
const FRONT: u8 = 1;
const BACK: u8 = 2;
const SPANNING: u8 = 3;

impl CsgPlane {
    fn from_points(a: Vec3, b: Vec3, c: Vec3) -> Option<Self> {
        let normal = (b - a).cross(c - a).normalized()?;
        Some(Self {
            normal,
            w: normal.dot(a),
        })
    }

    fn flip(&mut self) {
        self.normal = -self.normal;
        self.w = -self.w;
    }

    /// Classify `polygon` against this plane and distribute it (or its split
    /// halves) over the four output lists.
    fn split_polygon(
        &self,
        polygon: &CsgPolygon,
        coplanar_front: &mut Vec<CsgPolygon>,
        coplanar_back: &mut Vec<CsgPolygon>,
        front: &mut Vec<CsgPolygon>,
        back: &mut Vec<CsgPolygon>,
    ) {
        let mut polygon_type = COPLANAR;
        let mut types = Vec::with_capacity(polygon.vertices.len());
        for vertex in &polygon.vertices {
            let offset = self.normal.dot(vertex.pos) - self.w;
            let side = if offset < -PLANE_EPSILON {
                BACK
            } else if offset > PLANE_EPSILON {
                FRONT
            } else {
                COPLANAR
            };
            polygon_type |= side;
            types.push(side);
        }

        match polygon_type {
            COPLANAR => {
                if self.normal.dot(polygon.plane.normal) > 0.0 {
                    coplanar_front.push(polygon.clone());
                } else {
                    coplanar_back.push(polygon.clone());
                }
            }
            FRONT => front.push(polygon.clone()),
            BACK => back.push(polygon.clone()),
            _ => {
                let mut front_vertices = Vec::new();
                let mut back_vertices = Vec::new();
                let count = polygon.vertices.len();
                for i in 0..count {
                    let j = (i + 1) % count;
                    let (ti, tj) = (types[i], types[j]);
                    let (vi, vj) = (polygon.vertices[i], polygon.vertices[j]);
                    if ti != BACK {
                        front_vertices.push(vi);
                    }
                    if ti != FRONT {
                        back_vertices.push(vi);
                    }
                    if (ti | tj) == SPANNING {
                        let denom = self.normal.dot(vj.pos - vi.pos);
                        if denom.abs() > f64::EPSILON {
                            let t = (self.w - self.normal.dot(vi.pos)) / denom;
                            let v = vi.interpolate(vj, t);
                            front_vertices.push(v);
                            back_vertices.push(v);
                        }
                    }
                }
                // Split halves stay on the parent plane; no recompute needed.
                if front_vertices.len() >= 3 {
                    front.push(CsgPolygon {
                        vertices: front_vertices,
                        plane: polygon.plane,
                    });
                }
                if back_vertices.len() >= 3 {
                    back.push(CsgPolygon {
                        vertices: back_vertices,
                        plane: polygon.plane,
                    });
                }
            }
        }
    }
}

#[derive(Debug, Clone)]
struct CsgPolygon {
    vertices: Vec<CsgVertex>,
    plane: CsgPlane,
}

impl CsgPolygon {
    fn new(vertices: Vec<CsgVertex>) -> Option<Self> {
        if vertices.len() < 3 {
            return None;
        }
        let plane = CsgPlane::from_points(vertices[0].pos, vertices[1].pos, vertices[2].pos)?;
        Some(Self { vertices, plane })
    }

    fn flip(&mut self) {
        self.vertices.reverse();
        for vertex in &mut self.vertices {
            *vertex = vertex.flipped();
        }
        self.plane.flip();
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// BSP tree
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct BspNode {
    plane: Option<CsgPlane>,
    front: Option<Box<BspNode>>,
    back: Option<Box<BspNode>>,
    polygons: Vec<CsgPolygon>,
}

impl BspNode {
    fn new(polygons: Vec<CsgPolygon>) -> Self {
        let mut node = Self::default();
        node.build(polygons);
        node
    }

    /// Convert solid space to empty space and vice versa.
    fn invert(&mut self) {
        for polygon in &mut self.polygons {
            polygon.flip();
        }
        if let Some(plane) = &mut self.plane {
            plane.flip();
        }
        if let Some(front) = &mut self.front {
            front.invert();
        }
        if let Some(back) = &mut self.back {
            back.invert();
        }
        std::mem::swap(&mut self.front, &mut self.back);
    }

    /// Remove the parts of `polygons` inside this tree's solid space.
    fn clip_polygons(&self, polygons: Vec<CsgPolygon>) -> Vec<CsgPolygon> {
        let Some(plane) = self.plane else {
            return polygons;
        };

        let mut front = Vec::new();
        let mut back = Vec::new();
        let mut coplanar_front = Vec::new();
        let mut coplanar_back = Vec::new();
        for polygon in &polygons {
            plane.split_polygon(
                polygon,
                &mut coplanar_front,
                &mut coplanar_back,
                &mut front,
                &mut back,
            );
        }
        front.append(&mut coplanar_front);
        back.append(&mut coplanar_back);

        let mut front = match &self.front {
            Some(node) => node.clip_polygons(front),
            None => front,
        };
        let back = match &self.back {
            Some(node) => node.clip_polygons(back),
            // No back subtree: everything behind the plane is inside the solid.
            None => Vec::new(),
        };

        front.extend(back);
        front
    }

    /// Remove all polygons in this tree that are inside `bsp`'s solid space.
    fn clip_to(&mut self, bsp: &BspNode) {
        self.polygons = bsp.clip_polygons(std::mem::take(&mut self.polygons));
        if let Some(front) = &mut self.front {
            front.clip_to(bsp);
        }
        if let Some(back) = &mut self.back {
            back.clip_to(bsp);
        }
    }

    fn all_polygons(&self) -> Vec<CsgPolygon> {
        let mut out = self.polygons.clone();
        if let Some(front) = &self.front {
            out.extend(front.all_polygons());
        }
        if let Some(back) = &self.back {
            out.extend(back.all_polygons());
        }
        out
    }

    fn build(&mut self, polygons: Vec<CsgPolygon>) {
        if polygons.is_empty() {
            return;
        }
        let plane = match self.plane {
            Some(plane) => plane,
            None => {
                let plane = polygons[0].plane;
                self.plane = Some(plane);
                plane
            }
        };

        let mut coplanar_front = Vec::new();
        let mut coplanar_back = Vec::new();
        let mut front = Vec::new();
        let mut back = Vec::new();
        for polygon in &polygons {
            plane.split_polygon(
                polygon,
                &mut coplanar_front,
                &mut coplanar_back,
                &mut front,
                &mut back,
            );
        }
        self.polygons.append(&mut coplanar_front);
        self.polygons.append(&mut coplanar_back);

        if !front.is_empty() {
            self.front
                .get_or_insert_with(|| Box::new(BspNode::default()))
                .build(front);
        }
        if !back.is_empty() {
            self.back
                .get_or_insert_with(|| Box::new(BspNode::default()))
                .build(back);
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Mesh conversion
// ─────────────────────────────────────────────────────────────────────────────

fn mesh_polygons(mesh: &VertexData) -> Vec<CsgPolygon> {
    let mut polygons = Vec::with_capacity(mesh.triangle_count());
    for tri in mesh.indices.chunks_exact(3) {
        let (ia, ib, ic) = (tri[0] as usize, tri[1] as usize, tri[2] as usize);
        let (Some(&pa), Some(&pb), Some(&pc)) = (
            mesh.positions.get(ia),
            mesh.positions.get(ib),
            mesh.positions.get(ic),
        ) else {
            continue;
        };

        let face_normal = (Vec3::from_array(pb) - Vec3::from_array(pa))
            .cross(Vec3::from_array(pc) - Vec3::from_array(pa))
            .normalized()
            .unwrap_or(Vec3::ZERO);

        let vertex = |index: usize, pos: [f64; 3]| CsgVertex {
            pos: Vec3::from_array(pos),
            normal: mesh
                .normals
                .as_ref()
                .and_then(|n| n.get(index))
                .map_or(face_normal, |&n| Vec3::from_array(n)),
            uv: mesh
                .uvs
                .as_ref()
                .and_then(|uv| uv.get(index))
                .copied()
                .unwrap_or([0.0; 2]),
            color: mesh
                .colors
                .as_ref()
                .and_then(|c| c.get(index))
                .copied()
                .unwrap_or([0.0; 4]),
        };

        if let Some(polygon) =
            CsgPolygon::new(vec![vertex(ia, pa), vertex(ib, pb), vertex(ic, pc)])
        {
            polygons.push(polygon);
        }
    }
    polygons
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct VertexKey {
    pos: [u64; 3],
    normal: [u64; 3],
    uv: [u64; 2],
    color: [u64; 4],
}

impl VertexKey {
    fn new(v: CsgVertex) -> Self {
        Self {
            pos: v.pos.to_array().map(f64::to_bits),
            normal: v.normal.to_array().map(f64::to_bits),
            uv: v.uv.map(f64::to_bits),
            color: v.color.map(f64::to_bits),
        }
    }
}

/// Fan-triangulate the polygon soup back into an indexed buffer, sharing
/// bit-identical vertices.
fn polygons_to_vertex_data(
    polygons: &[CsgPolygon],
    with_uvs: bool,
    with_colors: bool,
) -> VertexData {
    let mut map: HashMap<VertexKey, u32> = HashMap::new();
    let mut positions: Vec<[f64; 3]> = Vec::new();
    let mut normals: Vec<[f64; 3]> = Vec::new();
    let mut uvs: Vec<[f64; 2]> = Vec::new();
    let mut colors: Vec<[f64; 4]> = Vec::new();
    let mut indices: Vec<u32> = Vec::new();

    for polygon in polygons {
        for i in 1..polygon.vertices.len() - 1 {
            for &vertex in [
                &polygon.vertices[0],
                &polygon.vertices[i],
                &polygon.vertices[i + 1],
            ] {
                let key = VertexKey::new(vertex);
                let slot = match map.get(&key) {
                    Some(&slot) => slot,
                    None => {
                        let slot = positions.len() as u32;
                        positions.push(vertex.pos.to_array());
                        normals.push(vertex.normal.to_array());
                        if with_uvs {
                            uvs.push(vertex.uv);
                        }
                        if with_colors {
                            colors.push(vertex.color);
                        }
                        map.insert(key, slot);
                        slot
                    }
                };
                indices.push(slot);
            }
        }
    }

    let mut data = VertexData::new(positions, indices);
    data.normals = Some(normals);
    data.uvs = with_uvs.then_some(uvs);
    data.colors = with_colors.then_some(colors);
    data
}
