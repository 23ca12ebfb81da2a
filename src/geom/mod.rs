mod core;
mod csg;
mod vertex_data;

pub use core::{BBox, Point3, Quat, Tolerance, Transform, Vec3};
pub use csg::{BooleanOperation, CsgError, boolean, point_in_mesh};
pub use vertex_data::{
    GeometryMetadata, PositionDedup, VertexData, VertexDataError, dedup_positions,
};

#[cfg(test)]
mod tests;
