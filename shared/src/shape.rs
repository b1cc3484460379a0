//! Debug shapes recorded by categories and drawn into the 3D view.
//!
//! Shapes travel as a kind tag plus a flat list of points; the meaning of
//! each point depends on the kind (see the constructors).

use bitcode::{Decode, Encode};
use glam::Vec3;

use crate::color::Color;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Encode, Decode)]
pub enum ShapeKind {
    #[default]
    Invalid,
    Point,
    Segment,
    Box,
    Cone,
    Cylinder,
    Capsule,
    Polygon,
}

#[derive(Debug, Clone, PartialEq, Default, Encode, Decode)]
pub struct Shape {
    pub kind: ShapeKind,
    pub points: Vec<[f32; 3]>,
    pub color: Color,
    /// Optional label, drawn next to the shape when its anchor is on screen
    pub description: String,
}

impl Shape {
    /// `[location, (radius, 0, 0)]`
    pub fn point(location: Vec3, radius: f32, color: Color) -> Self {
        Self::new(ShapeKind::Point, vec![location, Vec3::new(radius, 0.0, 0.0)], color)
    }

    /// `[start, end, (thickness, 0, 0)]`
    pub fn segment(start: Vec3, end: Vec3, thickness: f32, color: Color) -> Self {
        Self::new(
            ShapeKind::Segment,
            vec![start, end, Vec3::new(thickness, 0.0, 0.0)],
            color,
        )
    }

    /// `[center, extent]`
    pub fn cuboid(center: Vec3, extent: Vec3, color: Color) -> Self {
        Self::new(ShapeKind::Box, vec![center, extent], color)
    }

    /// `[apex, direction, (length, 0, 0)]`
    pub fn cone(apex: Vec3, direction: Vec3, length: f32, color: Color) -> Self {
        Self::new(
            ShapeKind::Cone,
            vec![apex, direction, Vec3::new(length, 0.0, 0.0)],
            color,
        )
    }

    /// `[center, (radius, 0, half_height)]`
    pub fn cylinder(center: Vec3, radius: f32, half_height: f32, color: Color) -> Self {
        Self::new(
            ShapeKind::Cylinder,
            vec![center, Vec3::new(radius, 0.0, half_height)],
            color,
        )
    }

    /// `[center, (radius, 0, half_height)]`
    pub fn capsule(center: Vec3, radius: f32, half_height: f32, color: Color) -> Self {
        Self::new(
            ShapeKind::Capsule,
            vec![center, Vec3::new(radius, 0.0, half_height)],
            color,
        )
    }

    /// Closed outline through every vertex.
    pub fn polygon(vertices: &[Vec3], color: Color) -> Self {
        Self::new(ShapeKind::Polygon, vertices.to_vec(), color)
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    fn new(kind: ShapeKind, points: Vec<Vec3>, color: Color) -> Self {
        Self {
            kind,
            points: points.iter().map(Vec3::to_array).collect(),
            color,
            description: String::new(),
        }
    }

    pub fn point_at(&self, index: usize) -> Option<Vec3> {
        self.points.get(index).copied().map(Vec3::from_array)
    }

    /// Whether the point list matches what the kind expects.
    pub fn is_well_formed(&self) -> bool {
        let count = self.points.len();
        match self.kind {
            ShapeKind::Invalid => false,
            ShapeKind::Point | ShapeKind::Box | ShapeKind::Cylinder | ShapeKind::Capsule => {
                count == 2
            }
            ShapeKind::Segment | ShapeKind::Cone => count == 3,
            ShapeKind::Polygon => count >= 3,
        }
    }

    /// World location the description is drawn at.
    ///
    /// `None` for malformed shapes.
    pub fn anchor(&self) -> Option<Vec3> {
        if !self.is_well_formed() {
            return None;
        }
        match self.kind {
            ShapeKind::Segment => Some((self.point_at(0)? + self.point_at(1)?) * 0.5),
            ShapeKind::Polygon => {
                let sum: Vec3 = self.points.iter().copied().map(Vec3::from_array).sum();
                Some(sum / self.points.len() as f32)
            }
            _ => self.point_at(0),
        }
    }
}
