//! Visualization sink for sampled points and located boxes.
//!
//! The engine never reads anything back from a sink; it only hands over
//! geometry. [`RecordingSink`] keeps everything in memory and can be serialized
//! for inspection, [`NullSink`] drops it.

use serde::Serialize;

use crate::geom::{Point3, Vec3};

/// 8-bit RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    /// Dim violet used for sampled surface points.
    pub const SAMPLE: Self = Self::new(50, 25, 50);
    pub const PURPLE: Self = Self::new(169, 7, 228);

    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DebugPoint {
    pub position: Point3,
    pub size: f64,
    pub color: Color,
    pub persistent: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DebugBox {
    pub center: Point3,
    pub half_extents: Vec3,
    pub color: Color,
    pub persistent: bool,
    /// Seconds to keep the box on screen; negative means "until cleared".
    pub lifetime: f64,
    pub thickness: f64,
}

impl DebugBox {
    /// Persistent purple outline used for located BVH nodes.
    #[must_use]
    pub const fn located(center: Point3, half_extents: Vec3) -> Self {
        Self {
            center,
            half_extents,
            color: Color::PURPLE,
            persistent: true,
            lifetime: -1.0,
            thickness: 10.0,
        }
    }
}

pub trait DebugSink {
    fn draw_point(&mut self, point: &DebugPoint);

    fn draw_box(&mut self, bbox: &DebugBox);
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl DebugSink for NullSink {
    fn draw_point(&mut self, _point: &DebugPoint) {}

    fn draw_box(&mut self, _bbox: &DebugBox) {}
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum DebugPrimitive {
    Point(DebugPoint),
    Box(DebugBox),
}

/// Keeps every primitive in submission order.
#[derive(Debug, Default, Clone, Serialize)]
pub struct RecordingSink {
    primitives: Vec<DebugPrimitive>,
}

impl RecordingSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn primitives(&self) -> &[DebugPrimitive] {
        &self.primitives
    }

    pub fn points(&self) -> impl Iterator<Item = &DebugPoint> {
        self.primitives.iter().filter_map(|primitive| match primitive {
            DebugPrimitive::Point(point) => Some(point),
            DebugPrimitive::Box(_) => None,
        })
    }

    pub fn boxes(&self) -> impl Iterator<Item = &DebugBox> {
        self.primitives.iter().filter_map(|primitive| match primitive {
            DebugPrimitive::Box(bbox) => Some(bbox),
            DebugPrimitive::Point(_) => None,
        })
    }

    pub fn clear(&mut self) {
        self.primitives.clear();
    }
}

impl DebugSink for RecordingSink {
    fn draw_point(&mut self, point: &DebugPoint) {
        self.primitives.push(DebugPrimitive::Point(*point));
    }

    fn draw_box(&mut self, bbox: &DebugBox) {
        self.primitives.push(DebugPrimitive::Box(*bbox));
    }
}

impl<S: DebugSink + ?Sized> DebugSink for &mut S {
    fn draw_point(&mut self, point: &DebugPoint) {
        (**self).draw_point(point);
    }

    fn draw_box(&mut self, bbox: &DebugBox) {
        (**self).draw_box(bbox);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_sink_keeps_submission_order() {
        let mut sink = RecordingSink::new();
        sink.draw_point(&DebugPoint {
            position: Point3::new(1.0, 2.0, 3.0),
            size: 2.0,
            color: Color::SAMPLE,
            persistent: true,
        });
        sink.draw_box(&DebugBox::located(
            Point3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 1.0, 1.0),
        ));

        assert_eq!(sink.primitives().len(), 2);
        assert!(matches!(sink.primitives()[0], DebugPrimitive::Point(_)));
        assert!(matches!(sink.primitives()[1], DebugPrimitive::Box(_)));
        assert_eq!(sink.points().count(), 1);

        let located = sink.boxes().next().expect("one box");
        assert_eq!(located.color, Color::PURPLE);
        assert!(located.persistent);
        assert!(located.lifetime < 0.0);
    }

    #[test]
    fn forwarding_through_mut_reference() {
        fn draw_twice(mut sink: impl DebugSink) {
            let bbox = DebugBox::located(Point3::ORIGIN, Vec3::ZERO);
            sink.draw_box(&bbox);
            sink.draw_box(&bbox);
        }

        let mut sink = RecordingSink::new();
        draw_twice(&mut sink);
        assert_eq!(sink.boxes().count(), 2);

        sink.clear();
        assert!(sink.primitives().is_empty());
    }
}
