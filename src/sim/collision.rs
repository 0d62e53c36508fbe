//! Collision primitives
//!
//! Every entity exposes an axis-aligned [`Rect`] (`x, y, w, h`, top-left
//! origin). Round things (enemy shots, power-ups, two of the bosses) add a
//! circular [`Hitbox`]. All tests use strict inequalities: touching edges do
//! not collide.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::{SCREEN_HEIGHT, SCREEN_WIDTH};

/// Axis-aligned rectangle, top-left origin
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.w / 2.0, self.y + self.h / 2.0)
    }

    /// Grow by `pad` on every side
    pub fn padded(&self, pad: f32) -> Rect {
        Rect::new(self.x - pad, self.y - pad, self.w + pad * 2.0, self.h + pad * 2.0)
    }

    #[inline]
    pub fn intersects(&self, other: &Rect) -> bool {
        rects_intersect(self, other)
    }

    /// Gap between two rects along the closest axes (0 when overlapping)
    pub fn distance_to(&self, other: &Rect) -> f32 {
        let dx = (other.x - self.right()).max(self.x - other.right()).max(0.0);
        let dy = (other.y - self.bottom()).max(self.y - other.bottom()).max(0.0);
        (dx * dx + dy * dy).sqrt()
    }

    /// True when the rect lies entirely outside the screen grown by `margin`
    pub fn offscreen(&self, margin: f32) -> bool {
        self.right() < -margin
            || self.x > SCREEN_WIDTH + margin
            || self.bottom() < -margin
            || self.y > SCREEN_HEIGHT + margin
    }
}

/// Collision shape of an entity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Hitbox {
    Rect(Rect),
    Circle { center: Vec2, radius: f32 },
}

impl Hitbox {
    /// Test against a rectangle
    pub fn hits_rect(&self, rect: &Rect) -> bool {
        match *self {
            Hitbox::Rect(r) => rects_intersect(&r, rect),
            Hitbox::Circle { center, radius } => rect_circle_intersect(rect, center, radius),
        }
    }

    /// Bounding rectangle
    pub fn bounds(&self) -> Rect {
        match *self {
            Hitbox::Rect(r) => r,
            Hitbox::Circle { center, radius } => {
                Rect::new(center.x - radius, center.y - radius, radius * 2.0, radius * 2.0)
            }
        }
    }
}

/// Strict AABB overlap
#[inline]
pub fn rects_intersect(a: &Rect, b: &Rect) -> bool {
    a.x < b.x + b.w && a.x + a.w > b.x && a.y < b.y + b.h && a.y + a.h > b.y
}

/// Rectangle vs circle: clamp the circle center into the rect and compare distance
#[inline]
pub fn rect_circle_intersect(rect: &Rect, center: Vec2, radius: f32) -> bool {
    let closest = Vec2::new(
        center.x.clamp(rect.x, rect.right()),
        center.y.clamp(rect.y, rect.bottom()),
    );
    center.distance_squared(closest) < radius * radius
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_rects_overlap() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(5.0, 5.0, 10.0, 10.0);
        assert!(rects_intersect(&a, &b));
    }

    #[test]
    fn test_touching_rects_do_not_collide() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let right = Rect::new(10.0, 0.0, 10.0, 10.0);
        let below = Rect::new(0.0, 10.0, 10.0, 10.0);
        assert!(!rects_intersect(&a, &right));
        assert!(!rects_intersect(&a, &below));
    }

    #[test]
    fn test_circle_inside_rect() {
        let r = Rect::new(0.0, 0.0, 100.0, 100.0);
        assert!(rect_circle_intersect(&r, Vec2::new(50.0, 50.0), 1.0));
    }

    #[test]
    fn test_circle_touching_edge_does_not_collide() {
        let r = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(!rect_circle_intersect(&r, Vec2::new(15.0, 5.0), 5.0));
        assert!(rect_circle_intersect(&r, Vec2::new(14.9, 5.0), 5.0));
    }

    #[test]
    fn test_circle_near_corner() {
        let r = Rect::new(0.0, 0.0, 10.0, 10.0);
        // Distance to corner is ~7.07
        assert!(!rect_circle_intersect(&r, Vec2::new(15.0, 15.0), 7.0));
        assert!(rect_circle_intersect(&r, Vec2::new(15.0, 15.0), 7.1));
    }

    #[test]
    fn test_offscreen_margin() {
        // Fully left of the screen
        assert!(Rect::new(-50.0, 10.0, 40.0, 10.0).offscreen(0.0));
        // Partially visible
        assert!(!Rect::new(-30.0, 10.0, 40.0, 10.0).offscreen(0.0));
        // Right edge exactly on the boundary is not outside
        assert!(!Rect::new(-40.0, 10.0, 40.0, 10.0).offscreen(0.0));
        // Past the right edge but within the margin
        assert!(!Rect::new(SCREEN_WIDTH + 10.0, 10.0, 5.0, 5.0).offscreen(20.0));
        assert!(Rect::new(SCREEN_WIDTH + 30.0, 10.0, 5.0, 5.0).offscreen(20.0));
    }

    #[test]
    fn test_distance_to() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(13.0, 14.0, 5.0, 5.0);
        assert!((a.distance_to(&b) - 5.0).abs() < 1e-5);
        assert_eq!(a.distance_to(&a), 0.0);
    }

    fn rect_strategy() -> impl Strategy<Value = Rect> {
        (-500.0f32..500.0, -500.0f32..500.0, 0.0f32..200.0, 0.0f32..200.0)
            .prop_map(|(x, y, w, h)| Rect::new(x, y, w, h))
    }

    proptest! {
        #[test]
        fn prop_rect_test_is_symmetric(a in rect_strategy(), b in rect_strategy()) {
            prop_assert_eq!(rects_intersect(&a, &b), rects_intersect(&b, &a));
        }

        #[test]
        fn prop_offscreen_matches_definition(r in rect_strategy(), margin in 0.0f32..100.0) {
            let inside_x = r.x + r.w >= -margin && r.x <= SCREEN_WIDTH + margin;
            let inside_y = r.y + r.h >= -margin && r.y <= SCREEN_HEIGHT + margin;
            prop_assert_eq!(r.offscreen(margin), !(inside_x && inside_y));
        }
    }
}
