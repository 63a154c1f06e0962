//! Scene-space vector and rectangle helpers.
//!
//! Rectangles are stored as their four edges rather than origin plus size so
//! that intersection and containment compare edge values exactly.

use std::ops::{Add, Mul, Sub};

use crate::camera::types::Size;

/// Crop geometry lives on a grid of this step. Sums and differences of grid
/// values are exact in `f64`, so a square built from one side length keeps
/// `width == height` bit for bit.
pub const GRID_STEP: f64 = 1.0 / 1024.0;

/// Nearest grid value.
pub fn snap(value: f64) -> f64 {
    (value / GRID_STEP).round() * GRID_STEP
}

pub fn snap_down(value: f64) -> f64 {
    (value / GRID_STEP).floor() * GRID_STEP
}

pub fn snap_up(value: f64) -> f64 {
    (value / GRID_STEP).ceil() * GRID_STEP
}

/// A point or displacement in scene coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn dot(self, other: Vec2) -> f64 {
        self.x * other.x + self.y * other.y
    }

    pub fn length(self) -> f64 {
        self.dot(self).sqrt()
    }

    /// Orthogonal projection of `self` onto `axis`:
    /// `((self · axis) / (axis · axis)) * axis`.
    ///
    /// A zero axis projects everything to zero.
    pub fn project_onto(self, axis: Vec2) -> Vec2 {
        let denominator = axis.dot(axis);
        if denominator == 0.0 {
            return Vec2::default();
        }
        axis * (self.dot(axis) / denominator)
    }

    pub fn snapped(self) -> Vec2 {
        Vec2::new(snap(self.x), snap(self.y))
    }
}

impl Add for Vec2 {
    type Output = Vec2;

    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vec2 {
    type Output = Vec2;

    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Vec2 {
    type Output = Vec2;

    fn mul(self, rhs: f64) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

/// Axis-aligned rectangle in scene coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl Rect {
    pub const fn new(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Rectangle from an origin and a size.
    pub fn from_origin_size(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self::new(left, top, left + width, top + height)
    }

    /// Bounds of a frame of the given size, anchored at the origin.
    pub fn from_size(size: Size) -> Self {
        Self::new(0.0, 0.0, f64::from(size.width), f64::from(size.height))
    }

    /// Largest grid-aligned rectangle inside `self`.
    pub fn snapped_inside(&self) -> Rect {
        Rect::new(
            snap_up(self.left),
            snap_up(self.top),
            snap_down(self.right),
            snap_down(self.bottom),
        )
    }

    /// Largest square centered in `self`.
    pub fn centered_square(&self) -> Rect {
        let side = self.width().min(self.height());
        let center = self.center();
        let half = side / 2.0;
        Rect::new(
            center.x - half,
            center.y - half,
            center.x + half,
            center.y + half,
        )
    }

    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }

    pub fn top_left(&self) -> Vec2 {
        Vec2::new(self.left, self.top)
    }

    pub fn top_right(&self) -> Vec2 {
        Vec2::new(self.right, self.top)
    }

    pub fn bottom_right(&self) -> Vec2 {
        Vec2::new(self.right, self.bottom)
    }

    pub fn bottom_left(&self) -> Vec2 {
        Vec2::new(self.left, self.bottom)
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(
            (self.left + self.right) / 2.0,
            (self.top + self.bottom) / 2.0,
        )
    }

    pub fn is_empty(&self) -> bool {
        self.width() <= 0.0 || self.height() <= 0.0
    }

    /// Overlap of two rectangles; empty rectangles collapse to `Rect::default()`.
    pub fn intersect(&self, other: &Rect) -> Rect {
        let overlap = Rect::new(
            self.left.max(other.left),
            self.top.max(other.top),
            self.right.min(other.right),
            self.bottom.min(other.bottom),
        );
        if overlap.is_empty() {
            Rect::default()
        } else {
            overlap
        }
    }

    /// True when `other` lies fully inside `self`, edges included.
    pub fn contains_rect(&self, other: &Rect) -> bool {
        self.intersect(other) == *other
    }

    /// Hit test against the circle inscribed in this rectangle.
    pub fn inscribed_circle_contains(&self, point: Vec2) -> bool {
        let radius = self.width().min(self.height()) / 2.0;
        (point - self.center()).length() <= radius
    }
}
