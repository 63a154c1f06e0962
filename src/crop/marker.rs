use crate::crop::geometry::{Rect, Vec2};

/// Which corner of the crop region a marker sits on, clockwise from top-left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Orientation {
    TopLeft = 0,
    TopRight = 1,
    BottomRight = 2,
    BottomLeft = 3,
}

impl Orientation {
    pub const ALL: [Orientation; 4] = [
        Orientation::TopLeft,
        Orientation::TopRight,
        Orientation::BottomRight,
        Orientation::BottomLeft,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// The 45° axis a drag of this corner is constrained to.
    pub fn diagonal_axis(self) -> Vec2 {
        match self {
            Self::TopLeft | Self::BottomRight => Vec2::new(1.0, 1.0),
            Self::TopRight | Self::BottomLeft => Vec2::new(-1.0, 1.0),
        }
    }

    /// Unit step away from the opposite corner along each axis.
    pub fn outward(self) -> Vec2 {
        match self {
            Self::TopLeft => Vec2::new(-1.0, -1.0),
            Self::TopRight => Vec2::new(1.0, -1.0),
            Self::BottomRight => Vec2::new(1.0, 1.0),
            Self::BottomLeft => Vec2::new(-1.0, 1.0),
        }
    }

    /// The neighbour sharing this corner's x coordinate.
    pub fn same_x_neighbour(self) -> Self {
        match self {
            Self::TopLeft => Self::BottomLeft,
            Self::TopRight => Self::BottomRight,
            Self::BottomRight => Self::TopRight,
            Self::BottomLeft => Self::TopLeft,
        }
    }

    /// The neighbour sharing this corner's y coordinate.
    pub fn same_y_neighbour(self) -> Self {
        match self {
            Self::TopLeft => Self::TopRight,
            Self::TopRight => Self::TopLeft,
            Self::BottomRight => Self::BottomLeft,
            Self::BottomLeft => Self::BottomRight,
        }
    }

    pub fn opposite(self) -> Self {
        Self::ALL[(self.index() + 2) % 4]
    }

    /// This corner of `rect`.
    pub fn corner_of(self, rect: &Rect) -> Vec2 {
        match self {
            Self::TopLeft => rect.top_left(),
            Self::TopRight => rect.top_right(),
            Self::BottomRight => rect.bottom_right(),
            Self::BottomLeft => rect.bottom_left(),
        }
    }
}

/// One of the four drag handles of a crop region.
///
/// Markers are plain values; the owning controller decides whether a move is
/// allowed and keeps the four of them consistent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CornerMarker {
    orientation: Orientation,
    position: Vec2,
}

impl CornerMarker {
    pub fn new(orientation: Orientation, position: Vec2) -> Self {
        Self {
            orientation,
            position,
        }
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn set_position(&mut self, position: Vec2) {
        self.position = position;
    }

    /// Where this marker would go if dragged towards `candidate`.
    ///
    /// The pointer delta is projected onto the corner's diagonal, so corner
    /// drags scale the square instead of skewing it.
    pub fn constrained_position(&self, candidate: Vec2) -> Vec2 {
        let delta = candidate - self.position;
        self.position + delta.project_onto(self.orientation.diagonal_axis())
    }

    /// Whether `point` grabs this marker's handle.
    pub fn hit_test(&self, point: Vec2, radius: f64) -> bool {
        (point - self.position).length() <= radius
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orientations_are_numbered_clockwise_from_top_left() {
        for (index, orientation) in Orientation::ALL.iter().enumerate() {
            assert_eq!(orientation.index(), index);
        }
    }

    #[test]
    fn outward_points_away_from_the_opposite_corner() {
        let rect = Rect::new(10.0, 20.0, 110.0, 120.0);
        for orientation in Orientation::ALL {
            let anchor = orientation.opposite().corner_of(&rect);
            assert_eq!(
                anchor + orientation.outward() * 100.0,
                orientation.corner_of(&rect),
                "{orientation:?}"
            );
        }
    }

    #[test]
    fn neighbours_share_the_expected_coordinate() {
        let rect = Rect::new(10.0, 20.0, 110.0, 120.0);
        for orientation in Orientation::ALL {
            let corner = orientation.corner_of(&rect);
            let x_neighbour = orientation.same_x_neighbour().corner_of(&rect);
            let y_neighbour = orientation.same_y_neighbour().corner_of(&rect);
            assert_eq!(corner.x, x_neighbour.x, "{orientation:?}");
            assert_ne!(corner.y, x_neighbour.y, "{orientation:?}");
            assert_eq!(corner.y, y_neighbour.y, "{orientation:?}");
            assert_ne!(corner.x, y_neighbour.x, "{orientation:?}");
        }
    }

    #[test]
    fn opposite_is_neither_neighbour() {
        for orientation in Orientation::ALL {
            let opposite = orientation.opposite();
            assert_ne!(opposite, orientation);
            assert_ne!(opposite, orientation.same_x_neighbour());
            assert_ne!(opposite, orientation.same_y_neighbour());
            assert_eq!(opposite.opposite(), orientation);
        }
    }

    #[test]
    fn diagonal_axes_match_corner_pairs() {
        assert_eq!(Orientation::TopLeft.diagonal_axis(), Vec2::new(1.0, 1.0));
        assert_eq!(Orientation::BottomRight.diagonal_axis(), Vec2::new(1.0, 1.0));
        assert_eq!(Orientation::TopRight.diagonal_axis(), Vec2::new(-1.0, 1.0));
        assert_eq!(Orientation::BottomLeft.diagonal_axis(), Vec2::new(-1.0, 1.0));
    }

    #[test]
    fn constrained_position_projects_delta() {
        let marker = CornerMarker::new(Orientation::TopRight, Vec2::new(400.0, 0.0));
        let moved = marker.constrained_position(Vec2::new(380.0, 0.0));
        // Delta (-20, 0) on the (-1, 1) axis becomes (-10, 10).
        assert_eq!(moved, Vec2::new(390.0, 10.0));
    }

    #[test]
    fn hit_test_uses_radius() {
        let marker = CornerMarker::new(Orientation::TopLeft, Vec2::new(10.0, 10.0));
        assert!(marker.hit_test(Vec2::new(13.0, 14.0), 5.0));
        assert!(!marker.hit_test(Vec2::new(16.0, 10.0), 5.0));
    }
}
