use std::cell::Cell;
use std::rc::Rc;

use tracing::debug;

use crate::crop::error::CropError;
use crate::crop::geometry::{snap, snap_down, Rect, Vec2};
use crate::crop::marker::{CornerMarker, Orientation};

/// Smallest side a crop region may shrink to (exclusive).
pub const MIN_EXTENT: f64 = 100.0;

/// Grab radius of a corner handle, in scene units.
pub const HANDLE_RADIUS: f64 = 10.0;

/// Result of a proposed marker or region move.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MoveOutcome {
    /// All markers moved; carries the new region.
    Committed(Rect),
    /// The move would break an invariant; nothing changed.
    Rejected,
}

/// Cursor shape to show while hovering over the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorAffordance {
    Default,
    /// Over the top-left or bottom-right handle.
    ResizeDiagonal,
    /// Over the top-right or bottom-left handle.
    ResizeAntiDiagonal,
    /// Inside the region's inscribed circle.
    Move,
}

/// Read-only view of the latest committed crop region.
///
/// Cloned into sink transforms so the compositor can read the region once
/// per frame without borrowing the controller.
#[derive(Debug, Clone, Default)]
pub struct RegionHandle(Rc<Cell<Option<Rect>>>);

impl RegionHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<Rect> {
        self.0.get()
    }

    pub fn clear(&self) {
        self.0.set(None);
    }

    fn publish(&self, region: Rect) {
        self.0.set(Some(region));
    }
}

/// Observer invoked with every committed region.
pub type RegionListener = Box<dyn FnMut(Rect)>;

#[derive(Debug, Clone, Copy)]
enum DragState {
    Marker {
        orientation: Orientation,
        grab_offset: Vec2,
    },
    Region {
        grab_offset: Vec2,
    },
}

/// Square crop region over a fixed border, edited through four corner markers.
///
/// The four markers encode the same square redundantly. Every edit builds a
/// full proposal of all four positions from a single grid-aligned side length,
/// validates it, and then either commits all of them or none.
pub struct CropRegionController {
    border: Rect,
    min_extent: f64,
    markers: [CornerMarker; 4],
    handle: RegionHandle,
    listeners: Vec<RegionListener>,
    drag: Option<DragState>,
}

impl CropRegionController {
    /// Place a centered square as large as the border allows.
    ///
    /// The border is first shrunk onto the geometry grid.
    pub fn new(border: Rect) -> Result<Self, CropError> {
        Self::with_handle(border, RegionHandle::new())
    }

    /// Like [`CropRegionController::new`], publishing into an existing handle.
    pub fn with_handle(border: Rect, handle: RegionHandle) -> Result<Self, CropError> {
        let grid_border = border.snapped_inside();
        let side = snap_down(grid_border.width().min(grid_border.height()));
        if side <= MIN_EXTENT {
            return Err(CropError::BorderTooSmall {
                width: border.width(),
                height: border.height(),
                min_extent: MIN_EXTENT,
            });
        }
        let border = grid_border;

        let square = Rect::from_origin_size(
            border.left + snap_down((border.width() - side) / 2.0),
            border.top + snap_down((border.height() - side) / 2.0),
            side,
            side,
        );
        let markers = markers_on(&square);
        handle.publish(square);
        debug!("crop region initialised at {square:?} within {border:?}");

        Ok(Self {
            border,
            min_extent: MIN_EXTENT,
            markers,
            handle,
            listeners: Vec::new(),
            drag: None,
        })
    }

    pub fn border(&self) -> Rect {
        self.border
    }

    pub fn markers(&self) -> &[CornerMarker; 4] {
        &self.markers
    }

    pub fn marker(&self, orientation: Orientation) -> &CornerMarker {
        &self.markers[orientation.index()]
    }

    /// The committed region, spanned by the top-left and bottom-right markers.
    pub fn current_region(&self) -> Rect {
        region_of(&self.markers)
    }

    pub fn region_handle(&self) -> RegionHandle {
        self.handle.clone()
    }

    /// Register an observer for committed regions.
    pub fn subscribe(&mut self, listener: impl FnMut(Rect) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Move the marker at `orientation` towards `candidate`.
    ///
    /// The marker's own movement rule picks the actual position, which is
    /// then reduced to a side length measured from the opposite corner. That
    /// corner stays put and the two neighbours follow along their shared axis.
    pub fn on_marker_dragged(&mut self, orientation: Orientation, candidate: Vec2) -> MoveOutcome {
        let anchor = self.markers[orientation.opposite().index()].position();
        let moved = self.markers[orientation.index()].constrained_position(candidate);
        let outward = orientation.outward();
        // Negative once the marker crosses the opposite corner.
        let side = snap((moved - anchor).dot(outward) / 2.0);
        let moved = anchor + outward * side;

        let mut proposal = self.markers;
        proposal[orientation.index()].set_position(moved);

        let x_neighbour = &mut proposal[orientation.same_x_neighbour().index()];
        let position = x_neighbour.position();
        x_neighbour.set_position(Vec2::new(moved.x, position.y));

        let y_neighbour = &mut proposal[orientation.same_y_neighbour().index()];
        let position = y_neighbour.position();
        y_neighbour.set_position(Vec2::new(position.x, moved.y));

        self.commit(proposal)
    }

    /// Translate the whole region so its top-left lands on `candidate_top_left`.
    pub fn drag_whole_region(&mut self, candidate_top_left: Vec2) -> MoveOutcome {
        let side = self.current_region().width();
        let origin = candidate_top_left.snapped();
        let region = Rect::from_origin_size(origin.x, origin.y, side, side);
        self.commit(markers_on(&region))
    }

    /// Start a drag if `point` grabs a handle or the region's interior.
    ///
    /// Handles win over the interior. Returns whether a drag started.
    pub fn pointer_press(&mut self, point: Vec2) -> bool {
        self.drag = if let Some(marker) = self.marker_at(point) {
            Some(DragState::Marker {
                orientation: marker.orientation(),
                grab_offset: point - marker.position(),
            })
        } else if self.current_region().inscribed_circle_contains(point) {
            Some(DragState::Region {
                grab_offset: point - self.current_region().top_left(),
            })
        } else {
            None
        };
        self.drag.is_some()
    }

    /// Continue the active drag. `None` when no drag is in progress.
    pub fn pointer_move(&mut self, point: Vec2) -> Option<MoveOutcome> {
        match self.drag? {
            DragState::Marker {
                orientation,
                grab_offset,
            } => Some(self.on_marker_dragged(orientation, point - grab_offset)),
            DragState::Region { grab_offset } => Some(self.drag_whole_region(point - grab_offset)),
        }
    }

    pub fn pointer_release(&mut self) {
        self.drag = None;
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Cursor affordance for a hover at `point`. Carries no state.
    pub fn hover(&self, point: Vec2) -> CursorAffordance {
        match self.marker_at(point).map(CornerMarker::orientation) {
            Some(Orientation::TopLeft | Orientation::BottomRight) => {
                CursorAffordance::ResizeDiagonal
            }
            Some(Orientation::TopRight | Orientation::BottomLeft) => {
                CursorAffordance::ResizeAntiDiagonal
            }
            None if self.current_region().inscribed_circle_contains(point) => {
                CursorAffordance::Move
            }
            None => CursorAffordance::Default,
        }
    }

    fn marker_at(&self, point: Vec2) -> Option<&CornerMarker> {
        self.markers
            .iter()
            .find(|marker| marker.hit_test(point, HANDLE_RADIUS))
    }

    /// Validate a full proposal and commit it, or leave every marker untouched.
    fn commit(&mut self, proposal: [CornerMarker; 4]) -> MoveOutcome {
        let region = region_of(&proposal);
        if !self.is_allowed(&region) {
            debug!("crop move to {region:?} rejected");
            return MoveOutcome::Rejected;
        }

        self.markers = proposal;
        self.handle.publish(region);
        for listener in &mut self.listeners {
            listener(region);
        }
        MoveOutcome::Committed(region)
    }

    fn is_allowed(&self, region: &Rect) -> bool {
        region.width() > self.min_extent
            && region.height() > self.min_extent
            && self.border.contains_rect(region)
    }
}

fn markers_on(region: &Rect) -> [CornerMarker; 4] {
    Orientation::ALL.map(|orientation| CornerMarker::new(orientation, orientation.corner_of(region)))
}

/// Region spanned by the top-left and bottom-right markers. A proposal where
/// those two cross yields negative extents and fails validation.
fn region_of(markers: &[CornerMarker; 4]) -> Rect {
    let top_left = markers[Orientation::TopLeft.index()].position();
    let bottom_right = markers[Orientation::BottomRight.index()].position();
    Rect::new(top_left.x, top_left.y, bottom_right.x, bottom_right.y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn square_border() -> Rect {
        Rect::new(0.0, 0.0, 400.0, 400.0)
    }

    fn positions(controller: &CropRegionController) -> [Vec2; 4] {
        controller.markers().map(|marker| marker.position())
    }

    fn assert_invariants(controller: &CropRegionController) {
        let region = controller.current_region();
        assert_eq!(region.width(), region.height(), "not square: {region:?}");
        assert!(region.width() > MIN_EXTENT, "too small: {region:?}");
        assert!(controller.border().contains_rect(&region), "outside: {region:?}");
        for orientation in Orientation::ALL {
            assert_eq!(
                controller.marker(orientation).position(),
                orientation.corner_of(&region),
                "{orientation:?} drifted from the region corner"
            );
        }
    }

    #[test]
    fn initial_region_is_centered_square() {
        let controller = CropRegionController::new(Rect::new(0.0, 0.0, 640.0, 480.0)).unwrap();
        assert_eq!(
            controller.current_region(),
            Rect::new(80.0, 0.0, 560.0, 480.0)
        );
        assert_invariants(&controller);
    }

    #[test]
    fn markers_start_on_region_corners_in_clockwise_order() {
        let controller = CropRegionController::new(square_border()).unwrap();
        assert_eq!(
            positions(&controller),
            [
                Vec2::new(0.0, 0.0),
                Vec2::new(400.0, 0.0),
                Vec2::new(400.0, 400.0),
                Vec2::new(0.0, 400.0),
            ]
        );
    }

    #[test]
    fn border_too_small_is_rejected() {
        let result = CropRegionController::new(Rect::new(0.0, 0.0, 640.0, 100.0));
        assert!(matches!(result, Err(CropError::BorderTooSmall { .. })));
    }

    #[test]
    fn dragging_top_left_inwards_shrinks_square() {
        let mut controller = CropRegionController::new(square_border()).unwrap();
        let outcome = controller.on_marker_dragged(Orientation::TopLeft, Vec2::new(50.0, 50.0));

        assert_eq!(
            outcome,
            MoveOutcome::Committed(Rect::new(50.0, 50.0, 400.0, 400.0))
        );
        assert_eq!(controller.current_region().width(), 350.0);
        assert_invariants(&controller);
    }

    #[test]
    fn off_diagonal_drag_is_projected() {
        let mut controller = CropRegionController::new(square_border()).unwrap();
        let outcome = controller.on_marker_dragged(Orientation::TopLeft, Vec2::new(390.0, 0.0));

        assert_eq!(
            outcome,
            MoveOutcome::Committed(Rect::new(195.0, 195.0, 400.0, 400.0))
        );
        assert_invariants(&controller);
    }

    #[test]
    fn shrinking_below_min_extent_rolls_back() {
        let mut controller = CropRegionController::new(square_border()).unwrap();
        let before = positions(&controller);

        let outcome = controller.on_marker_dragged(Orientation::TopLeft, Vec2::new(390.0, 390.0));

        assert_eq!(outcome, MoveOutcome::Rejected);
        assert_eq!(positions(&controller), before);
    }

    #[test]
    fn exactly_min_extent_is_rejected() {
        let mut controller = CropRegionController::new(square_border()).unwrap();
        let outcome = controller.on_marker_dragged(Orientation::TopLeft, Vec2::new(300.0, 300.0));
        assert_eq!(outcome, MoveOutcome::Rejected);
    }

    #[test]
    fn growing_past_border_rolls_back() {
        let mut controller = CropRegionController::new(square_border()).unwrap();
        let before = positions(&controller);

        let outcome =
            controller.on_marker_dragged(Orientation::BottomRight, Vec2::new(410.0, 410.0));

        assert_eq!(outcome, MoveOutcome::Rejected);
        assert_eq!(positions(&controller), before);
    }

    #[test]
    fn dragging_past_the_opposite_corner_is_rejected() {
        let mut controller = CropRegionController::new(Rect::new(0.0, 0.0, 2000.0, 2000.0)).unwrap();
        controller.on_marker_dragged(Orientation::BottomRight, Vec2::new(600.0, 600.0));
        let before = positions(&controller);

        let outcome = controller.on_marker_dragged(Orientation::TopLeft, Vec2::new(900.0, 900.0));

        assert_eq!(outcome, MoveOutcome::Rejected);
        assert_eq!(positions(&controller), before);
    }

    #[test]
    fn anti_diagonal_corner_moves_neighbours_and_keeps_opposite() {
        let mut controller = CropRegionController::new(square_border()).unwrap();
        let outcome =
            controller.on_marker_dragged(Orientation::TopRight, Vec2::new(350.0, 50.0));

        assert_eq!(
            outcome,
            MoveOutcome::Committed(Rect::new(0.0, 50.0, 350.0, 400.0))
        );
        assert_eq!(
            controller.marker(Orientation::BottomLeft).position(),
            Vec2::new(0.0, 400.0)
        );
        assert_eq!(
            controller.marker(Orientation::BottomRight).position(),
            Vec2::new(350.0, 400.0)
        );
        assert_eq!(
            controller.marker(Orientation::TopLeft).position(),
            Vec2::new(0.0, 50.0)
        );
        assert_invariants(&controller);
    }

    #[test]
    fn whole_region_drag_translates_all_markers() {
        let mut controller = CropRegionController::new(square_border()).unwrap();
        controller.on_marker_dragged(Orientation::BottomRight, Vec2::new(200.0, 200.0));

        let outcome = controller.drag_whole_region(Vec2::new(150.0, 100.0));

        assert_eq!(
            outcome,
            MoveOutcome::Committed(Rect::new(150.0, 100.0, 350.0, 300.0))
        );
        assert_invariants(&controller);
    }

    #[test]
    fn whole_region_drag_outside_border_rolls_back() {
        let mut controller = CropRegionController::new(square_border()).unwrap();
        controller.on_marker_dragged(Orientation::BottomRight, Vec2::new(200.0, 200.0));
        let before = positions(&controller);

        let outcome = controller.drag_whole_region(Vec2::new(250.0, 0.0));

        assert_eq!(outcome, MoveOutcome::Rejected);
        assert_eq!(positions(&controller), before);
    }

    fn xorshift(seed: u64) -> impl FnMut() -> f64 {
        let mut state = seed;
        move || {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            (state % 10_000) as f64 / 10.0 - 500.0
        }
    }

    fn run_drag_sequence(controller: &mut CropRegionController, seed: u64, steps: usize) {
        let mut next = xorshift(seed);
        let mut committed = 0;
        for step in 0..steps {
            let before = positions(controller);
            let candidate = Vec2::new(next(), next());
            let outcome = if step % 5 == 0 {
                let target = controller.current_region().top_left() + candidate * 0.1;
                controller.drag_whole_region(target)
            } else {
                let orientation = Orientation::ALL[step % 4];
                let target = controller.marker(orientation).position() + candidate * 0.2;
                controller.on_marker_dragged(orientation, target)
            };
            if outcome == MoveOutcome::Rejected {
                assert_eq!(positions(controller), before, "step {step}");
            } else {
                committed += 1;
            }
            assert_invariants(controller);
        }
        assert!(committed > 0, "no move in {steps} steps was committed");
    }

    #[test]
    fn invariants_hold_after_every_call_in_a_drag_sequence() {
        let mut controller = CropRegionController::new(Rect::new(0.0, 0.0, 1280.0, 720.0)).unwrap();
        run_drag_sequence(&mut controller, 0x2545_f491_4f6c_dd1d, 2000);
    }

    #[test]
    fn fractional_drags_keep_the_square_exact() {
        let mut controller = CropRegionController::new(Rect::new(0.0, 0.0, 1280.0, 720.0)).unwrap();
        for seed in [1, 0x9e37_79b9_7f4a_7c15, 0xdead_beef] {
            run_drag_sequence(&mut controller, seed, 2000);
        }
    }

    #[test]
    fn fractional_border_starts_on_the_grid() {
        let border = Rect::new(0.3, 0.7, 1280.9, 720.2);
        let mut controller = CropRegionController::new(border).unwrap();
        assert!(border.contains_rect(&controller.current_region()));
        assert_invariants(&controller);

        run_drag_sequence(&mut controller, 7, 500);
        assert!(border.contains_rect(&controller.current_region()));
    }

    #[test]
    fn corner_drag_to_fractional_point_gives_equal_sides() {
        let mut controller = CropRegionController::new(Rect::new(0.0, 0.0, 1280.0, 720.0)).unwrap();
        let outcome = controller.on_marker_dragged(Orientation::TopLeft, Vec2::new(618.78, 58.78));

        let MoveOutcome::Committed(region) = outcome else {
            panic!("drag should commit, got {outcome:?}");
        };
        assert_eq!(region.width(), region.height());
        assert_eq!(region.bottom_right(), Vec2::new(1000.0, 720.0));
        assert_invariants(&controller);
    }

    #[test]
    fn subscribers_see_only_committed_regions() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut controller = CropRegionController::new(square_border()).unwrap();
        let sink = Rc::clone(&seen);
        controller.subscribe(move |region| sink.borrow_mut().push(region));

        controller.on_marker_dragged(Orientation::TopLeft, Vec2::new(50.0, 50.0));
        controller.on_marker_dragged(Orientation::TopLeft, Vec2::new(390.0, 390.0));

        assert_eq!(*seen.borrow(), vec![Rect::new(50.0, 50.0, 400.0, 400.0)]);
    }

    #[test]
    fn region_handle_tracks_commits() {
        let mut controller = CropRegionController::new(square_border()).unwrap();
        let handle = controller.region_handle();
        assert_eq!(handle.get(), Some(square_border()));

        controller.on_marker_dragged(Orientation::BottomRight, Vec2::new(300.0, 300.0));
        assert_eq!(handle.get(), Some(Rect::new(0.0, 0.0, 300.0, 300.0)));

        controller.on_marker_dragged(Orientation::BottomRight, Vec2::new(50.0, 50.0));
        assert_eq!(handle.get(), Some(Rect::new(0.0, 0.0, 300.0, 300.0)));
    }

    #[test]
    fn pointer_press_on_handle_starts_marker_drag() {
        let mut controller = CropRegionController::new(square_border()).unwrap();
        assert!(controller.pointer_press(Vec2::new(3.0, 4.0)));

        // Grab offset (3, 4) is preserved, so the marker lands on (50, 50).
        let outcome = controller.pointer_move(Vec2::new(53.0, 54.0));
        assert_eq!(
            outcome,
            Some(MoveOutcome::Committed(Rect::new(50.0, 50.0, 400.0, 400.0)))
        );

        controller.pointer_release();
        assert!(!controller.is_dragging());
        assert_eq!(controller.pointer_move(Vec2::new(0.0, 0.0)), None);
    }

    #[test]
    fn pointer_press_inside_circle_starts_region_drag() {
        let mut controller = CropRegionController::new(Rect::new(0.0, 0.0, 800.0, 400.0)).unwrap();
        assert!(controller.pointer_press(Vec2::new(400.0, 200.0)));

        let outcome = controller.pointer_move(Vec2::new(300.0, 200.0));
        assert_eq!(
            outcome,
            Some(MoveOutcome::Committed(Rect::new(100.0, 0.0, 500.0, 400.0)))
        );
    }

    #[test]
    fn pointer_press_in_square_corner_outside_circle_does_nothing() {
        let mut controller = CropRegionController::new(square_border()).unwrap();
        assert!(!controller.pointer_press(Vec2::new(30.0, 30.0)));
        assert!(!controller.is_dragging());
    }

    #[test]
    fn hover_reports_affordances() {
        let controller = CropRegionController::new(square_border()).unwrap();
        assert_eq!(
            controller.hover(Vec2::new(1.0, 1.0)),
            CursorAffordance::ResizeDiagonal
        );
        assert_eq!(
            controller.hover(Vec2::new(399.0, 2.0)),
            CursorAffordance::ResizeAntiDiagonal
        );
        assert_eq!(
            controller.hover(Vec2::new(200.0, 200.0)),
            CursorAffordance::Move
        );
        assert_eq!(
            controller.hover(Vec2::new(30.0, 30.0)),
            CursorAffordance::Default
        );
        assert!(!controller.is_dragging());
    }
}
