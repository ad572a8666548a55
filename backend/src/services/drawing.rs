//! Rectangle drawing on the map.
//!
//! The map widget is reduced to the [`MapInteraction`] trait: while drawing,
//! panning and rotation are switched off so a drag draws a box instead of
//! moving the map. Pointer input is fed to [`DrawingController::handle`] one
//! event at a time.

use log::debug;

use crate::models::bbox::{BoundingBox, LonLat};

/// Map side effects the controller needs.
pub trait MapInteraction {
    /// Enable or disable drag-pan and drag-rotate.
    fn set_pan_rotate_enabled(&mut self, enabled: bool);
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DrawingState {
    Idle,
    ModeActive,
    Dragging { anchor: LonLat, current: BoundingBox },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DrawingInput {
    StartDrawing,
    PointerDown(LonLat),
    PointerMove(LonLat),
    PointerUp(LonLat),
    Cancel,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DrawingOutput {
    /// Live rectangle while the pointer is held down.
    Preview(BoundingBox),
    /// Final rectangle on release.
    Completed(BoundingBox),
}

pub struct DrawingController<M: MapInteraction> {
    map: M,
    state: DrawingState,
}

impl<M: MapInteraction> DrawingController<M> {
    pub fn new(map: M) -> Self {
        Self {
            map,
            state: DrawingState::Idle,
        }
    }

    pub fn state(&self) -> DrawingState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        !matches!(self.state, DrawingState::Idle)
    }

    pub fn map(&self) -> &M {
        &self.map
    }

    pub fn into_map(self) -> M {
        self.map
    }

    /// Advance the state machine. Inputs that make no sense in the current
    /// state are ignored.
    pub fn handle(&mut self, input: DrawingInput) -> Option<DrawingOutput> {
        let (next, output) = match (self.state, input) {
            (DrawingState::Idle, DrawingInput::StartDrawing) => {
                self.map.set_pan_rotate_enabled(false);
                (DrawingState::ModeActive, None)
            }
            (DrawingState::ModeActive, DrawingInput::PointerDown(anchor)) => (
                DrawingState::Dragging {
                    anchor,
                    current: BoundingBox::from_points(anchor, anchor),
                },
                None,
            ),
            (DrawingState::Dragging { anchor, .. }, DrawingInput::PointerMove(point)) => {
                let current = BoundingBox::from_points(anchor, point);
                (
                    DrawingState::Dragging { anchor, current },
                    Some(DrawingOutput::Preview(current)),
                )
            }
            (DrawingState::Dragging { anchor, .. }, DrawingInput::PointerUp(point)) => {
                let bbox = BoundingBox::from_points(anchor, point);
                debug!("drawing completed: {}", bbox);
                (DrawingState::ModeActive, Some(DrawingOutput::Completed(bbox)))
            }
            (DrawingState::ModeActive | DrawingState::Dragging { .. }, DrawingInput::Cancel) => {
                self.map.set_pan_rotate_enabled(true);
                (DrawingState::Idle, None)
            }
            (state, input) => {
                debug!("ignoring {:?} in state {:?}", input, state);
                (state, None)
            }
        };
        self.state = next;
        output
    }
}
