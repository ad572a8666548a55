//! From a drag on the map to a request ready for dispatch.

use waterwatch::models::{AnalysisRequest, BoundingBox, DataSource, LonLat};
use waterwatch::services::drawing::{
    DrawingController, DrawingInput, DrawingOutput, DrawingState, MapInteraction,
};
use waterwatch::services::validation::validate;

/// Map double that tracks whether drag-pan is currently enabled.
struct FakeMap {
    pan_rotate_enabled: bool,
}

impl MapInteraction for FakeMap {
    fn set_pan_rotate_enabled(&mut self, enabled: bool) {
        self.pan_rotate_enabled = enabled;
    }
}

fn drag(ctl: &mut DrawingController<FakeMap>, from: LonLat, to: LonLat) -> Option<BoundingBox> {
    ctl.handle(DrawingInput::PointerDown(from));
    ctl.handle(DrawingInput::PointerMove(LonLat::new(
        (from.lon + to.lon) / 2.0,
        (from.lat + to.lat) / 2.0,
    )));
    match ctl.handle(DrawingInput::PointerUp(to)) {
        Some(DrawingOutput::Completed(bbox)) => Some(bbox),
        _ => None,
    }
}

#[test]
fn test_drag_yields_expected_bbox() {
    let mut ctl = DrawingController::new(FakeMap {
        pan_rotate_enabled: true,
    });
    ctl.handle(DrawingInput::StartDrawing);
    assert!(!ctl.map().pan_rotate_enabled);

    let bbox = drag(
        &mut ctl,
        LonLat::new(-122.5, 37.7),
        LonLat::new(-122.0, 37.9),
    )
    .expect("drag should complete");

    assert_eq!(
        bbox,
        BoundingBox {
            west: -122.5,
            south: 37.7,
            east: -122.0,
            north: 37.9,
        }
    );
    assert_eq!(ctl.state(), DrawingState::ModeActive);
}

#[test]
fn test_reverse_drag_gives_same_bbox() {
    let mut ctl = DrawingController::new(FakeMap {
        pan_rotate_enabled: true,
    });
    ctl.handle(DrawingInput::StartDrawing);
    let forward = drag(&mut ctl, LonLat::new(-122.5, 37.7), LonLat::new(-122.0, 37.9));
    let backward = drag(&mut ctl, LonLat::new(-122.0, 37.9), LonLat::new(-122.5, 37.7));
    assert_eq!(forward, backward);

    ctl.handle(DrawingInput::Cancel);
    assert!(ctl.map().pan_rotate_enabled);
    assert!(!ctl.is_active());
}

#[test]
fn test_drawn_box_builds_request() {
    let mut ctl = DrawingController::new(FakeMap {
        pan_rotate_enabled: true,
    });
    ctl.handle(DrawingInput::StartDrawing);
    let bbox = drag(&mut ctl, LonLat::new(-122.5, 37.7), LonLat::new(-122.0, 37.9)).unwrap();

    let request = AnalysisRequest::build(bbox, "2025-06-01", "2025-06-30", "landsat8").unwrap();
    assert_eq!(request.data_source, DataSource::Landsat8);
    assert_eq!(request.bbox, bbox);
}

#[test]
fn test_click_without_drag_is_rejected_downstream() {
    let mut ctl = DrawingController::new(FakeMap {
        pan_rotate_enabled: true,
    });
    ctl.handle(DrawingInput::StartDrawing);
    ctl.handle(DrawingInput::PointerDown(LonLat::new(10.0, 10.0)));
    let bbox = match ctl.handle(DrawingInput::PointerUp(LonLat::new(10.0, 10.0))) {
        Some(DrawingOutput::Completed(bbox)) => bbox,
        other => panic!("unexpected output {:?}", other),
    };

    let report = validate(&bbox, "2025-06-01", "2025-06-30", "sentinel2");
    assert_eq!(report.errors().len(), 1);
    assert!(report.errors()[0].starts_with("Bounding box too small"));
}
