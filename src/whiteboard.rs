//! Whiteboard snapshot bridge.
//!
//! Two independent drawing surfaces (producer: editable, consumer:
//! read-only) are kept consistent through an opaque serialized snapshot held
//! by the backend.
//!
//! ## Grid invariant
//!
//! The grid overlay is synthetic: its primitives are reconstructible purely
//! from surface dimensions and a fixed cell size, so they are tagged with
//! `gridLine: true` and excluded from every saved snapshot **and** from
//! change detection. Saving then loading a snapshot never introduces or
//! drops a non-grid object.

use crate::surface::{DrawingSurface, SurfaceError};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Marker property identifying synthetic grid primitives.
pub const GRID_TAG: &str = "gridLine";

/// Background restored on clear and written into every snapshot.
pub const BOARD_BACKGROUND: &str = "white";

/// Snapshot document format revision, carried for forward compatibility
/// with the drawing library's own loader.
pub const DOCUMENT_VERSION: &str = "5.3.0";

// ---------------------------------------------------------------------------
// Grid overlay
// ---------------------------------------------------------------------------

/// True if the object is a synthetic grid primitive.
pub fn is_grid_object(obj: &Value) -> bool {
    obj.get(GRID_TAG).and_then(Value::as_bool).unwrap_or(false)
}

/// Build the grid overlay for a surface of the given size.
///
/// Lines are non-selectable, non-evented, and tagged so persistence and
/// change detection skip them.
pub fn grid_lines(width: f64, height: f64, cell: f64) -> Vec<Value> {
    let mut lines = Vec::new();
    if cell <= 0.0 {
        return lines;
    }

    let line = |x1: f64, y1: f64, x2: f64, y2: f64| {
        json!({
            "type": "line",
            "x1": x1, "y1": y1, "x2": x2, "y2": y2,
            "stroke": "#ddd",
            "strokeWidth": 1,
            "selectable": false,
            "evented": false,
            GRID_TAG: true,
        })
    };

    let mut x = 0.0;
    while x < width {
        lines.push(line(x, 0.0, x, height));
        x += cell;
    }
    let mut y = 0.0;
    while y < height {
        lines.push(line(0.0, y, width, y));
        y += cell;
    }
    lines
}

// ---------------------------------------------------------------------------
// Snapshot document
// ---------------------------------------------------------------------------

/// Serialized drawing-surface state: every drawn primitive except grid
/// overlay primitives, plus the background color.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotDocument {
    pub version: String,
    pub objects: Vec<Value>,
    pub background: String,
}

impl SnapshotDocument {
    /// Capture the persistable content of a surface, filtering out grid
    /// primitives.
    pub fn capture(surface: &dyn DrawingSurface) -> Self {
        Self {
            version: DOCUMENT_VERSION.to_string(),
            objects: surface
                .objects()
                .into_iter()
                .filter(|o| !is_grid_object(o))
                .collect(),
            background: surface.background(),
        }
    }

    /// Digest of the persistable content. Grid primitives never influence
    /// this, so toggling the overlay does not look like an edit.
    pub fn digest(&self) -> md5::Digest {
        let body = serde_json::to_vec(&self.objects).unwrap_or_default();
        md5::compute(body)
    }

    /// Serialized form stored by the backend.
    pub fn to_state_string(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

// ---------------------------------------------------------------------------
// Consumer side
// ---------------------------------------------------------------------------

/// Normalize a backend `state` value: older backends store the snapshot as
/// a JSON string, newer ones as an object.
pub fn normalize_state(state: &Value) -> Result<Value, SurfaceError> {
    match state {
        Value::String(s) => serde_json::from_str(s)
            .map_err(|e| SurfaceError::InvalidState(format!("state string is not JSON: {e}"))),
        other => Ok(other.clone()),
    }
}

/// Replace a read-only surface's contents with a fetched snapshot and force
/// every loaded object non-interactive (the consumer never edits).
pub fn apply_state(surface: &mut dyn DrawingSurface, state: &Value) -> Result<(), SurfaceError> {
    let normalized = normalize_state(state)?;
    surface.load_state(&normalized)?;
    surface.set_interactive(false);
    Ok(())
}

// ---------------------------------------------------------------------------
// Producer side
// ---------------------------------------------------------------------------

/// Producer bridge: turns local surface mutations into backend saves.
///
/// `sync` is called after every mutation (stroke completion, shape
/// finalization, object modification, clear); it returns a state string
/// only when the non-grid content actually changed since the last push,
/// so overlay churn and repeated events do not spam the backend.
#[derive(Debug, Default)]
pub struct WhiteboardPublisher {
    last_digest: Option<md5::Digest>,
}

impl WhiteboardPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Capture the surface; returns the serialized state to save, or `None`
    /// when nothing persistable changed.
    pub fn sync(&mut self, surface: &dyn DrawingSurface) -> Option<String> {
        let doc = SnapshotDocument::capture(surface);
        let digest = doc.digest();
        if self.last_digest == Some(digest) {
            return None;
        }
        self.last_digest = Some(digest);
        Some(doc.to_state_string())
    }

    /// Wipe the surface, restore the background, regenerate the grid, and
    /// return the (empty) state to persist.
    pub fn clear(
        &mut self,
        surface: &mut dyn DrawingSurface,
        width: f64,
        height: f64,
        cell: f64,
    ) -> String {
        surface.clear(BOARD_BACKGROUND);
        surface.add_objects(grid_lines(width, height, cell));

        let doc = SnapshotDocument::capture(surface);
        self.last_digest = Some(doc.digest());
        doc.to_state_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::HeadlessCanvas;

    fn stroke(id: u32) -> Value {
        json!({"type": "path", "path": format!("M 0 0 L {id} {id}"), "stroke": "#000"})
    }

    // ---------------------------------------------------------------
    // Grid exclusion
    // ---------------------------------------------------------------

    #[test]
    fn capture_excludes_grid_objects() {
        let mut canvas = HeadlessCanvas::new();
        canvas.add_objects(grid_lines(100.0, 100.0, 50.0));
        canvas.add_objects(vec![stroke(1), stroke(2)]);

        let doc = SnapshotDocument::capture(&canvas);
        assert_eq!(doc.objects.len(), 2);
        assert!(doc.objects.iter().all(|o| !is_grid_object(o)));
    }

    #[test]
    fn save_then_load_round_trips_non_grid_objects() {
        let mut producer = HeadlessCanvas::new();
        producer.add_objects(grid_lines(200.0, 200.0, 50.0));
        producer.add_objects(vec![stroke(1)]);

        let state = SnapshotDocument::capture(&producer).to_state_string();

        let mut consumer = HeadlessCanvas::new();
        apply_state(&mut consumer, &Value::String(state)).unwrap();

        assert_eq!(consumer.objects.len(), 1);
        assert!(!is_grid_object(&consumer.objects[0]));
    }

    #[test]
    fn grid_lines_cover_both_axes() {
        let lines = grid_lines(100.0, 50.0, 50.0);
        // 2 vertical (x = 0, 50) + 1 horizontal (y = 0)
        assert_eq!(lines.len(), 3);
        assert!(lines.iter().all(is_grid_object));
    }

    // ---------------------------------------------------------------
    // Consumer apply
    // ---------------------------------------------------------------

    #[test]
    fn apply_state_forces_objects_non_interactive() {
        let mut producer = HeadlessCanvas::new();
        producer.add_objects(vec![stroke(7)]);
        let doc = SnapshotDocument::capture(&producer);

        let mut consumer = HeadlessCanvas::new();
        apply_state(&mut consumer, &serde_json::to_value(&doc).unwrap()).unwrap();

        assert!(!consumer.interactive);
        for obj in &consumer.objects {
            assert_eq!(obj["selectable"], Value::Bool(false));
            assert_eq!(obj["evented"], Value::Bool(false));
        }
    }

    #[test]
    fn apply_state_rejects_garbage_string() {
        let mut consumer = HeadlessCanvas::new();
        let err = apply_state(&mut consumer, &Value::String("not json".into()));
        assert!(err.is_err());
        assert_eq!(consumer.loads, 0);
    }

    // ---------------------------------------------------------------
    // Publisher change detection
    // ---------------------------------------------------------------

    #[test]
    fn publisher_skips_unchanged_content() {
        let mut canvas = HeadlessCanvas::new();
        canvas.add_objects(vec![stroke(1)]);

        let mut publisher = WhiteboardPublisher::new();
        assert!(publisher.sync(&canvas).is_some());
        assert!(publisher.sync(&canvas).is_none());

        canvas.add_objects(vec![stroke(2)]);
        assert!(publisher.sync(&canvas).is_some());
    }

    #[test]
    fn grid_changes_do_not_trigger_a_save() {
        let mut canvas = HeadlessCanvas::new();
        canvas.add_objects(vec![stroke(1)]);

        let mut publisher = WhiteboardPublisher::new();
        assert!(publisher.sync(&canvas).is_some());

        canvas.add_objects(grid_lines(400.0, 400.0, 50.0));
        assert!(publisher.sync(&canvas).is_none());
    }

    #[test]
    fn clear_resets_surface_and_publishes_empty_state() {
        let mut canvas = HeadlessCanvas::new();
        canvas.add_objects(vec![stroke(1)]);

        let mut publisher = WhiteboardPublisher::new();
        let state = publisher.clear(&mut canvas, 100.0, 100.0, 50.0);

        let doc: SnapshotDocument = serde_json::from_str(&state).unwrap();
        assert!(doc.objects.is_empty());
        assert_eq!(doc.background, BOARD_BACKGROUND);
        // Grid was regenerated on the live surface but not persisted.
        assert!(canvas.objects.iter().all(is_grid_object));
        assert!(!canvas.objects.is_empty());
    }
}
