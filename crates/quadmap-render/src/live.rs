//! Partial loading for maps streamed from a live host.

use std::sync::Mutex;

use quadmap_geom::GROUND_LAYER;
use quadmap_map::{MapNode, SpatialMap};

use crate::view::RenderView;

/// Outbound half of a live session. Requests are fire and forget; the reply
/// arrives later and marks the node half visible.
pub trait LiveClient {
    /// `x`, `y` are the tile coordinates of the node origin.
    fn query_node(&self, x: i32, y: i32, underground: bool);
}

/// Creates every missing leaf under the floors the view will draw, hidden
/// until the host delivers it. Returns how many leaves were created.
pub fn prepare_live_nodes(map: &mut SpatialMap, view: &RenderView) -> usize {
    let before = map.node_count();
    for z in view.floors() {
        let bounds = view.floor_bounds(z).node_aligned();
        for (x, y) in bounds.node_origins() {
            map.create_leaf(x, y);
        }
    }
    let created = map.node_count() - before;
    if created > 0 {
        log::trace!(target: "live", "created {created} placeholder nodes");
    }
    created
}

/// Sends `query_node` for a node half that has not been requested yet.
/// True when this call sent it.
pub fn request_node(node: &MapNode, underground: bool, client: &dyn LiveClient) -> bool {
    if node.is_visible(underground) || !node.try_request(underground) {
        return false;
    }
    let (x, y) = node.coord().origin();
    log::debug!(target: "live", "query node ({x}, {y}) underground={underground}");
    client.query_node(x, y, underground);
    true
}

#[inline]
pub fn is_underground_floor(z: i32) -> bool {
    z > GROUND_LAYER
}

/// Client that queues requests for the caller to answer, used by the
/// simulated live session and in tests.
#[derive(Debug, Default)]
pub struct QueuedLiveClient {
    requests: Mutex<Vec<(i32, i32, bool)>>,
}

impl QueuedLiveClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take_requests(&self) -> Vec<(i32, i32, bool)> {
        match self.requests.lock() {
            Ok(mut q) => std::mem::take(&mut *q),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }

    pub fn pending(&self) -> usize {
        self.requests.lock().map(|q| q.len()).unwrap_or(0)
    }
}

impl LiveClient for QueuedLiveClient {
    fn query_node(&self, x: i32, y: i32, underground: bool) {
        match self.requests.lock() {
            Ok(mut q) => q.push((x, y, underground)),
            Err(poisoned) => poisoned.into_inner().push((x, y, underground)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::DrawingOptions;
    use crate::view::Camera;

    #[test]
    fn request_is_sent_once() {
        let mut map = SpatialMap::new_live();
        let client = QueuedLiveClient::new();
        let node = map.create_leaf(8, 8);
        assert!(request_node(node, false, &client));
        assert!(!request_node(node, false, &client));
        assert!(request_node(node, true, &client));
        assert_eq!(client.take_requests(), vec![(8, 8, false), (8, 8, true)]);
    }

    #[test]
    fn visible_nodes_are_never_requested() {
        let mut map = SpatialMap::new_live();
        let client = QueuedLiveClient::new();
        map.mark_node_loaded(4, 4, false);
        let node = map.get_leaf(4, 4).expect("node");
        assert!(!request_node(node, false, &client));
        assert_eq!(client.pending(), 0);
    }

    #[test]
    fn prepare_creates_hidden_leaves() {
        let mut map = SpatialMap::new_live();
        let camera = Camera {
            screen_width: 64,
            screen_height: 64,
            scroll_x: 320,
            scroll_y: 320,
            ..Camera::default()
        };
        let view = RenderView::setup(&camera, &DrawingOptions::default());
        let created = prepare_live_nodes(&mut map, &view);
        assert!(created > 0);
        assert_eq!(prepare_live_nodes(&mut map, &view), 0);
        let node = map.get_leaf(12, 12).expect("leaf under the viewport");
        assert!(!node.is_visible(false));
    }
}
