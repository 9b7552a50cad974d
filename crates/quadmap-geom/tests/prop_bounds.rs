use proptest::prelude::*;
use quadmap_geom::{NODE_SIZE, NodeCoord, Position, TileBounds};

fn arb_bounds() -> impl Strategy<Value = TileBounds> {
    (0i32..2000, 0i32..2000, 0i32..64, 0i32..64)
        .prop_map(|(x, y, w, h)| TileBounds::new(x, y, x + w, y + h))
}

#[test]
fn aligned_origins_for_two_by_two_nodes() {
    let b = TileBounds::new(0, 0, 7, 7);
    let origins: Vec<(i32, i32)> = b.node_origins().collect();
    assert_eq!(origins, vec![(0, 0), (4, 0), (0, 4), (4, 4)]);
    assert_eq!(b.node_count(), 4);
}

#[test]
fn unaligned_bounds_snap_outward() {
    let b = TileBounds::new(3, 5, 9, 6);
    let a = b.node_aligned();
    assert_eq!(a, TileBounds::new(0, 4, 11, 7));
    let nodes: Vec<NodeCoord> = b.nodes().collect();
    assert_eq!(
        nodes,
        vec![NodeCoord::new(0, 1), NodeCoord::new(1, 1), NodeCoord::new(2, 1)]
    );
}

#[test]
fn expanded_grows_every_side() {
    let b = TileBounds::new(10, 20, 13, 23).expanded(3);
    assert_eq!(b, TileBounds::new(7, 17, 16, 26));
    assert_eq!(TileBounds::new(0, 0, 1, 1).expanded(5).clamped().min_x, 0);
}

#[test]
fn empty_bounds_visit_nothing() {
    let b = TileBounds::new(10, 10, 9, 9);
    assert!(b.is_empty());
    assert_eq!(b.node_origins().count(), 0);
    assert_eq!(b.node_count(), 0);
}

proptest! {
    #[test]
    fn every_tile_lies_in_a_listed_node(b in arb_bounds(), dx in 0i32..64, dy in 0i32..64) {
        let x = b.min_x + dx.min(b.max_x - b.min_x);
        let y = b.min_y + dy.min(b.max_y - b.min_y);
        let node = Position::new(x, y, 7).node();
        prop_assert!(b.nodes().any(|n| n == node));
    }

    #[test]
    fn origins_are_node_aligned_and_counted(b in arb_bounds()) {
        let origins: Vec<(i32, i32)> = b.node_origins().collect();
        prop_assert_eq!(origins.len(), b.node_count());
        for (x, y) in origins {
            prop_assert_eq!(x % NODE_SIZE, 0);
            prop_assert_eq!(y % NODE_SIZE, 0);
            prop_assert!(b.node_aligned().contains(x, y));
        }
    }

    #[test]
    fn node_index_is_unique_within_node(x in 0i32..4, y in 0i32..4) {
        let p = Position::new(100 + x, 200 + y, 7);
        prop_assert_eq!(p.node_index(), (x * NODE_SIZE + y) as usize);
    }
}
