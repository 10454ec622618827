use crate::key::Key;
use crate::rpc::ChordNode;
use crate::tests::build_ring;
use crate::tests::expected_owner;
use crate::tests::keyed_node;

#[tokio::test(start_paused = true)]
async fn test_every_key_resolves_like_brute_force() {
    let keys = [10u64, 100, 200];
    let nodes = build_ring(&keys).await;

    for node in &nodes {
        for probe in 0..crate::consts::RING_SIZE {
            let owner = ChordNode::find_successor(&**node, Key::new(probe))
                .await
                .expect("lookup should succeed on a quiescent ring");
            assert_eq!(
                owner.key(),
                Key::new(expected_owner(&keys, probe)),
                "probe {probe} from node {}",
                node.key()
            );
        }
    }
}

#[tokio::test(start_paused = true)]
async fn test_node_keys_resolve_to_themselves() {
    let keys = [10u64, 80, 160, 230];
    let nodes = build_ring(&keys).await;

    for node in &nodes {
        for key in keys {
            let owner = ChordNode::find_successor(&**node, Key::new(key))
                .await
                .expect("lookup should succeed");
            assert_eq!(owner.key(), Key::new(key));
        }
    }
}

#[tokio::test(start_paused = true)]
async fn test_closest_preceding_node_skips_past_the_key() {
    let nodes = build_ring(&[10u64, 100, 200]).await;
    let node_10 = &nodes[0];

    // Looking just past itself, no finger precedes the key strictly, so
    // the node itself is the best answer.
    let hop = node_10
        .closest_preceding_node(Key::new(11))
        .await
        .expect("scan should succeed");
    assert_eq!(hop.key(), Key::new(10));

    // Looking far around the ring, the farthest preceding finger wins.
    let hop = node_10
        .closest_preceding_node(Key::new(250))
        .await
        .expect("scan should succeed");
    assert_eq!(hop.key(), Key::new(200));
}

#[tokio::test(start_paused = true)]
async fn test_lookup_through_stale_entry_point() {
    // An unjoined node knows nobody; lookups stay on itself.
    let loner = keyed_node("loner", 42);
    let owner = ChordNode::find_successor(&*loner, Key::new(7))
        .await
        .expect("lone lookup");
    assert_eq!(owner.key(), Key::new(42));
}
