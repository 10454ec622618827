use bytes::Bytes;

use crate::key::Key;
use crate::rpc::ChordNode;
use crate::tests::build_ring;
use crate::tests::converge;
use crate::tests::keyed_node;
use crate::tests::CONVERGE_ROUNDS;

#[tokio::test(start_paused = true)]
async fn test_ring_pointers_converge() {
    let keys = [10u64, 100, 200];
    let nodes = build_ring(&keys).await;

    // Successor and predecessor pointers form the sorted cycle.
    let expectations = [(10u64, 100u64, 200u64), (100, 200, 10), (200, 10, 100)];
    for (node, (key, successor, predecessor)) in nodes.iter().zip(expectations) {
        assert_eq!(node.key(), Key::new(key));
        assert_eq!(
            node.lock_finger().unwrap().successor().key(),
            Key::new(successor)
        );
        let pred = node
            .predecessor()
            .await
            .unwrap()
            .map(|finger| finger.key());
        assert_eq!(pred, Some(Key::new(predecessor)));
    }
}

#[tokio::test(start_paused = true)]
async fn test_successor_windows_chain_the_ring() {
    let nodes = build_ring(&[10u64, 100, 200]).await;

    // Each window holds the run of ring neighbors beyond the immediate
    // successor: for node 10 that is 200 and then 10 itself.
    assert_eq!(
        nodes[0].lock_successors().unwrap().keys(),
        vec![Key::new(200), Key::new(10)]
    );
    assert_eq!(
        nodes[1].lock_successors().unwrap().keys(),
        vec![Key::new(10), Key::new(100)]
    );
    assert_eq!(
        nodes[2].lock_successors().unwrap().keys(),
        vec![Key::new(100), Key::new(200)]
    );
}

#[tokio::test(start_paused = true)]
async fn test_quiescent_ring_reaches_a_fixed_point() {
    let nodes = build_ring(&[10u64, 100, 200]).await;

    let snapshot: Vec<_> = nodes
        .iter()
        .map(|node| {
            (
                node.lock_finger().unwrap().keys(),
                node.lock_successors().unwrap().keys(),
            )
        })
        .collect();

    converge(&nodes, CONVERGE_ROUNDS).await;

    let after: Vec<_> = nodes
        .iter()
        .map(|node| {
            (
                node.lock_finger().unwrap().keys(),
                node.lock_successors().unwrap().keys(),
            )
        })
        .collect();
    assert_eq!(snapshot, after);
}

#[tokio::test(start_paused = true)]
async fn test_dead_successor_is_replaced_from_the_window() {
    let mut nodes = build_ring(&[10u64, 80, 160, 230]).await;

    // Kill node 160: dropping the only strong reference makes every
    // handle to it unreachable, like a crashed process.
    let dead = nodes.remove(2);
    assert_eq!(dead.key(), Key::new(160));
    drop(dead);

    converge(&nodes, CONVERGE_ROUNDS).await;

    // Node 80 routed through 160; it must have promoted 230.
    assert_eq!(
        nodes[1].lock_finger().unwrap().successor().key(),
        Key::new(230)
    );
    // 230 must have dropped its dead predecessor and learned 80.
    let pred = nodes[2]
        .predecessor()
        .await
        .unwrap()
        .map(|finger| finger.key());
    assert_eq!(pred, Some(Key::new(80)));

    // Lookups for ranges not owned by the dead node keep resolving.
    for (probe, owner) in [(5u64, 10u64), (50, 80), (200, 230), (250, 10)] {
        let resolved = ChordNode::find_successor(&*nodes[0], Key::new(probe))
            .await
            .expect("lookup after failover");
        assert_eq!(resolved.key(), Key::new(owner), "probe {probe}");
    }
}

#[tokio::test(start_paused = true)]
async fn test_notify_only_accepts_closer_predecessors() {
    let nodes = build_ring(&[10u64, 100, 200]).await;
    let node_100 = &nodes[1];

    // 10 is the current predecessor of 100; a farther candidate like 200
    // must be rejected, while the status quo is kept.
    node_100
        .notify(nodes[2].self_finger())
        .await
        .expect("notify");
    let pred = node_100
        .predecessor()
        .await
        .unwrap()
        .map(|finger| finger.key());
    assert_eq!(pred, Some(Key::new(10)));
}

#[tokio::test(start_paused = true)]
async fn test_restarted_node_rejoins_without_losing_data() {
    // Ring of 10, 100, 200. "alex" hashes into (10, 100], so node 100
    // stores it.
    let mut nodes = build_ring(&[10u64, 100, 200]).await;
    let stored = nodes[2]
        .put("alex", Bytes::from_static(b"37"))
        .await
        .expect("put through node 200");
    assert_eq!(stored.key(), Key::new(100));

    // Take node 10 down and let the survivors repair the ring.
    let dead = nodes.remove(0);
    drop(dead);
    converge(&nodes, CONVERGE_ROUNDS).await;
    assert_eq!(
        nodes[1].get("alex").await.expect("get after crash"),
        Some(Bytes::from_static(b"37"))
    );

    // Bring a fresh node up on the same position and rejoin.
    let reborn = keyed_node("node-10", 10);
    reborn
        .join(&nodes[0].self_finger())
        .await
        .expect("rejoin the ring");
    nodes.insert(0, reborn);
    converge(&nodes, CONVERGE_ROUNDS).await;

    // The key still resolves to node 100 from anywhere, the newcomer
    // included.
    for node in &nodes {
        assert_eq!(
            node.get("alex").await.expect("get after rejoin"),
            Some(Bytes::from_static(b"37")),
            "get from node {}",
            node.key()
        );
    }
}
