//! # Bootstrap Integration Tests
//!
//! Submission normalization, route exchange and genesis issuance across
//! in-process nodes.

use std::sync::Arc;

use project_chain::{
    BootstrapError, ChainConfig, FirstShareholder, InMemoryNodeDirectory, LocalNodeClient,
    NodeClient, NodeIdentity, ProjectNode, ProjectSubmit, ShareholderRef,
};
use shared_crypto::SigningKey;
use shared_types::{NodeRoute, Uid};

fn spawn(directory: &InMemoryNodeDirectory, name: &str, seed: u8) -> Arc<LocalNodeClient> {
    let node = ProjectNode::new(
        name,
        NodeRoute::http(name, 9000 + seed as u16),
        SigningKey::from_seed([seed; 32]),
    )
    .with_config(ChainConfig::immediate(4));
    directory.register(Arc::new(node))
}

fn client_ref(client: &Arc<LocalNodeClient>) -> ShareholderRef {
    ShareholderRef::Client(client.clone() as Arc<dyn NodeClient>)
}

#[tokio::test]
async fn test_every_shareholder_stores_the_same_genesis() {
    let directory = InMemoryNodeDirectory::new();
    let a = spawn(&directory, "alice", 1);
    let b = spawn(&directory, "bob", 2);
    let c = spawn(&directory, "carol", 3);

    let issued = ProjectSubmit::new("shared", vec![client_ref(&a), client_ref(&b), client_ref(&c)])
        .description("three way")
        .start(&directory, &FirstShareholder)
        .await
        .unwrap();

    assert_eq!(issued.len(), 3);
    let first = &issued[0];
    assert!(issued.iter().all(|g| g == first));
    assert!(first.verify_start_hash().unwrap());
    assert_eq!(first.state_sync_leader, a.identity());
    assert_eq!(first.leader_node_route, Some(a.route()));

    for client in [&a, &b, &c] {
        let stored = client.node().genesis(&first.id).unwrap();
        assert_eq!(stored.start_hash, first.start_hash);
    }
}

#[tokio::test]
async fn test_leader_exchanges_routes_with_followers_only() {
    let directory = InMemoryNodeDirectory::new();
    let a = spawn(&directory, "alice", 1);
    let b = spawn(&directory, "bob", 2);
    let c = spawn(&directory, "carol", 3);

    ProjectSubmit::new("routes", vec![client_ref(&a), client_ref(&b), client_ref(&c)])
        .normalize()
        .await
        .unwrap();

    let leader_peers: Vec<NodeIdentity> = a.node().peers().into_iter().map(|(id, _)| id).collect();
    assert_eq!(leader_peers.len(), 2);
    assert!(leader_peers.contains(&b.identity()));
    assert!(leader_peers.contains(&c.identity()));

    assert_eq!(b.node().peers(), vec![(a.identity(), a.route())]);
    assert_eq!(c.node().peers(), vec![(a.identity(), a.route())]);
}

#[tokio::test]
async fn test_identities_skip_route_exchange() {
    let directory = InMemoryNodeDirectory::new();
    let a = spawn(&directory, "alice", 1);
    let b = spawn(&directory, "bob", 2);

    let normalized = ProjectSubmit::new("ids", vec![a.identity().into(), b.identity().into()])
        .normalize()
        .await
        .unwrap();

    assert_eq!(normalized.leader_node_route, None);
    assert!(a.node().peers().is_empty());
}

#[tokio::test]
async fn test_users_receive_the_project() {
    let directory = InMemoryNodeDirectory::new();
    let owner = spawn(&directory, "owner", 1);
    let user = spawn(&directory, "scientist", 2);

    let issued = ProjectSubmit::new("for users", vec![owner.identity().into()])
        .users(vec![client_ref(&user)])
        .user_email_address("ds@example.org")
        .start(&directory, &FirstShareholder)
        .await
        .unwrap();

    let project_id = issued[0].id;
    assert!(user.node().genesis(&project_id).is_some());
    assert!(owner.node().genesis(&project_id).is_none());
    assert_eq!(issued[0].state_sync_leader, owner.identity());
}

#[tokio::test]
async fn test_unknown_node_fails_bootstrap() {
    let directory = InMemoryNodeDirectory::new();
    let a = spawn(&directory, "alice", 1);
    let ghost = NodeIdentity::new(Uid::new(), SigningKey::from_seed([42u8; 32]).verify_key());

    let err = ProjectSubmit::new("ghost", vec![a.identity().into(), ghost.clone().into()])
        .start(&directory, &FirstShareholder)
        .await
        .unwrap_err();

    assert!(matches!(err, BootstrapError::NodeUnreachable(id) if id == ghost));
}

#[tokio::test]
async fn test_offline_follower_breaks_route_exchange() {
    let directory = InMemoryNodeDirectory::new();
    let a = spawn(&directory, "alice", 1);
    let b = spawn(&directory, "bob", 2);
    b.set_offline(true);

    let err = ProjectSubmit::new("offline", vec![client_ref(&a), client_ref(&b)])
        .normalize()
        .await
        .unwrap_err();

    assert!(matches!(err, BootstrapError::RouteExchange { .. }));
}

#[tokio::test]
async fn test_bootstrapped_project_accepts_appends() {
    let directory = InMemoryNodeDirectory::new();
    let a = spawn(&directory, "alice", 1);
    let b = spawn(&directory, "bob", 2);

    let issued = ProjectSubmit::new("live", vec![client_ref(&a), client_ref(&b)])
        .start(&directory, &FirstShareholder)
        .await
        .unwrap();

    let mut project = b.node().open_project(issued[0].id, &directory).unwrap();
    let receipt = project.send_message("first").await.unwrap();
    assert_eq!(receipt.seq_no, 1);
    assert_eq!(a.node().replica_len(&issued[0].id), Some(1));
    assert_eq!(b.node().replica_len(&issued[0].id), Some(0));
}
