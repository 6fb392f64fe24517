//! # Event Chain Integration Tests
//!
//! Two or three in-process nodes, bootstrapped through `ProjectSubmit`,
//! appending through the first shareholder as leader.

use std::sync::Arc;

use project_chain::{
    ChainConfig, EventKindTag, FirstShareholder, InMemoryNodeDirectory, InMemoryRequestService,
    LocalNodeClient, NodeClient, PollStatus, Project, ProjectError, ProjectEvent, ProjectNode,
    ProjectRequest, ProjectSubmit, RequestStatus, ShareholderRef, SharedProject, StatusError,
    UserCodeRef, ValidationError,
};
use shared_crypto::SigningKey;
use shared_types::{NodeRoute, Uid};

struct Network {
    directory: InMemoryNodeDirectory,
    nodes: Vec<Arc<LocalNodeClient>>,
    project_id: Uid,
}

impl Network {
    async fn start(names: &[&str]) -> Self {
        let directory = InMemoryNodeDirectory::new();
        let nodes: Vec<_> = names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let node = ProjectNode::new(
                    *name,
                    NodeRoute::http(*name, 8080 + i as u16),
                    SigningKey::from_seed([i as u8 + 1; 32]),
                )
                .with_config(ChainConfig::immediate(16));
                directory.register(Arc::new(node))
            })
            .collect();

        let shareholders = nodes
            .iter()
            .map(|c| ShareholderRef::Client(c.clone() as Arc<dyn NodeClient>))
            .collect();
        let issued = ProjectSubmit::new("integration", shareholders)
            .start(&directory, &FirstShareholder)
            .await
            .unwrap();

        Self {
            project_id: issued[0].id,
            directory,
            nodes,
        }
    }

    fn open(&self, index: usize) -> Project {
        self.nodes[index]
            .node()
            .open_project(self.project_id, &self.directory)
            .unwrap()
    }

    fn leader_len(&self) -> usize {
        self.nodes[0].node().replica_len(&self.project_id).unwrap()
    }
}

fn seq_nos(project: &Project) -> Vec<u64> {
    project.events().iter().filter_map(|e| e.seq_no).collect()
}

/// Scenario A: A posts a message, B replies in its thread.
#[tokio::test]
async fn test_reply_links_to_message_and_genesis() {
    let net = Network::start(&["alice", "bob"]).await;
    let mut a = net.open(0);
    let mut b = net.open(1);

    let hello = a.send_message("hello").await.unwrap();
    assert_eq!(hello.seq_no, 1);
    let stored = a.get_event(&hello.event_id).unwrap();
    assert_eq!(stored.prev_event_hash, Some(a.start_hash));
    assert_eq!(stored.prev_event_uid, Some(a.id));

    b.sync().await.unwrap();
    let reply = b
        .reply_message(hello.event_id, "hello back")
        .await
        .unwrap();
    assert_eq!(reply.seq_no, 2);
    assert_eq!(reply.attempts, 1);

    a.sync().await.unwrap();
    let reply_event = a.get_event(&reply.event_id).unwrap();
    assert_eq!(reply_event.kind(), EventKindTag::ThreadMessage);
    assert_eq!(reply_event.parent_event_id(), Some(hello.event_id));
    let first = a.get_event(&hello.event_id).unwrap();
    assert!(reply_event.valid_descendant(&a, Some(first)).is_ok());

    assert_eq!(seq_nos(&a), vec![1, 2]);
    assert_eq!(seq_nos(&b), vec![1, 2]);
    let head_a = a.validate_events(true).unwrap();
    let head_b = b.validate_events(true).unwrap();
    assert_eq!(head_a, head_b);
    assert_eq!(head_a, reply.event_hash);
    assert_eq!(net.leader_len(), 2);
}

/// Both shareholders post top-level messages without syncing in between.
#[tokio::test]
async fn test_two_shareholders_append_in_turn() {
    let net = Network::start(&["alice", "bob"]).await;
    let mut a = net.open(0);
    let mut b = net.open(1);

    let e1 = a.send_message("hello from alice").await.unwrap();
    let e2 = b.send_message("hello from bob").await.unwrap();
    assert_eq!(e1.seq_no, 1);
    assert_eq!(e2.seq_no, 2);

    a.sync().await.unwrap();
    assert_eq!(seq_nos(&a), vec![1, 2]);
    assert_eq!(seq_nos(&b), vec![1, 2]);

    let ids_a: Vec<Uid> = a.events().iter().map(|e| e.id).collect();
    let ids_b: Vec<Uid> = b.events().iter().map(|e| e.id).collect();
    assert_eq!(ids_a, ids_b);
    assert_eq!(a.validate_events(false), b.validate_events(false));
}

/// Scenario B: out-of-range poll answer is rejected before an event exists.
#[tokio::test]
async fn test_poll_answer_out_of_range_leaves_chain_unchanged() {
    let net = Network::start(&["alice", "bob"]).await;
    let mut a = net.open(0);

    let poll = a
        .create_poll("favourite?", vec!["red".into(), "green".into(), "blue".into()])
        .await
        .unwrap();

    let err = a.answer_poll(poll.event_id, 5).await.unwrap_err();
    assert!(matches!(
        err,
        ProjectError::InvalidPollAnswer { answer: 5, choices: 3 }
    ));
    assert_eq!(a.len(), 1);
    assert_eq!(net.leader_len(), 1);

    let err = a
        .create_poll("empty?", Vec::new())
        .await
        .unwrap_err();
    assert!(matches!(err, ProjectError::EmptyPollChoices));
}

/// Scenario C: a lagging follower resyncs, rebases and retries.
#[tokio::test]
async fn test_lagging_follower_rebases_after_stale() {
    let net = Network::start(&["alice", "bob"]).await;
    let mut a = net.open(0);
    let mut b = net.open(1);

    a.send_message("one").await.unwrap();
    b.sync().await.unwrap();
    a.send_message("two").await.unwrap();
    assert_eq!(b.get_last_seq_no(), 1);

    let receipt = b.send_message("three").await.unwrap();
    assert_eq!(receipt.seq_no, 3);
    assert_eq!(receipt.attempts, 2);

    assert_eq!(seq_nos(&b), vec![1, 2, 3]);
    assert!(b.validate_events(false).is_ok());
    assert_eq!(net.leader_len(), 3);
}

/// Scenario D: two responses to one request are a reported data error.
#[tokio::test]
async fn test_double_response_is_reported() {
    let net = Network::start(&["alice", "bob"]).await;
    let mut a = net.open(0);
    let mut b = net.open(1);
    let requests = InMemoryRequestService::new();

    let code = UserCodeRef {
        id: Uid::new(),
        node_uid: Some(a.shareholders[0].id),
        name: "train_model".to_string(),
    };
    let request = a.create_request(&code, &requests).await.unwrap();

    a.approve_request(request.event_id, &requests).await.unwrap();
    b.sync().await.unwrap();
    b.add_event(ProjectEvent::new(ProjectRequest::approve(request.event_id)))
        .await
        .unwrap();
    a.sync().await.unwrap();

    let event = a.get_event(&request.event_id).unwrap().clone();
    assert_eq!(
        a.request_status(&event),
        Err(StatusError::MultipleResponses { count: 2 })
    );
    assert!(a.validate_events(false).is_ok());
}

#[tokio::test]
async fn test_request_approval_flow() {
    let net = Network::start(&["alice", "bob"]).await;
    let mut a = net.open(0);
    let requests = InMemoryRequestService::new();

    let anonymous = UserCodeRef {
        id: Uid::new(),
        node_uid: None,
        name: "orphan".to_string(),
    };
    assert!(matches!(
        a.create_request(&anonymous, &requests).await,
        Err(ProjectError::MissingNodeUid(_))
    ));

    let code = UserCodeRef {
        id: Uid::new(),
        node_uid: Some(Uid::new()),
        name: "train_model".to_string(),
    };
    let receipt = a.create_request(&code, &requests).await.unwrap();
    let event = a.get_event(&receipt.event_id).unwrap().clone();
    assert_eq!(a.request_status(&event), Ok(RequestStatus::NoResponse));

    a.approve_request(receipt.event_id, &requests).await.unwrap();
    assert_eq!(a.request_status(&event), Ok(RequestStatus::Approved));

    if let project_chain::EventPayload::Request(r) = &event.payload {
        assert!(requests.is_approved(&r.request.id));
    } else {
        panic!("expected a request event");
    }
}

#[tokio::test]
async fn test_poll_tally_across_nodes() {
    let net = Network::start(&["alice", "bob", "carol"]).await;
    let mut a = net.open(0);
    let mut b = net.open(1);
    let mut c = net.open(2);

    let poll = a
        .create_poll("ship it?", vec!["yes".into(), "no".into()])
        .await
        .unwrap();

    b.sync().await.unwrap();
    c.sync().await.unwrap();
    b.answer_poll(poll.event_id, 2).await.unwrap();
    c.answer_poll(poll.event_id, 1).await.unwrap();
    b.answer_poll(poll.event_id, 1).await.unwrap();

    a.sync().await.unwrap();
    let poll_event = a.get_event(&poll.event_id).unwrap().clone();
    let status = a.poll_status(&poll_event).unwrap();
    match &status {
        PollStatus::Answers(answers) => assert_eq!(answers.len(), 2),
        PollStatus::NoAnswers => panic!("expected answers"),
    }
    assert_eq!(status.counts(2), vec![2, 0]);
}

#[tokio::test]
async fn test_message_threads() {
    let net = Network::start(&["alice", "bob"]).await;
    let mut a = net.open(0);
    let mut b = net.open(1);

    let root = a.send_message("root").await.unwrap();
    b.sync().await.unwrap();
    let reply = b.reply_message(root.event_id, "first reply").await.unwrap();
    assert_eq!(reply.seq_no, 2);
    a.sync().await.unwrap();

    // replying to a reply stays in the root's thread
    a.reply_message(reply.event_id, "second reply").await.unwrap();

    let root_event = a.get_event(&root.event_id).unwrap().clone();
    let children = a.get_children(&root_event);
    assert_eq!(children.len(), 2);
    assert!(children
        .iter()
        .all(|e| e.parent_event_id() == Some(root.event_id)));
    assert!(children
        .iter()
        .all(|e| e.kind() == EventKindTag::ThreadMessage));

    let text = a.messages();
    assert_eq!(text.lines().count(), 3);
    assert_eq!(text.lines().filter(|l| l.starts_with("> ")).count(), 2);

    let poll = a.create_poll("q", vec!["a".into()]).await.unwrap();
    assert!(matches!(
        a.reply_message(poll.event_id, "nope").await,
        Err(ProjectError::WrongEventKind { .. })
    ));
}

#[tokio::test]
async fn test_tampered_event_fails_at_its_index() {
    let net = Network::start(&["alice", "bob"]).await;
    let mut a = net.open(0);
    for i in 0..4 {
        a.send_message(format!("message {i}")).await.unwrap();
    }
    assert!(a.validate_events(false).is_ok());

    let mut events = a.events().to_vec();
    events[2].payload = project_chain::ProjectMessage::new("forged").into();
    let forged = Project::restore(a.genesis(), events);

    let err = forged.validate_events(true).unwrap_err();
    assert_eq!(err.index, 2);
    assert!(matches!(err.source, ValidationError::BadSignature { .. }));

    // re-signed by an outsider: signature verifies against the new key but
    // the successor no longer links to it
    let outsider = SigningKey::from_seed([99u8; 32]);
    let mut events = a.events().to_vec();
    events[1].payload = project_chain::ProjectMessage::new("forged").into();
    events[1].creator_verify_key = Some(outsider.verify_key());
    let genesis_view = Project::restore(a.genesis(), events[..1].to_vec());
    events[1].rebase(&genesis_view).unwrap();
    events[1].sign(&outsider).unwrap();
    let forged = Project::restore(a.genesis(), events);

    let err = forged.validate_events(false).unwrap_err();
    assert_eq!(err.index, 2);
    assert!(matches!(err.source, ValidationError::PrevHashMismatch { .. }));
}

#[tokio::test]
async fn test_reordered_events_fail_validation() {
    let net = Network::start(&["alice", "bob"]).await;
    let mut a = net.open(0);
    a.send_message("one").await.unwrap();
    a.send_message("two").await.unwrap();

    let mut events = a.events().to_vec();
    events.swap(0, 1);
    let shuffled = Project::restore(a.genesis(), events);

    let err = shuffled.validate_events(false).unwrap_err();
    assert_eq!(err.index, 0);
    assert!(matches!(err.source, ValidationError::PrevUidMismatch { .. }));
}

#[tokio::test]
async fn test_unreachable_leader_propagates() {
    let net = Network::start(&["alice", "bob"]).await;
    let mut b = net.open(1);
    net.nodes[0].set_offline(true);

    let err = b.send_message("anyone?").await.unwrap_err();
    assert!(matches!(
        err,
        ProjectError::Leader(project_chain::LeaderError::Unreachable(_))
    ));
    assert!(b.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_participants_share_one_order() {
    let net = Network::start(&["alice", "bob"]).await;
    let a: SharedProject = Arc::new(tokio::sync::Mutex::new(net.open(0)));
    let b: SharedProject = Arc::new(tokio::sync::Mutex::new(net.open(1)));

    let mut handles = Vec::new();
    for (who, project) in [("a", a.clone()), ("b", b.clone())] {
        handles.push(tokio::spawn(async move {
            for i in 0..5 {
                let mut guard = project.lock().await;
                guard.send_message(format!("{who}{i}")).await.unwrap();
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let mut a = a.lock().await;
    let mut b = b.lock().await;
    a.sync().await.unwrap();
    b.sync().await.unwrap();

    assert_eq!(seq_nos(&a), (1..=10).collect::<Vec<u64>>());
    assert_eq!(a.validate_events(false), b.validate_events(false));
    assert!(a.validate_events(false).is_ok());
    assert_eq!(net.leader_len(), 10);
}
