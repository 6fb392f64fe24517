//! # Project-Chain Node
//!
//! Runs a small collaboration between in-process nodes:
//!
//! 1. Load configuration (from env)
//! 2. Initialize logging
//! 3. Start one node per name and register it in the directory
//! 4. Bootstrap a project; the first node becomes the state-sync leader
//! 5. Exchange messages, run a poll and a request through the leader
//! 6. Sync every participant and check that all heads agree

use std::sync::Arc;

use anyhow::{bail, ensure, Context, Result};
use tracing::{debug, info, warn};

use project_chain::{
    ChainConfig, EventFilter, EventKindTag, FirstShareholder, InMemoryNodeDirectory,
    InMemoryRequestService, LocalNodeClient, NodeClient, Project, ProjectNode, ProjectSubmit,
    ShareholderRef, UserCodeRef,
};
use project_telemetry::{init_logging, log_event, log_project_event, TelemetryConfig};
use shared_crypto::SigningKey;
use shared_types::{hash_to_hex, NodeRoute, Uid};

/// Demo settings.
#[derive(Debug, Clone)]
struct DemoConfig {
    chain: ChainConfig,
    node_names: Vec<String>,
    base_port: u16,
    leader_key: Option<SigningKey>,
}

fn load_config() -> Result<DemoConfig> {
    let chain = ChainConfig::from_env();
    chain.validate().context("invalid chain configuration")?;

    let node_names: Vec<String> = std::env::var("PC_DEMO_NODES")
        .unwrap_or_else(|_| "alice,bob".to_string())
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if node_names.len() < 2 {
        bail!("PC_DEMO_NODES needs at least two node names");
    }

    let base_port = match std::env::var("PC_BASE_PORT") {
        Ok(port) => port.parse().context("PC_BASE_PORT must be a port number")?,
        Err(_) => 8080,
    };

    // Override the leader key from environment
    let mut leader_key = None;
    if let Ok(seed_hex) = std::env::var("PC_LEADER_SEED") {
        match hex::decode(&seed_hex) {
            Ok(bytes) if bytes.len() == 32 => {
                let mut seed = [0u8; 32];
                seed.copy_from_slice(&bytes);
                leader_key = Some(SigningKey::from_secret(&mut seed));
                info!("Loaded leader key from environment");
            }
            _ => warn!("PC_LEADER_SEED must be 32 bytes (64 hex chars), ignoring"),
        }
    }

    Ok(DemoConfig {
        chain,
        node_names,
        base_port,
        leader_key,
    })
}

/// Port of the `index`-th node, counting up from `base`.
fn node_port(base: u16, index: usize) -> Result<u16> {
    u16::try_from(index)
        .ok()
        .and_then(|offset| base.checked_add(offset))
        .with_context(|| format!("node {} has no port above base port {}", index, base))
}

fn start_nodes(
    config: &DemoConfig,
    directory: &InMemoryNodeDirectory,
) -> Result<Vec<Arc<LocalNodeClient>>> {
    config
        .node_names
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let signing_key = match (i, &config.leader_key) {
                (0, Some(key)) => key.clone(),
                _ => SigningKey::generate(),
            };
            let route = NodeRoute::http(name.as_str(), node_port(config.base_port, i)?);
            let node = ProjectNode::new(name.as_str(), route, signing_key)
                .with_config(config.chain.clone());
            info!(node = %node.identity(), "Started node {}", name);
            Ok(directory.register(Arc::new(node)))
        })
        .collect()
}

async fn run_session(projects: &mut [Project], requests: &InMemoryRequestService) -> Result<()> {
    let (leader, followers) = projects
        .split_first_mut()
        .context("session needs at least one participant")?;

    let welcome = leader.send_message("Welcome to the project").await?;
    for (i, follower) in followers.iter_mut().enumerate() {
        follower.sync().await?;
        follower
            .reply_message(welcome.event_id, format!("Hi from participant {}", i + 2))
            .await?;
    }

    let poll = leader
        .create_poll(
            "Which dataset first?",
            vec!["census".to_string(), "weather".to_string()],
        )
        .await?;
    for (i, follower) in followers.iter_mut().enumerate() {
        follower.sync().await?;
        follower.answer_poll(poll.event_id, (i % 2) as u32 + 1).await?;
    }

    let code = UserCodeRef {
        id: Uid::new(),
        node_uid: Some(leader.shareholders[0].id),
        name: "summary_statistics".to_string(),
    };
    let follower = followers.first_mut().context("session needs a follower")?;
    follower.sync().await?;
    let request = follower.create_request(&code, requests).await?;
    leader.sync().await?;
    leader.approve_request(request.event_id, requests).await?;

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let telemetry = TelemetryConfig::from_env();
    init_logging(&telemetry)?;
    let service = telemetry.service_name.as_str();

    // Load configuration
    let config = load_config()?;
    debug!(chain = ?config.chain, "Chain configuration");

    let directory = InMemoryNodeDirectory::new();
    let nodes = start_nodes(&config, &directory)?;

    let shareholders = nodes
        .iter()
        .map(|client| ShareholderRef::Client(client.clone() as Arc<dyn NodeClient>))
        .collect();
    let issued = ProjectSubmit::new("demo", shareholders)
        .description("in-process project-chain demo")
        .start(&directory, &FirstShareholder)
        .await
        .context("bootstrap failed")?;
    let project_id = issued
        .first()
        .map(|genesis| genesis.id)
        .context("no node accepted the project")?;
    log_event!(
        info,
        service,
        "Project bootstrapped",
        project_id = %project_id,
        nodes = issued.len()
    );

    let mut projects = nodes
        .iter()
        .map(|client| client.node().open_project(project_id, &directory))
        .collect::<Result<Vec<_>, _>>()?;

    let requests = InMemoryRequestService::new();
    run_session(&mut projects, &requests).await?;

    let mut heads = Vec::with_capacity(projects.len());
    for project in projects.iter_mut() {
        project.sync().await?;
        let head = project.validate_events(true)?;
        heads.push(head);
    }
    ensure!(
        heads.windows(2).all(|pair| pair[0] == pair[1]),
        "participants disagree on the chain head"
    );

    let leader = &projects[0];
    if let Some(last) = leader.last_event() {
        log_project_event!(
            info,
            service,
            "All participants agree",
            project_id,
            last.id,
            leader.get_last_seq_no(),
            head = %hash_to_hex(&heads[0])
        );
    }
    for line in leader.messages().lines() {
        info!("{}", line);
    }
    let polls = leader.get_events(&EventFilter::new().kind(EventKindTag::MultipleChoicePoll));
    if let Some(poll) = polls.first() {
        let status = leader.poll_status(poll)?;
        info!("Poll tally: {:?}", status.counts(2));
    }
    debug!("{}", leader.to_json()?);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_ports_count_up_from_base() {
        assert_eq!(node_port(8080, 0).unwrap(), 8080);
        assert_eq!(node_port(8080, 2).unwrap(), 8082);
        assert_eq!(node_port(u16::MAX, 0).unwrap(), u16::MAX);
    }

    #[test]
    fn test_node_port_past_range_is_an_error() {
        assert!(node_port(u16::MAX, 1).is_err());
        assert!(node_port(65_530, 10).is_err());
        assert!(node_port(0, usize::MAX).is_err());
    }
}
