//! In-memory request service

use crate::domain::{SubmittedRequest, UserCodeRef};
use crate::ports::RequestService;
use async_trait::async_trait;
use parking_lot::RwLock;
use shared_types::Uid;
use std::collections::HashMap;

/// Records submitted requests and their approval flag.
#[derive(Default)]
pub struct InMemoryRequestService {
    requests: RwLock<HashMap<Uid, (SubmittedRequest, bool)>>,
}

impl InMemoryRequestService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_approved(&self, request_id: &Uid) -> bool {
        self.requests
            .read()
            .get(request_id)
            .map(|(_, approved)| *approved)
            .unwrap_or(false)
    }

    pub fn request_count(&self) -> usize {
        self.requests.read().len()
    }
}

#[async_trait]
impl RequestService for InMemoryRequestService {
    async fn submit(&self, code: &UserCodeRef) -> Result<SubmittedRequest, String> {
        let node_uid = code
            .node_uid
            .ok_or_else(|| format!("Node uid is not set for the object: {:?}", code.id))?;

        let request = SubmittedRequest {
            id: Uid::new(),
            node_uid,
            object_uid: code.id,
            summary: format!("Request to run {}", code.name),
        };
        self.requests
            .write()
            .insert(request.id, (request.clone(), false));
        Ok(request)
    }

    async fn approve(&self, request: &SubmittedRequest) -> Result<(), String> {
        let mut requests = self.requests.write();
        let entry = requests
            .get_mut(&request.id)
            .ok_or_else(|| format!("Unknown request: {:?}", request.id))?;
        entry.1 = true;
        Ok(())
    }
}
