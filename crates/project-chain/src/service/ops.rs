//! Project conveniences built on `add_event`.

use super::AppendReceipt;
use crate::domain::{
    EventKindTag, EventPayload, Project, ProjectError, ProjectEvent, ProjectMessage,
    ProjectMultipleChoicePoll, ProjectRequest, ProjectResult, UserCodeRef,
};
use crate::ports::RequestService;
use shared_types::Uid;

impl Project {
    fn require_event(&self, id: Uid) -> ProjectResult<&ProjectEvent> {
        self.get_event(&id).ok_or(ProjectError::EventNotFound(id))
    }

    pub async fn send_message(&mut self, message: impl Into<String>) -> ProjectResult<AppendReceipt> {
        self.add_event(ProjectEvent::new(ProjectMessage::new(message)))
            .await
    }

    /// Reply in the thread of `message_id`. Replies to a thread message go to
    /// the thread's root message.
    pub async fn reply_message(
        &mut self,
        message_id: Uid,
        message: impl Into<String>,
    ) -> ProjectResult<AppendReceipt> {
        let target = self.require_event(message_id)?;
        let root = match &target.payload {
            EventPayload::Message(_) => target.id,
            EventPayload::ThreadMessage(thread) => thread.parent_event_id,
            other => {
                return Err(ProjectError::WrongEventKind {
                    id: message_id,
                    expected: EventKindTag::Message,
                    actual: other.kind(),
                })
            }
        };
        self.add_event(ProjectEvent::new(ProjectMessage::reply(root, message)))
            .await
    }

    pub async fn create_poll(
        &mut self,
        question: impl Into<String>,
        choices: Vec<String>,
    ) -> ProjectResult<AppendReceipt> {
        let poll = ProjectMultipleChoicePoll::new(question, choices)?;
        self.add_event(ProjectEvent::new(poll)).await
    }

    /// Answer the poll `poll_id` with a 1-based choice.
    pub async fn answer_poll(&mut self, poll_id: Uid, answer: u32) -> ProjectResult<AppendReceipt> {
        let target = self.require_event(poll_id)?;
        let answer = match &target.payload {
            EventPayload::MultipleChoicePoll(poll) => poll.answer(poll_id, answer)?,
            other => {
                return Err(ProjectError::WrongEventKind {
                    id: poll_id,
                    expected: EventKindTag::MultipleChoicePoll,
                    actual: other.kind(),
                })
            }
        };
        self.add_event(ProjectEvent::new(answer)).await
    }

    /// Submit `code` to the node's request service and record the request.
    pub async fn create_request(
        &mut self,
        code: &UserCodeRef,
        service: &dyn RequestService,
    ) -> ProjectResult<AppendReceipt> {
        if code.node_uid.is_none() {
            return Err(ProjectError::MissingNodeUid(code.id));
        }
        let request = service
            .submit(code)
            .await
            .map_err(ProjectError::RequestService)?;
        self.add_event(ProjectEvent::new(ProjectRequest { request }))
            .await
    }

    /// Approve through the request service first, then record the response.
    pub async fn approve_request(
        &mut self,
        request_event_id: Uid,
        service: &dyn RequestService,
    ) -> ProjectResult<AppendReceipt> {
        let target = self.require_event(request_event_id)?;
        let request = match &target.payload {
            EventPayload::Request(r) => r.request.clone(),
            other => {
                return Err(ProjectError::WrongEventKind {
                    id: request_event_id,
                    expected: EventKindTag::Request,
                    actual: other.kind(),
                })
            }
        };
        service
            .approve(&request)
            .await
            .map_err(ProjectError::RequestService)?;
        self.add_event(ProjectEvent::new(ProjectRequest::approve(request_event_id)))
            .await
    }
}
