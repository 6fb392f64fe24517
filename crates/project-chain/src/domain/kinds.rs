//! Event kinds and their payloads
//!
//! The set of kinds is closed. Sub-events (thread replies, request
//! responses, poll answers) carry the id of the event they reply to, and
//! each kind declares which kinds may reply to it.

use super::{ProjectError, ProjectResult};
use serde::{Deserialize, Serialize};
use shared_types::Uid;
use std::fmt;

/// Discriminant of an event payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventKindTag {
    Message,
    ThreadMessage,
    Request,
    RequestResponse,
    MultipleChoicePoll,
    PollAnswer,
}

impl EventKindTag {
    /// Kinds permitted as direct children of this kind.
    pub fn allowed_sub_types(self) -> &'static [EventKindTag] {
        match self {
            EventKindTag::Message => &[EventKindTag::ThreadMessage],
            EventKindTag::Request => &[EventKindTag::RequestResponse],
            EventKindTag::MultipleChoicePoll => &[EventKindTag::PollAnswer],
            EventKindTag::ThreadMessage
            | EventKindTag::RequestResponse
            | EventKindTag::PollAnswer => &[],
        }
    }

    pub fn allows_child(self, child: EventKindTag) -> bool {
        self.allowed_sub_types().contains(&child)
    }

    /// Whether events of this kind always reply to a parent.
    pub fn is_sub_event(self) -> bool {
        matches!(
            self,
            EventKindTag::ThreadMessage | EventKindTag::RequestResponse | EventKindTag::PollAnswer
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            EventKindTag::Message => "ProjectMessage",
            EventKindTag::ThreadMessage => "ProjectThreadMessage",
            EventKindTag::Request => "ProjectRequest",
            EventKindTag::RequestResponse => "ProjectRequestResponse",
            EventKindTag::MultipleChoicePoll => "ProjectMultipleChoicePoll",
            EventKindTag::PollAnswer => "AnswerProjectPoll",
        }
    }
}

impl fmt::Display for EventKindTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Top-level chat message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectMessage {
    pub message: String,
}

impl ProjectMessage {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Build a thread reply to the message stored under `message_id`.
    pub fn reply(message_id: Uid, message: impl Into<String>) -> ProjectThreadMessage {
        ProjectThreadMessage {
            parent_event_id: message_id,
            message: message.into(),
        }
    }
}

/// Reply inside a message thread.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectThreadMessage {
    pub parent_event_id: Uid,
    pub message: String,
}

/// Opaque request submitted to a node's request service.
///
/// The request lifecycle itself belongs to that service; the chain only
/// records that a request exists and who answered it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmittedRequest {
    pub id: Uid,
    pub node_uid: Uid,
    pub object_uid: Uid,
    pub summary: String,
}

/// Reference to a user-code object that a request asks to run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserCodeRef {
    pub id: Uid,
    pub node_uid: Option<Uid>,
    pub name: String,
}

/// Approval request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRequest {
    pub request: SubmittedRequest,
}

impl ProjectRequest {
    /// Approval response for the request stored under `request_event_id`.
    pub fn approve(request_event_id: Uid) -> ProjectRequestResponse {
        ProjectRequestResponse {
            parent_event_id: request_event_id,
            response: true,
        }
    }
}

/// Approve (`true`) or deny (`false`) a request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRequestResponse {
    pub parent_event_id: Uid,
    pub response: bool,
}

/// Poll with a fixed list of choices, answered by 1-based index.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectMultipleChoicePoll {
    pub question: String,
    pub choices: Vec<String>,
}

impl ProjectMultipleChoicePoll {
    pub fn new(question: impl Into<String>, choices: Vec<String>) -> ProjectResult<Self> {
        if choices.is_empty() {
            return Err(ProjectError::EmptyPollChoices);
        }
        Ok(Self {
            question: question.into(),
            choices,
        })
    }

    pub fn check_answer(&self, answer: u32) -> ProjectResult<()> {
        if answer == 0 || answer as usize > self.choices.len() {
            return Err(ProjectError::InvalidPollAnswer {
                answer,
                choices: self.choices.len(),
            });
        }
        Ok(())
    }

    /// Answer the poll stored under `poll_event_id`. Out-of-range answers are
    /// rejected here, before any event exists.
    pub fn answer(&self, poll_event_id: Uid, answer: u32) -> ProjectResult<AnswerProjectPoll> {
        self.check_answer(answer)?;
        Ok(AnswerProjectPoll {
            parent_event_id: poll_event_id,
            answer,
        })
    }
}

/// One respondent's answer to a poll.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerProjectPoll {
    pub parent_event_id: Uid,
    pub answer: u32,
}

/// Payload of a project event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventPayload {
    Message(ProjectMessage),
    ThreadMessage(ProjectThreadMessage),
    Request(ProjectRequest),
    RequestResponse(ProjectRequestResponse),
    MultipleChoicePoll(ProjectMultipleChoicePoll),
    PollAnswer(AnswerProjectPoll),
}

impl EventPayload {
    pub fn kind(&self) -> EventKindTag {
        match self {
            EventPayload::Message(_) => EventKindTag::Message,
            EventPayload::ThreadMessage(_) => EventKindTag::ThreadMessage,
            EventPayload::Request(_) => EventKindTag::Request,
            EventPayload::RequestResponse(_) => EventKindTag::RequestResponse,
            EventPayload::MultipleChoicePoll(_) => EventKindTag::MultipleChoicePoll,
            EventPayload::PollAnswer(_) => EventKindTag::PollAnswer,
        }
    }

    /// Parent id for sub-events, `None` for top-level events.
    pub fn parent_event_id(&self) -> Option<Uid> {
        match self {
            EventPayload::ThreadMessage(m) => Some(m.parent_event_id),
            EventPayload::RequestResponse(r) => Some(r.parent_event_id),
            EventPayload::PollAnswer(a) => Some(a.parent_event_id),
            EventPayload::Message(_)
            | EventPayload::Request(_)
            | EventPayload::MultipleChoicePoll(_) => None,
        }
    }

    /// Text of message-like payloads.
    pub fn message_text(&self) -> Option<&str> {
        match self {
            EventPayload::Message(m) => Some(&m.message),
            EventPayload::ThreadMessage(m) => Some(&m.message),
            _ => None,
        }
    }
}

macro_rules! impl_payload_from {
    ($($ty:ident => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for EventPayload {
                fn from(value: $ty) -> Self {
                    EventPayload::$variant(value)
                }
            }
        )*
    };
}

impl_payload_from! {
    ProjectMessage => Message,
    ProjectThreadMessage => ThreadMessage,
    ProjectRequest => Request,
    ProjectRequestResponse => RequestResponse,
    ProjectMultipleChoicePoll => MultipleChoicePoll,
    AnswerProjectPoll => PollAnswer,
}
