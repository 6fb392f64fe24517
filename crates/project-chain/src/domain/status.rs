//! Kind-specific status queries
//!
//! Both queries fold over the children of a single event. Conflicting data
//! (two responses to one request, a child of the wrong kind) is reported as
//! a `StatusError`, never resolved silently.

use super::{EventKindTag, EventPayload, NodeIdentity, Project, ProjectEvent, StatusError};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Approval state of a request event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum RequestStatus {
    NoResponse,
    Approved,
    Denied,
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestStatus::NoResponse => f.write_str("No response"),
            RequestStatus::Approved => f.write_str("Approved"),
            RequestStatus::Denied => f.write_str("Denied"),
        }
    }
}

/// Tally of a poll event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum PollStatus {
    NoAnswers,
    /// Latest answer of each respondent.
    Answers(BTreeMap<NodeIdentity, u32>),
}

impl PollStatus {
    /// Respondents per 1-based choice.
    pub fn counts(&self, choices: usize) -> Vec<usize> {
        let mut counts = vec![0; choices];
        if let PollStatus::Answers(answers) = self {
            for &answer in answers.values() {
                if let Some(slot) = (answer as usize)
                    .checked_sub(1)
                    .and_then(|i| counts.get_mut(i))
                {
                    *slot += 1;
                }
            }
        }
        counts
    }
}

/// Status of the request stored as `event`.
pub fn request_status(project: &Project, event: &ProjectEvent) -> Result<RequestStatus, StatusError> {
    if event.kind() != EventKindTag::Request {
        return Err(StatusError::NotARequest(event.kind()));
    }

    let responses = project.get_children(event);
    match responses.as_slice() {
        [] => Ok(RequestStatus::NoResponse),
        [response] => match &response.payload {
            EventPayload::RequestResponse(r) if r.response => Ok(RequestStatus::Approved),
            EventPayload::RequestResponse(_) => Ok(RequestStatus::Denied),
            other => Err(StatusError::UnexpectedChild {
                expected: EventKindTag::RequestResponse,
                actual: other.kind(),
            }),
        },
        many => Err(StatusError::MultipleResponses { count: many.len() }),
    }
}

/// Tally of the poll stored as `event`. When a respondent answered more than
/// once, only the answer appended last counts.
pub fn poll_status(project: &Project, event: &ProjectEvent) -> Result<PollStatus, StatusError> {
    if event.kind() != EventKindTag::MultipleChoicePoll {
        return Err(StatusError::NotAPoll(event.kind()));
    }

    let mut answers = BTreeMap::new();
    // newest first, so the first answer seen per identity wins
    for child in project.get_children(event).into_iter().rev() {
        let answer = match &child.payload {
            EventPayload::PollAnswer(a) => a.answer,
            other => {
                return Err(StatusError::UnexpectedChild {
                    expected: EventKindTag::PollAnswer,
                    actual: other.kind(),
                })
            }
        };
        let creator = child
            .creator_verify_key
            .ok_or(StatusError::MissingCreator(child.id))?;
        let identity = project.get_identity_from_key(&creator)?;
        answers.entry(identity.clone()).or_insert(answer);
    }

    if answers.is_empty() {
        Ok(PollStatus::NoAnswers)
    } else {
        Ok(PollStatus::Answers(answers))
    }
}

impl Project {
    pub fn request_status(&self, event: &ProjectEvent) -> Result<RequestStatus, StatusError> {
        request_status(self, event)
    }

    pub fn poll_status(&self, event: &ProjectEvent) -> Result<PollStatus, StatusError> {
        poll_status(self, event)
    }
}
