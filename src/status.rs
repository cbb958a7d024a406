//! Message lifecycle state machine.
//!
//! Status codes are grouped in bands of ten so sub-states can be added
//! later without renumbering (111 = "created, awaiting numbers" etc.).
//! A message only ever moves forward through the sequence.

use serde::Serialize;

use crate::error::AppError;

/// Lifecycle stage of a message. The discriminants are the wire/database
/// status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(i32)]
pub enum MessageStatus {
    Created = 110,
    Confirmed = 120,
    Received = 130,
    Sent = 140,
}

/// Event that drives a status transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusEvent {
    /// The create transaction committed.
    CreateConfirmed,
    /// The author acknowledged receipt.
    MarkReceived,
    /// The author acknowledged delivery.
    MarkSent,
}

/// Human-readable projection of a status code. Derived from the registry,
/// never stored authoritatively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusMeta {
    pub status_code: i32,
    pub status_name: &'static str,
    pub status_description: &'static str,
}

impl MessageStatus {
    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn from_code(code: i32) -> Result<Self, AppError> {
        match code {
            110 => Ok(MessageStatus::Created),
            120 => Ok(MessageStatus::Confirmed),
            130 => Ok(MessageStatus::Received),
            140 => Ok(MessageStatus::Sent),
            other => Err(AppError::UnknownStatus(other)),
        }
    }

    /// Compute the next status for an event. Same-state, backward and
    /// skipping transitions all fail.
    pub fn next(self, event: StatusEvent) -> Result<Self, AppError> {
        use MessageStatus::*;
        use StatusEvent::*;

        match (self, event) {
            (Created, CreateConfirmed) => Ok(Confirmed),
            (Confirmed, MarkReceived) => Ok(Received),
            (Received, MarkSent) => Ok(Sent),
            (from, _) => Err(AppError::Transition {
                from: from.code(),
                requested: event.target_code(),
            }),
        }
    }

    pub fn meta(self) -> StatusMeta {
        match self {
            MessageStatus::Created => StatusMeta {
                status_code: 110,
                status_name: "created",
                status_description: "Message accepted and persisted, not yet confirmed",
            },
            MessageStatus::Confirmed => StatusMeta {
                status_code: 120,
                status_name: "confirmed",
                status_description: "Message confirmed and queued for delivery",
            },
            MessageStatus::Received => StatusMeta {
                status_code: 130,
                status_name: "received",
                status_description: "Message receipt acknowledged by the author",
            },
            MessageStatus::Sent => StatusMeta {
                status_code: 140,
                status_name: "sent",
                status_description: "Message delivery acknowledged; terminal state",
            },
        }
    }
}

impl StatusEvent {
    /// The status an event is trying to reach, used for error reporting.
    fn target_code(self) -> i32 {
        match self {
            StatusEvent::CreateConfirmed => MessageStatus::Confirmed.code(),
            StatusEvent::MarkReceived => MessageStatus::Received.code(),
            StatusEvent::MarkSent => MessageStatus::Sent.code(),
        }
    }
}

/// Look up the meta registry entry for a raw status code.
pub fn meta_for_code(code: i32) -> Result<StatusMeta, AppError> {
    Ok(MessageStatus::from_code(code)?.meta())
}
