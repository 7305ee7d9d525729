//! Reveal messages - progress of the typewriter reveal back to the App layer

use crate::models::MessageId;
use crate::reveal::RevealOutcome;

#[derive(Debug, Clone)]
pub enum RevealEvent {
    /// Everything shown so far for the message
    Update { id: MessageId, content: String },
    /// The reveal ran to the end or was cancelled
    Finished {
        id: MessageId,
        outcome: RevealOutcome,
    },
}

impl RevealEvent {
    pub fn id(&self) -> MessageId {
        match self {
            RevealEvent::Update { id, .. } => *id,
            RevealEvent::Finished { id, .. } => *id,
        }
    }
}
