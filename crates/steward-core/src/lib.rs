//! # steward-core
//!
//! Core types, traits, and scheduling logic for the steward assistant.
//!
//! This crate holds everything that does not talk to the network: the
//! date/time normalizer, the availability matcher, pending meeting
//! resolution, the confirmation workflow, and the storage/backend traits the
//! other steward crates implement.

pub mod actions;
pub mod availability;
pub mod confirmation;
pub mod datetime;
pub mod defaults;
pub mod error;
pub mod events;
pub mod invitations;
pub mod logging;
pub mod models;
pub mod traits;

// Re-export commonly used types at crate root
pub use actions::{ActionKind, MeetingDraft, ProposedAction, TaskDraft};
pub use availability::{find_common_slot, standard_time_blocks, SlotMatch, TimeBlock};
pub use confirmation::{
    ActionCommitter, CandidateKey, ChatSession, CommittedAction, ConfirmOutcome,
    ConfirmationState, Speaker, TranscriptEntry,
};
pub use datetime::{
    format_canonical, normalize, normalize_optional, normalize_to_canonical, parse_canonical,
    DateTarget, NormalizeError,
};
pub use error::{Error, Result};
pub use events::{EventActor, EventBus, EventEnvelope, ServerEvent};
pub use invitations::{ArrangeMeeting, InviteOutcome, InviteResponse, Resolution};
pub use models::*;
pub use traits::*;
