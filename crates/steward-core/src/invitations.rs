//! Pending meeting lifecycle: arrange, respond, resolve.
//!
//! A pending meeting starts with one outstanding response per invited
//! participant. Every accept or reject decrements the count exactly once.
//! When it reaches zero the meeting is resolved: the organiser's and
//! acceptors' availabilities are matched, producing a meeting or an explicit
//! discard outcome.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::availability::{find_common_slot, validate_availability, SlotMatch};
use crate::error::{Error, Result};
use crate::models::{clean_identities, DayAvailability, Meeting, NewMeeting, PendingMeeting};

/// Organiser's request to arrange a meeting.
#[derive(Debug, Clone, Deserialize)]
pub struct ArrangeMeeting {
    pub title: String,
    #[serde(default)]
    pub agenda: String,
    pub participants: Vec<String>,
    pub availability: DayAvailability,
}

/// A participant's answer to an invitation.
#[derive(Debug, Clone, PartialEq)]
pub enum InviteResponse {
    Accept(DayAvailability),
    Reject,
}

/// What happened once every participant answered.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Scheduled { meeting: NewMeeting, slot: SlotMatch },
    NoCommonSlot,
    AllDeclined,
}

/// Result of a response as reported to the responding user.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum InviteOutcome {
    /// Others still have to answer.
    Pending { remaining: u32 },
    /// Everyone answered and a common slot was found.
    Scheduled { meeting: Meeting },
    /// Everyone answered but no slot is shared; the pending meeting was discarded.
    NoCommonSlot,
    /// Every participant declined; the pending meeting was discarded.
    AllDeclined,
}

impl InviteOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            InviteOutcome::Pending { .. } => "pending",
            InviteOutcome::Scheduled { .. } => "scheduled",
            InviteOutcome::NoCommonSlot => "no_common_slot",
            InviteOutcome::AllDeclined => "all_declined",
        }
    }
}

impl PendingMeeting {
    /// Validate an arrange request and build the pending meeting.
    pub fn arrange(organiser: &str, req: ArrangeMeeting) -> Result<Self> {
        let title = req.title.trim();
        if title.is_empty() {
            return Err(Error::InvalidInput("title must not be empty".to_string()));
        }

        let participants: Vec<String> = clean_identities(&req.participants)
            .into_iter()
            .filter(|p| p != organiser)
            .collect();
        if participants.is_empty() {
            return Err(Error::InvalidInput(
                "at least one participant besides the organiser is required".to_string(),
            ));
        }

        let availability = validate_availability(&req.availability).map_err(Error::InvalidInput)?;

        let mut availabilities = std::collections::BTreeMap::new();
        availabilities.insert(organiser.to_string(), availability);

        Ok(Self {
            id: Uuid::now_v7(),
            title: title.to_string(),
            agenda: req.agenda.trim().to_string(),
            organiser: organiser.to_string(),
            pending_response: participants.len() as u32,
            participants,
            availabilities,
            responded: Vec::new(),
            created_at: Utc::now(),
        })
    }

    /// True when `identity` is invited and has not answered yet.
    pub fn awaits(&self, identity: &str) -> bool {
        self.participants.iter().any(|p| p == identity)
            && !self.responded.iter().any(|p| p == identity)
    }

    /// Record one participant's answer.
    pub fn respond(&mut self, identity: &str, response: InviteResponse) -> Result<()> {
        if !self.participants.iter().any(|p| p == identity) {
            return Err(Error::Forbidden(format!(
                "{} is not invited to '{}'",
                identity, self.title
            )));
        }
        if self.responded.iter().any(|p| p == identity) || self.pending_response == 0 {
            return Err(Error::Conflict(format!(
                "{} already responded to '{}'",
                identity, self.title
            )));
        }

        if let InviteResponse::Accept(availability) = response {
            let availability = validate_availability(&availability).map_err(Error::InvalidInput)?;
            self.availabilities.insert(identity.to_string(), availability);
        }

        self.responded.push(identity.to_string());
        self.pending_response -= 1;
        Ok(())
    }

    pub fn is_complete(&self) -> bool {
        self.pending_response == 0
    }

    /// Participants who accepted (organiser excluded).
    pub fn acceptors(&self) -> Vec<&str> {
        self.availabilities
            .keys()
            .filter(|k| **k != self.organiser)
            .map(String::as_str)
            .collect()
    }

    /// Match the collected availabilities. Only meaningful once complete.
    pub fn resolve(&self) -> Resolution {
        if self.acceptors().is_empty() {
            return Resolution::AllDeclined;
        }

        match find_common_slot(self.availabilities.values()) {
            Some(slot) => {
                let mut participants = self.participants.clone();
                if !participants.contains(&self.organiser) {
                    participants.push(self.organiser.clone());
                }
                Resolution::Scheduled {
                    meeting: NewMeeting {
                        title: self.title.clone(),
                        agenda: self.agenda.clone(),
                        time: slot.start(),
                        participants,
                        organizer: self.organiser.clone(),
                    },
                    slot,
                }
            }
            None => Resolution::NoCommonSlot,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datetime::format_canonical;

    fn offer(json: &str) -> DayAvailability {
        serde_json::from_str(json).unwrap()
    }

    fn arrange(participants: &[&str]) -> PendingMeeting {
        PendingMeeting::arrange(
            "org@x.io",
            ArrangeMeeting {
                title: " Planning ".to_string(),
                agenda: "Q2".to_string(),
                participants: participants.iter().map(|s| s.to_string()).collect(),
                availability: offer(r#"{"2025-02-01":["9:00 - 10:00","10:00 - 11:00"]}"#),
            },
        )
        .unwrap()
    }

    #[test]
    fn test_arrange_counts_participants() {
        let pm = arrange(&["a@x.io", "b@x.io", "a@x.io", "org@x.io"]);
        assert_eq!(pm.title, "Planning");
        assert_eq!(pm.participants, vec!["a@x.io", "b@x.io"]);
        assert_eq!(pm.pending_response, 2);
        assert!(pm.availabilities.contains_key("org@x.io"));
    }

    #[test]
    fn test_arrange_rejects_bad_input() {
        let base = ArrangeMeeting {
            title: "Planning".to_string(),
            agenda: String::new(),
            participants: vec!["a@x.io".to_string()],
            availability: offer(r#"{"2025-02-01":["9:00 - 10:00"]}"#),
        };

        let mut no_one = base.clone();
        no_one.participants = vec!["org@x.io".to_string(), " ".to_string()];
        assert!(matches!(
            PendingMeeting::arrange("org@x.io", no_one),
            Err(Error::InvalidInput(_))
        ));

        let mut no_title = base.clone();
        no_title.title = "  ".to_string();
        assert!(PendingMeeting::arrange("org@x.io", no_title).is_err());

        let mut no_slots = base;
        no_slots.availability = DayAvailability::new();
        assert!(PendingMeeting::arrange("org@x.io", no_slots).is_err());
    }

    #[test]
    fn test_all_accept_schedules_meeting() {
        let mut pm = arrange(&["a@x.io", "b@x.io"]);
        pm.respond("a@x.io", InviteResponse::Accept(offer(r#"{"2025-02-01":["10:00 - 11:00"]}"#)))
            .unwrap();
        assert!(!pm.is_complete());
        pm.respond("b@x.io", InviteResponse::Accept(offer(r#"{"2025-02-01":["10:00 - 11:00"]}"#)))
            .unwrap();
        assert!(pm.is_complete());

        match pm.resolve() {
            Resolution::Scheduled { meeting, slot } => {
                assert_eq!(format_canonical(&meeting.time), "2025-02-01T10:00");
                assert_eq!(slot.block.label(), "10:00 - 11:00");
                assert_eq!(meeting.participants, vec!["a@x.io", "b@x.io", "org@x.io"]);
                assert_eq!(meeting.organizer, "org@x.io");
            }
            other => panic!("expected scheduled, got {:?}", other),
        }
    }

    #[test]
    fn test_reject_does_not_store_availability() {
        let mut pm = arrange(&["a@x.io", "b@x.io"]);
        pm.respond("a@x.io", InviteResponse::Reject).unwrap();
        assert_eq!(pm.pending_response, 1);
        assert!(!pm.availabilities.contains_key("a@x.io"));
    }

    #[test]
    fn test_last_response_reject_still_matches_acceptors() {
        let mut pm = arrange(&["a@x.io", "b@x.io"]);
        pm.respond("a@x.io", InviteResponse::Accept(offer(r#"{"2025-02-01":["9:00 - 10:00"]}"#)))
            .unwrap();
        pm.respond("b@x.io", InviteResponse::Reject).unwrap();

        assert!(pm.is_complete());
        assert!(matches!(pm.resolve(), Resolution::Scheduled { .. }));
    }

    #[test]
    fn test_all_declined() {
        let mut pm = arrange(&["a@x.io"]);
        pm.respond("a@x.io", InviteResponse::Reject).unwrap();
        assert_eq!(pm.resolve(), Resolution::AllDeclined);
    }

    #[test]
    fn test_no_common_slot() {
        let mut pm = arrange(&["a@x.io"]);
        pm.respond("a@x.io", InviteResponse::Accept(offer(r#"{"2025-02-02":["9:00 - 10:00"]}"#)))
            .unwrap();
        assert_eq!(pm.resolve(), Resolution::NoCommonSlot);
    }

    #[test]
    fn test_double_response_conflicts() {
        let mut pm = arrange(&["a@x.io", "b@x.io"]);
        pm.respond("a@x.io", InviteResponse::Reject).unwrap();
        assert!(matches!(
            pm.respond("a@x.io", InviteResponse::Reject),
            Err(Error::Conflict(_))
        ));
        assert_eq!(pm.pending_response, 1);
    }

    #[test]
    fn test_outsider_forbidden() {
        let mut pm = arrange(&["a@x.io"]);
        assert!(matches!(
            pm.respond("z@x.io", InviteResponse::Reject),
            Err(Error::Forbidden(_))
        ));
        assert!(matches!(
            pm.respond("org@x.io", InviteResponse::Reject),
            Err(Error::Forbidden(_))
        ));
    }

    #[test]
    fn test_empty_acceptance_rejected_without_decrement() {
        let mut pm = arrange(&["a@x.io"]);
        assert!(pm
            .respond("a@x.io", InviteResponse::Accept(DayAvailability::new()))
            .is_err());
        assert_eq!(pm.pending_response, 1);
        assert!(pm.awaits("a@x.io"));
    }

    #[test]
    fn test_outcome_serialization() {
        let json = serde_json::to_value(InviteOutcome::Pending { remaining: 2 }).unwrap();
        assert_eq!(json["outcome"], "pending");
        assert_eq!(json["remaining"], 2);
        let json = serde_json::to_value(InviteOutcome::AllDeclined).unwrap();
        assert_eq!(json["outcome"], "all_declined");
    }
}
