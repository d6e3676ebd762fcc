//! Guest list models

use serde::{Deserialize, Serialize};
use sqlx::types::chrono::{DateTime, Utc};
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "age_group", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AgeGroup {
    Adult,
    Child,
}

/// Invited guest; members of one family share a phone number
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Guest {
    pub id: i32,
    pub name: String,
    pub phone: String,
    pub age_group: AgeGroup,
    pub confirmed: bool,
    /// Set when the guest confirms, cleared when they withdraw
    pub confirmation_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Default)]
pub struct GuestGroup {
    pub count: usize,
    pub guests: Vec<Guest>,
}

/// Split guests into adults and children, keeping their order
pub fn split_by_age(guests: &[Guest]) -> (GuestGroup, GuestGroup) {
    let (adults, children): (Vec<Guest>, Vec<Guest>) = guests
        .iter()
        .cloned()
        .partition(|g| g.age_group == AgeGroup::Adult);
    (
        GuestGroup {
            count: adults.len(),
            guests: adults,
        },
        GuestGroup {
            count: children.len(),
            guests: children,
        },
    )
}

/// Everyone registered under one phone number
#[derive(Debug, Serialize)]
pub struct FamilyResponse {
    pub phone: String,
    pub total: usize,
    pub adults: GuestGroup,
    pub children: GuestGroup,
}

impl FamilyResponse {
    pub fn new(phone: String, members: &[Guest]) -> Self {
        let (adults, children) = split_by_age(members);
        Self {
            phone,
            total: members.len(),
            adults,
            children,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy)]
pub struct GuestConfirmation {
    pub id: i32,
    pub confirmed: bool,
}

/// Request DTO for a family's RSVP
#[derive(Debug, Deserialize, Validate)]
pub struct ConfirmGuestsRequest {
    #[validate(length(min = 10, message = "Invalid phone number"))]
    pub phone: String,
    #[validate(length(min = 1, message = "At least one confirmation is required"))]
    pub confirmations: Vec<GuestConfirmation>,
}

#[derive(Debug, Serialize)]
pub struct ConfirmGuestsResponse {
    pub message: String,
    pub phone: String,
    pub count: usize,
    pub guests: Vec<Guest>,
}

/// RSVP filter for the admin guest list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RsvpStatus {
    Confirmed,
    Unconfirmed,
}

impl RsvpStatus {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "confirmed" => Some(RsvpStatus::Confirmed),
            "unconfirmed" => Some(RsvpStatus::Unconfirmed),
            _ => None,
        }
    }

    pub fn is_confirmed(self) -> bool {
        self == RsvpStatus::Confirmed
    }
}

#[derive(Debug, Serialize)]
pub struct GuestListResponse {
    pub status: RsvpStatus,
    pub total: usize,
    pub adults: GuestGroup,
    pub children: GuestGroup,
    pub guests: Vec<Guest>,
}

impl GuestListResponse {
    pub fn new(status: RsvpStatus, guests: Vec<Guest>) -> Self {
        let (adults, children) = split_by_age(&guests);
        Self {
            status,
            total: guests.len(),
            adults,
            children,
            guests,
        }
    }
}

#[derive(Debug, Serialize, Default, PartialEq, Eq)]
pub struct HeadCount {
    pub total: usize,
    pub adults: usize,
    pub children: usize,
}

impl HeadCount {
    fn add(&mut self, age_group: AgeGroup) {
        self.total += 1;
        match age_group {
            AgeGroup::Adult => self.adults += 1,
            AgeGroup::Child => self.children += 1,
        }
    }
}

#[derive(Debug, Serialize, Default, PartialEq, Eq)]
pub struct ConfirmationPercentage {
    pub confirmed: u32,
}

/// RSVP overview for the admin dashboard
#[derive(Debug, Serialize, Default, PartialEq, Eq)]
pub struct ConfirmationStats {
    pub total: usize,
    pub confirmed: HeadCount,
    pub unconfirmed: HeadCount,
    pub percentage: ConfirmationPercentage,
}

impl ConfirmationStats {
    /// Tally `(age_group, confirmed)` pairs; the percentage rounds half up
    pub fn tally(rows: impl IntoIterator<Item = (AgeGroup, bool)>) -> Self {
        let mut stats = ConfirmationStats::default();
        for (age_group, confirmed) in rows {
            stats.total += 1;
            if confirmed {
                stats.confirmed.add(age_group);
            } else {
                stats.unconfirmed.add(age_group);
            }
        }
        if stats.total > 0 {
            let percent = (200 * stats.confirmed.total + stats.total) / (2 * stats.total);
            stats.percentage.confirmed = percent as u32;
        }
        stats
    }
}
