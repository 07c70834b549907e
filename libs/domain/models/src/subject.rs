// [libs/domain/models/src/subject.rs]
//! Stable actor identity — the root entity every pillar keys off of.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum SubjectType {
    Student,
    Faculty,
    Researcher,
    Business,
    Agent,
    Service,
}

/// Ordered tiers — `Ord` derives the monotonic comparison
/// (unverified < email < institutional < enterprise < admin).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum ClearanceLevel {
    Unverified,
    Email,
    Institutional,
    Enterprise,
    Admin,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subject {
    pub id: Uuid,
    pub subject_type: SubjectType,
    pub clearance_level: ClearanceLevel,
    pub email: String,
    pub display_name: String,
    pub institution_id: Option<Uuid>,
    pub org_id: Option<Uuid>,
    pub trust_score: u8,
    pub is_active: bool,
    pub is_banned: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Subject {
    /// `banned ⇒ cannot be issued a new passport`.
    pub fn can_receive_passport(&self) -> bool {
        self.is_active && !self.is_banned
    }

    /// Clearance is monotonic unless an admin explicitly revokes it; this
    /// helper enforces that a caller never silently downgrades clearance.
    pub fn raise_clearance(&mut self, new_level: ClearanceLevel) {
        if new_level > self.clearance_level {
            self.clearance_level = new_level;
        }
    }
}
