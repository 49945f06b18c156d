use chrono::{DateTime, NaiveDate, Utc};
use shared::Sex;
use uuid::Uuid;

/// A child profile, owned by exactly one parent user.
#[derive(Debug, Clone, PartialEq)]
pub struct Child {
    pub child_id: Uuid,
    pub parent_id: Uuid,
    pub name: String,
    pub sex: Sex,
    pub birth_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}
