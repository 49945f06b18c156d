use shared::UserProfile;

use crate::domain::models::user::User;
use crate::storage::format_timestamp;

pub struct UserMapper;

impl UserMapper {
    /// Public profile; the password hash never leaves the domain
    pub fn to_profile(user: &User) -> UserProfile {
        UserProfile {
            id: user.id.to_string(),
            email: user.email.clone(),
            name: user.name.clone(),
            phone: user.phone.clone(),
            language: user.language,
            created_at: format_timestamp(&user.created_at),
        }
    }
}
