use shared::{ChildListResponse, ChildResponse};

use crate::domain::models::child::Child;
use crate::storage::format_timestamp;

/// Mapper from domain children to the shared child DTOs
pub struct ChildMapper;

impl ChildMapper {
    pub fn to_dto(child: &Child) -> ChildResponse {
        ChildResponse {
            child_id: child.child_id.to_string(),
            name: child.name.clone(),
            sex: child.sex,
            birth_date: child.birth_date.format("%Y-%m-%d").to_string(),
            created_at: format_timestamp(&child.created_at),
        }
    }

    pub fn to_list_dto(children: &[Child]) -> ChildListResponse {
        ChildListResponse {
            children: children.iter().map(Self::to_dto).collect(),
            total_count: children.len(),
        }
    }
}
