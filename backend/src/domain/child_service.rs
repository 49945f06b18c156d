use chrono::{NaiveDate, Utc};
use shared::RegisterChildRequest;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::models::child::Child;
use crate::domain::models::user::User;
use crate::error::{AppError, ValidationErrors};
use crate::storage::{current_timestamp, ChildRepository, DbConnection};

const MAX_NAME_LENGTH: usize = 255;

/// Service for registering and looking up a parent's children
#[derive(Clone)]
pub struct ChildService {
    child_repository: ChildRepository,
}

impl ChildService {
    pub fn new(db: DbConnection) -> Self {
        Self {
            child_repository: ChildRepository::new(db),
        }
    }

    /// Register a new child owned by `parent`
    pub async fn register_child(&self, parent: &User, request: &RegisterChildRequest) -> Result<Child, AppError> {
        info!("Registering child for user {}: {}", parent.id, request.name.trim());

        let birth_date = self.validate_registration(request)?;

        let child = Child {
            child_id: Uuid::new_v4(),
            parent_id: parent.id,
            name: request.name.trim().to_string(),
            sex: request.sex,
            birth_date,
            created_at: current_timestamp(),
        };

        self.child_repository
            .store_child(&child)
            .await
            .map_err(AppError::internal(parent.language.pick(
                "Failed to register child",
                "Imeshindwa kusajili mtoto",
            )))?;

        info!("Child registered successfully: {}", child.child_id);
        Ok(child)
    }

    /// List the parent's children, newest first
    pub async fn list_children(&self, parent: &User) -> Result<Vec<Child>, AppError> {
        let children = self
            .child_repository
            .list_children_for_parent(parent.id)
            .await
            .map_err(AppError::internal(parent.language.pick(
                "Failed to fetch children",
                "Imeshindwa kupata watoto",
            )))?;

        info!("Found {} children for user {}", children.len(), parent.id);
        Ok(children)
    }

    /// Get one of the parent's children. Another parent's child is reported
    /// exactly like a missing one.
    pub async fn get_child(&self, parent: &User, child_id: Uuid) -> Result<Child, AppError> {
        let child = self
            .child_repository
            .get_child_for_parent(child_id, parent.id)
            .await
            .map_err(AppError::internal(parent.language.pick(
                "Failed to fetch child",
                "Imeshindwa kupata mtoto",
            )))?;

        match child {
            Some(child) => Ok(child),
            None => {
                warn!("Child {} not found for user {}", child_id, parent.id);
                Err(child_not_found(parent))
            }
        }
    }

    fn validate_registration(&self, request: &RegisterChildRequest) -> Result<NaiveDate, AppError> {
        let mut errors = ValidationErrors::new();

        let name = request.name.trim();
        if name.is_empty() {
            errors.add("name", "Child name cannot be empty");
        } else if name.chars().count() > MAX_NAME_LENGTH {
            errors.add("name", format!("Child name cannot exceed {} characters", MAX_NAME_LENGTH));
        }

        let birth_date = match NaiveDate::parse_from_str(&request.birth_date, "%Y-%m-%d") {
            Ok(date) if date > Utc::now().date_naive() => {
                errors.add("birth_date", "Birth date cannot be in the future");
                None
            }
            Ok(date) => Some(date),
            Err(_) => {
                errors.add("birth_date", "Invalid birth date format. Use YYYY-MM-DD.");
                None
            }
        };

        errors.into_result()?;
        birth_date.ok_or_else(|| AppError::validation_field("birth_date", "Invalid birth date"))
    }
}

pub(crate) fn child_not_found(user: &User) -> AppError {
    AppError::NotFound(user.language.pick("Child not found", "Mtoto hajapatikana").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::repositories::user_repository::test_support::insert_user;
    use shared::{Language, Sex};

    async fn init_test() -> (ChildService, DbConnection) {
        let db = DbConnection::in_memory().await.expect("Failed to create test database");
        (ChildService::new(db.clone()), db)
    }

    fn request(name: &str, birth_date: &str) -> RegisterChildRequest {
        RegisterChildRequest {
            name: name.to_string(),
            sex: Sex::Male,
            birth_date: birth_date.to_string(),
        }
    }

    #[tokio::test]
    async fn test_register_and_get_child() {
        let (service, db) = init_test().await;
        let parent = insert_user(&db, "parent@example.com").await;

        let child = service.register_child(&parent, &request("  Juma  ", "2023-05-01")).await.unwrap();
        assert_eq!(child.name, "Juma");
        assert_eq!(child.parent_id, parent.id);

        let fetched = service.get_child(&parent, child.child_id).await.unwrap();
        assert_eq!(fetched, child);
    }

    #[tokio::test]
    async fn test_register_reports_all_invalid_fields() {
        let (service, db) = init_test().await;
        let parent = insert_user(&db, "parent@example.com").await;

        let result = service.register_child(&parent, &request("   ", "01/05/2023")).await;
        match result {
            Err(AppError::Validation(errors)) => {
                let fields: Vec<&str> = errors.fields.iter().map(|f| f.field.as_str()).collect();
                assert_eq!(fields, vec!["name", "birth_date"]);
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_future_birth_date_rejected() {
        let (service, db) = init_test().await;
        let parent = insert_user(&db, "parent@example.com").await;

        let result = service.register_child(&parent, &request("Juma", "2999-01-01")).await;
        assert!(matches!(result, Err(AppError::Validation(_))));

        let long_name = "a".repeat(256);
        let result = service.register_child(&parent, &request(&long_name, "2023-01-01")).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_other_parents_child_is_not_found() {
        let (service, db) = init_test().await;
        let owner = insert_user(&db, "owner@example.com").await;
        let mut other = insert_user(&db, "other@example.com").await;
        let child = service.register_child(&owner, &request("Juma", "2023-05-01")).await.unwrap();

        assert!(matches!(
            service.get_child(&other, child.child_id).await,
            Err(AppError::NotFound(message)) if message == "Child not found"
        ));

        other.language = Language::Swahili;
        assert!(matches!(
            service.get_child(&other, child.child_id).await,
            Err(AppError::NotFound(message)) if message == "Mtoto hajapatikana"
        ));
        assert!(service.list_children(&other).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_children() {
        let (service, db) = init_test().await;
        let parent = insert_user(&db, "parent@example.com").await;
        service.register_child(&parent, &request("Juma", "2022-01-01")).await.unwrap();
        service.register_child(&parent, &request("Neema", "2023-01-01")).await.unwrap();

        let children = service.list_children(&parent).await.unwrap();
        assert_eq!(children.len(), 2);
        assert_eq!(children[0].name, "Neema");
    }
}
