//! Contact directory service.

use chrono::Utc;
use jardin_common::{AppResult, form};
use jardin_db::{
    entities::{contact_info, contact_info::ContactCategory},
    repositories::ContactInfoRepository,
};
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidateEmail, ValidateUrl};

use super::{FieldCheck, WriteMode, timestamp};
use crate::policy::{Access, Caller, Resource, authorize, visibility};

/// Contact entry fields for create and update.
///
/// Every field except `name` may be blank.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct ContactInput {
    #[validate(length(min = 1, max = 120))]
    pub name: Option<String>,
    #[serde(default)]
    pub category: Option<ContactCategory>,
    #[serde(default)]
    #[validate(length(max = 20))]
    pub phone: Option<String>,
    #[serde(default)]
    #[validate(length(max = 20))]
    pub whatsapp: Option<String>,
    #[serde(default)]
    #[validate(length(max = 254))]
    pub email: Option<String>,
    #[serde(default)]
    #[validate(length(max = 255))]
    pub address: Option<String>,
    #[serde(default)]
    #[validate(length(max = 200))]
    pub facebook: Option<String>,
    #[serde(default)]
    #[validate(length(max = 200))]
    pub instagram: Option<String>,
    #[serde(default, deserialize_with = "form::opt_bool")]
    pub is_active: Option<bool>,
}

impl ContactInput {
    fn check(&self, mode: WriteMode) -> AppResult<()> {
        let mut check = FieldCheck::new();
        check.require(mode, "name", self.name.is_some());

        if let Some(email) = non_blank(self.email.as_deref())
            && !email.validate_email()
        {
            check.push("email", "Enter a valid email address.");
        }
        for (field, value) in [("facebook", &self.facebook), ("instagram", &self.instagram)] {
            if let Some(link) = non_blank(value.as_deref())
                && !link.validate_url()
            {
                check.push(field, "Enter a valid URL.");
            }
        }

        check.finish()
    }

    fn apply(self, active: &mut contact_info::ActiveModel) {
        if let Some(name) = self.name {
            active.name = Set(name);
        }
        if let Some(category) = self.category {
            active.category = Set(category);
        }
        if let Some(phone) = self.phone {
            active.phone = Set(phone);
        }
        if let Some(whatsapp) = self.whatsapp {
            active.whatsapp = Set(whatsapp);
        }
        if let Some(email) = self.email {
            active.email = Set(email);
        }
        if let Some(address) = self.address {
            active.address = Set(address);
        }
        if let Some(facebook) = self.facebook {
            active.facebook = Set(facebook);
        }
        if let Some(instagram) = self.instagram {
            active.instagram = Set(instagram);
        }
        if let Some(is_active) = self.is_active {
            active.is_active = Set(is_active);
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Contact entry with the label of its category.
#[derive(Debug, Clone, Serialize)]
pub struct ContactResponse {
    pub id: i64,
    pub name: String,
    pub category: ContactCategory,
    pub category_display: &'static str,
    pub phone: String,
    pub whatsapp: String,
    pub email: String,
    pub address: String,
    pub facebook: String,
    pub instagram: String,
    pub is_active: bool,
    pub created_at: String,
}

impl From<contact_info::Model> for ContactResponse {
    fn from(c: contact_info::Model) -> Self {
        Self {
            id: c.id,
            name: c.name,
            category: c.category,
            category_display: c.category.label(),
            phone: c.phone,
            whatsapp: c.whatsapp,
            email: c.email,
            address: c.address,
            facebook: c.facebook,
            instagram: c.instagram,
            is_active: c.is_active,
            created_at: timestamp(&c.created_at),
        }
    }
}

/// Service for the contact directory.
#[derive(Clone)]
pub struct ContactService {
    contact_repo: ContactInfoRepository,
}

impl ContactService {
    /// Create a new contact service.
    #[must_use]
    pub const fn new(contact_repo: ContactInfoRepository) -> Self {
        Self { contact_repo }
    }

    /// List entries by category, then name.
    pub async fn list(&self, caller: &Caller) -> AppResult<Vec<ContactResponse>> {
        authorize(caller, Resource::ContactInfo, Access::Read)?;

        let entries = self
            .contact_repo
            .list(visibility(caller, Resource::ContactInfo))
            .await?;
        Ok(entries.into_iter().map(ContactResponse::from).collect())
    }

    /// Get an entry by ID.
    pub async fn get(&self, caller: &Caller, id: i64) -> AppResult<ContactResponse> {
        authorize(caller, Resource::ContactInfo, Access::Read)?;

        let entry = self
            .contact_repo
            .get_by_id(id, visibility(caller, Resource::ContactInfo))
            .await?;
        Ok(entry.into())
    }

    /// Create an entry.
    pub async fn create(&self, caller: &Caller, input: ContactInput) -> AppResult<ContactResponse> {
        authorize(caller, Resource::ContactInfo, Access::Write)?;
        input.validate()?;
        input.check(WriteMode::Full)?;

        let mut model = contact_info::ActiveModel {
            category: Set(ContactCategory::default()),
            phone: Set(String::new()),
            whatsapp: Set(String::new()),
            email: Set(String::new()),
            address: Set(String::new()),
            facebook: Set(String::new()),
            instagram: Set(String::new()),
            is_active: Set(true),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        };
        input.apply(&mut model);

        let entry = self.contact_repo.create(model).await?;
        tracing::info!(contact_id = entry.id, "Contact entry created");
        Ok(entry.into())
    }

    /// Replace or patch an entry.
    pub async fn update(
        &self,
        caller: &Caller,
        id: i64,
        input: ContactInput,
        mode: WriteMode,
    ) -> AppResult<ContactResponse> {
        authorize(caller, Resource::ContactInfo, Access::Write)?;
        input.validate()?;
        input.check(mode)?;

        let entry = self
            .contact_repo
            .get_by_id(id, visibility(caller, Resource::ContactInfo))
            .await?;
        let mut active: contact_info::ActiveModel = entry.into();
        input.apply(&mut active);

        let entry = self.contact_repo.update(active).await?;
        Ok(entry.into())
    }

    /// Delete an entry.
    pub async fn delete(&self, caller: &Caller, id: i64) -> AppResult<()> {
        authorize(caller, Resource::ContactInfo, Access::Write)?;

        let entry = self
            .contact_repo
            .get_by_id(id, visibility(caller, Resource::ContactInfo))
            .await?;
        self.contact_repo.delete(entry.id).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::policy::Role;
    use crate::services::test_support::editor;
    use jardin_common::AppError;
    use jardin_db::test_utils::{logged_statements, where_clause};
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn test_contact(id: i64, category: ContactCategory) -> contact_info::Model {
        contact_info::Model {
            id,
            name: "Remises del Valle".to_string(),
            category,
            phone: "+54 351 555".to_string(),
            whatsapp: String::new(),
            email: String::new(),
            address: String::new(),
            facebook: String::new(),
            instagram: String::new(),
            is_active: true,
            created_at: Utc::now().into(),
        }
    }

    #[test]
    fn test_category_display() {
        let response = ContactResponse::from(test_contact(1, ContactCategory::Operadores));
        assert_eq!(response.category_display, "Operadores Turísticos");

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["category"], "OPERADORES");
    }

    #[test]
    fn test_blank_links_are_accepted() {
        let input = ContactInput {
            name: Some("Guías".to_string()),
            email: Some(String::new()),
            facebook: Some(String::new()),
            ..Default::default()
        };
        assert!(input.check(WriteMode::Full).is_ok());
    }

    #[test]
    fn test_malformed_email_and_link() {
        let input = ContactInput {
            name: Some("Guías".to_string()),
            email: Some("guias-at-example".to_string()),
            instagram: Some("instagram guias".to_string()),
            ..Default::default()
        };
        match input.check(WriteMode::Full) {
            Err(AppError::InvalidFields(fields)) => {
                assert!(fields.contains_key("email"));
                assert!(fields.contains_key("instagram"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_editor_cannot_write() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let svc = ContactService::new(ContactInfoRepository::new(db));

        let result = svc
            .create(&editor(Role::Editor), ContactInput::default())
            .await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    async fn list_statement(caller: &Caller) -> String {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_contact(1, ContactCategory::General)]])
                .into_connection(),
        );
        let svc = ContactService::new(ContactInfoRepository::new(db.clone()));

        svc.list(caller).await.unwrap();
        drop(svc);

        logged_statements(db).remove(0)
    }

    #[tokio::test]
    async fn test_staff_list_includes_inactive() {
        let staff = Caller {
            user_id: Some(1),
            is_staff: true,
            role: None,
        };
        let statement = list_statement(&staff).await;
        assert!(!where_clause(&statement).contains("is_active"));
    }

    #[tokio::test]
    async fn test_admin_role_without_staff_lists_active_only() {
        let statement = list_statement(&editor(Role::Admin)).await;
        assert!(where_clause(&statement).contains("is_active"));
    }
}
