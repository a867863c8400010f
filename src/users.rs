//! User directory and admin operations.
//!
//! The directory caches one paginated listing; page 1 replaces it and later
//! pages append, mirroring the task board's load contract. Admin operations
//! (role toggle, bulk create) patch the cached entries in place.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::ApiClient;
use crate::error::Result;
use crate::task::Pagination;

/// Denormalized user reference carried on a task's `assignedTo`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_admin: Option<bool>,
}

impl UserSummary {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Full directory record from `GET /users`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserRecord {
    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            email: self.email.clone(),
            is_admin: Some(self.is_admin),
        }
    }
}

/// Wire shape of the `GET /users` data payload.
#[derive(Debug, Clone, Deserialize)]
pub struct UserPage {
    pub users: Vec<UserRecord>,
    pub pagination: Pagination,
}

/// One user in an admin bulk-create request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkUserRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub is_admin: bool,
}

/// The admin endpoints echo user documents with a raw `_id` field.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminUser {
    #[serde(rename = "_id")]
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RoleToggleOutcome {
    pub user: AdminUser,
    pub action: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BulkFailure {
    pub email: String,
    pub error: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BulkSummary {
    pub total: u32,
    pub successful: u32,
    pub failed: u32,
}

/// Per-user breakdown of a bulk-create request.
#[derive(Debug, Clone, Deserialize)]
pub struct BulkCreateOutcome {
    pub created: Vec<AdminUser>,
    pub failed: Vec<BulkFailure>,
    pub summary: BulkSummary,
}

/// Cached user listing plus its intents.
pub struct UserDirectory {
    api: ApiClient,
    pub users: Vec<UserRecord>,
    pub pagination: Option<Pagination>,
    pub loading: bool,
    pub error: Option<String>,
}

impl UserDirectory {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            users: Vec::new(),
            pagination: None,
            loading: false,
            error: None,
        }
    }

    /// Fetch one page of users. Page 1 (or any search) replaces the cached
    /// listing; later pages append.
    pub async fn load_page(&mut self, page: u32, limit: u32, search: Option<&str>) -> Result<()> {
        let mut query = vec![("page", page.to_string()), ("limit", limit.to_string())];
        if let Some(search) = search {
            let search = search.trim();
            if !search.is_empty() {
                query.push(("search", search.to_string()));
            }
        }

        self.loading = true;
        self.error = None;
        let result = self.api.get::<UserPage>("/users", &query).await;
        self.loading = false;

        match result {
            Ok(fetched) => {
                if page <= 1 {
                    self.users = fetched.users;
                } else {
                    self.users.extend(fetched.users);
                }
                self.pagination = Some(fetched.pagination);
                Ok(())
            }
            Err(err) => {
                self.error = Some(err.to_string());
                Err(err)
            }
        }
    }

    pub fn clear(&mut self) {
        self.users.clear();
        self.pagination = None;
    }

    pub fn find(&self, user_id: &str) -> Option<&UserRecord> {
        self.users.iter().find(|user| user.id == user_id)
    }

    /// Flip a user's admin flag via `PATCH /admin/users/{id}/role` and patch
    /// the cached record to match.
    pub async fn set_role(&mut self, user_id: &str, is_admin: bool) -> Result<RoleToggleOutcome> {
        let body = serde_json::json!({ "isAdmin": is_admin });
        let outcome: RoleToggleOutcome = match self
            .api
            .patch(&format!("/admin/users/{user_id}/role"), &body)
            .await
        {
            Ok(outcome) => outcome,
            Err(err) => {
                self.error = Some(err.to_string());
                return Err(err);
            }
        };

        if let Some(user) = self.users.iter_mut().find(|user| user.id == outcome.user.id) {
            user.is_admin = outcome.user.is_admin;
        }
        Ok(outcome)
    }

    /// Create users in bulk via `POST /admin/users`, appending the created
    /// ones to the cached listing.
    pub async fn bulk_create(&mut self, requests: &[BulkUserRequest]) -> Result<BulkCreateOutcome> {
        let body = serde_json::json!({ "users": requests });
        let outcome: BulkCreateOutcome = match self.api.post("/admin/users", &body).await {
            Ok(outcome) => outcome,
            Err(err) => {
                self.error = Some(err.to_string());
                return Err(err);
            }
        };

        let now = Utc::now();
        for created in &outcome.created {
            self.users.push(UserRecord {
                id: created.id.clone(),
                first_name: created.first_name.clone(),
                last_name: created.last_name.clone(),
                email: created.email.clone(),
                is_admin: created.is_admin,
                created_at: created.created_at.unwrap_or(now),
                updated_at: created.created_at.unwrap_or(now),
            });
        }
        if let Some(pagination) = self.pagination.as_mut() {
            pagination.total_items += outcome.created.len() as u64;
        }
        Ok(outcome)
    }
}
