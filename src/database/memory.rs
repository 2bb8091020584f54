use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::directory::Directory;
use super::manager::DatabaseError;
use super::models::{AccentColor, NewUser, Organization, Role, Theme, User};

/// In-process directory for tests and local tooling.
///
/// Mirrors the PostgreSQL semantics: case-insensitive unique emails and an
/// all-or-nothing organization creation.
#[derive(Default)]
pub struct MemoryDirectory {
    state: RwLock<MemoryState>,
}

#[derive(Default)]
struct MemoryState {
    users: HashMap<Uuid, User>,
    organizations: HashMap<Uuid, Organization>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn remove_user(&self, id: Uuid) -> Option<User> {
        self.state.write().await.users.remove(&id)
    }

    pub async fn set_role(&self, id: Uuid, role: Role) {
        if let Some(user) = self.state.write().await.users.get_mut(&id) {
            user.role = role;
            user.updated_at = Utc::now();
        }
    }

    pub async fn organization(&self, id: Uuid) -> Option<Organization> {
        self.state.read().await.organizations.get(&id).cloned()
    }
}

#[async_trait]
impl Directory for MemoryDirectory {
    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, DatabaseError> {
        Ok(self.state.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        let state = self.state.read().await;
        Ok(state
            .users
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn create_user(&self, new_user: NewUser) -> Result<User, DatabaseError> {
        let mut state = self.state.write().await;
        if state.users.values().any(|u| u.email.eq_ignore_ascii_case(&new_user.email)) {
            return Err(DatabaseError::Conflict("User already exists".to_string()));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email: new_user.email,
            name: new_user.name,
            password_hash: new_user.password_hash,
            role: new_user.role,
            org_id: new_user.org_id,
            profile_image: None,
            theme: Theme::System,
            accent_color: AccentColor::Blue,
            reset_token_hash: None,
            reset_token_expiry: None,
            created_at: now,
            updated_at: now,
        };
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn create_organization(
        &self,
        owner_id: Uuid,
        name: &str,
    ) -> Result<Organization, DatabaseError> {
        let mut state = self.state.write().await;

        match state.users.get(&owner_id) {
            None => return Err(DatabaseError::NotFound(format!("User {owner_id}"))),
            Some(user) if user.org_id.is_some() => {
                return Err(DatabaseError::Conflict(
                    "User already belongs to an organization".to_string(),
                ))
            }
            Some(_) => {}
        }

        let now = Utc::now();
        let org = Organization {
            id: Uuid::new_v4(),
            name: name.to_string(),
            created_at: now,
            updated_at: now,
        };
        state.organizations.insert(org.id, org.clone());

        if let Some(user) = state.users.get_mut(&owner_id) {
            user.org_id = Some(org.id);
            user.role = Role::Admin;
            user.updated_at = now;
        }

        Ok(org)
    }

    async fn store_reset_token(
        &self,
        email: &str,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<bool, DatabaseError> {
        let mut state = self.state.write().await;
        match state.users.values_mut().find(|u| u.email.eq_ignore_ascii_case(email)) {
            Some(user) => {
                user.reset_token_hash = Some(token_hash.to_string());
                user.reset_token_expiry = Some(expires_at);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn reset_password(
        &self,
        token_hash: &str,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, DatabaseError> {
        let mut state = self.state.write().await;
        let user = state.users.values_mut().find(|u| {
            u.reset_token_hash.as_deref() == Some(token_hash)
                && u.reset_token_expiry.map(|exp| exp > now).unwrap_or(false)
        });

        match user {
            Some(user) => {
                user.password_hash = password_hash.to_string();
                user.reset_token_hash = None;
                user.reset_token_expiry = None;
                user.updated_at = now;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
