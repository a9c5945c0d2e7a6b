//! Team and user management

use crate::error::{conflict_error, validation_error, AppError};
use crate::models::{
    validate_username, PullRequest, Team, TeamWithMembers, UpdateUserRequest, User,
};
use crate::store::{MembershipStore, PullRequestStore};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

pub struct TeamService {
    store: Arc<dyn MembershipStore>,
}

impl TeamService {
    pub fn new(store: Arc<dyn MembershipStore>) -> Self {
        Self { store }
    }

    pub async fn create_team(&self, name: String) -> Result<Team, AppError> {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(validation_error("Team name must not be blank"));
        }
        if self.store.get_team_by_name(&name).await?.is_some() {
            return Err(conflict_error(format!("Team '{}' already exists", name)));
        }

        let team = Team {
            id: Uuid::new_v4(),
            name,
        };
        self.store.create_team(&team).await?;
        info!("Created team '{}' ({})", team.name, team.id);
        Ok(team)
    }

    /// The team and all of its members, ordered by username
    pub async fn get_team(&self, id: Uuid) -> Result<TeamWithMembers, AppError> {
        debug!("Fetching team {}", id);
        let team = self
            .store
            .get_team(id)
            .await?
            .ok_or(AppError::TeamNotFound(id))?;
        let members = self.store.get_team_members(id).await?;
        Ok(TeamWithMembers { team, members })
    }

    pub async fn update_team(&self, id: Uuid, name: String) -> Result<Team, AppError> {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(validation_error("Team name must not be blank"));
        }
        let team = self
            .store
            .update_team(&Team { id, name })
            .await?
            .ok_or(AppError::TeamNotFound(id))?;
        info!("Renamed team {} to '{}'", team.id, team.name);
        Ok(team)
    }

    /// Delete a team; its members stay but lose their team
    pub async fn delete_team(&self, id: Uuid) -> Result<(), AppError> {
        if !self.store.delete_team(id).await? {
            return Err(AppError::TeamNotFound(id));
        }
        info!("Deleted team {}", id);
        Ok(())
    }
}

pub struct UserService {
    users: Arc<dyn MembershipStore>,
    pull_requests: Arc<dyn PullRequestStore>,
}

impl UserService {
    pub fn new(users: Arc<dyn MembershipStore>, pull_requests: Arc<dyn PullRequestStore>) -> Self {
        Self {
            users,
            pull_requests,
        }
    }

    pub async fn create_user(
        &self,
        username: String,
        team_id: Option<Uuid>,
        is_active: bool,
    ) -> Result<User, AppError> {
        if let Some(team_id) = team_id {
            self.users
                .get_team(team_id)
                .await?
                .ok_or(AppError::TeamNotFound(team_id))?;
        }

        let user = User {
            id: Uuid::new_v4(),
            username,
            team_id,
            is_active,
        };
        self.users.create_user(&user).await?;
        info!("Created user '{}' ({})", user.username, user.id);
        Ok(user)
    }

    pub async fn get_user(&self, id: Uuid) -> Result<User, AppError> {
        debug!("Fetching user {}", id);
        self.users
            .get_user(id)
            .await?
            .ok_or(AppError::UserNotFound(id))
    }

    /// Apply the fields present in `changes`, leaving the rest untouched
    pub async fn update_user(&self, id: Uuid, changes: UpdateUserRequest) -> Result<User, AppError> {
        let mut user = self.get_user(id).await?;

        if let Some(username) = changes.username {
            validate_username(&username).map_err(|e| {
                validation_error(
                    e.message
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| "Invalid username".to_string()),
                )
            })?;
            user.username = username;
        }
        if let Some(team_id) = changes.team_id {
            if let Some(team_id) = team_id {
                self.users
                    .get_team(team_id)
                    .await?
                    .ok_or(AppError::TeamNotFound(team_id))?;
            }
            user.team_id = team_id;
        }
        if let Some(is_active) = changes.is_active {
            user.is_active = is_active;
        }

        let updated = self
            .users
            .update_user(&user)
            .await?
            .ok_or(AppError::UserNotFound(id))?;
        info!("Updated user {}", id);
        Ok(updated)
    }

    /// Fails with a conflict while any pull request references the user
    pub async fn delete_user(&self, id: Uuid) -> Result<(), AppError> {
        if !self.users.delete_user(id).await? {
            return Err(AppError::UserNotFound(id));
        }
        info!("Deleted user {}", id);
        Ok(())
    }

    /// Pull requests the user currently reviews, open or merged, newest first
    pub async fn get_reviews_assigned_to_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<PullRequest>, AppError> {
        self.get_user(user_id).await?;
        self.pull_requests
            .list_pull_requests_by_reviewer(user_id)
            .await
    }
}
