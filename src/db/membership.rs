//! PostgreSQL membership store

use super::{queries, violates};
use crate::error::{conflict_error, AppError};
use crate::models::{Team, User};
use crate::store::MembershipStore;
use async_trait::async_trait;
use deadpool_postgres::Pool;
use tokio_postgres::error::SqlState;
use tokio_postgres::Row;
use uuid::Uuid;

pub struct PgMembershipStore {
    pool: Pool,
}

impl PgMembershipStore {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

fn team_from_row(row: &Row) -> Team {
    Team {
        id: row.get(0),
        name: row.get(1),
    }
}

fn user_from_row(row: &Row) -> User {
    User {
        id: row.get(0),
        username: row.get(1),
        team_id: row.get(2),
        is_active: row.get(3),
    }
}

/// Translate constraint failures on user writes into domain errors
fn user_write_error(e: tokio_postgres::Error, user: &User) -> AppError {
    if violates(&e, &SqlState::UNIQUE_VIOLATION) {
        conflict_error(format!("Username '{}' is already taken", user.username))
    } else if violates(&e, &SqlState::FOREIGN_KEY_VIOLATION) {
        match user.team_id {
            Some(team_id) => AppError::TeamNotFound(team_id),
            None => AppError::Database(e),
        }
    } else {
        AppError::Database(e)
    }
}

#[async_trait]
impl MembershipStore for PgMembershipStore {
    async fn create_team(&self, team: &Team) -> Result<(), AppError> {
        let client = self.pool.get().await?;
        client
            .execute(queries::INSERT_TEAM, &[&team.id, &team.name])
            .await
            .map_err(|e| {
                if violates(&e, &SqlState::UNIQUE_VIOLATION) {
                    conflict_error(format!("Team '{}' already exists", team.name))
                } else {
                    AppError::Database(e)
                }
            })?;
        Ok(())
    }

    async fn get_team(&self, id: Uuid) -> Result<Option<Team>, AppError> {
        let client = self.pool.get().await?;
        let row = client.query_opt(queries::GET_TEAM, &[&id]).await?;
        Ok(row.as_ref().map(team_from_row))
    }

    async fn get_team_by_name(&self, name: &str) -> Result<Option<Team>, AppError> {
        let client = self.pool.get().await?;
        let row = client.query_opt(queries::GET_TEAM_BY_NAME, &[&name]).await?;
        Ok(row.as_ref().map(team_from_row))
    }

    async fn update_team(&self, team: &Team) -> Result<Option<Team>, AppError> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt(queries::UPDATE_TEAM, &[&team.id, &team.name])
            .await
            .map_err(|e| {
                if violates(&e, &SqlState::UNIQUE_VIOLATION) {
                    conflict_error(format!("Team '{}' already exists", team.name))
                } else {
                    AppError::Database(e)
                }
            })?;
        Ok(row.as_ref().map(team_from_row))
    }

    async fn delete_team(&self, id: Uuid) -> Result<bool, AppError> {
        let client = self.pool.get().await?;
        let deleted = client.execute(queries::DELETE_TEAM, &[&id]).await?;
        Ok(deleted > 0)
    }

    async fn get_team_members(&self, team_id: Uuid) -> Result<Vec<User>, AppError> {
        let client = self.pool.get().await?;
        let rows = client.query(queries::GET_TEAM_MEMBERS, &[&team_id]).await?;
        Ok(rows.iter().map(user_from_row).collect())
    }

    async fn get_active_team_members(
        &self,
        team_id: Uuid,
        exclude: &[Uuid],
    ) -> Result<Vec<User>, AppError> {
        let client = self.pool.get().await?;
        let rows = client
            .query(queries::GET_ACTIVE_TEAM_MEMBERS, &[&team_id, &exclude])
            .await?;
        Ok(rows.iter().map(user_from_row).collect())
    }

    async fn deactivate_team_members(&self, team_id: Uuid) -> Result<u64, AppError> {
        let client = self.pool.get().await?;
        Ok(client
            .execute(queries::DEACTIVATE_TEAM_MEMBERS, &[&team_id])
            .await?)
    }

    async fn create_user(&self, user: &User) -> Result<(), AppError> {
        let client = self.pool.get().await?;
        client
            .execute(
                queries::INSERT_USER,
                &[&user.id, &user.username, &user.team_id, &user.is_active],
            )
            .await
            .map_err(|e| user_write_error(e, user))?;
        Ok(())
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let client = self.pool.get().await?;
        let row = client.query_opt(queries::GET_USER, &[&id]).await?;
        Ok(row.as_ref().map(user_from_row))
    }

    async fn update_user(&self, user: &User) -> Result<Option<User>, AppError> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt(
                queries::UPDATE_USER,
                &[&user.id, &user.username, &user.team_id, &user.is_active],
            )
            .await
            .map_err(|e| user_write_error(e, user))?;
        Ok(row.as_ref().map(user_from_row))
    }

    async fn delete_user(&self, id: Uuid) -> Result<bool, AppError> {
        let client = self.pool.get().await?;
        let deleted = client
            .execute(queries::DELETE_USER, &[&id])
            .await
            .map_err(|e| {
                if violates(&e, &SqlState::FOREIGN_KEY_VIOLATION) {
                    conflict_error(format!(
                        "User {} is referenced by pull requests and cannot be deleted",
                        id
                    ))
                } else {
                    AppError::Database(e)
                }
            })?;
        Ok(deleted > 0)
    }
}
