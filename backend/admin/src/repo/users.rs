//! Operator accounts.

use raffle_rules::Role;
use serde::Deserialize;
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::info;

use crate::errors::{AdminError, Result};
use crate::models::User;
use crate::repo::required;

const SELECT_USER: &str = "SELECT id, name, email, role, created_at FROM users";

#[derive(Debug, Clone, Deserialize)]
pub struct UserInput {
    pub name: String,
    pub email: String,
    #[serde(default = "default_role")]
    pub role: Role,
}

fn default_role() -> Role {
    Role::User
}

pub async fn list_users(pool: &SqlitePool) -> Result<Vec<User>> {
    let sql = format!("{SELECT_USER} ORDER BY name ASC, id ASC");
    Ok(sqlx::query_as::<_, User>(&sql).fetch_all(pool).await?)
}

pub async fn get_user(pool: &SqlitePool, id: i64) -> Result<User> {
    let sql = format!("{SELECT_USER} WHERE id = ?1");
    sqlx::query_as::<_, User>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(AdminError::NotFound("user"))
}

fn normalized_email(raw: &str) -> Result<String> {
    let email = required(raw, "email")?.to_ascii_lowercase();
    if !email.contains('@') {
        return Err(AdminError::Validation("email is invalid".to_string()));
    }
    Ok(email)
}

pub async fn create_user(pool: &SqlitePool, input: UserInput) -> Result<User> {
    let name = required(&input.name, "name")?;
    let email = normalized_email(&input.email)?;

    let id = sqlx::query("INSERT INTO users (name, email, role) VALUES (?1, ?2, ?3)")
        .bind(&name)
        .bind(&email)
        .bind(input.role.as_str())
        .execute(pool)
        .await
        .map_err(|e| AdminError::from_write(e, "user email"))?
        .last_insert_rowid();

    info!(user_id = id, role = %input.role, "user created");
    get_user(pool, id).await
}

/// Whether the user is currently an admin; `NotFound` if there is no such user.
async fn is_admin(tx: &mut Transaction<'_, Sqlite>, id: i64) -> Result<bool> {
    let role: Option<String> = sqlx::query_scalar("SELECT role FROM users WHERE id = ?1")
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?;
    match role {
        Some(role) => Ok(role == Role::Admin.as_str()),
        None => Err(AdminError::NotFound("user")),
    }
}

/// Refuse a change that would leave no admin besides `id`.
async fn ensure_other_admin(tx: &mut Transaction<'_, Sqlite>, id: i64) -> Result<()> {
    let others: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE role = ?1 AND id != ?2")
            .bind(Role::Admin.as_str())
            .bind(id)
            .fetch_one(&mut **tx)
            .await?;
    if others == 0 {
        return Err(AdminError::Conflict(
            "at least one admin must remain".to_string(),
        ));
    }
    Ok(())
}

pub async fn update_user(pool: &SqlitePool, id: i64, input: UserInput) -> Result<User> {
    let name = required(&input.name, "name")?;
    let email = normalized_email(&input.email)?;

    let mut tx = pool.begin().await?;
    if is_admin(&mut tx, id).await? && input.role != Role::Admin {
        ensure_other_admin(&mut tx, id).await?;
    }

    sqlx::query("UPDATE users SET name = ?1, email = ?2, role = ?3 WHERE id = ?4")
        .bind(&name)
        .bind(&email)
        .bind(input.role.as_str())
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(|e| AdminError::from_write(e, "user email"))?;
    tx.commit().await?;

    info!(user_id = id, role = %input.role, "user updated");
    get_user(pool, id).await
}

pub async fn delete_user(pool: &SqlitePool, id: i64) -> Result<()> {
    let mut tx = pool.begin().await?;
    if is_admin(&mut tx, id).await? {
        ensure_other_admin(&mut tx, id).await?;
    }

    sqlx::query("DELETE FROM users WHERE id = ?1")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    info!(user_id = id, "user deleted");
    Ok(())
}
