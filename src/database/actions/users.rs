use crate::{
    error::CoreError,
    schema::{Id, User},
};

use sqlx::{Pool, Sqlite};

pub async fn get_user(id: Id, pool: &Pool<Sqlite>) -> Result<User, CoreError> {
    let row: Option<User> = sqlx::query_as("SELECT id, username FROM users WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    row.ok_or_else(|| CoreError::NotFound(format!("User {id}")))
}

/// Registers the identity other relations point at. Credentials are owned by
/// the authentication collaborator.
pub async fn create_user(username: &str, pool: &Pool<Sqlite>) -> Result<User, CoreError> {
    let username = username.trim();
    if username.is_empty() {
        return Err(CoreError::validation("username", "must not be empty"));
    }

    let result = sqlx::query("INSERT INTO users (username) VALUES (?)")
        .bind(username)
        .execute(pool)
        .await
        .map_err(|e| CoreError::from_store(e, "User"))?;

    Ok(User {
        id: result.last_insert_rowid(),
        username: username.to_owned(),
    })
}
