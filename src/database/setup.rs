//! Store initialization.
//!
//! Every uniqueness rule of the data model lives in this schema as a `UNIQUE`
//! constraint, so concurrent writers are arbitrated by the store itself.

use std::{str::FromStr, time::Duration};

use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
    Pool, Sqlite,
};

use crate::{config::StoreConfig, error::CoreError};

const SCHEMA: &[&str] = &[
    "
    CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        username TEXT NOT NULL UNIQUE
    )
    ",
    "
    CREATE TABLE IF NOT EXISTS ingredients (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        measurement_unit TEXT NOT NULL,
        UNIQUE (name, measurement_unit)
    )
    ",
    "CREATE INDEX IF NOT EXISTS idx_ingredients_name ON ingredients(name)",
    "
    CREATE TABLE IF NOT EXISTS tags (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE,
        color TEXT NOT NULL UNIQUE,
        slug TEXT NOT NULL UNIQUE
    )
    ",
    "
    CREATE TABLE IF NOT EXISTS recipes (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        author_id INTEGER NOT NULL,
        name TEXT NOT NULL,
        image TEXT NOT NULL DEFAULT '',
        text TEXT NOT NULL,
        cooking_time INTEGER NOT NULL CHECK (cooking_time > 0),
        created_at TEXT NOT NULL,
        FOREIGN KEY (author_id) REFERENCES users(id) ON DELETE CASCADE
    )
    ",
    "CREATE INDEX IF NOT EXISTS idx_recipes_author ON recipes(author_id)",
    "
    CREATE TABLE IF NOT EXISTS recipe_ingredients (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        recipe_id INTEGER NOT NULL,
        ingredient_id INTEGER NOT NULL,
        amount INTEGER NOT NULL CHECK (amount > 0),
        FOREIGN KEY (recipe_id) REFERENCES recipes(id) ON DELETE CASCADE,
        FOREIGN KEY (ingredient_id) REFERENCES ingredients(id) ON DELETE CASCADE,
        UNIQUE (recipe_id, ingredient_id)
    )
    ",
    "
    CREATE TABLE IF NOT EXISTS recipe_tags (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        recipe_id INTEGER NOT NULL,
        tag_id INTEGER NOT NULL,
        FOREIGN KEY (recipe_id) REFERENCES recipes(id) ON DELETE CASCADE,
        FOREIGN KEY (tag_id) REFERENCES tags(id) ON DELETE CASCADE,
        UNIQUE (recipe_id, tag_id)
    )
    ",
    "
    CREATE TABLE IF NOT EXISTS favorites (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL,
        recipe_id INTEGER NOT NULL,
        FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE,
        FOREIGN KEY (recipe_id) REFERENCES recipes(id) ON DELETE CASCADE,
        UNIQUE (user_id, recipe_id)
    )
    ",
    "
    CREATE TABLE IF NOT EXISTS shopping_cart (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL,
        recipe_id INTEGER NOT NULL,
        FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE,
        FOREIGN KEY (recipe_id) REFERENCES recipes(id) ON DELETE CASCADE,
        UNIQUE (user_id, recipe_id)
    )
    ",
];

/// Opens the pool described by `config` and makes sure the schema exists.
pub async fn setup_database(config: &StoreConfig) -> Result<Pool<Sqlite>, CoreError> {
    let options = SqliteConnectOptions::from_str(&config.database_url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .foreign_keys(true)
        .busy_timeout(config.acquire_timeout);

    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout)
        .connect_with(options)
        .await?;

    create_schema(&pool).await?;
    log::info!("Recipe store ready at {}", config.database_url);

    Ok(pool)
}

/// Opens a private in-memory store with the full schema.
///
/// The pool holds exactly one connection that never expires, since an
/// in-memory database lives only as long as its connection.
pub async fn connect_in_memory() -> Result<Pool<Sqlite>, CoreError> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None::<Duration>)
        .max_lifetime(None::<Duration>)
        .connect_with(options)
        .await?;

    create_schema(&pool).await?;

    Ok(pool)
}

async fn create_schema(pool: &Pool<Sqlite>) -> Result<(), CoreError> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }
    log::trace!("> Schema verified ({} statements)", SCHEMA.len());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn in_memory_store_has_every_relation() {
        let pool = connect_in_memory().await.unwrap();

        for table in [
            "users",
            "ingredients",
            "tags",
            "recipes",
            "recipe_ingredients",
            "recipe_tags",
            "favorites",
            "shopping_cart",
        ] {
            let _: (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {table}"))
                .fetch_one(&pool)
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn schema_creation_is_idempotent() {
        let pool = connect_in_memory().await.unwrap();
        create_schema(&pool).await.unwrap();
    }
}
