use std::collections::BTreeSet;

use sqlx::{Pool, Sqlite, SqliteConnection};

use crate::{
    error::CoreError,
    schema::{Id, MarkKind, MarkRecord, RecipeSummary},
};

pub(crate) async fn is_marked(
    kind: MarkKind,
    user_id: Id,
    recipe_id: Id,
    conn: &mut SqliteConnection,
) -> Result<bool, CoreError> {
    let result: Option<(Id,)> = sqlx::query_as(&format!(
        "SELECT recipe_id FROM {} WHERE user_id = ? AND recipe_id = ?",
        kind.table()
    ))
    .bind(user_id)
    .bind(recipe_id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(result.is_some())
}

pub async fn has_mark(
    kind: MarkKind,
    user_id: Id,
    recipe_id: Id,
    pool: &Pool<Sqlite>,
) -> Result<bool, CoreError> {
    let mut conn = pool.acquire().await?;
    is_marked(kind, user_id, recipe_id, &mut conn).await
}

/// Marks a recipe for a user. The insert runs first so that concurrent adds
/// of the same pair are arbitrated by the unique constraint: exactly one of
/// them stores a row, the others get `Conflict`.
pub async fn add_mark(
    kind: MarkKind,
    user_id: Id,
    recipe_id: Id,
    pool: &Pool<Sqlite>,
) -> Result<MarkRecord, CoreError> {
    let mut tr = pool.begin().await?;

    let result = sqlx::query(&format!(
        "
        INSERT INTO {} (user_id, recipe_id)
        SELECT ?, id FROM recipes WHERE id = ?
        ON CONFLICT DO NOTHING
    ",
        kind.table()
    ))
    .bind(user_id)
    .bind(recipe_id)
    .execute(&mut *tr)
    .await
    .map_err(|e| CoreError::from_store(e, "User"))?;

    let recipe: Option<RecipeSummary> =
        sqlx::query_as("SELECT id, name, image, cooking_time FROM recipes WHERE id = ?")
            .bind(recipe_id)
            .fetch_optional(&mut *tr)
            .await?;

    let Some(recipe) = recipe else {
        return Err(CoreError::NotFound(format!("Recipe {recipe_id}")));
    };

    if result.rows_affected() == 0 {
        log::warn!(
            "User {user_id} tried to add recipe {recipe_id} to {} twice",
            kind.label()
        );
        return Err(CoreError::Conflict(format!(
            "Recipe is already in {}",
            kind.label()
        )));
    }

    let id = result.last_insert_rowid();
    tr.commit().await?;
    log::trace!("> User {user_id} added recipe {recipe_id} to {}", kind.label());

    Ok(MarkRecord {
        id,
        user_id,
        kind,
        recipe,
    })
}

/// Removes a mark. Removing a mark that does not exist is `NotFound`, so a
/// second removal of the same pair fails.
pub async fn remove_mark(
    kind: MarkKind,
    user_id: Id,
    recipe_id: Id,
    pool: &Pool<Sqlite>,
) -> Result<(), CoreError> {
    let result = sqlx::query(&format!(
        "DELETE FROM {} WHERE user_id = ? AND recipe_id = ?",
        kind.table()
    ))
    .bind(user_id)
    .bind(recipe_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(CoreError::NotFound(format!(
            "Recipe {recipe_id} in {}",
            kind.label()
        )));
    }

    log::trace!("> User {user_id} removed recipe {recipe_id} from {}", kind.label());
    Ok(())
}

pub async fn list_marked_recipe_ids(
    kind: MarkKind,
    user_id: Id,
    pool: &Pool<Sqlite>,
) -> Result<BTreeSet<Id>, CoreError> {
    let rows: Vec<(Id,)> = sqlx::query_as(&format!(
        "SELECT recipe_id FROM {} WHERE user_id = ?",
        kind.table()
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(|row| row.0).collect())
}

/// Compact recipes a user marked, most recently marked first.
pub async fn list_marked_recipes(
    kind: MarkKind,
    user_id: Id,
    pool: &Pool<Sqlite>,
) -> Result<Vec<RecipeSummary>, CoreError> {
    let rows: Vec<RecipeSummary> = sqlx::query_as(&format!(
        "
        SELECT r.id AS id, r.name AS name, r.image AS image, r.cooking_time AS cooking_time
        FROM {} m
        INNER JOIN recipes r ON r.id = m.recipe_id
        WHERE m.user_id = ?
        ORDER BY m.id DESC
    ",
        kind.table()
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
