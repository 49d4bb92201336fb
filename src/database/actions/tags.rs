use crate::{
    constants::{TAG_COLOR_LENGTH, TAG_NAME_MAX_LENGTH, TAG_SLUG_MAX_LENGTH},
    error::CoreError,
    schema::{Id, Tag},
};

use sqlx::{Pool, Sqlite};

pub async fn create_tag(
    name: &str,
    color: &str,
    slug: &str,
    pool: &Pool<Sqlite>,
) -> Result<Tag, CoreError> {
    let name = name.trim();
    if name.is_empty() || name.chars().count() > TAG_NAME_MAX_LENGTH {
        return Err(CoreError::validation(
            "name",
            format!("must be 1 to {TAG_NAME_MAX_LENGTH} characters"),
        ));
    }
    if !is_color(color) {
        return Err(CoreError::validation("color", "expected #RRGGBB"));
    }
    if !is_slug(slug) {
        return Err(CoreError::validation(
            "slug",
            format!("expected 1 to {TAG_SLUG_MAX_LENGTH} of [-a-zA-Z0-9_]"),
        ));
    }

    let result = sqlx::query("INSERT INTO tags (name, color, slug) VALUES (?, ?, ?)")
        .bind(name)
        .bind(color)
        .bind(slug)
        .execute(pool)
        .await
        .map_err(|e| CoreError::from_store(e, "Tag"))?;

    Ok(Tag {
        id: result.last_insert_rowid(),
        name: name.to_owned(),
        color: color.to_owned(),
        slug: slug.to_owned(),
    })
}

pub async fn get_tag(id: Id, pool: &Pool<Sqlite>) -> Result<Tag, CoreError> {
    let tag: Option<Tag> = sqlx::query_as("SELECT id, name, color, slug FROM tags WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    tag.ok_or_else(|| CoreError::NotFound(format!("Tag {id}")))
}

pub async fn find_tag_by_slug(slug: &str, pool: &Pool<Sqlite>) -> Result<Option<Tag>, CoreError> {
    let tag: Option<Tag> =
        sqlx::query_as("SELECT id, name, color, slug FROM tags WHERE slug = ?")
            .bind(slug)
            .fetch_optional(pool)
            .await?;

    Ok(tag)
}

pub async fn list_tags(pool: &Pool<Sqlite>) -> Result<Vec<Tag>, CoreError> {
    let list: Vec<Tag> = sqlx::query_as("SELECT id, name, color, slug FROM tags ORDER BY name")
        .fetch_all(pool)
        .await?;

    Ok(list)
}

fn is_color(color: &str) -> bool {
    color.len() == TAG_COLOR_LENGTH
        && color
            .strip_prefix('#')
            .is_some_and(|hex| hex.chars().all(|c| c.is_ascii_hexdigit()))
}

fn is_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug.len() <= TAG_SLUG_MAX_LENGTH
        && slug
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
