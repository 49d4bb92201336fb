use crate::{
    constants::{INGREDIENT_NAME_MAX_LENGTH, MEASUREMENT_UNIT_MAX_LENGTH},
    error::CoreError,
    import::parse_catalog,
    schema::{Id, ImportSummary, Ingredient},
};

use sqlx::{Pool, Sqlite};

pub async fn get_ingredient(id: Id, pool: &Pool<Sqlite>) -> Result<Ingredient, CoreError> {
    let row: Option<Ingredient> =
        sqlx::query_as("SELECT id, name, measurement_unit FROM ingredients WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await?;

    row.ok_or_else(|| CoreError::NotFound(format!("Ingredient {id}")))
}

/// Lists the catalog ordered by name, optionally narrowed to names containing
/// `name_contains` (case-insensitive).
pub async fn list_ingredients(
    name_contains: Option<&str>,
    pool: &Pool<Sqlite>,
) -> Result<Vec<Ingredient>, CoreError> {
    let rows: Vec<Ingredient> = match name_contains.map(str::trim).filter(|s| !s.is_empty()) {
        Some(search) => {
            sqlx::query_as(
                "
                SELECT id, name, measurement_unit FROM ingredients
                WHERE INSTR(LOWER(name), LOWER(?)) > 0
                ORDER BY LOWER(name), id
            ",
            )
            .bind(search)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query_as(
                "SELECT id, name, measurement_unit FROM ingredients ORDER BY LOWER(name), id",
            )
            .fetch_all(pool)
            .await?
        }
    };

    Ok(rows)
}

pub async fn create_ingredient(
    name: &str,
    measurement_unit: &str,
    pool: &Pool<Sqlite>,
) -> Result<Ingredient, CoreError> {
    let (name, measurement_unit) = validate_ingredient(name, measurement_unit)?;

    let result = sqlx::query("INSERT INTO ingredients (name, measurement_unit) VALUES (?, ?)")
        .bind(name)
        .bind(measurement_unit)
        .execute(pool)
        .await
        .map_err(|e| CoreError::from_store(e, "Ingredient"))?;

    Ok(Ingredient {
        id: result.last_insert_rowid(),
        name: name.to_owned(),
        measurement_unit: measurement_unit.to_owned(),
    })
}

/// Imports catalog lines in one transaction. Pairs already present are left
/// untouched and counted as skipped.
pub async fn import_ingredients(
    text: &str,
    pool: &Pool<Sqlite>,
) -> Result<ImportSummary, CoreError> {
    let entries = parse_catalog(text)?;
    for entry in entries.iter() {
        validate_ingredient(&entry.name, &entry.measurement_unit)?;
    }

    let mut tr = pool.begin().await?;
    let mut created = 0;
    for entry in entries.iter() {
        let result = sqlx::query(
            "
            INSERT INTO ingredients (name, measurement_unit) VALUES (?, ?)
            ON CONFLICT DO NOTHING
        ",
        )
        .bind(&entry.name)
        .bind(&entry.measurement_unit)
        .execute(&mut *tr)
        .await?;

        created += result.rows_affected() as usize;
    }
    tr.commit().await?;

    let summary = ImportSummary {
        created,
        skipped: entries.len() - created,
    };
    log::info!(
        "Imported ingredient catalog: {} created, {} skipped",
        summary.created,
        summary.skipped
    );

    Ok(summary)
}

fn validate_ingredient<'a>(
    name: &'a str,
    measurement_unit: &'a str,
) -> Result<(&'a str, &'a str), CoreError> {
    let name = name.trim();
    let measurement_unit = measurement_unit.trim();

    if name.is_empty() {
        return Err(CoreError::validation("name", "must not be empty"));
    }
    if name.chars().count() > INGREDIENT_NAME_MAX_LENGTH {
        return Err(CoreError::validation(
            "name",
            format!("must be at most {INGREDIENT_NAME_MAX_LENGTH} characters"),
        ));
    }
    if measurement_unit.is_empty() {
        return Err(CoreError::validation("measurement_unit", "must not be empty"));
    }
    if measurement_unit.chars().count() > MEASUREMENT_UNIT_MAX_LENGTH {
        return Err(CoreError::validation(
            "measurement_unit",
            format!("must be at most {MEASUREMENT_UNIT_MAX_LENGTH} characters"),
        ));
    }

    Ok((name, measurement_unit))
}
