use std::collections::HashSet;

use chrono::Utc;
use sqlx::{Pool, QueryBuilder, Sqlite, SqliteConnection};

use crate::{
    constants::{
        COOKING_TIME_MAX, INGREDIENT_AMOUNT_MAX, RECIPE_COLLECTION_MAX, RECIPE_NAME_MAX_LENGTH,
    },
    error::CoreError,
    filter::RecipeFilter,
    schema::{
        Id, IngredientAmount, IngredientLine, MarkKind, NewRecipe, Recipe, RecipeOrder,
        RecipeRow, RecipeUpdate, RecipeView, Tag,
    },
};

use super::marks::is_marked;

pub(crate) async fn fetch_recipe_row(
    id: Id,
    conn: &mut SqliteConnection,
) -> Result<Option<RecipeRow>, CoreError> {
    let row: Option<RecipeRow> = sqlx::query_as(
        "
        SELECT id, author_id, name, image, text, cooking_time, created_at
        FROM recipes WHERE id = ?
    ",
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(row)
}

/// Current ingredient lines of a recipe, ordered by ingredient name.
pub(crate) async fn list_recipe_lines(
    recipe_id: Id,
    conn: &mut SqliteConnection,
) -> Result<Vec<IngredientLine>, CoreError> {
    let rows: Vec<IngredientLine> = sqlx::query_as(
        "
        SELECT i.id AS ingredient_id, i.name AS name, i.measurement_unit AS measurement_unit, rl.amount AS amount
        FROM recipe_ingredients rl
        INNER JOIN ingredients i ON i.id = rl.ingredient_id
        WHERE rl.recipe_id = ?
        ORDER BY LOWER(i.name), i.id
    ",
    )
    .bind(recipe_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows)
}

pub(crate) async fn list_recipe_tags(
    recipe_id: Id,
    conn: &mut SqliteConnection,
) -> Result<Vec<Tag>, CoreError> {
    let rows: Vec<Tag> = sqlx::query_as(
        "
        SELECT t.id AS id, t.name AS name, t.color AS color, t.slug AS slug
        FROM recipe_tags rt
        INNER JOIN tags t ON t.id = rt.tag_id
        WHERE rt.recipe_id = ?
        ORDER BY t.name
    ",
    )
    .bind(recipe_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows)
}

async fn load_recipe(row: RecipeRow, conn: &mut SqliteConnection) -> Result<Recipe, CoreError> {
    let ingredients = list_recipe_lines(row.id, conn).await?;
    let tags = list_recipe_tags(row.id, conn).await?;

    Ok(Recipe::from_parts(row, ingredients, tags))
}

async fn view_recipe(
    recipe: Recipe,
    caller: Option<Id>,
    conn: &mut SqliteConnection,
) -> Result<RecipeView, CoreError> {
    let (is_favorited, is_in_shopping_cart) = match caller {
        Some(user_id) => (
            is_marked(MarkKind::Favorite, user_id, recipe.id, conn).await?,
            is_marked(MarkKind::ShoppingCart, user_id, recipe.id, conn).await?,
        ),
        None => (false, false),
    };

    Ok(RecipeView {
        recipe,
        is_favorited,
        is_in_shopping_cart,
    })
}

pub async fn get_recipe(id: Id, pool: &Pool<Sqlite>) -> Result<Recipe, CoreError> {
    let mut conn = pool.acquire().await?;

    match fetch_recipe_row(id, &mut conn).await? {
        Some(row) => load_recipe(row, &mut conn).await,
        None => Err(CoreError::NotFound(format!("Recipe {id}"))),
    }
}

pub async fn get_recipe_view(
    id: Id,
    caller: Option<Id>,
    pool: &Pool<Sqlite>,
) -> Result<RecipeView, CoreError> {
    let mut conn = pool.acquire().await?;

    let recipe = match fetch_recipe_row(id, &mut conn).await? {
        Some(row) => load_recipe(row, &mut conn).await?,
        None => return Err(CoreError::NotFound(format!("Recipe {id}"))),
    };

    view_recipe(recipe, caller, &mut conn).await
}

/// Recipes matching `filter`, evaluated for `caller` (anonymous callers never
/// get the favorites or shopping cart restrictions).
pub async fn list_recipes(
    filter: &RecipeFilter,
    order: RecipeOrder,
    caller: Option<Id>,
    pool: &Pool<Sqlite>,
) -> Result<Vec<Recipe>, CoreError> {
    let mut conn = pool.acquire().await?;
    let mut query = filter.to_query(order, caller);

    let rows: Vec<RecipeRow> = query.build_query_as().fetch_all(&mut *conn).await?;
    log::debug!("Recipe filter {filter:?} matched {} recipes", rows.len());

    let mut recipes = Vec::with_capacity(rows.len());
    for row in rows {
        recipes.push(load_recipe(row, &mut conn).await?);
    }

    Ok(recipes)
}

pub async fn fetch_recipes(
    filter: &RecipeFilter,
    order: RecipeOrder,
    caller: Option<Id>,
    pool: &Pool<Sqlite>,
) -> Result<Vec<RecipeView>, CoreError> {
    let recipes = list_recipes(filter, order, caller, pool).await?;

    let mut conn = pool.acquire().await?;
    let mut views = Vec::with_capacity(recipes.len());
    for recipe in recipes {
        views.push(view_recipe(recipe, caller, &mut conn).await?);
    }

    Ok(views)
}

pub async fn create_recipe(
    author_id: Id,
    recipe: NewRecipe,
    pool: &Pool<Sqlite>,
) -> Result<Recipe, CoreError> {
    let name = validate_name(&recipe.name)?;
    validate_cooking_time(recipe.cooking_time)?;
    validate_lines(&recipe.ingredients)?;
    validate_tags(&recipe.tags)?;

    let mut tr = pool.begin().await?;

    let result = sqlx::query(
        "
        INSERT INTO recipes (author_id, name, image, text, cooking_time, created_at)
        VALUES (?, ?, ?, ?, ?, ?)
    ",
    )
    .bind(author_id)
    .bind(name)
    .bind(&recipe.image)
    .bind(&recipe.text)
    .bind(recipe.cooking_time)
    .bind(Utc::now())
    .execute(&mut *tr)
    .await
    .map_err(|e| CoreError::from_store(e, "Author"))?;

    let id = result.last_insert_rowid();

    insert_lines(id, &recipe.ingredients, &mut tr).await?;
    insert_tags(id, &recipe.tags, &mut tr).await?;

    let row = fetch_recipe_row(id, &mut tr)
        .await?
        .ok_or_else(|| CoreError::NotFound(format!("Recipe {id}")))?;
    let created = load_recipe(row, &mut tr).await?;

    tr.commit().await?;
    log::info!("Recipe {id} created by user {author_id}");

    Ok(created)
}

/// Applies `update` to a recipe owned by `caller_id`. Supplied ingredient or
/// tag collections replace the stored ones.
pub async fn update_recipe(
    id: Id,
    caller_id: Id,
    update: RecipeUpdate,
    pool: &Pool<Sqlite>,
) -> Result<Recipe, CoreError> {
    let mut tr = pool.begin().await?;
    claim_recipe(id, caller_id, &mut tr).await?;

    let name = update.name.as_deref().map(validate_name).transpose()?;
    if let Some(cooking_time) = update.cooking_time {
        validate_cooking_time(cooking_time)?;
    }
    if let Some(lines) = &update.ingredients {
        validate_lines(lines)?;
    }
    if let Some(tags) = &update.tags {
        validate_tags(tags)?;
    }

    sqlx::query(
        "
        UPDATE recipes SET
        name = COALESCE(?, name),
        text = COALESCE(?, text),
        cooking_time = COALESCE(?, cooking_time),
        image = COALESCE(?, image)
        WHERE id = ?
    ",
    )
    .bind(name)
    .bind(&update.text)
    .bind(update.cooking_time)
    .bind(&update.image)
    .bind(id)
    .execute(&mut *tr)
    .await?;

    if let Some(lines) = &update.ingredients {
        sqlx::query("DELETE FROM recipe_ingredients WHERE recipe_id = ?")
            .bind(id)
            .execute(&mut *tr)
            .await?;
        insert_lines(id, lines, &mut tr).await?;
    }

    if let Some(tags) = &update.tags {
        sqlx::query("DELETE FROM recipe_tags WHERE recipe_id = ?")
            .bind(id)
            .execute(&mut *tr)
            .await?;
        insert_tags(id, tags, &mut tr).await?;
    }

    let row = fetch_recipe_row(id, &mut tr)
        .await?
        .ok_or_else(|| CoreError::NotFound(format!("Recipe {id}")))?;
    let updated = load_recipe(row, &mut tr).await?;

    tr.commit().await?;
    log::info!("Recipe {id} updated by user {caller_id}");

    Ok(updated)
}

/// Deletes a recipe together with its lines, tag links and every mark on it.
pub async fn delete_recipe(id: Id, caller_id: Id, pool: &Pool<Sqlite>) -> Result<(), CoreError> {
    let mut tr = pool.begin().await?;
    claim_recipe(id, caller_id, &mut tr).await?;

    for table in [
        MarkKind::Favorite.table(),
        MarkKind::ShoppingCart.table(),
        "recipe_tags",
        "recipe_ingredients",
    ] {
        sqlx::query(&format!("DELETE FROM {table} WHERE recipe_id = ?"))
            .bind(id)
            .execute(&mut *tr)
            .await?;
    }

    sqlx::query("DELETE FROM recipes WHERE id = ?")
        .bind(id)
        .execute(&mut *tr)
        .await?;

    tr.commit().await?;
    log::info!("Recipe {id} deleted by user {caller_id}");

    Ok(())
}

/// Write-locks a recipe for mutation by its author. The ownership check is
/// the transaction's first statement, so the check and the writes that follow
/// see the same row.
async fn claim_recipe(id: Id, caller_id: Id, conn: &mut SqliteConnection) -> Result<(), CoreError> {
    let result = sqlx::query("UPDATE recipes SET author_id = author_id WHERE id = ? AND author_id = ?")
        .bind(id)
        .bind(caller_id)
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() > 0 {
        return Ok(());
    }

    match fetch_recipe_row(id, conn).await? {
        Some(recipe) => {
            log::warn!("User {caller_id} tried to modify recipe {id} owned by {}", recipe.author_id);
            Err(CoreError::Authorization(String::from(
                "Only the author can modify this recipe",
            )))
        }
        None => Err(CoreError::NotFound(format!("Recipe {id}"))),
    }
}

async fn insert_lines(
    recipe_id: Id,
    lines: &[IngredientAmount],
    conn: &mut SqliteConnection,
) -> Result<(), CoreError> {
    let ids: Vec<Id> = lines.iter().map(|line| line.ingredient_id).collect();
    if count_existing("ingredients", &ids, conn).await? != ids.len() {
        return Err(CoreError::validation("ingredients", "unknown ingredient"));
    }

    let mut query_builder: QueryBuilder<Sqlite> =
        QueryBuilder::new("INSERT INTO recipe_ingredients (recipe_id, ingredient_id, amount) ");

    query_builder.push_values(lines.iter(), |mut b, line| {
        b.push_bind(recipe_id)
            .push_bind(line.ingredient_id)
            .push_bind(line.amount);
    });

    query_builder
        .build()
        .execute(&mut *conn)
        .await
        .map_err(|e| CoreError::from_store(e, "Ingredient line"))?;

    Ok(())
}

async fn insert_tags(
    recipe_id: Id,
    tags: &[Id],
    conn: &mut SqliteConnection,
) -> Result<(), CoreError> {
    if count_existing("tags", tags, conn).await? != tags.len() {
        return Err(CoreError::validation("tags", "unknown tag"));
    }

    let mut query_builder: QueryBuilder<Sqlite> =
        QueryBuilder::new("INSERT INTO recipe_tags (recipe_id, tag_id) ");

    query_builder.push_values(tags.iter(), |mut b, tag_id| {
        b.push_bind(recipe_id).push_bind(*tag_id);
    });

    query_builder
        .build()
        .execute(&mut *conn)
        .await
        .map_err(|e| CoreError::from_store(e, "Tag link"))?;

    Ok(())
}

/// Number of rows of `table` whose id is in `ids`.
async fn count_existing(
    table: &'static str,
    ids: &[Id],
    conn: &mut SqliteConnection,
) -> Result<usize, CoreError> {
    let mut query_builder: QueryBuilder<Sqlite> =
        QueryBuilder::new(format!("SELECT COUNT(*) FROM {table} WHERE id IN ("));
    let mut separated = query_builder.separated(", ");
    for id in ids.iter() {
        separated.push_bind(*id);
    }
    separated.push_unseparated(")");

    let count: (i64,) = query_builder
        .build_query_as()
        .fetch_one(&mut *conn)
        .await?;

    Ok(count.0 as usize)
}

fn validate_name(name: &str) -> Result<&str, CoreError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(CoreError::validation("name", "must not be empty"));
    }
    if name.chars().count() > RECIPE_NAME_MAX_LENGTH {
        return Err(CoreError::validation(
            "name",
            format!("must be at most {RECIPE_NAME_MAX_LENGTH} characters"),
        ));
    }
    Ok(name)
}

fn validate_cooking_time(cooking_time: i64) -> Result<(), CoreError> {
    if cooking_time <= 0 || cooking_time > COOKING_TIME_MAX {
        return Err(CoreError::validation(
            "cooking_time",
            format!("must be between 1 and {COOKING_TIME_MAX} minutes"),
        ));
    }
    Ok(())
}

fn validate_lines(lines: &[IngredientAmount]) -> Result<(), CoreError> {
    if lines.is_empty() {
        return Err(CoreError::validation(
            "ingredients",
            "at least one ingredient is required",
        ));
    }
    if lines.len() > RECIPE_COLLECTION_MAX {
        return Err(CoreError::validation(
            "ingredients",
            format!("at most {RECIPE_COLLECTION_MAX} ingredients are allowed"),
        ));
    }

    let mut seen = HashSet::new();
    for line in lines.iter() {
        if line.amount <= 0 || line.amount > INGREDIENT_AMOUNT_MAX {
            return Err(CoreError::validation(
                "amount",
                format!(
                    "ingredient {} needs an amount between 1 and {INGREDIENT_AMOUNT_MAX}",
                    line.ingredient_id
                ),
            ));
        }
        if !seen.insert(line.ingredient_id) {
            return Err(CoreError::validation(
                "ingredients",
                format!("ingredient {} is listed more than once", line.ingredient_id),
            ));
        }
    }
    Ok(())
}

fn validate_tags(tags: &[Id]) -> Result<(), CoreError> {
    if tags.is_empty() {
        return Err(CoreError::validation("tags", "at least one tag is required"));
    }
    if tags.len() > RECIPE_COLLECTION_MAX {
        return Err(CoreError::validation(
            "tags",
            format!("at most {RECIPE_COLLECTION_MAX} tags are allowed"),
        ));
    }

    let mut seen = HashSet::new();
    if let Some(tag) = tags.iter().find(|tag| !seen.insert(**tag)) {
        return Err(CoreError::validation(
            "tags",
            format!("tag {tag} is listed more than once"),
        ));
    }
    Ok(())
}
