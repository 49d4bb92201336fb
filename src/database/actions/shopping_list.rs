use std::collections::HashMap;

use sqlx::{Pool, Sqlite};

use crate::{
    constants::{
        SHOPPING_LIST_FILENAME, SHOPPING_LIST_HEADER, SHOPPING_LIST_MIME_TYPE,
        SHOPPING_LIST_SEPARATOR,
    },
    error::CoreError,
    schema::{Id, IngredientLine, MarkKind, ShoppingList, ShoppingListEntry, ShoppingListFile},
};

use super::{marks::list_marked_recipe_ids, recipes::list_recipe_lines};

/// Sums the current ingredient lines of every recipe in the user's shopping
/// cart. Nothing is cached: each call reads the live cart and recipes.
pub async fn shopping_list(user_id: Id, pool: &Pool<Sqlite>) -> Result<ShoppingList, CoreError> {
    let recipe_ids = list_marked_recipe_ids(MarkKind::ShoppingCart, user_id, pool).await?;
    if recipe_ids.is_empty() {
        return Ok(ShoppingList::default());
    }

    let mut conn = pool.acquire().await?;
    let mut lines = vec![];
    for recipe_id in recipe_ids.iter() {
        lines.extend(list_recipe_lines(*recipe_id, &mut conn).await?);
    }

    let list = ShoppingList::aggregate(lines)?;
    log::debug!(
        "Shopping list for user {user_id}: {} recipes, {} ingredients",
        recipe_ids.len(),
        list.entries.len()
    );

    Ok(list)
}

pub async fn download_shopping_list(
    user_id: Id,
    pool: &Pool<Sqlite>,
) -> Result<ShoppingListFile, CoreError> {
    Ok(shopping_list(user_id, pool).await?.render())
}

impl ShoppingList {
    /// Groups lines by ingredient identity and sums their amounts. Entries are
    /// ordered by case-insensitive name, then by ingredient id.
    pub fn aggregate(lines: impl IntoIterator<Item = IngredientLine>) -> Result<Self, CoreError> {
        let mut groups: HashMap<Id, ShoppingListEntry> = HashMap::new();
        for line in lines {
            let entry = groups
                .entry(line.ingredient_id)
                .or_insert_with(|| ShoppingListEntry {
                    ingredient_id: line.ingredient_id,
                    name: line.name,
                    measurement_unit: line.measurement_unit,
                    amount: 0,
                });

            entry.amount = entry.amount.checked_add(line.amount).ok_or_else(|| {
                CoreError::validation(
                    "amount",
                    format!("total of ingredient {} is out of range", line.ingredient_id),
                )
            })?;
        }

        let mut entries: Vec<ShoppingListEntry> = groups.into_values().collect();
        entries.sort_by_cached_key(|entry| (entry.name.to_lowercase(), entry.ingredient_id));

        Ok(Self { entries })
    }

    pub fn render(&self) -> ShoppingListFile {
        let mut content = String::from(SHOPPING_LIST_HEADER);
        for entry in self.entries.iter() {
            content += &format!(
                "{} {} {}{SHOPPING_LIST_SEPARATOR}",
                capitalize(&entry.name),
                entry.amount,
                entry.measurement_unit
            );
        }

        ShoppingListFile {
            content,
            filename: SHOPPING_LIST_FILENAME.to_string(),
            mime_type: SHOPPING_LIST_MIME_TYPE.to_string(),
        }
    }
}

/// Upper-cases the first character and lower-cases the rest, independent of
/// any locale.
fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}
