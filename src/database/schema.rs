use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CoreError;

pub type Id = i64;

#[derive(sqlx::FromRow, Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: Id,
    pub username: String,
}

#[derive(sqlx::FromRow, Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ingredient {
    pub id: Id,
    pub name: String,
    pub measurement_unit: String,
}

#[derive(sqlx::FromRow, Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tag {
    pub id: Id,
    pub name: String,
    pub color: String,
    pub slug: String,
}

/// A recipe as stored, without its line and tag collections.
#[derive(sqlx::FromRow, Debug, Clone)]
pub struct RecipeRow {
    pub id: Id,
    pub author_id: Id,
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i64,
    pub created_at: DateTime<Utc>,
}

/// Quantified link between a recipe and one ingredient, joined with the
/// ingredient's display data.
#[derive(sqlx::FromRow, Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngredientLine {
    pub ingredient_id: Id,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Recipe {
    pub id: Id,
    pub author_id: Id,
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i64,
    pub created_at: DateTime<Utc>,
    pub ingredients: Vec<IngredientLine>,
    pub tags: Vec<Tag>,
}

impl Recipe {
    pub fn from_parts(row: RecipeRow, ingredients: Vec<IngredientLine>, tags: Vec<Tag>) -> Self {
        Self {
            id: row.id,
            author_id: row.author_id,
            name: row.name,
            image: row.image,
            text: row.text,
            cooking_time: row.cooking_time,
            created_at: row.created_at,
            ingredients,
            tags,
        }
    }

    pub fn summary(&self) -> RecipeSummary {
        RecipeSummary {
            id: self.id,
            name: self.name.to_owned(),
            image: self.image.to_owned(),
            cooking_time: self.cooking_time,
        }
    }
}

/// Read-side shape: the recipe plus the caller's marks on it.
#[derive(Debug, Clone, Serialize)]
pub struct RecipeView {
    #[serde(flatten)]
    pub recipe: Recipe,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
}

#[derive(sqlx::FromRow, Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecipeSummary {
    pub id: Id,
    pub name: String,
    pub image: String,
    pub cooking_time: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct IngredientAmount {
    #[serde(rename = "id")]
    pub ingredient_id: Id,
    pub amount: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewRecipe {
    pub name: String,
    pub text: String,
    pub cooking_time: i64,
    #[serde(default)]
    pub image: String,
    pub ingredients: Vec<IngredientAmount>,
    pub tags: Vec<Id>,
}

/// Partial update. Supplied collections replace the stored ones wholesale.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecipeUpdate {
    pub name: Option<String>,
    pub text: Option<String>,
    pub cooking_time: Option<i64>,
    pub image: Option<String>,
    pub ingredients: Option<Vec<IngredientAmount>>,
    pub tags: Option<Vec<Id>>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkKind {
    Favorite,
    ShoppingCart,
}

impl MarkKind {
    pub fn table(&self) -> &'static str {
        match self {
            MarkKind::Favorite => "favorites",
            MarkKind::ShoppingCart => "shopping_cart",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MarkKind::Favorite => "favorites",
            MarkKind::ShoppingCart => "shopping cart",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarkRecord {
    pub id: Id,
    pub user_id: Id,
    pub kind: MarkKind,
    pub recipe: RecipeSummary,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecipeOrder {
    #[default]
    Newest,
    Oldest,
    Alphabetical,
}

impl RecipeOrder {
    pub fn sql(&self) -> &'static str {
        match self {
            RecipeOrder::Newest => "r.id DESC",
            RecipeOrder::Oldest => "r.id ASC",
            RecipeOrder::Alphabetical => "LOWER(r.name), r.id DESC",
        }
    }
}

impl TryFrom<Value> for RecipeOrder {
    type Error = CoreError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value.as_str() {
            Some(value) => match value {
                "newest" => Ok(Self::Newest),
                "oldest" => Ok(Self::Oldest),
                "alphabetical" => Ok(Self::Alphabetical),
                _ => Err(CoreError::validation("ordering", "Invalid variant")),
            },
            None => Err(CoreError::validation(
                "ordering",
                "Failed to parse value as string",
            )),
        }
    }
}

/// One purchase line: an ingredient and its amount summed over a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShoppingListEntry {
    pub ingredient_id: Id,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ShoppingList {
    pub entries: Vec<ShoppingListEntry>,
}

/// Rendered shopping list, ready to be served as an attachment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShoppingListFile {
    pub content: String,
    pub filename: String,
    pub mime_type: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub created: usize,
    pub skipped: usize,
}
