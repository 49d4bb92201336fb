#![allow(dead_code)]

use std::time::Duration;

use recipebook_sdk::{
    actions::{create_ingredient, create_recipe, create_tag, create_user},
    schema::{Id, Ingredient, IngredientAmount, NewRecipe, Recipe, Tag, User},
    setup::{connect_in_memory, setup_database},
    StoreConfig,
};
use sqlx::{Pool, Sqlite};
use tempfile::TempDir;

pub struct Kitchen {
    pub pool: Pool<Sqlite>,
    pub author: User,
    pub guest: User,
    pub flour: Ingredient,
    pub egg: Ingredient,
    pub milk: Ingredient,
    pub breakfast: Tag,
    pub dinner: Tag,
}

/// Fresh in-memory store with two users, three ingredients and two tags.
pub async fn kitchen() -> Kitchen {
    stock(connect_in_memory().await.unwrap()).await
}

/// Same fixture on a file-backed store whose pool holds several connections,
/// so concurrent calls really run in parallel transactions. Keep the returned
/// directory alive for as long as the store is used.
pub async fn shared_kitchen() -> (Kitchen, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let config = StoreConfig {
        database_url: format!("sqlite://{}", dir.path().join("recipes.db").display()),
        max_connections: 8,
        acquire_timeout: Duration::from_secs(10),
        ..Default::default()
    };

    let pool = setup_database(&config).await.unwrap();
    (stock(pool).await, dir)
}

async fn stock(pool: Pool<Sqlite>) -> Kitchen {
    let author = create_user("author", &pool).await.unwrap();
    let guest = create_user("guest", &pool).await.unwrap();
    let flour = create_ingredient("flour", "g", &pool).await.unwrap();
    let egg = create_ingredient("egg", "pcs", &pool).await.unwrap();
    let milk = create_ingredient("milk", "ml", &pool).await.unwrap();
    let breakfast = create_tag("Breakfast", "#E26C2D", "breakfast", &pool)
        .await
        .unwrap();
    let dinner = create_tag("Dinner", "#49B64E", "dinner", &pool)
        .await
        .unwrap();

    Kitchen {
        pool,
        author,
        guest,
        flour,
        egg,
        milk,
        breakfast,
        dinner,
    }
}

pub fn new_recipe(name: &str, lines: &[(Id, i64)], tags: &[Id]) -> NewRecipe {
    NewRecipe {
        name: name.to_string(),
        text: String::from("Mix everything and cook."),
        cooking_time: 15,
        image: String::new(),
        ingredients: lines
            .iter()
            .map(|(ingredient_id, amount)| IngredientAmount {
                ingredient_id: *ingredient_id,
                amount: *amount,
            })
            .collect(),
        tags: tags.to_vec(),
    }
}

impl Kitchen {
    pub async fn recipe(&self, name: &str, lines: &[(Id, i64)], tags: &[Id]) -> Recipe {
        create_recipe(self.author.id, new_recipe(name, lines, tags), &self.pool)
            .await
            .unwrap()
    }
}
