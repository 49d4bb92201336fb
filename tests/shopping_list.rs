mod common;

use common::kitchen;
use recipebook_sdk::{
    actions::{
        add_mark, create_ingredient, delete_recipe, download_shopping_list, remove_mark,
        shopping_list, update_recipe,
    },
    error::CoreError,
    schema::{IngredientAmount, MarkKind, RecipeUpdate},
};

#[tokio::test]
async fn sums_ingredients_across_the_cart() {
    let k = kitchen().await;
    let bread = k
        .recipe("Bread", &[(k.flour.id, 200)], &[k.breakfast.id])
        .await;
    let cake = k
        .recipe(
            "Cake",
            &[(k.flour.id, 300), (k.egg.id, 2)],
            &[k.dinner.id],
        )
        .await;
    let shake = k
        .recipe("Shake", &[(k.milk.id, 400)], &[k.breakfast.id])
        .await;

    add_mark(MarkKind::ShoppingCart, k.guest.id, bread.id, &k.pool)
        .await
        .unwrap();
    add_mark(MarkKind::ShoppingCart, k.guest.id, cake.id, &k.pool)
        .await
        .unwrap();
    // Favorites do not contribute.
    add_mark(MarkKind::Favorite, k.guest.id, shake.id, &k.pool)
        .await
        .unwrap();

    let file = download_shopping_list(k.guest.id, &k.pool).await.unwrap();
    assert_eq!(file.content, "Shopping list:\nEgg 2 pcs,\nFlour 500 g,\n");
    assert_eq!(file.filename, "Shopping list.txt");
    assert_eq!(file.mime_type, "text/plain");
}

#[tokio::test]
async fn empty_cart_yields_empty_list() {
    let k = kitchen().await;

    let list = shopping_list(k.guest.id, &k.pool).await.unwrap();
    assert!(list.entries.is_empty());
    assert_eq!(list.render().content, "Shopping list:\n");
}

#[tokio::test]
async fn same_name_in_different_units_stays_separate() {
    let k = kitchen().await;
    let milk_cups = create_ingredient("milk", "cup", &k.pool).await.unwrap();
    let latte = k
        .recipe("Latte", &[(k.milk.id, 200)], &[k.breakfast.id])
        .await;
    let cocoa = k
        .recipe("Cocoa", &[(milk_cups.id, 1)], &[k.dinner.id])
        .await;

    for recipe in [&latte, &cocoa] {
        add_mark(MarkKind::ShoppingCart, k.author.id, recipe.id, &k.pool)
            .await
            .unwrap();
    }

    let list = shopping_list(k.author.id, &k.pool).await.unwrap();
    let entries: Vec<(&str, i64)> = list
        .entries
        .iter()
        .map(|entry| (entry.measurement_unit.as_str(), entry.amount))
        .collect();
    assert_eq!(entries, vec![("ml", 200), ("cup", 1)]);
}

#[tokio::test]
async fn reflects_current_cart_and_recipe_contents() {
    let k = kitchen().await;
    let bread = k
        .recipe("Bread", &[(k.flour.id, 200)], &[k.breakfast.id])
        .await;
    let cake = k
        .recipe("Cake", &[(k.egg.id, 3)], &[k.dinner.id])
        .await;
    add_mark(MarkKind::ShoppingCart, k.guest.id, bread.id, &k.pool)
        .await
        .unwrap();
    add_mark(MarkKind::ShoppingCart, k.guest.id, cake.id, &k.pool)
        .await
        .unwrap();

    let update = RecipeUpdate {
        ingredients: Some(vec![IngredientAmount {
            ingredient_id: k.flour.id,
            amount: 450,
        }]),
        ..Default::default()
    };
    update_recipe(bread.id, k.author.id, update, &k.pool)
        .await
        .unwrap();
    let content = shopping_list(k.guest.id, &k.pool).await.unwrap().render().content;
    assert_eq!(content, "Shopping list:\nEgg 3 pcs,\nFlour 450 g,\n");

    remove_mark(MarkKind::ShoppingCart, k.guest.id, cake.id, &k.pool)
        .await
        .unwrap();
    let content = shopping_list(k.guest.id, &k.pool).await.unwrap().render().content;
    assert_eq!(content, "Shopping list:\nFlour 450 g,\n");

    delete_recipe(bread.id, k.author.id, &k.pool).await.unwrap();
    let list = shopping_list(k.guest.id, &k.pool).await.unwrap();
    assert!(list.entries.is_empty());
}

#[tokio::test]
async fn names_are_written_in_sentence_case() {
    let k = kitchen().await;
    let powder = create_ingredient("MILK powder", "g", &k.pool).await.unwrap();
    let cocoa = k
        .recipe("Cocoa", &[(powder.id, 5)], &[k.breakfast.id])
        .await;
    add_mark(MarkKind::ShoppingCart, k.guest.id, cocoa.id, &k.pool)
        .await
        .unwrap();

    let file = download_shopping_list(k.guest.id, &k.pool).await.unwrap();
    assert_eq!(file.content, "Shopping list:\nMilk powder 5 g,\n");
}

#[tokio::test]
async fn oversized_stored_totals_fail_cleanly() {
    let k = kitchen().await;
    let first = k
        .recipe("Bread", &[(k.flour.id, 200)], &[k.breakfast.id])
        .await;
    let second = k
        .recipe("Cake", &[(k.flour.id, 300)], &[k.dinner.id])
        .await;
    // Rows written before amounts were capped.
    sqlx::query("UPDATE recipe_ingredients SET amount = ? WHERE recipe_id = ?")
        .bind(i64::MAX)
        .bind(first.id)
        .execute(&k.pool)
        .await
        .unwrap();

    for recipe in [&first, &second] {
        add_mark(MarkKind::ShoppingCart, k.guest.id, recipe.id, &k.pool)
            .await
            .unwrap();
    }

    assert!(matches!(
        download_shopping_list(k.guest.id, &k.pool).await,
        Err(CoreError::Validation { field: "amount", .. })
    ));
}
