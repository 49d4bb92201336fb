use chrono::NaiveDate;
use sqlx::{QueryBuilder, Sqlite};

use crate::{
    constants::RECIPE_COLLECTION_MAX,
    error::CoreError,
    form::Form,
    schema::{Id, MarkKind, RecipeOrder},
};

/// Query predicates over recipes. Every present predicate must hold.
///
/// `is_favorited` and `is_in_shopping_cart` only restrict when they are
/// `Some(true)` and the caller is known; `false` never excludes recipes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipeFilter {
    /// Tag slugs; a recipe matches when it carries at least one of them.
    pub tags: Vec<String>,
    pub author: Option<Id>,
    pub created_since: Option<NaiveDate>,
    pub is_favorited: Option<bool>,
    pub is_in_shopping_cart: Option<bool>,
}

impl RecipeFilter {
    pub fn from_form(form: &Form) -> Result<Self, CoreError> {
        let tags = form.get_str_list("tags")?;
        if tags.len() > RECIPE_COLLECTION_MAX {
            return Err(CoreError::validation(
                "tags",
                format!("at most {RECIPE_COLLECTION_MAX} tags are allowed"),
            ));
        }

        Ok(Self {
            tags,
            author: form.get_id("author")?,
            created_since: form.get_date("created")?,
            is_favorited: form.get_bool("is_favorited")?,
            is_in_shopping_cart: form.get_bool("is_in_shopping_cart")?,
        })
    }

    fn mark_restrictions(&self, caller: Option<Id>) -> Vec<(MarkKind, Id)> {
        let Some(user_id) = caller else {
            return vec![];
        };

        [
            (MarkKind::Favorite, self.is_favorited),
            (MarkKind::ShoppingCart, self.is_in_shopping_cart),
        ]
        .into_iter()
        .filter(|(_, flag)| *flag == Some(true))
        .map(|(kind, _)| (kind, user_id))
        .collect()
    }

    /// Compiles the filter into one `SELECT` over `recipes r`.
    pub(crate) fn to_query(&self, order: RecipeOrder, caller: Option<Id>) -> QueryBuilder<'static, Sqlite> {
        let mut query_builder: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT r.id, r.author_id, r.name, r.image, r.text, r.cooking_time, r.created_at FROM recipes r WHERE 1 = 1",
        );

        if !self.tags.is_empty() {
            query_builder.push(
                " AND EXISTS (SELECT 1 FROM recipe_tags rt INNER JOIN tags t ON t.id = rt.tag_id WHERE rt.recipe_id = r.id AND t.slug IN (",
            );
            let mut separated = query_builder.separated(", ");
            for slug in self.tags.iter() {
                separated.push_bind(slug.to_owned());
            }
            separated.push_unseparated("))");
        }

        if let Some(author) = self.author {
            query_builder.push(" AND r.author_id = ").push_bind(author);
        }

        if let Some(created_since) = self.created_since {
            query_builder
                .push(" AND r.created_at >= ")
                .push_bind(created_since.format("%F").to_string());
        }

        for (kind, user_id) in self.mark_restrictions(caller) {
            query_builder
                .push(format!(
                    " AND EXISTS (SELECT 1 FROM {} m WHERE m.recipe_id = r.id AND m.user_id = ",
                    kind.table()
                ))
                .push_bind(user_id)
                .push(")");
        }

        query_builder.push(" ORDER BY ").push(order.sql());
        log::trace!("> Recipe query: {}", query_builder.sql());

        query_builder
    }
}

impl RecipeOrder {
    /// Reads `ordering`, falling back to newest first.
    pub fn from_form(form: &Form) -> Result<Self, CoreError> {
        Ok(form.get_value::<Self>("ordering")?.unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::FormData;
    use serde_json::json;

    fn form(value: serde_json::Value) -> Form {
        let data: FormData = serde_json::from_value(value).unwrap();
        Form::from_data(data)
    }

    #[test]
    fn parses_every_predicate() {
        let form = form(json!({
            "tags": ["breakfast", "lunch"],
            "author": "3",
            "created": "2024-01-01",
            "is_favorited": "1",
            "is_in_shopping_cart": false,
            "ordering": "oldest"
        }));

        assert_eq!(
            RecipeFilter::from_form(&form).unwrap(),
            RecipeFilter {
                tags: vec!["breakfast".into(), "lunch".into()],
                author: Some(3),
                created_since: NaiveDate::from_ymd_opt(2024, 1, 1),
                is_favorited: Some(true),
                is_in_shopping_cart: Some(false),
            }
        );
        assert_eq!(RecipeOrder::from_form(&form).unwrap(), RecipeOrder::Oldest);
    }

    #[test]
    fn empty_form_is_unrestricted_newest_first() {
        let form = Form::default();
        assert_eq!(RecipeFilter::from_form(&form).unwrap(), RecipeFilter::default());
        assert_eq!(RecipeOrder::from_form(&form).unwrap(), RecipeOrder::Newest);
    }

    #[test]
    fn malformed_values_name_the_field() {
        for (key, value) in [
            ("author", json!("me")),
            ("created", json!("yesterday")),
            ("is_favorited", json!("maybe")),
            ("ordering", json!("random")),
        ] {
            let form = Form::from_data(FormData::from([(key.to_string(), value)]));
            let result = RecipeFilter::from_form(&form)
                .and_then(|_| RecipeOrder::from_form(&form).map(|_| ()));
            match result {
                Err(CoreError::Validation { field, .. }) => assert_eq!(field, key),
                other => panic!("expected validation error for {key}, got {other:?}"),
            }
        }
    }

    #[test]
    fn oversized_tag_lists_are_rejected() {
        let tags: Vec<String> = (0..=RECIPE_COLLECTION_MAX).map(|i| format!("tag{i}")).collect();
        let form = Form::from_pairs(tags.iter().map(|tag| ("tags", tag.as_str())));

        assert!(matches!(
            RecipeFilter::from_form(&form),
            Err(CoreError::Validation { field: "tags", .. })
        ));
    }

    #[test]
    fn mark_predicates_only_restrict_known_callers_when_true() {
        let filter = RecipeFilter {
            is_favorited: Some(true),
            is_in_shopping_cart: Some(false),
            ..Default::default()
        };

        assert_eq!(
            filter.mark_restrictions(Some(5)),
            vec![(MarkKind::Favorite, 5)]
        );
        assert!(filter.mark_restrictions(None).is_empty());
    }

    #[test]
    fn compiles_to_a_single_statement() {
        let filter = RecipeFilter {
            tags: vec!["breakfast".into(), "dinner".into()],
            author: Some(1),
            is_in_shopping_cart: Some(true),
            ..Default::default()
        };
        let query = filter.to_query(RecipeOrder::Alphabetical, Some(2));
        let sql = query.sql();

        assert!(sql.contains("t.slug IN (?, ?))"));
        assert!(sql.contains("r.author_id = ?"));
        assert!(sql.contains("FROM shopping_cart m"));
        assert!(!sql.contains("FROM favorites m"));
        assert!(sql.ends_with("ORDER BY LOWER(r.name), r.id DESC"));
    }
}
