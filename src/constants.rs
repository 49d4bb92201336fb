pub const RECIPE_NAME_MAX_LENGTH: usize = 200;
pub const INGREDIENT_NAME_MAX_LENGTH: usize = 200;
pub const MEASUREMENT_UNIT_MAX_LENGTH: usize = 200;
pub const TAG_NAME_MAX_LENGTH: usize = 200;
pub const TAG_COLOR_LENGTH: usize = 7;
pub const TAG_SLUG_MAX_LENGTH: usize = 50;

/// Upper bound of a small positive integer column.
pub const COOKING_TIME_MAX: i64 = 32767;
/// Amounts are 32-bit in the catalog, so cart totals always fit in an i64.
pub const INGREDIENT_AMOUNT_MAX: i64 = i32::MAX as i64;

/// SQLite's default `SQLITE_MAX_VARIABLE_NUMBER`.
pub const SQLITE_BIND_LIMIT: usize = 32766;
/// Longest ingredient or tag list a recipe payload or filter may carry. Line
/// inserts bind three values per row.
pub const RECIPE_COLLECTION_MAX: usize = SQLITE_BIND_LIMIT / 3;

pub const SHOPPING_LIST_FILENAME: &str = "Shopping list.txt";
pub const SHOPPING_LIST_MIME_TYPE: &str = "text/plain";
pub const SHOPPING_LIST_HEADER: &str = "Shopping list:\n";
pub const SHOPPING_LIST_SEPARATOR: &str = ",\n";

pub const SESSION_COOKIE: &str = "session";
