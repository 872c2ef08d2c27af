//! The fixed SQL templates. Caller-supplied values are only ever bound to the
//! `?` placeholders, never formatted into the text.

pub const LIST_CUSTOMIZATIONS: &str = "SELECT * FROM OrderCustomizations";

/// Only ingredient-bearing categories below the root, shallow to deep.
pub const LIST_CUSTOMIZABLE_CATEGORIES: &str =
    "SELECT * FROM categories WHERE isIngredient = ? AND level > 0 ORDER BY level ASC";

/// The value of `categories.isIngredient` that marks an ingredient-bearing category.
pub const INGREDIENT_FLAG: &str = "yes";

pub const LIST_INGREDIENTS_BY_CATEGORY: &str = "SELECT * FROM ingredients WHERE CategoryID = ?";

pub const INSERT_CUSTOMIZATION: &str =
    "INSERT INTO OrderCustomizations (OrderID, IngredientID) VALUES (?, ?)";

pub const UPDATE_CUSTOMIZATION: &str =
    "UPDATE OrderCustomizations SET OrderID = ?, IngredientID = ? WHERE OrderCustomizationID = ?";

pub const DELETE_CUSTOMIZATION: &str =
    "DELETE FROM OrderCustomizations WHERE OrderCustomizationID = ?";

pub const PING: &str = "SELECT 1";

#[cfg(test)]
mod tests {
    use super::*;

    fn placeholders(sql: &str) -> usize {
        sql.matches('?').count()
    }

    #[test]
    fn placeholder_counts_match_bound_parameters() {
        assert_eq!(placeholders(LIST_CUSTOMIZATIONS), 0);
        assert_eq!(placeholders(LIST_CUSTOMIZABLE_CATEGORIES), 1);
        assert_eq!(placeholders(LIST_INGREDIENTS_BY_CATEGORY), 1);
        assert_eq!(placeholders(INSERT_CUSTOMIZATION), 2);
        assert_eq!(placeholders(UPDATE_CUSTOMIZATION), 3);
        assert_eq!(placeholders(DELETE_CUSTOMIZATION), 1);
        assert_eq!(placeholders(PING), 0);
    }

    #[test]
    fn category_listing_is_ordered_by_level() {
        assert!(LIST_CUSTOMIZABLE_CATEGORIES.ends_with("ORDER BY level ASC"));
        assert!(LIST_CUSTOMIZABLE_CATEGORIES.contains("level > 0"));
    }
}
