//! Product catalogue categories.

use serde::{Deserialize, Serialize};

use super::status::string_enum;

/// Category a product is listed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ProductCategory {
    #[default]
    Electronic,
    Fashion,
    Home,
    Health,
    Sport,
    Books,
}

string_enum!(ProductCategory {
    Electronic => "Electronic",
    Fashion => "Fashion",
    Home => "Home",
    Health => "Health",
    Sport => "Sport",
    Books => "Books",
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_six_categories() {
        let literals: Vec<&str> = ProductCategory::ALL.iter().map(|c| c.as_str()).collect();
        assert_eq!(
            literals,
            ["Electronic", "Fashion", "Home", "Health", "Sport", "Books"]
        );
    }

    #[test]
    fn test_unknown_category() {
        assert!("Toys".parse::<ProductCategory>().is_err());
    }
}
