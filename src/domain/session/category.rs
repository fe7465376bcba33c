//! Category value object - one candidate major in the bracket.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::ValidationError;

/// Name of a candidate category (e.g. "计算机类").
///
/// Compared by exact name. Leading and trailing whitespace is trimmed on
/// construction so the same category typed twice never appears as two.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Category(String);

impl Category {
    /// Creates a category, rejecting blank names.
    pub fn new(name: impl Into<String>) -> Result<Self, ValidationError> {
        let name = name.into();
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::empty_field("category"));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Returns the category name.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Description attached to a bye appearance for this category.
    pub fn bye_description(&self) -> String {
        format!("{}轮空晋级", self.0)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for Category {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Category::new(value)
    }
}

impl From<Category> for String {
    fn from(category: Category) -> Self {
        category.0
    }
}

/// Parses a list of names into categories, rejecting duplicates.
pub fn parse_categories<I, S>(field: &str, names: I) -> Result<Vec<Category>, ValidationError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut categories: Vec<Category> = Vec::new();
    for name in names {
        let category = Category::new(name)?;
        if categories.contains(&category) {
            return Err(ValidationError::invalid_format(
                field,
                format!("duplicate category '{}'", category),
            ));
        }
        categories.push(category);
    }
    Ok(categories)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_trims_whitespace() {
        let category = Category::new("  数学类 ").unwrap();
        assert_eq!(category.as_str(), "数学类");
    }

    #[test]
    fn category_rejects_blank_name() {
        assert!(Category::new("   ").is_err());
    }

    #[test]
    fn bye_description_names_the_category() {
        let category = Category::new("医学").unwrap();
        assert_eq!(category.bye_description(), "医学轮空晋级");
    }

    #[test]
    fn category_deserialization_validates() {
        let ok: Category = serde_json::from_str("\"文学\"").unwrap();
        assert_eq!(ok.as_str(), "文学");
        assert!(serde_json::from_str::<Category>("\"\"").is_err());
    }

    #[test]
    fn parse_categories_rejects_duplicates() {
        let result = parse_categories("categories", ["文学", "数学类", "文学"]);
        assert!(matches!(result, Err(ValidationError::InvalidFormat { .. })));
    }

    #[test]
    fn parse_categories_keeps_order() {
        let parsed = parse_categories("categories", ["b", "a", "c"]).unwrap();
        let names: Vec<&str> = parsed.iter().map(Category::as_str).collect();
        assert_eq!(names, vec!["b", "a", "c"]);
    }
}
