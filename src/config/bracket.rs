//! Bracket configuration

use serde::Deserialize;
use std::path::PathBuf;

use super::error::ValidationError;
use crate::domain::session::{parse_categories, Category, MIN_ELIGIBLE_CATEGORIES};

/// Categories compared in round 1 unless configured otherwise.
pub const DEFAULT_CATEGORIES: [&str; 8] = [
    "计算机类",
    "心理学类",
    "教育学类",
    "历史学类",
    "医学",
    "文学",
    "数学类",
    "物理学类",
];

/// Bracket configuration
#[derive(Debug, Clone, Deserialize)]
pub struct BracketConfig {
    /// Round 1 categories (comma-separated)
    #[serde(default = "default_categories")]
    pub default_categories: String,

    /// YAML file mapping a category to its sub-categories
    pub expansions_path: Option<PathBuf>,
}

impl BracketConfig {
    /// Parsed round 1 categories
    pub fn categories(&self) -> Result<Vec<Category>, ValidationError> {
        let names = self
            .default_categories
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty());
        let categories = parse_categories("default_categories", names)
            .map_err(|e| ValidationError::InvalidCategories(e.to_string()))?;
        if categories.len() < MIN_ELIGIBLE_CATEGORIES {
            return Err(ValidationError::InvalidCategories(format!(
                "at least {} required, got {}",
                MIN_ELIGIBLE_CATEGORIES,
                categories.len()
            )));
        }
        Ok(categories)
    }

    /// Validate bracket configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.categories().map(|_| ())
    }
}

impl Default for BracketConfig {
    fn default() -> Self {
        Self {
            default_categories: default_categories(),
            expansions_path: None,
        }
    }
}

fn default_categories() -> String {
    DEFAULT_CATEGORIES.join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_the_eight_categories() {
        let categories = BracketConfig::default().categories().unwrap();
        assert_eq!(categories.len(), 8);
        assert_eq!(categories[0].as_str(), "计算机类");
        assert_eq!(categories[7].as_str(), "物理学类");
    }

    #[test]
    fn test_custom_list_is_trimmed() {
        let config = BracketConfig {
            default_categories: " 医学 , 文学 ,".to_string(),
            ..Default::default()
        };
        let names: Vec<String> = config
            .categories()
            .unwrap()
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(names, vec!["医学", "文学"]);
    }

    #[test]
    fn test_single_category_is_rejected() {
        let config = BracketConfig {
            default_categories: "医学".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_duplicates_are_rejected() {
        let config = BracketConfig {
            default_categories: "医学,文学,医学".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidCategories(_))
        ));
    }
}
