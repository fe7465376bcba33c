//! Category expansion table loaded from YAML.
//!
//! The file maps a category to the sub-categories a lone winner drills down
//! into:
//!
//! ```yaml
//! 计算机类:
//!   - 计算机科学与技术
//!   - 软件工程
//!   - 人工智能
//! ```

use serde::Deserialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use thiserror::Error;

use crate::domain::foundation::ValidationError;
use crate::domain::session::{parse_categories, Category, MIN_ELIGIBLE_CATEGORIES};
use crate::ports::CategoryExpansions;

/// Errors raised while loading an expansion table.
#[derive(Debug, Error)]
pub enum ExpansionTableError {
    #[error("Failed to read expansion table: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse expansion table: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid category in expansion table: {0}")]
    InvalidCategory(#[from] ValidationError),

    #[error("'{category}' expands to {count} sub-categories, at least {min} required")]
    TooFewSubcategories {
        category: String,
        count: usize,
        min: usize,
    },

    #[error("'{0}' expands into itself")]
    SelfExpansion(String),

    #[error("Expansion cycle through '{0}'")]
    Cycle(String),
}

#[derive(Debug, Deserialize)]
#[serde(transparent)]
struct RawTable(BTreeMap<String, Vec<String>>);

/// Fixed category-to-subcategories lookup.
#[derive(Debug, Clone, Default)]
pub struct StaticCategoryExpansions {
    table: HashMap<Category, Vec<Category>>,
}

impl StaticCategoryExpansions {
    /// Builds a lookup from already-parsed entries.
    pub fn new(
        entries: impl IntoIterator<Item = (Category, Vec<Category>)>,
    ) -> Result<Self, ExpansionTableError> {
        let table: HashMap<Category, Vec<Category>> = entries.into_iter().collect();
        Self::validate(&table)?;
        Ok(Self { table })
    }

    /// Parses a YAML expansion table.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ExpansionTableError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let RawTable(raw) = serde_yaml::from_str(yaml)?;
        let mut entries = Vec::with_capacity(raw.len());
        for (name, subs) in raw {
            let category = Category::new(name)?;
            let field = format!("expansions.{}", category);
            let subs = parse_categories(&field, subs)?;
            entries.push((category, subs));
        }
        Self::new(entries)
    }

    /// Reads and parses a YAML expansion table from disk.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ExpansionTableError> {
        let yaml = std::fs::read_to_string(path.as_ref())?;
        let expansions = Self::from_yaml_str(&yaml)?;
        tracing::info!(
            path = %path.as_ref().display(),
            entries = expansions.len(),
            "Loaded category expansion table"
        );
        Ok(expansions)
    }

    /// Number of categories with an expansion.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    fn validate(table: &HashMap<Category, Vec<Category>>) -> Result<(), ExpansionTableError> {
        for (category, subs) in table {
            if subs.len() < MIN_ELIGIBLE_CATEGORIES {
                return Err(ExpansionTableError::TooFewSubcategories {
                    category: category.to_string(),
                    count: subs.len(),
                    min: MIN_ELIGIBLE_CATEGORIES,
                });
            }
            if subs.contains(category) {
                return Err(ExpansionTableError::SelfExpansion(category.to_string()));
            }
        }

        // A cycle would let a session drill down forever.
        let mut done: HashSet<&Category> = HashSet::new();
        for start in table.keys() {
            let mut path: Vec<&Category> = Vec::new();
            Self::visit(table, start, &mut path, &mut done)?;
        }
        Ok(())
    }

    fn visit<'a>(
        table: &'a HashMap<Category, Vec<Category>>,
        category: &'a Category,
        path: &mut Vec<&'a Category>,
        done: &mut HashSet<&'a Category>,
    ) -> Result<(), ExpansionTableError> {
        if done.contains(category) {
            return Ok(());
        }
        if path.contains(&category) {
            return Err(ExpansionTableError::Cycle(category.to_string()));
        }
        path.push(category);
        for sub in table.get(category).into_iter().flatten() {
            Self::visit(table, sub, path, done)?;
        }
        path.pop();
        done.insert(category);
        Ok(())
    }
}

impl CategoryExpansions for StaticCategoryExpansions {
    fn expansion_of(&self, category: &Category) -> Vec<Category> {
        self.table.get(category).cloned().unwrap_or_default()
    }
}
