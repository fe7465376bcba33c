//! Category expansion lookup port.

use crate::domain::session::Category;

/// Maps a category to the finer-grained categories a lone winner drills
/// down into.
///
/// An empty list means the category is a leaf and the bracket ends on it.
pub trait CategoryExpansions: Send + Sync {
    fn expansion_of(&self, category: &Category) -> Vec<Category>;
}

/// Lookup with no expansions at all; every category is a leaf.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoExpansions;

impl CategoryExpansions for NoExpansions {
    fn expansion_of(&self, _category: &Category) -> Vec<Category> {
        Vec::new()
    }
}
