use std::collections::HashMap;

use async_trait::async_trait;
use uuid::Uuid;

use super::error::PlanError;
use super::model::{Recipe, WeekDays};

/// Lookup capability over the recipe store.
///
/// Implementations return only active recipes. `find_by_ids` silently drops
/// ids it cannot find; callers detect the gap by comparing id sets.
#[async_trait]
pub trait RecipeResolver: Send + Sync {
    async fn find_by_ids(&self, ids: &[Uuid]) -> anyhow::Result<Vec<Recipe>>;
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Recipe>>;
}

/// Recipes resolved for one menu, keyed by id.
#[derive(Debug, Default, Clone)]
pub struct RecipeBook {
    recipes: HashMap<Uuid, Recipe>,
}

impl RecipeBook {
    pub fn get(&self, id: &Uuid) -> Result<&Recipe, PlanError> {
        self.recipes
            .get(id)
            .ok_or_else(|| PlanError::RecipeNotFound { ids: vec![*id] })
    }

    pub fn recipes(&self) -> impl Iterator<Item = &Recipe> {
        self.recipes.values()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.recipes.len()
    }
}

impl FromIterator<Recipe> for RecipeBook {
    fn from_iter<I: IntoIterator<Item = Recipe>>(iter: I) -> Self {
        Self {
            recipes: iter.into_iter().map(|r| (r.id, r)).collect(),
        }
    }
}

/// Resolve every recipe a menu references in one batched read.
///
/// Fails with `RecipeNotFound` listing every id the store did not return,
/// in order of first reference.
pub async fn resolve_menu<R>(days: &WeekDays, resolver: &R) -> Result<RecipeBook, PlanError>
where
    R: RecipeResolver + ?Sized,
{
    let wanted = days.distinct_ids();
    if wanted.is_empty() {
        return Ok(RecipeBook::default());
    }

    let found = resolver
        .find_by_ids(&wanted)
        .await
        .map_err(PlanError::Resolver)?;
    let book: RecipeBook = found.into_iter().collect();

    let missing: Vec<Uuid> = wanted
        .into_iter()
        .filter(|id| !book.recipes.contains_key(id))
        .collect();
    if !missing.is_empty() {
        tracing::warn!(missing = missing.len(), "menu references unknown recipes");
        return Err(PlanError::RecipeNotFound { ids: missing });
    }

    Ok(book)
}
