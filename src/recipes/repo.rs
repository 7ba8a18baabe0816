use anyhow::Context;
use async_trait::async_trait;
use sqlx::{types::Json, PgPool};
use uuid::Uuid;

use crate::planner::{Difficulty, Recipe, RecipeResolver};
use crate::recipes::dto::{RecipeDraft, RecipeView};
use crate::recipes::repo_types::RecipeRow;

const RECIPE_COLUMNS: &str = "id, name, ingredients, calories, protein, carbs, fat, steps, \
                              is_vegetarian, prep_time, difficulty, created_by, created_at, updated_at";

fn into_views(rows: Vec<RecipeRow>) -> anyhow::Result<Vec<RecipeView>> {
    rows.into_iter().map(RecipeView::try_from).collect()
}

/// Escape `%`, `_` and `\` so user input matches literally inside ILIKE.
pub(crate) fn like_pattern(q: &str) -> String {
    let mut out = String::with_capacity(q.len() + 2);
    out.push('%');
    for c in q.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('%');
    out
}

pub async fn insert(db: &PgPool, draft: &RecipeDraft, owner: Uuid) -> anyhow::Result<RecipeView> {
    let row = sqlx::query_as::<_, RecipeRow>(&format!(
        r#"
        INSERT INTO recipes (name, ingredients, calories, protein, carbs, fat, steps,
                             is_vegetarian, prep_time, difficulty, created_by)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        RETURNING {RECIPE_COLUMNS}
        "#
    ))
    .bind(&draft.name)
    .bind(Json(&draft.ingredients))
    .bind(draft.nutrition.calories)
    .bind(draft.nutrition.protein)
    .bind(draft.nutrition.carbs)
    .bind(draft.nutrition.fat)
    .bind(&draft.steps)
    .bind(draft.is_vegetarian)
    .bind(draft.prep_time)
    .bind(draft.difficulty.as_str())
    .bind(owner)
    .fetch_one(db)
    .await
    .context("insert recipe")?;
    RecipeView::try_from(row)
}

/// Active recipe by id.
pub async fn find(db: &PgPool, id: Uuid) -> anyhow::Result<Option<RecipeView>> {
    let row = sqlx::query_as::<_, RecipeRow>(&format!(
        "SELECT {RECIPE_COLUMNS} FROM recipes WHERE id = $1 AND active"
    ))
    .bind(id)
    .fetch_optional(db)
    .await
    .context("find recipe")?;
    row.map(RecipeView::try_from).transpose()
}

pub async fn list(
    db: &PgPool,
    is_vegetarian: Option<bool>,
    difficulty: Option<Difficulty>,
    created_by: Option<Uuid>,
) -> anyhow::Result<Vec<RecipeView>> {
    let rows = sqlx::query_as::<_, RecipeRow>(&format!(
        r#"
        SELECT {RECIPE_COLUMNS}
          FROM recipes
         WHERE active
           AND ($1::BOOLEAN IS NULL OR is_vegetarian = $1)
           AND ($2::TEXT IS NULL OR difficulty = $2)
           AND ($3::UUID IS NULL OR created_by = $3)
         ORDER BY created_at DESC
        "#
    ))
    .bind(is_vegetarian)
    .bind(difficulty.map(|d| d.as_str()))
    .bind(created_by)
    .fetch_all(db)
    .await
    .context("list recipes")?;
    into_views(rows)
}

/// Case-insensitive match on recipe name or any ingredient name.
pub async fn search(db: &PgPool, q: &str) -> anyhow::Result<Vec<RecipeView>> {
    let rows = sqlx::query_as::<_, RecipeRow>(&format!(
        r#"
        SELECT {RECIPE_COLUMNS}
          FROM recipes
         WHERE active
           AND (name ILIKE $1
                OR EXISTS (SELECT 1
                             FROM jsonb_array_elements(ingredients) AS ing
                            WHERE ing->>'name' ILIKE $1))
         ORDER BY name
        "#
    ))
    .bind(like_pattern(q))
    .fetch_all(db)
    .await
    .context("search recipes")?;
    into_views(rows)
}

pub async fn update(db: &PgPool, id: Uuid, draft: &RecipeDraft) -> anyhow::Result<Option<RecipeView>> {
    let row = sqlx::query_as::<_, RecipeRow>(&format!(
        r#"
        UPDATE recipes
           SET name = $2, ingredients = $3, calories = $4, protein = $5, carbs = $6, fat = $7,
               steps = $8, is_vegetarian = $9, prep_time = $10, difficulty = $11,
               updated_at = now()
         WHERE id = $1 AND active
        RETURNING {RECIPE_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(&draft.name)
    .bind(Json(&draft.ingredients))
    .bind(draft.nutrition.calories)
    .bind(draft.nutrition.protein)
    .bind(draft.nutrition.carbs)
    .bind(draft.nutrition.fat)
    .bind(&draft.steps)
    .bind(draft.is_vegetarian)
    .bind(draft.prep_time)
    .bind(draft.difficulty.as_str())
    .fetch_optional(db)
    .await
    .context("update recipe")?;
    row.map(RecipeView::try_from).transpose()
}

/// Flip `active` off. Returns false when nothing was active under that id.
pub async fn soft_delete(db: &PgPool, id: Uuid) -> anyhow::Result<bool> {
    let res = sqlx::query("UPDATE recipes SET active = FALSE, updated_at = now() WHERE id = $1 AND active")
        .bind(id)
        .execute(db)
        .await
        .context("soft delete recipe")?;
    Ok(res.rows_affected() > 0)
}

/// Postgres-backed [`RecipeResolver`].
#[derive(Clone)]
pub struct PgRecipeStore {
    db: PgPool,
}

impl PgRecipeStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl RecipeResolver for PgRecipeStore {
    async fn find_by_ids(&self, ids: &[Uuid]) -> anyhow::Result<Vec<Recipe>> {
        let rows = sqlx::query_as::<_, RecipeRow>(&format!(
            "SELECT {RECIPE_COLUMNS} FROM recipes WHERE id = ANY($1) AND active"
        ))
        .bind(ids)
        .fetch_all(&self.db)
        .await
        .context("find recipes by ids")?;
        Ok(into_views(rows)?.into_iter().map(|v| v.recipe).collect())
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Recipe>> {
        Ok(find(&self.db, id).await?.map(|v| v.recipe))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("rice"), "%rice%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(like_pattern("a\\b"), "%a\\\\b%");
    }
}
