use sqlx::{types::Json, FromRow};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::planner::{Ingredient, Nutrition, Recipe};
use crate::recipes::dto::RecipeView;

#[derive(Debug, FromRow)]
pub struct RecipeRow {
    pub id: Uuid,
    pub name: String,
    pub ingredients: Json<Vec<Ingredient>>,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub steps: Vec<String>,
    pub is_vegetarian: bool,
    pub prep_time: i32,
    pub difficulty: String,
    pub created_by: Uuid,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl TryFrom<RecipeRow> for RecipeView {
    type Error = anyhow::Error;

    fn try_from(r: RecipeRow) -> anyhow::Result<Self> {
        Ok(Self {
            recipe: Recipe {
                id: r.id,
                name: r.name,
                ingredients: r.ingredients.0,
                nutrition: Nutrition {
                    calories: r.calories,
                    protein: r.protein,
                    carbs: r.carbs,
                    fat: r.fat,
                },
                steps: r.steps,
                is_vegetarian: r.is_vegetarian,
                prep_time: r.prep_time,
                difficulty: r.difficulty.parse()?,
                created_by: r.created_by,
            },
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}
