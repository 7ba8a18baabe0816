use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::planner::validate::{
    validate_ingredients, validate_nutrition, validate_prep_time, validate_recipe_name,
    validate_steps,
};
use crate::planner::{Difficulty, Ingredient, Nutrition, Recipe, ScaledRecipe, ValidationError};

/// Recipe as returned by the API.
#[derive(Debug, Serialize)]
pub struct RecipeView {
    #[serde(flatten)]
    pub recipe: Recipe,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateRecipeRequest {
    pub name: String,
    pub ingredients: Vec<Ingredient>,
    pub nutrition: Nutrition,
    pub steps: Vec<String>,
    #[serde(default)]
    pub is_vegetarian: bool,
    pub prep_time: i32,
    pub difficulty: Difficulty,
}

/// Partial update; absent fields keep their stored value.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateRecipeRequest {
    pub name: Option<String>,
    pub ingredients: Option<Vec<Ingredient>>,
    pub nutrition: Option<Nutrition>,
    pub steps: Option<Vec<String>>,
    pub is_vegetarian: Option<bool>,
    pub prep_time: Option<i32>,
    pub difficulty: Option<Difficulty>,
}

/// A recipe body that passed validation and is ready to persist.
#[derive(Debug, Clone, PartialEq)]
pub struct RecipeDraft {
    pub name: String,
    pub ingredients: Vec<Ingredient>,
    pub nutrition: Nutrition,
    pub steps: Vec<String>,
    pub is_vegetarian: bool,
    pub prep_time: i32,
    pub difficulty: Difficulty,
}

impl CreateRecipeRequest {
    pub fn validate(self) -> Result<RecipeDraft, ValidationError> {
        let name = validate_recipe_name(&self.name)?;
        let ingredients = validate_ingredients(self.ingredients)?;
        validate_nutrition(&self.nutrition)?;
        let steps = validate_steps(self.steps)?;
        validate_prep_time(self.prep_time)?;
        Ok(RecipeDraft {
            name,
            ingredients,
            nutrition: self.nutrition,
            steps,
            is_vegetarian: self.is_vegetarian,
            prep_time: self.prep_time,
            difficulty: self.difficulty,
        })
    }
}

impl RecipeDraft {
    /// True when saving this draft would turn a vegetarian recipe into a
    /// non-vegetarian one.
    pub fn drops_vegetarian(&self, current: &Recipe) -> bool {
        current.is_vegetarian && !self.is_vegetarian
    }
}

impl UpdateRecipeRequest {
    /// Overlay the patch on `current` and validate the result as a whole.
    pub fn merge(self, current: &Recipe) -> Result<RecipeDraft, ValidationError> {
        CreateRecipeRequest {
            name: self.name.unwrap_or_else(|| current.name.clone()),
            ingredients: self
                .ingredients
                .unwrap_or_else(|| current.ingredients.clone()),
            nutrition: self.nutrition.unwrap_or(current.nutrition),
            steps: self.steps.unwrap_or_else(|| current.steps.clone()),
            is_vegetarian: self.is_vegetarian.unwrap_or(current.is_vegetarian),
            prep_time: self.prep_time.unwrap_or(current.prep_time),
            difficulty: self.difficulty.unwrap_or(current.difficulty),
        }
        .validate()
    }
}

#[derive(Debug, Deserialize)]
pub struct RecipeFilter {
    pub is_vegetarian: Option<bool>,
    pub difficulty: Option<String>,
    pub created_by: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Serialize)]
pub struct RecipeShoppingList {
    pub shopping_list: ScaledRecipe,
    pub for_people: u8,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::testing::recipe;
    use crate::planner::model::Unit;

    fn request() -> CreateRecipeRequest {
        serde_json::from_value(serde_json::json!({
            "name": " Lentil soup ",
            "ingredients": [{ "name": "lentils", "quantity": 80, "unit": "g" }],
            "nutrition": { "calories": 320, "protein": 18, "carbs": 50, "fat": 4 },
            "steps": ["Rinse", "Simmer 25 minutes"],
            "is_vegetarian": true,
            "prep_time": 30,
            "difficulty": "easy"
        }))
        .unwrap()
    }

    #[test]
    fn create_request_validates_and_trims() {
        let draft = request().validate().unwrap();
        assert_eq!(draft.name, "Lentil soup");
        assert_eq!(draft.ingredients[0].unit, Unit::Gram);
        assert_eq!(draft.steps.len(), 2);
    }

    #[test]
    fn create_request_requires_ingredients_and_steps() {
        let mut req = request();
        req.ingredients.clear();
        assert_eq!(req.validate().unwrap_err().field, "ingredients");

        let mut req = request();
        req.steps.clear();
        assert_eq!(req.validate().unwrap_err().field, "steps");

        let mut req = request();
        req.prep_time = 0;
        assert_eq!(req.validate().unwrap_err().field, "prep_time");
    }

    #[test]
    fn unknown_unit_is_rejected_by_serde() {
        let res = serde_json::from_value::<CreateRecipeRequest>(serde_json::json!({
            "name": "x",
            "ingredients": [{ "name": "a", "quantity": 1, "unit": "bushel" }],
            "nutrition": { "calories": 1, "protein": 1, "carbs": 1, "fat": 1 },
            "steps": ["a"],
            "prep_time": 1,
            "difficulty": "easy"
        }));
        assert!(res.is_err());
    }

    #[test]
    fn merge_keeps_unchanged_fields_and_revalidates() {
        let current = recipe("stew", false, &[("beef", 200.0, Unit::Gram)]);

        let patch = UpdateRecipeRequest {
            is_vegetarian: Some(true),
            ..Default::default()
        };
        let draft = patch.merge(&current).unwrap();
        assert_eq!(draft.name, "stew");
        assert!(draft.is_vegetarian);
        assert_eq!(draft.ingredients, current.ingredients);

        let patch = UpdateRecipeRequest {
            steps: Some(vec![]),
            ..Default::default()
        };
        assert_eq!(patch.merge(&current).unwrap_err().field, "steps");
    }

    #[test]
    fn only_losing_the_vegetarian_flag_counts_as_dropping_it() {
        let veg = recipe("soup", true, &[("leek", 1.0, Unit::Piece)]);
        let meat = recipe("stew", false, &[("beef", 200.0, Unit::Gram)]);

        let to_meat = UpdateRecipeRequest {
            is_vegetarian: Some(false),
            ..Default::default()
        };
        assert!(to_meat.merge(&veg).unwrap().drops_vegetarian(&veg));

        let rename = UpdateRecipeRequest {
            name: Some("leek soup".into()),
            ..Default::default()
        };
        assert!(!rename.merge(&veg).unwrap().drops_vegetarian(&veg));

        let to_veg = UpdateRecipeRequest {
            is_vegetarian: Some(true),
            ..Default::default()
        };
        assert!(!to_veg.merge(&meat).unwrap().drops_vegetarian(&meat));
    }
}
