use super::error::{PlanError, ValidationError};
use super::model::{Ingredient, MenuType, Nutrition, Recipe, WeekDays, Weekday};

pub const MAX_RECIPE_NAME_LENGTH: usize = 100;
pub const MIN_PREP_TIME: i32 = 1;

/// Every weekday must carry at least one recipe. All empty days are reported
/// in a single error, in weekday order.
pub fn validate_completeness(days: &WeekDays) -> Result<(), ValidationError> {
    let missing: Vec<&str> = Weekday::ALL
        .iter()
        .filter(|d| days.day(**d).is_empty())
        .map(Weekday::as_str)
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::new(
            "days",
            format!(
                "every day needs at least one recipe; missing: {}",
                missing.join(", ")
            ),
        ))
    }
}

/// A vegetarian menu may only reference vegetarian recipes.
pub fn validate_menu_compatibility<'a, I>(menu_type: MenuType, recipes: I) -> Result<(), PlanError>
where
    I: IntoIterator<Item = &'a Recipe>,
{
    if menu_type != MenuType::Vegetarian {
        return Ok(());
    }
    if recipes.into_iter().any(|r| !r.is_vegetarian) {
        return Err(PlanError::VegetarianConflict);
    }
    Ok(())
}

pub fn validate_recipe_name(name: &str) -> Result<String, ValidationError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationError::new("name", "recipe name is required"));
    }
    if name.chars().count() > MAX_RECIPE_NAME_LENGTH {
        return Err(ValidationError::new(
            "name",
            format!("recipe name cannot exceed {MAX_RECIPE_NAME_LENGTH} characters"),
        ));
    }
    Ok(name.to_string())
}

pub fn validate_ingredients(ingredients: Vec<Ingredient>) -> Result<Vec<Ingredient>, ValidationError> {
    if ingredients.is_empty() {
        return Err(ValidationError::new(
            "ingredients",
            "a recipe needs at least one ingredient",
        ));
    }
    ingredients
        .into_iter()
        .enumerate()
        .map(|(i, mut ing)| {
            ing.name = ing.name.trim().to_string();
            if ing.name.is_empty() {
                return Err(ValidationError::new(
                    format!("ingredients[{i}].name"),
                    "ingredient name is required",
                ));
            }
            if !ing.quantity.is_finite() || ing.quantity < 0.0 {
                return Err(ValidationError::new(
                    format!("ingredients[{i}].quantity"),
                    "quantity must be a non-negative number",
                ));
            }
            Ok(ing)
        })
        .collect()
}

pub fn validate_nutrition(n: &Nutrition) -> Result<(), ValidationError> {
    let fields = [
        ("nutrition.calories", n.calories),
        ("nutrition.protein", n.protein),
        ("nutrition.carbs", n.carbs),
        ("nutrition.fat", n.fat),
    ];
    for (field, value) in fields {
        if !value.is_finite() || value < 0.0 {
            return Err(ValidationError::new(field, "must be a non-negative number"));
        }
    }
    Ok(())
}

pub fn validate_steps(steps: Vec<String>) -> Result<Vec<String>, ValidationError> {
    if steps.is_empty() {
        return Err(ValidationError::new(
            "steps",
            "a recipe needs at least one preparation step",
        ));
    }
    steps
        .into_iter()
        .enumerate()
        .map(|(i, s)| {
            let s = s.trim().to_string();
            if s.is_empty() {
                Err(ValidationError::new(
                    format!("steps[{i}]"),
                    "each step must contain instructions",
                ))
            } else {
                Ok(s)
            }
        })
        .collect()
}

pub fn validate_prep_time(minutes: i32) -> Result<(), ValidationError> {
    if minutes < MIN_PREP_TIME {
        return Err(ValidationError::new(
            "prep_time",
            format!("preparation time must be at least {MIN_PREP_TIME} minute"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::model::Unit;
    use crate::planner::testing::recipe;
    use uuid::Uuid;

    fn full_week() -> WeekDays {
        let id = Uuid::new_v4();
        WeekDays {
            monday: vec![id],
            tuesday: vec![id],
            wednesday: vec![id],
            thursday: vec![id],
            friday: vec![id],
            saturday: vec![id],
            sunday: vec![id],
        }
    }

    #[test]
    fn complete_week_passes() {
        assert!(validate_completeness(&full_week()).is_ok());
    }

    #[test]
    fn completeness_lists_every_missing_day() {
        let mut days = full_week();
        days.tuesday.clear();
        days.sunday.clear();
        let err = validate_completeness(&days).unwrap_err();
        assert_eq!(err.field, "days");
        assert!(err.message.ends_with("missing: tuesday, sunday"), "{}", err.message);
    }

    #[test]
    fn vegetarian_menu_rejects_meat() {
        let veg = recipe("salad", true, &[("lettuce", 1.0, Unit::Piece)]);
        let meat = recipe("steak", false, &[("beef", 200.0, Unit::Gram)]);
        let err = validate_menu_compatibility(MenuType::Vegetarian, [&veg, &meat]).unwrap_err();
        assert!(matches!(err, PlanError::VegetarianConflict));
        assert!(validate_menu_compatibility(MenuType::Vegetarian, [&veg]).is_ok());
    }

    #[test]
    fn omnivore_menu_accepts_anything() {
        let meat = recipe("steak", false, &[("beef", 200.0, Unit::Gram)]);
        assert!(validate_menu_compatibility(MenuType::Omnivore, [&meat]).is_ok());
    }

    #[test]
    fn ingredient_rules() {
        assert!(validate_ingredients(vec![]).is_err());

        let err = validate_ingredients(vec![Ingredient {
            name: "  ".into(),
            quantity: 1.0,
            unit: Unit::Gram,
        }])
        .unwrap_err();
        assert_eq!(err.field, "ingredients[0].name");

        let err = validate_ingredients(vec![Ingredient {
            name: "salt".into(),
            quantity: -1.0,
            unit: Unit::Pinch,
        }])
        .unwrap_err();
        assert_eq!(err.field, "ingredients[0].quantity");

        let ok = validate_ingredients(vec![Ingredient {
            name: " salt ".into(),
            quantity: 0.0,
            unit: Unit::Pinch,
        }])
        .unwrap();
        assert_eq!(ok[0].name, "salt");
    }

    #[test]
    fn name_steps_prep_time_rules() {
        assert!(validate_recipe_name("   ").is_err());
        assert!(validate_recipe_name(&"x".repeat(101)).is_err());
        assert_eq!(validate_recipe_name(" Soup ").unwrap(), "Soup");

        assert!(validate_steps(vec![]).is_err());
        assert_eq!(validate_steps(vec!["".into()]).unwrap_err().field, "steps[0]");

        assert!(validate_prep_time(0).is_err());
        assert!(validate_prep_time(1).is_ok());
    }

    #[test]
    fn nutrition_rejects_negative_or_nan() {
        let mut n = Nutrition::default();
        assert!(validate_nutrition(&n).is_ok());
        n.fat = -0.5;
        assert_eq!(validate_nutrition(&n).unwrap_err().field, "nutrition.fat");
        n.fat = f64::NAN;
        assert!(validate_nutrition(&n).is_err());
    }
}
