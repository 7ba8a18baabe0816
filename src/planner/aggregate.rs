use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use uuid::Uuid;

use super::error::PlanError;
use super::model::{Headcount, Ingredient, Nutrition, Recipe, Unit, WeekDays, Weekday};
use super::resolver::{resolve_menu, RecipeBook, RecipeResolver};

/// Nutrition totals per weekday, always holding all seven days.
pub type DailyNutrition = BTreeMap<Weekday, Nutrition>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShoppingItem {
    pub name: String,
    pub quantity: f64,
    pub unit: Unit,
}

/// One recipe sized for a headcount.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScaledRecipe {
    pub ingredients: Vec<Ingredient>,
    pub nutrition: Nutrition,
}

/// Sum per-portion nutrition for each day. Every slot counts once, so a
/// recipe listed twice on a day contributes twice.
pub fn daily_nutrition(days: &WeekDays, book: &RecipeBook) -> Result<DailyNutrition, PlanError> {
    let mut out = DailyNutrition::new();
    for day in Weekday::ALL {
        let mut total = Nutrition::default();
        for id in days.day(day) {
            total += &book.get(id)?.nutrition;
        }
        out.insert(day, total);
    }
    Ok(out)
}

/// Build the week's shopping list for `people`.
///
/// Entries are keyed by (name, unit) and appear in the order their key was
/// first seen, walking monday to sunday.
pub fn shopping_list(
    days: &WeekDays,
    people: Headcount,
    book: &RecipeBook,
) -> Result<Vec<ShoppingItem>, PlanError> {
    let factor = people.factor();
    let mut items: Vec<ShoppingItem> = Vec::new();
    let mut index: HashMap<(String, Unit), usize> = HashMap::new();

    for id in days.slots() {
        let recipe = book.get(&id)?;
        for ing in &recipe.ingredients {
            let amount = ing.quantity * factor;
            match index.get(&(ing.name.clone(), ing.unit)) {
                Some(&at) => items[at].quantity += amount,
                None => {
                    index.insert((ing.name.clone(), ing.unit), items.len());
                    items.push(ShoppingItem {
                        name: ing.name.clone(),
                        quantity: amount,
                        unit: ing.unit,
                    });
                }
            }
        }
    }
    Ok(items)
}

pub fn scale_recipe(recipe: &Recipe, people: Headcount) -> ScaledRecipe {
    let factor = people.factor();
    ScaledRecipe {
        ingredients: recipe
            .ingredients
            .iter()
            .map(|ing| Ingredient {
                quantity: ing.quantity * factor,
                ..ing.clone()
            })
            .collect(),
        nutrition: recipe.nutrition.scaled(factor),
    }
}

/// Resolves a menu's recipes through a [`RecipeResolver`] and runs the pure
/// aggregations over them.
pub struct MenuAggregator<'a, R: ?Sized> {
    resolver: &'a R,
}

impl<'a, R> MenuAggregator<'a, R>
where
    R: RecipeResolver + ?Sized,
{
    pub fn new(resolver: &'a R) -> Self {
        Self { resolver }
    }

    /// Headcount is checked before any recipe is fetched.
    pub async fn generate_shopping_list(
        &self,
        days: &WeekDays,
        number_of_people: i64,
    ) -> Result<Vec<ShoppingItem>, PlanError> {
        let people = Headcount::try_from(number_of_people)?;
        let book = resolve_menu(days, self.resolver).await?;
        shopping_list(days, people, &book)
    }

    pub async fn scale_recipe(
        &self,
        recipe_id: Uuid,
        number_of_people: i64,
    ) -> Result<ScaledRecipe, PlanError> {
        let people = Headcount::try_from(number_of_people)?;
        let recipe = self
            .resolver
            .find_by_id(recipe_id)
            .await
            .map_err(PlanError::Resolver)?
            .ok_or(PlanError::RecipeNotFound { ids: vec![recipe_id] })?;
        Ok(scale_recipe(&recipe, people))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::resolver::memory::MemoryRecipes;
    use crate::planner::testing::{recipe, with_nutrition};

    fn headcount(n: i64) -> Headcount {
        Headcount::try_from(n).unwrap()
    }

    #[test]
    fn rice_example_merges_and_scales() {
        let a = recipe("pilaf", true, &[("rice", 100.0, Unit::Gram)]);
        let b = recipe("risotto", true, &[("rice", 50.0, Unit::Gram)]);
        let days = WeekDays {
            monday: vec![a.id, b.id],
            ..Default::default()
        };
        let book: RecipeBook = [a, b].into_iter().collect();

        let list = shopping_list(&days, headcount(2), &book).unwrap();
        assert_eq!(
            list,
            vec![ShoppingItem {
                name: "rice".into(),
                quantity: 300.0,
                unit: Unit::Gram,
            }]
        );
    }

    #[test]
    fn same_name_different_unit_stays_separate() {
        let a = recipe("a", true, &[("milk", 200.0, Unit::Millilitre)]);
        let b = recipe("b", true, &[("milk", 1.0, Unit::Cup)]);
        let days = WeekDays {
            monday: vec![a.id],
            thursday: vec![b.id, a.id],
            ..Default::default()
        };
        let book: RecipeBook = [a, b].into_iter().collect();

        let list = shopping_list(&days, headcount(1), &book).unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!((list[0].unit, list[0].quantity), (Unit::Millilitre, 400.0));
        assert_eq!((list[1].unit, list[1].quantity), (Unit::Cup, 1.0));
    }

    #[test]
    fn order_follows_first_occurrence_not_alphabet() {
        let a = recipe("a", true, &[("zucchini", 1.0, Unit::Piece), ("basil", 2.0, Unit::Gram)]);
        let b = recipe("b", true, &[("apple", 1.0, Unit::Piece), ("zucchini", 1.0, Unit::Piece)]);
        let days = WeekDays {
            sunday: vec![b.id],
            monday: vec![a.id],
            ..Default::default()
        };
        let book: RecipeBook = [a, b].into_iter().collect();

        let names: Vec<_> = shopping_list(&days, headcount(1), &book)
            .unwrap()
            .into_iter()
            .map(|i| i.name)
            .collect();
        assert_eq!(names, vec!["zucchini", "basil", "apple"]);
    }

    #[test]
    fn quantities_scale_linearly_and_output_is_stable() {
        let a = recipe("a", false, &[("beef", 150.0, Unit::Gram), ("onion", 0.5, Unit::Piece)]);
        let b = recipe("b", true, &[("onion", 1.0, Unit::Piece)]);
        let days = WeekDays {
            tuesday: vec![a.id, b.id],
            saturday: vec![a.id],
            ..Default::default()
        };
        let book: RecipeBook = [a, b].into_iter().collect();

        let base = shopping_list(&days, headcount(2), &book).unwrap();
        for h2 in [3_i64, 10, 20] {
            let scaled = shopping_list(&days, headcount(h2), &book).unwrap();
            assert_eq!(base.len(), scaled.len());
            for (lo, hi) in base.iter().zip(&scaled) {
                assert_eq!((&lo.name, lo.unit), (&hi.name, hi.unit));
                assert_eq!(hi.quantity, lo.quantity * (h2 as f64 / 2.0));
            }
        }

        let again = shopping_list(&days, headcount(2), &book).unwrap();
        assert_eq!(base, again);
    }

    #[test]
    fn daily_nutrition_counts_each_slot_and_covers_all_days() {
        let a = with_nutrition(recipe("a", true, &[("oats", 50.0, Unit::Gram)]), 300.0, 10.0, 50.0, 5.0);
        let b = with_nutrition(recipe("b", true, &[("egg", 1.0, Unit::Piece)]), 80.0, 6.0, 1.0, 5.0);
        let days = WeekDays {
            monday: vec![a.id, a.id, b.id],
            wednesday: vec![b.id],
            ..Default::default()
        };
        let book: RecipeBook = [a, b].into_iter().collect();

        let totals = daily_nutrition(&days, &book).unwrap();
        assert_eq!(totals.len(), 7);
        assert_eq!(
            totals[&Weekday::Monday],
            Nutrition { calories: 680.0, protein: 26.0, carbs: 101.0, fat: 15.0 }
        );
        assert_eq!(totals[&Weekday::Wednesday].calories, 80.0);
        assert_eq!(totals[&Weekday::Sunday], Nutrition::default());
    }

    #[test]
    fn unknown_recipe_is_an_error_not_a_gap() {
        let days = WeekDays {
            monday: vec![Uuid::new_v4()],
            ..Default::default()
        };
        let book = RecipeBook::default();
        assert!(matches!(
            daily_nutrition(&days, &book),
            Err(PlanError::RecipeNotFound { .. })
        ));
        assert!(matches!(
            shopping_list(&days, headcount(1), &book),
            Err(PlanError::RecipeNotFound { .. })
        ));
    }

    #[test]
    fn scale_recipe_multiplies_ingredients_and_nutrition() {
        let r = with_nutrition(
            recipe("pancakes", true, &[("flour", 60.0, Unit::Gram), ("milk", 0.5, Unit::Cup)]),
            250.0,
            7.0,
            40.0,
            6.0,
        );
        let scaled = scale_recipe(&r, headcount(4));
        assert_eq!(scaled.ingredients[0].quantity, 240.0);
        assert_eq!(scaled.ingredients[1].quantity, 2.0);
        assert_eq!(scaled.ingredients[1].unit, Unit::Cup);
        assert_eq!(scaled.nutrition.calories, 1000.0);
        assert_eq!(scaled.nutrition.fat, 24.0);
    }

    #[tokio::test]
    async fn aggregator_rejects_headcount_before_lookup() {
        let store = MemoryRecipes::default();
        let agg = MenuAggregator::new(&store);
        let days = WeekDays {
            monday: vec![Uuid::new_v4()],
            ..Default::default()
        };
        for bad in [0, 21] {
            match agg.generate_shopping_list(&days, bad).await {
                Err(PlanError::Validation(e)) => assert_eq!(e.field, "number_of_people"),
                other => panic!("expected validation error, got {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn aggregator_resolves_through_store() {
        let a = recipe("soup", true, &[("carrot", 2.0, Unit::Piece)]);
        let store = MemoryRecipes::with([a.clone()]);
        let agg = MenuAggregator::new(&store);
        let days = WeekDays {
            monday: vec![a.id],
            friday: vec![a.id],
            ..Default::default()
        };

        let list = agg.generate_shopping_list(&days, 20).await.unwrap();
        assert_eq!(list[0].quantity, 80.0);
        let list = agg.generate_shopping_list(&days, 1).await.unwrap();
        assert_eq!(list[0].quantity, 4.0);

        let scaled = agg.scale_recipe(a.id, 3).await.unwrap();
        assert_eq!(scaled.ingredients[0].quantity, 6.0);
        assert!(matches!(
            agg.scale_recipe(Uuid::new_v4(), 3).await,
            Err(PlanError::RecipeNotFound { .. })
        ));
    }
}
