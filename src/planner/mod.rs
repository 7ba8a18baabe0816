//! Menu aggregation: nutrition rollup, shopping lists and menu validation.
//!
//! Everything here works on already-resolved recipe data. The only I/O goes
//! through [`RecipeResolver`].

pub mod aggregate;
pub mod error;
pub mod model;
pub mod resolver;
pub mod validate;

pub use aggregate::{DailyNutrition, MenuAggregator, ScaledRecipe, ShoppingItem};
pub use error::{PlanError, ValidationError};
pub use model::{
    Difficulty, Headcount, Ingredient, MenuType, Nutrition, Recipe, WeekDays, WeekId, MIN_PEOPLE,
};
pub use resolver::{resolve_menu, RecipeBook, RecipeResolver};
