use std::fmt;
use std::str::FromStr;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::ValidationError;

pub const MIN_PEOPLE: u8 = 1;
pub const MAX_PEOPLE: u8 = 20;

/// Measurement units a recipe ingredient may use.
///
/// Ingredients merge only on an exact (name, unit) match; units are never
/// converted into each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Unit {
    #[serde(rename = "g")]
    Gram,
    #[serde(rename = "kg")]
    Kilogram,
    #[serde(rename = "ml")]
    Millilitre,
    #[serde(rename = "l")]
    Litre,
    #[serde(rename = "pcs", alias = "buc")]
    Piece,
    #[serde(rename = "tbsp", alias = "lingură")]
    Tablespoon,
    #[serde(rename = "tsp", alias = "linguriță")]
    Teaspoon,
    #[serde(rename = "cup", alias = "cană")]
    Cup,
    #[serde(rename = "pinch", alias = "praf")]
    Pinch,
}

impl Unit {
    pub fn as_str(&self) -> &'static str {
        match self {
            Unit::Gram => "g",
            Unit::Kilogram => "kg",
            Unit::Millilitre => "ml",
            Unit::Litre => "l",
            Unit::Piece => "pcs",
            Unit::Tablespoon => "tbsp",
            Unit::Teaspoon => "tsp",
            Unit::Cup => "cup",
            Unit::Pinch => "pinch",
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    pub name: String,
    /// Amount for a single portion.
    pub quantity: f64,
    pub unit: Unit,
}

/// Per-portion nutrition facts. Also used for sums and scaled totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Nutrition {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

impl Nutrition {
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            calories: self.calories * factor,
            protein: self.protein * factor,
            carbs: self.carbs * factor,
            fat: self.fat * factor,
        }
    }
}

impl std::ops::AddAssign<&Nutrition> for Nutrition {
    fn add_assign(&mut self, rhs: &Nutrition) {
        self.calories += rhs.calories;
        self.protein += rhs.protein;
        self.carbs += rhs.carbs;
        self.fat += rhs.fat;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl FromStr for Difficulty {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            _ => Err(ValidationError::new(
                "difficulty",
                "difficulty must be one of: easy, medium, hard",
            )),
        }
    }
}

/// A resolved recipe, as the aggregator sees it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recipe {
    pub id: Uuid,
    pub name: String,
    pub ingredients: Vec<Ingredient>,
    pub nutrition: Nutrition,
    pub steps: Vec<String>,
    pub is_vegetarian: bool,
    pub prep_time: i32,
    pub difficulty: Difficulty,
    pub created_by: Uuid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    pub const ALL: [Weekday; 7] = [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
        Weekday::Sunday,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Weekday::Monday => "monday",
            Weekday::Tuesday => "tuesday",
            Weekday::Wednesday => "wednesday",
            Weekday::Thursday => "thursday",
            Weekday::Friday => "friday",
            Weekday::Saturday => "saturday",
            Weekday::Sunday => "sunday",
        }
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Recipe ids assigned to each day of a menu week.
///
/// Absent days deserialize as empty lists so the completeness check can name
/// them instead of failing inside serde.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekDays {
    #[serde(default)]
    pub monday: Vec<Uuid>,
    #[serde(default)]
    pub tuesday: Vec<Uuid>,
    #[serde(default)]
    pub wednesday: Vec<Uuid>,
    #[serde(default)]
    pub thursday: Vec<Uuid>,
    #[serde(default)]
    pub friday: Vec<Uuid>,
    #[serde(default)]
    pub saturday: Vec<Uuid>,
    #[serde(default)]
    pub sunday: Vec<Uuid>,
}

impl WeekDays {
    pub fn day(&self, day: Weekday) -> &[Uuid] {
        match day {
            Weekday::Monday => &self.monday,
            Weekday::Tuesday => &self.tuesday,
            Weekday::Wednesday => &self.wednesday,
            Weekday::Thursday => &self.thursday,
            Weekday::Friday => &self.friday,
            Weekday::Saturday => &self.saturday,
            Weekday::Sunday => &self.sunday,
        }
    }

    /// Every slot of the week, monday first, duplicates kept.
    pub fn slots(&self) -> impl Iterator<Item = Uuid> + '_ {
        Weekday::ALL
            .into_iter()
            .flat_map(move |d| self.day(d).iter().copied())
    }

    /// Distinct ids in order of first reference.
    pub fn distinct_ids(&self) -> Vec<Uuid> {
        let mut seen = std::collections::HashSet::new();
        self.slots().filter(|id| seen.insert(*id)).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MenuType {
    Vegetarian,
    #[serde(alias = "omnivor")]
    Omnivore,
}

impl MenuType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MenuType::Vegetarian => "vegetarian",
            MenuType::Omnivore => "omnivore",
        }
    }
}

impl FromStr for MenuType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "vegetarian" => Ok(MenuType::Vegetarian),
            "omnivore" | "omnivor" => Ok(MenuType::Omnivore),
            _ => Err(ValidationError::new(
                "menu_type",
                "menu type must be vegetarian or omnivore",
            )),
        }
    }
}

/// ISO-style week identifier, `YYYY-Wnn` with nn in 01..=53.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WeekId(String);

fn week_pattern() -> &'static Regex {
    lazy_static! {
        static ref WEEK_RE: Regex =
            Regex::new(r"^\d{4}-W(0[1-9]|[1-4][0-9]|5[0-3])$").unwrap();
    }
    &WEEK_RE
}

impl WeekId {
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        if week_pattern().is_match(raw) {
            Ok(Self(raw.to_string()))
        } else {
            Err(ValidationError::new(
                "week",
                format!("{raw:?} is not a valid week, expected YYYY-Wnn (e.g. 2024-W01)"),
            ))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for WeekId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<WeekId> for String {
    fn from(w: WeekId) -> Self {
        w.0
    }
}

impl fmt::Display for WeekId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Number of people a shopping list is computed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Headcount(u8);

impl Headcount {
    pub fn get(&self) -> u8 {
        self.0
    }

    pub fn factor(&self) -> f64 {
        f64::from(self.0)
    }
}

impl TryFrom<i64> for Headcount {
    type Error = ValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        if (i64::from(MIN_PEOPLE)..=i64::from(MAX_PEOPLE)).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(ValidationError::new(
                "number_of_people",
                format!("number of people must be between {MIN_PEOPLE} and {MAX_PEOPLE}"),
            ))
        }
    }
}

impl From<Headcount> for u8 {
    fn from(h: Headcount) -> Self {
        h.0
    }
}

impl Default for Headcount {
    fn default() -> Self {
        Self(MIN_PEOPLE)
    }
}
