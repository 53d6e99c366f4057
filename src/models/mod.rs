use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Storage format of `FoodLog::date_time`
pub const DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Structured result of reading an AI food analysis response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub food_name: String,
    pub calories: u32,
    pub protein: u32,
    pub details: String,
}

impl AnalysisResult {
    pub const UNKNOWN_FOOD: &'static str = "Unknown Food";
    pub const DEFAULT_DETAILS: &'static str = "Analysis completed";

    /// Record returned when a response could not be read at all
    pub fn fallback() -> Self {
        Self {
            food_name: Self::UNKNOWN_FOOD.to_string(),
            calories: 300,
            protein: 0,
            details: "Could not parse AI response".to_string(),
        }
    }
}

impl Default for AnalysisResult {
    fn default() -> Self {
        Self {
            food_name: Self::UNKNOWN_FOOD.to_string(),
            calories: 0,
            protein: 0,
            details: Self::DEFAULT_DETAILS.to_string(),
        }
    }
}

/// A logged meal, either analyzed from a photo or entered by hand
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoodLog {
    pub id: i64,
    pub food_name: String,
    pub calories: i64,
    pub protein: i64,
    pub image_path: String, // empty for manual entries
    pub date_time: String,  // YYYY-MM-DD HH:MM:SS
    pub analysis_details: String,
}

impl FoodLog {
    /// Entry time for list display (`Mar 05, 12:30`), raw value if unparseable
    pub fn display_time(&self) -> String {
        match NaiveDateTime::parse_from_str(&self.date_time, DATE_TIME_FORMAT) {
            Ok(dt) => dt.format("%b %d, %H:%M").to_string(),
            Err(_) => self.date_time.clone(),
        }
    }

    pub fn has_image(&self) -> bool {
        !self.image_path.is_empty()
    }
}

/// A meal about to be inserted (no id yet)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewFoodLog {
    pub food_name: String,
    pub calories: i64,
    pub protein: i64,
    pub image_path: String,
    pub date_time: String,
    pub analysis_details: String,
}

impl NewFoodLog {
    pub fn from_analysis(result: &AnalysisResult, image_path: &str, date_time: String) -> Self {
        Self {
            food_name: result.food_name.clone(),
            calories: i64::from(result.calories),
            protein: i64::from(result.protein),
            image_path: image_path.to_string(),
            date_time,
            analysis_details: result.details.clone(),
        }
    }

    pub fn custom(name: &str, calories: i64, protein: i64, date_time: String) -> Self {
        Self {
            food_name: name.to_string(),
            calories,
            protein,
            image_path: String::new(),
            date_time,
            analysis_details: String::new(),
        }
    }

    pub fn into_food_log(self, id: i64) -> FoodLog {
        FoodLog {
            id,
            food_name: self.food_name,
            calories: self.calories,
            protein: self.protein,
            image_path: self.image_path,
            date_time: self.date_time,
            analysis_details: self.analysis_details,
        }
    }
}

/// Everything logged on one day plus its totals
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaySummary {
    pub date: NaiveDate,
    pub logs: Vec<FoodLog>, // newest first
    pub total_calories: i64,
    pub total_protein: i64,
}

impl DaySummary {
    pub fn new(date: NaiveDate, logs: Vec<FoodLog>) -> Self {
        let total_calories = logs.iter().map(|log| log.calories).sum();
        let total_protein = logs.iter().map(|log| log.protein).sum();
        Self {
            date,
            logs,
            total_calories,
            total_protein,
        }
    }

    /// Selected date as shown in the date field (`MM/DD/YYYY`)
    pub fn display_date(&self) -> String {
        self.date.format("%m/%d/%Y").to_string()
    }

    pub fn calories_label(&self) -> String {
        format!("{} cal", self.total_calories)
    }

    pub fn protein_label(&self) -> String {
        format!("{} g protein", self.total_protein)
    }
}
