pub mod meal_log;

pub use meal_log::MealLogHandler;
