pub mod ai_service;
pub mod database;
pub mod gemini; // Google Gemini image analysis
pub mod response_extractor;

pub use ai_service::FoodAnalyzer;
pub use database::Database;
pub use gemini::GeminiAnalyzer;
