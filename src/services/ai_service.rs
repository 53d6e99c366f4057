use anyhow::Result;

use crate::models::AnalysisResult;

/// Trait for image-understanding services (Gemini, test doubles, ...)
#[async_trait::async_trait]
pub trait FoodAnalyzer: Send + Sync {
    async fn analyze_food(&self, image_path: &str) -> Result<AnalysisResult>;
}
