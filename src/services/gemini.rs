use anyhow::{Context, Result};
use base64::{engine::general_purpose, Engine};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::models::AnalysisResult;
use crate::services::ai_service::FoodAnalyzer;
use crate::services::response_extractor;

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

const FOOD_PROMPT: &str = "Look at this food image and tell me:\n\
                           1. What food items do you see?\n\
                           2. Estimate the total calories\n\
                           3. Estimate the total protein in grams\n\
                           Respond in this exact format:\n\
                           Food: [name of the food]\n\
                           Calories: [number only]\n\
                           Protein: [number only]\n\
                           Details: [brief description]\n\
                           For example:\n\
                           Food: Grilled chicken salad\n\
                           Calories: 350\n\
                           Protein: 30\n\
                           Details: Mixed greens with grilled chicken breast, tomatoes, and light dressing";

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part {
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
    Text {
        text: String,
    },
}

#[derive(Debug, Serialize)]
struct InlineData {
    #[serde(rename = "mimeType")]
    mime_type: String,
    data: String,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

impl GenerateContentResponse {
    /// Text parts of the first candidate, joined
    fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|part| part.text.as_deref())
            .collect();

        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

/// MIME type guessed from the file extension, JPEG unless it says otherwise
fn mime_type_for(image_path: &str) -> &'static str {
    let extension = Path::new(image_path)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());

    match extension.as_deref() {
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        _ => "image/jpeg",
    }
}

pub struct GeminiAnalyzer {
    api_key: String,
    model: String,
    client: reqwest::Client,
}

impl GeminiAnalyzer {
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            api_key,
            model,
            client: reqwest::Client::new(),
        }
    }

    async fn request_analysis(&self, image_path: &str) -> Result<String> {
        log::debug!("📸 Starting image analysis for: {}", image_path);

        let image_data = tokio::fs::read(image_path)
            .await
            .with_context(|| format!("could not read image {}", image_path))?;
        let base64_image = general_purpose::STANDARD.encode(&image_data);

        log::debug!("📊 Image file size: {} bytes", image_data.len());
        log::debug!("🔄 Base64 encoded size: {} bytes", base64_image.len());

        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: mime_type_for(image_path).to_string(),
                            data: base64_image,
                        },
                    },
                    Part::Text {
                        text: FOOD_PROMPT.to_string(),
                    },
                ],
            }],
        };

        let url = format!("{}/{}:generateContent", API_BASE, self.model);
        log::info!("🤖 Sending request to Gemini with model: {}", self.model);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        log::debug!("📥 Gemini response status: {}", status);

        if !status.is_success() {
            let error_text = response.text().await?;
            log::error!("❌ Gemini API error response: {}", error_text);
            anyhow::bail!("Gemini API error ({}): {}", status, error_text);
        }

        let response_text = response.text().await?;
        log::debug!("📄 Raw Gemini response size: {} bytes", response_text.len());

        let parsed: GenerateContentResponse = serde_json::from_str(&response_text)?;
        let content = parsed
            .text()
            .ok_or_else(|| anyhow::anyhow!("No response from AI"))?;
        log::info!("💬 Gemini response content: {}", content);

        Ok(content)
    }
}

#[async_trait::async_trait]
impl FoodAnalyzer for GeminiAnalyzer {
    async fn analyze_food(&self, image_path: &str) -> Result<AnalysisResult> {
        let content = self
            .request_analysis(image_path)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to analyze image: {:#}", e))?;

        Ok(response_extractor::extract(&content))
    }
}
