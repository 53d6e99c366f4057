use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;

use crate::models::{DaySummary, FoodLog, NewFoodLog};
use crate::services::{Database, FoodAnalyzer};

pub const INVALID_MEAL_MESSAGE: &str = "Please enter valid data";

/// Failures callers may want to tell apart from storage or AI errors
#[derive(Debug, thiserror::Error)]
pub enum MealLogError {
    #[error("{}", INVALID_MEAL_MESSAGE)]
    InvalidMeal,
    #[error("No meal with id {0}")]
    NotFound(i64),
}

static IMAGE_SEQ: AtomicU64 = AtomicU64::new(0);

/// Lower-cased file extension for a stored photo, `jpg` unless it is plain alphanumeric
fn image_extension(extension: &str) -> String {
    let extension = extension.trim_start_matches('.');
    if extension.is_empty() || extension.len() > 8 || !extension.chars().all(|c| c.is_ascii_alphanumeric()) {
        "jpg".to_string()
    } else {
        extension.to_ascii_lowercase()
    }
}

/// `date` combined with the current local wall-clock time
fn timestamp_for(date: NaiveDate) -> String {
    format!("{} {}", date.format("%Y-%m-%d"), Local::now().format("%H:%M:%S"))
}

pub struct MealLogHandler {
    db: Arc<Database>,
    analyzer: Arc<dyn FoodAnalyzer>,
    images_dir: PathBuf,
}

impl MealLogHandler {
    pub fn new(db: Arc<Database>, analyzer: Arc<dyn FoodAnalyzer>, images_dir: PathBuf) -> Self {
        Self {
            db,
            analyzer,
            images_dir,
        }
    }

    /// Write the photo into the images directory under a fresh
    /// `food_{unix_millis}_{seq}.{ext}` name so the log keeps pointing at it
    async fn store_image(&self, data: &[u8], extension: &str) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.images_dir)
            .await
            .with_context(|| format!("could not create {}", self.images_dir.display()))?;

        loop {
            let target = self.images_dir.join(format!(
                "food_{}_{}.{}",
                chrono::Utc::now().timestamp_millis(),
                IMAGE_SEQ.fetch_add(1, Ordering::Relaxed),
                extension
            ));

            // create_new: never reuse a file another analysis is working on
            let mut file = match tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&target)
                .await
            {
                Ok(file) => file,
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => {
                    return Err(e).with_context(|| format!("could not create {}", target.display()))
                }
            };

            file.write_all(data)
                .await
                .with_context(|| format!("could not write {}", target.display()))?;
            file.flush().await?;
            log::debug!("📁 Stored image at {}", target.display());

            return Ok(target);
        }
    }

    /// Analyze a meal photo from disk and log the result under `date`
    pub async fn analyze_photo(&self, source_image: &Path, date: NaiveDate) -> Result<FoodLog> {
        log::info!("📸 Analyzing meal photo {} for {}", source_image.display(), date);

        let data = tokio::fs::read(source_image)
            .await
            .with_context(|| format!("could not read {}", source_image.display()))?;
        let extension = source_image
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("jpg");

        self.analyze_image(&data, extension, date).await
    }

    /// Analyze photo bytes (e.g. an upload) and log the result under `date`
    pub async fn analyze_image(&self, data: &[u8], extension: &str, date: NaiveDate) -> Result<FoodLog> {
        let extension = image_extension(extension);
        let stored = self.store_image(data, &extension).await?;
        let image_path = stored.to_string_lossy().to_string();

        let result = match self.analyzer.analyze_food(&image_path).await {
            Ok(result) => result,
            Err(e) => {
                log::error!("❌ Analysis failed for {}: {:#}", image_path, e);
                if let Err(remove_err) = tokio::fs::remove_file(&stored).await {
                    log::warn!("⚠️ Could not remove {}: {}", image_path, remove_err);
                }
                return Err(e);
            }
        };

        let new_log = NewFoodLog::from_analysis(&result, &image_path, timestamp_for(date));
        let id = self.db.insert_food_log(&new_log).await?;
        log::info!(
            "✅ Logged #{}: {} ({} cal, {} g protein)",
            id,
            result.food_name,
            result.calories,
            result.protein
        );

        Ok(new_log.into_food_log(id))
    }

    /// Log a meal entered by hand
    pub async fn add_custom_meal(
        &self,
        name: &str,
        calories: i64,
        protein: i64,
        date: NaiveDate,
    ) -> Result<FoodLog> {
        let name = name.trim();
        if name.is_empty() || calories <= 0 || protein < 0 {
            log::warn!(
                "⚠️ Rejected custom meal: name={:?} calories={} protein={}",
                name,
                calories,
                protein
            );
            return Err(MealLogError::InvalidMeal.into());
        }

        let new_log = NewFoodLog::custom(name, calories, protein, timestamp_for(date));
        let id = self.db.insert_food_log(&new_log).await?;
        log::info!("✅ Custom meal added #{}: {}", id, name);

        Ok(new_log.into_food_log(id))
    }

    pub async fn delete_meal(&self, id: i64) -> Result<()> {
        let food_log = self
            .db
            .get_food_log(id)
            .await?
            .ok_or(MealLogError::NotFound(id))?;

        if !self.db.delete_food_log(id).await? {
            return Err(MealLogError::NotFound(id).into());
        }
        log::info!("🗑️ Deleted meal #{}: {}", id, food_log.food_name);
        Ok(())
    }

    /// Calories logged on `date`, 0 for an empty day
    pub async fn calories_on(&self, date: NaiveDate) -> Result<i64> {
        Ok(self.db.get_calories_by_date(date).await?.unwrap_or(0))
    }

    pub async fn day_summary(&self, date: NaiveDate) -> Result<DaySummary> {
        let logs = self.db.get_food_logs_by_date(date).await?;
        let summary = DaySummary::new(date, logs);
        log::debug!(
            "📊 {}: {} meals, {} cal, {} g protein",
            date,
            summary.logs.len(),
            summary.total_calories,
            summary.total_protein
        );
        Ok(summary)
    }

    pub async fn all_meals(&self) -> Result<Vec<FoodLog>> {
        self.db.get_all_food_logs().await
    }
}
