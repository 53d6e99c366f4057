use anyhow::Result;
use chrono::NaiveDate;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    Row, SqlitePool,
};
use std::str::FromStr;

use crate::models::{FoodLog, NewFoodLog};

pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub async fn new(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

        // An in-memory database lives and dies with its connection
        let pool = if database_url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        } else {
            SqlitePoolOptions::new()
                .max_connections(5)
                .connect_with(options)
                .await?
        };

        let db = Database { pool };
        db.init_tables().await?;
        Ok(db)
    }

    async fn init_tables(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS food_logs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                food_name TEXT NOT NULL,
                calories INTEGER NOT NULL,
                protein INTEGER NOT NULL DEFAULT 0,
                image_path TEXT NOT NULL,
                date_time TEXT NOT NULL,
                analysis_details TEXT NOT NULL DEFAULT ''
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_food_logs_date_time ON food_logs (date_time)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    fn row_to_food_log(row: SqliteRow) -> FoodLog {
        FoodLog {
            id: row.get(0),
            food_name: row.get(1),
            calories: row.get(2),
            protein: row.get(3),
            image_path: row.get(4),
            date_time: row.get(5),
            analysis_details: row.get(6),
        }
    }

    pub async fn insert_food_log(&self, food_log: &NewFoodLog) -> Result<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO food_logs (food_name, calories, protein, image_path, date_time, analysis_details)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&food_log.food_name)
        .bind(food_log.calories)
        .bind(food_log.protein)
        .bind(&food_log.image_path)
        .bind(&food_log.date_time)
        .bind(&food_log.analysis_details)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Returns whether a row was removed
    pub async fn delete_food_log(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM food_logs WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn get_food_log(&self, id: i64) -> Result<Option<FoodLog>> {
        let food_log = sqlx::query(
            r#"
            SELECT id, food_name, calories, protein, image_path, date_time, analysis_details
            FROM food_logs WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .map(Self::row_to_food_log);

        Ok(food_log)
    }

    pub async fn get_all_food_logs(&self) -> Result<Vec<FoodLog>> {
        let rows = sqlx::query(
            r#"
            SELECT id, food_name, calories, protein, image_path, date_time, analysis_details
            FROM food_logs
            ORDER BY date_time DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Self::row_to_food_log).collect())
    }

    pub async fn get_food_logs_by_date(&self, date: NaiveDate) -> Result<Vec<FoodLog>> {
        let rows = sqlx::query(
            r#"
            SELECT id, food_name, calories, protein, image_path, date_time, analysis_details
            FROM food_logs
            WHERE DATE(date_time) = ?
            ORDER BY date_time DESC
            "#,
        )
        .bind(date.format("%Y-%m-%d").to_string())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Self::row_to_food_log).collect())
    }

    /// Sum of calories logged on `date`, `None` when nothing was logged
    pub async fn get_calories_by_date(&self, date: NaiveDate) -> Result<Option<i64>> {
        let result = sqlx::query("SELECT SUM(calories) FROM food_logs WHERE DATE(date_time) = ?")
            .bind(date.format("%Y-%m-%d").to_string())
            .fetch_one(&self.pool)
            .await?;

        let total: Option<i64> = result.get(0);
        Ok(total)
    }
}
