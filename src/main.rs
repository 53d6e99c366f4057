mod cli;
mod config;
mod handlers;
mod models;
mod services;
#[cfg(feature = "api-server")]
mod api; // HTTP API for the meal log

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::Parser;
use dotenv::dotenv;
use std::io::Read;
use std::sync::Arc;

use cli::{Cli, Commands};
use config::AppConfig;
use handlers::MealLogHandler;
use models::{DaySummary, FoodLog};
use services::{response_extractor, Database, FoodAnalyzer, GeminiAnalyzer};

fn print_log_line(log: &FoodLog) {
    let photo = if log.has_image() { " 📷" } else { "" };
    println!(
        "  #{:<4} {:<14} {:<30} {:>5} cal {:>4} g protein{}",
        log.id,
        log.display_time(),
        log.food_name,
        log.calories,
        log.protein,
        photo
    );
}

fn print_summary(summary: &DaySummary) {
    println!("\n📅 {}", summary.display_date());
    println!("🔥 {}   💪 {}\n", summary.calories_label(), summary.protein_label());

    if summary.logs.is_empty() {
        println!("  No meals logged.");
    }
    for log in &summary.logs {
        print_log_line(log);
    }
    println!();
}

async fn print_day_total(handler: &MealLogHandler, date: NaiveDate) -> Result<()> {
    let calories = handler.calories_on(date).await?;
    println!("🔥 {} cal logged on {}", calories, date.format("%m/%d/%Y"));
    Ok(())
}

async fn build_handler(config: &AppConfig) -> Result<Arc<MealLogHandler>> {
    let db = Arc::new(Database::new(&config.database_url).await?);
    log::info!("✅ Database initialized: {}", config.database_url);

    let analyzer: Arc<dyn FoodAnalyzer> = Arc::new(GeminiAnalyzer::new(
        config.gemini_api_key.clone().unwrap_or_default(),
        config.gemini_model.clone(),
    ));
    log::debug!("✅ Gemini analyzer initialized with model: {}", config.gemini_model);

    Ok(Arc::new(MealLogHandler::new(db, analyzer, config.images_dir.clone())))
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logger
    env_logger::init();

    // Load environment variables
    dotenv().ok();

    let cli = Cli::parse();
    let config = AppConfig::from_env();

    match cli.command {
        Commands::Parse { file } => {
            let text = match file {
                Some(path) => std::fs::read_to_string(&path)
                    .with_context(|| format!("could not read {}", path.display()))?,
                None => {
                    let mut text = String::new();
                    std::io::stdin().read_to_string(&mut text)?;
                    text
                }
            };
            let result = response_extractor::extract(&text);
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Commands::Analyze { image, date } => {
            config.require_gemini_api_key()?;
            let handler = build_handler(&config).await?;

            println!("⏳ Analyzing {}...", image.display());
            let logged = handler.analyze_photo(&image, date.unwrap_or_else(today)).await?;
            println!(
                "✅ Found: {} ({} cal, {} g protein)",
                logged.food_name, logged.calories, logged.protein
            );
            println!("   {}", logged.analysis_details);
            print_day_total(&handler, date.unwrap_or_else(today)).await?;
        }
        Commands::Add {
            name,
            calories,
            protein,
            date,
        } => {
            let handler = build_handler(&config).await?;
            let logged = handler
                .add_custom_meal(&name, calories, protein, date.unwrap_or_else(today))
                .await?;
            println!("✅ Custom meal added (#{})", logged.id);
            print_day_total(&handler, date.unwrap_or_else(today)).await?;
        }
        Commands::List { date, all } => {
            let handler = build_handler(&config).await?;
            if all {
                let logs = handler.all_meals().await?;
                if logs.is_empty() {
                    println!("No meals logged.");
                }
                for log in &logs {
                    print_log_line(log);
                }
            } else {
                let summary = handler.day_summary(date.unwrap_or_else(today)).await?;
                print_summary(&summary);
            }
        }
        Commands::Delete { id } => {
            let handler = build_handler(&config).await?;
            handler.delete_meal(id).await?;
            println!("🗑️ Deleted meal #{}", id);
        }
        #[cfg(feature = "api-server")]
        Commands::Serve { port } => {
            if config.gemini_api_key.is_none() {
                log::warn!("⚠️ GEMINI_API_KEY not set, /api/analyze will fail");
            }
            let handler = build_handler(&config).await?;

            let addr = match port {
                Some(port) => format!("0.0.0.0:{}", port),
                None => config.api_bind.clone(),
            };
            let app = api::create_api_router(handler, config.api_token());

            let listener = tokio::net::TcpListener::bind(&addr)
                .await
                .with_context(|| format!("Failed to bind {}", addr))?;
            log::info!("🌐 API server listening on {}", addr);
            println!("🌐 API server: http://{}/api/logs?token=...", addr);
            println!("🛑 Press Ctrl+C to stop\n");

            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    tokio::signal::ctrl_c().await.ok();
                    log::info!("🛑 Shutting down...");
                })
                .await?;
        }
    }

    Ok(())
}
