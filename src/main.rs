use std::str::FromStr;
use std::sync::Arc;

use clap::Parser;
use clap::Subcommand;
use florarag::config::AppConfig;
use florarag::database::Database;
use florarag::embeddings::EmbeddingClient;
use florarag::embeddings::HttpEmbeddingClient;
use florarag::knowledge::KnowledgeManager;
use florarag::knowledge::KnowledgeStore;
use florarag::models::BatchQuery;
use florarag::models::InitialCondition;
use florarag::models::KnowledgeEntryData;
use florarag::models::PredictionResult;
use florarag::models::StorageEnvironment;
use florarag::prediction::PredictionService;
use florarag::Result;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "florarag")]
#[command(about = "Flower spoilage prediction backed by a pgvector knowledge base")]
#[command(version)]
struct Cli {
    /// Enable verbose debug logging (default: info level)
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize database schema and seed the starter knowledge base
    Init {
        /// Skip seeding the starter dataset
        #[arg(long)]
        skip_seed: bool,
    },
    /// Show knowledge base statistics
    Stats,
    /// List knowledge entries
    List {
        /// Filter by flower type substring
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Add a knowledge entry
    Add {
        #[arg(long)]
        flower_type: String,
        #[arg(long)]
        variety: Option<String>,
        #[arg(long)]
        care_requirements: String,
        #[arg(long, default_value = "")]
        optimal_temperature: String,
        #[arg(long, default_value = "")]
        optimal_humidity: String,
        #[arg(long, default_value = "")]
        water_requirements: String,
        #[arg(long, default_value = "")]
        ethylene_sensitivity: String,
        #[arg(long, default_value = "")]
        common_issues: String,
        #[arg(long, default_value = "")]
        vase_life_tips: String,
        #[arg(long)]
        source_name: String,
        #[arg(long)]
        source_url: String,
    },
    /// Delete a knowledge entry by id
    Delete { id: Uuid },
    /// Regenerate embeddings for every knowledge entry
    Reembed,
    /// Predict remaining lifespan for an ad-hoc batch description
    Predict {
        #[arg(long)]
        flower_type: String,
        #[arg(long)]
        variety: Option<String>,
        /// Expected shelf life in days
        #[arg(long, default_value = "7")]
        expected_shelf_life: f64,
        /// Excellent, Good, Fair, or Poor
        #[arg(long)]
        initial_condition: Option<String>,
        /// Refrigerated, "Room Temperature", or Other
        #[arg(long)]
        storage: Option<String>,
        #[arg(long)]
        floral_food: bool,
    },
    /// Predict for a stored batch, using the cached prediction when fresh
    PredictBatch {
        id: Uuid,
        /// Recompute even if a fresh cached prediction exists
        #[arg(short, long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load()?;
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    florarag::logging::init_logging_with_config(Some(&config))?;

    match cli.command {
        Commands::Init { skip_seed } => init(&config, skip_seed).await,
        Commands::Stats => stats(&config).await,
        Commands::List { search } => list(&config, search).await,
        Commands::Add {
            flower_type,
            variety,
            care_requirements,
            optimal_temperature,
            optimal_humidity,
            water_requirements,
            ethylene_sensitivity,
            common_issues,
            vase_life_tips,
            source_name,
            source_url,
        } => {
            add(
                &config,
                KnowledgeEntryData {
                    flower_type,
                    variety,
                    care_requirements,
                    optimal_temperature,
                    optimal_humidity,
                    water_requirements,
                    ethylene_sensitivity,
                    common_issues,
                    vase_life_tips,
                    source_name,
                    source_url,
                },
            )
            .await
        }
        Commands::Delete { id } => delete(&config, id).await,
        Commands::Reembed => reembed(&config).await,
        Commands::Predict {
            flower_type,
            variety,
            expected_shelf_life,
            initial_condition,
            storage,
            floral_food,
        } => {
            let mut query = BatchQuery::new(flower_type, expected_shelf_life);
            query.variety = variety;
            query.floral_food_used = floral_food;
            if let Some(condition) = initial_condition {
                query.initial_condition = Some(
                    InitialCondition::from_str(&condition)
                        .map_err(florarag::FloraRagError::KnowledgeValidation)?,
                );
            }
            if let Some(storage) = storage {
                query.storage_environment = Some(
                    StorageEnvironment::from_str(&storage)
                        .map_err(florarag::FloraRagError::KnowledgeValidation)?,
                );
            }
            predict(&config, query).await
        }
        Commands::PredictBatch { id, force } => predict_batch(&config, id, force).await,
    }
}

fn knowledge_manager(config: &AppConfig, database: Arc<Database>) -> Result<KnowledgeManager> {
    let store: Arc<dyn KnowledgeStore> = database;
    let embeddings: Arc<dyn EmbeddingClient> = Arc::new(HttpEmbeddingClient::from_config(config)?);
    Ok(KnowledgeManager::new(store, embeddings))
}

async fn init(config: &AppConfig, skip_seed: bool) -> Result<()> {
    let database = Arc::new(Database::from_config(config).await?);

    if database.is_schema_initialized().await? {
        println!("Schema already initialized");
    } else {
        database
            .initialize_schema(config.embedding_dimension())
            .await?;
        println!("Schema created");
    }

    if !skip_seed {
        let manager = knowledge_manager(config, database)?;
        match manager.seed_knowledge_base().await? {
            Some(report) => {
                println!(
                    "Seeded knowledge base: {} inserted, {} failed",
                    report.inserted,
                    report.failures.len()
                );
                for (index, error) in &report.failures {
                    println!("  entry {index}: {error}");
                }
            }
            None => println!("Knowledge base already has entries, seed skipped"),
        }
    }

    Ok(())
}

async fn stats(config: &AppConfig) -> Result<()> {
    let database = Arc::new(Database::from_config(config).await?);
    let manager = knowledge_manager(config, database)?;
    let stats = manager.stats().await?;

    println!("Knowledge base statistics");
    println!("{:-<50}", "");
    println!("Total entries: {}", stats.total_entries);
    println!("Flower types:  {}", stats.flower_types.join(", "));
    println!("Varieties:     {}", stats.varieties.join(", "));
    Ok(())
}

async fn list(config: &AppConfig, search: Option<String>) -> Result<()> {
    let database = Arc::new(Database::from_config(config).await?);
    let manager = knowledge_manager(config, database)?;

    let entries = match search {
        Some(term) => manager.find_by_flower_type(&term).await?,
        None => manager.list_entries().await?,
    };

    if entries.is_empty() {
        println!("No knowledge entries found");
        return Ok(());
    }

    for entry in entries {
        println!(
            "{}  {}{}  [{}]",
            entry.id,
            entry.flower_type,
            entry
                .variety
                .as_deref()
                .map(|v| format!(" ({v})"))
                .unwrap_or_default(),
            entry.source_name,
        );
    }
    Ok(())
}

async fn add(config: &AppConfig, data: KnowledgeEntryData) -> Result<()> {
    let database = Arc::new(Database::from_config(config).await?);
    let manager = knowledge_manager(config, database)?;
    let entry = manager.add_entry(data).await?;
    println!("Added knowledge entry {}", entry.id);
    Ok(())
}

async fn delete(config: &AppConfig, id: Uuid) -> Result<()> {
    let database = Arc::new(Database::from_config(config).await?);
    let manager = knowledge_manager(config, database)?;
    manager.delete_entry(id).await?;
    println!("Deleted knowledge entry {id}");
    Ok(())
}

async fn reembed(config: &AppConfig) -> Result<()> {
    let database = Arc::new(Database::from_config(config).await?);
    let manager = knowledge_manager(config, database)?;
    let updated = manager.regenerate_all_embeddings().await?;
    println!("Regenerated embeddings for {updated} entries");
    Ok(())
}

async fn predict(config: &AppConfig, query: BatchQuery) -> Result<()> {
    let service = PredictionService::new(config).await?;
    let result = service.predictor().predict(&query).await?;
    print_result(&result);
    Ok(())
}

async fn predict_batch(config: &AppConfig, id: Uuid, force: bool) -> Result<()> {
    let service = PredictionService::new(config).await?;
    let result = service.predict_for_batch(id, force).await?;
    print_result(&result);
    Ok(())
}

fn print_result(result: &PredictionResult) {
    println!(
        "Prediction: {} days, {} hours, {} minutes remaining ({:.1} total hours)",
        result.detailed.days,
        result.detailed.hours,
        result.detailed.minutes,
        result.detailed.total_hours,
    );
    println!(
        "Confidence: {:.0}%  ({:?} tier)",
        result.confidence * 100.0,
        result.tier
    );
    println!("\nReasoning:\n{}", result.reasoning);

    if !result.recommendations.is_empty() {
        println!("\nRecommendations:");
        for rec in &result.recommendations {
            println!("  - {rec}");
        }
    }

    if !result.financial_recommendations.is_empty() {
        println!("\nFinancial recommendations:");
        for rec in &result.financial_recommendations {
            println!(
                "  - [{:?}] {} ({}): {}",
                rec.urgency, rec.title, rec.time_window, rec.description
            );
        }
    }

    if !result.sources.is_empty() {
        println!("\nSources:");
        for source in &result.sources {
            println!("  - {} <{}>", source.name, source.url);
        }
    }
}
