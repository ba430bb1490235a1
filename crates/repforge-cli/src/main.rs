//! RepForge — exercise recommendation and workout planning from the command line.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use repforge_engine::RecommendationEngine;
use repforge_infer::{EmbeddingConfig, QueryCache};
use repforge_store::SqliteStore;

mod seed;

fn resolve_data_dir() -> PathBuf {
    std::env::var("REPFORGE_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let exe_dir = std::env::current_exe()
                .ok()
                .and_then(|p| p.parent().map(|p| p.to_path_buf()));
            if let Some(dir) = exe_dir {
                let parent_data = dir.join("../data");
                if parent_data.exists() {
                    return parent_data;
                }
            }
            PathBuf::from("data")
        })
}

fn print_help() {
    println!("RepForge — exercise recommendations and workout plans");
    println!();
    println!("Usage: repforge <command> [args]");
    println!();
    println!("Commands:");
    println!("  seed <catalog.json>              Import exercises into the catalog");
    println!("  add-user <user.json>             Create a user from profile/preferences/health");
    println!("  embed                            Embed catalog entries for the active model");
    println!("  recommend <user> <muscles> [n]   Ranked exercises for comma-separated muscles");
    println!("  plan <user> [--save]             Generate (and optionally save) a weekly plan");
    println!("  workout <user> <day> [week]      Generate a workout for a weekday (0 = Monday)");
    println!("  today <user>                     Today's workout, created on first request");
    println!("  swap <user> <workout-exercise>   Replace an exercise in a workout");
    println!("  similar <exercise> [n]           Exercises similar to a catalog entry");
    println!("  stats                            Catalog and embedding statistics");
    println!("  help                             Show this help message");
    println!();
    println!("Environment:");
    println!("  REPFORGE_DATA_DIR                Data directory (default: ./data)");
    println!("  RUST_LOG                         Log filter (default: info)");
}

fn usage(msg: &str) -> ! {
    eprintln!("Usage: repforge {}", msg);
    std::process::exit(1);
}

fn id_arg(args: &[String], index: usize, msg: &str) -> i64 {
    match args.get(index).map(|a| a.parse::<i64>()) {
        Some(Ok(id)) => id,
        _ => usage(msg),
    }
}

/// Optional positive count. `None` when present but malformed.
fn parse_count(arg: Option<&str>, default: usize) -> Option<usize> {
    match arg {
        None => Some(default),
        Some(a) => a.parse().ok().filter(|&n| n > 0),
    }
}

fn count_arg(args: &[String], index: usize, default: usize, msg: &str) -> usize {
    match parse_count(args.get(index).map(String::as_str), default) {
        Some(n) => n,
        None => usage(msg),
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    let command = args.get(1).map(String::as_str).unwrap_or("help");
    if matches!(command, "help" | "--help" | "-h") {
        print_help();
        return Ok(());
    }

    let data_dir = resolve_data_dir();
    info!("Data directory: {}", data_dir.display());

    let config = repforge_core::RepForgeConfig::from_env(&data_dir)?;
    let store = SqliteStore::open(&config.data_paths.catalog)
        .map_err(|e| anyhow::anyhow!("Failed to open store: {}", e))?;
    let store = Arc::new(store);

    let embedding_config = EmbeddingConfig::load(&config.data_paths.embedding_config_file);
    let cache = QueryCache::new(
        config.query_cache_size,
        Duration::from_secs(config.query_cache_ttl_secs),
    );
    let gateway = Arc::new(repforge_infer::create_gateway(&embedding_config, cache));
    let engine = RecommendationEngine::new(Arc::clone(&store), gateway);

    match command {
        "seed" => {
            let Some(path) = args.get(2) else {
                usage("seed <catalog.json>")
            };
            let report = seed::seed_catalog(&store, PathBuf::from(path).as_path())?;
            seed::print_report(&report);
        }
        "add-user" => {
            let Some(path) = args.get(2) else {
                usage("add-user <user.json>")
            };
            let id = seed::add_user(&store, PathBuf::from(path).as_path())?;
            println!("Created user {}", id);
        }
        "embed" => {
            let embedded = engine.embed_catalog().await?;
            println!("Embedded {} exercises", embedded);
        }
        "recommend" => {
            let msg = "recommend <user> <muscles> [limit]";
            let user_id = id_arg(&args, 2, msg);
            let Some(muscles) = args.get(3) else {
                usage(msg)
            };
            let muscles: Vec<String> = muscles
                .split(',')
                .map(|m| m.trim().to_lowercase())
                .filter(|m| !m.is_empty())
                .collect();
            let limit = count_arg(&args, 4, 10, msg);
            let ranked = engine
                .get_exercises_for_muscles(user_id, &muscles, limit)
                .await?;
            print_json(&ranked)?;
        }
        "plan" => {
            let user_id = id_arg(&args, 2, "plan <user> [--save]");
            let plan = engine.generate_weekly_plan(user_id).await?;
            if args.iter().skip(3).any(|a| a == "--save") {
                let plan_id = engine.save_weekly_plan(user_id, &plan)?;
                info!("Saved plan {} for user {}", plan_id, user_id);
            }
            print_json(&plan)?;
        }
        "workout" => {
            let msg = "workout <user> <day-of-week> [week]";
            let user_id = id_arg(&args, 2, msg);
            let day = id_arg(&args, 3, msg);
            let week = count_arg(&args, 4, 1, msg) as u32;
            let workout = engine.generate_workout(user_id, day.rem_euclid(7) as u32, week)?;
            print_json(&workout)?;
        }
        "today" => {
            let user_id = id_arg(&args, 2, "today <user>");
            print_json(&engine.get_todays_workout(user_id)?)?;
        }
        "swap" => {
            let msg = "swap <user> <workout-exercise-id>";
            let user_id = id_arg(&args, 2, msg);
            let workout_exercise_id = id_arg(&args, 3, msg);
            print_json(&engine.swap_exercise(workout_exercise_id, user_id)?)?;
        }
        "similar" => {
            let msg = "similar <exercise-id> [limit]";
            let exercise_id = id_arg(&args, 2, msg);
            let limit = count_arg(&args, 3, 10, msg);
            print_json(&engine.search_similar_exercises(exercise_id, limit)?)?;
        }
        "stats" => {
            print_json(&store.get_stats()?)?;
        }
        other => {
            eprintln!("Unknown command: {}. Use 'repforge help' for usage.", other);
            std::process::exit(1);
        }
    }

    Ok(())
}
