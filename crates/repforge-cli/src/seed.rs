//! Catalog and user import from JSON files.

use std::path::Path;

use serde::Deserialize;
use tracing::{info, warn};

use repforge_core::{Exercise, UserHealth, UserPreferences, UserProfile};
use repforge_store::SqliteStore;

/// Result of a catalog import.
#[derive(Debug, Default)]
pub struct SeedReport {
    pub inserted: usize,
    pub skipped: Vec<String>,
}

/// Import a JSON array of exercises. Invalid or duplicate entries are
/// skipped and reported; the rest are inserted.
pub fn seed_catalog(store: &SqliteStore, path: &Path) -> anyhow::Result<SeedReport> {
    let raw = std::fs::read_to_string(path)?;
    let exercises: Vec<Exercise> = serde_json::from_str(&raw)?;

    let mut report = SeedReport::default();
    for exercise in &exercises {
        match store.add_exercise(exercise) {
            Ok(_) => report.inserted += 1,
            Err(e) => {
                warn!("Skipping {}: {}", exercise.slug, e);
                report.skipped.push(format!("{}: {}", exercise.slug, e));
            }
        }
    }
    info!(
        "Seeded {} exercises from {} ({} skipped)",
        report.inserted,
        path.display(),
        report.skipped.len()
    );
    Ok(report)
}

pub fn print_report(report: &SeedReport) {
    println!("=== RepForge Catalog Import ===");
    println!();
    println!("Inserted:           {}", report.inserted);
    println!("Skipped:            {}", report.skipped.len());
    if !report.skipped.is_empty() {
        println!();
        for s in &report.skipped {
            println!("  - {}", s);
        }
    }
}

/// User record as written by onboarding.
#[derive(Debug, Deserialize)]
pub struct UserFile {
    pub profile: Option<UserProfile>,
    pub preferences: Option<UserPreferences>,
    #[serde(default)]
    pub health: UserHealth,
}

pub fn add_user(store: &SqliteStore, path: &Path) -> anyhow::Result<i64> {
    let raw = std::fs::read_to_string(path)?;
    let user: UserFile = serde_json::from_str(&raw)?;
    let id = store.create_user(user.profile.as_ref(), user.preferences.as_ref(), &user.health)?;
    Ok(id)
}
