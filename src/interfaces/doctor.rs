use std::path::Path;

use anyhow::{bail, Result};
use rusqlite::{Connection, OpenFlags};

use crate::application::config::AppConfig;

const REQUIRED_COLUMNS: [&str; 6] = [
    "id",
    "scientific_name",
    "common_name",
    "confidence",
    "date",
    "time",
];

/// Connectivity and schema preflight against the analyzer's database.
pub fn check_database(path: &Path) -> Result<()> {
    println!("Testing database: {}", path.display());

    if !path.exists() {
        bail!("database file not found at {}", path.display());
    }

    let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;
    println!("Database connection successful");

    let tables: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'notes'",
        [],
        |row| row.get(0),
    )?;
    if tables == 0 {
        bail!("'notes' table not found");
    }
    println!("'notes' table found");

    let mut stmt = conn.prepare("PRAGMA table_info(notes)")?;
    let columns: Vec<String> = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<Result<Vec<_>, _>>()?;
    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .filter(|required| !columns.iter().any(|c| c == *required))
        .copied()
        .collect();
    if !missing.is_empty() {
        bail!("missing required columns: {}", missing.join(", "));
    }
    println!("All required columns found");

    let count: i64 = conn.query_row("SELECT COUNT(*) FROM notes", [], |row| row.get(0))?;
    println!("Found {} records in notes table", count);

    if count > 0 {
        let mut stmt = conn.prepare(
            "SELECT id, scientific_name, common_name, confidence, date, time
             FROM notes
             ORDER BY id DESC
             LIMIT 5",
        )?;
        let mut rows = stmt.query([])?;
        println!("\nMost recent detections:");
        while let Some(row) = rows.next()? {
            let id: i64 = row.get(0)?;
            let scientific: String = row.get::<_, Option<String>>(1)?.unwrap_or_default();
            let common: String = row.get::<_, Option<String>>(2)?.unwrap_or_default();
            let confidence: f64 = row.get::<_, Option<f64>>(3)?.unwrap_or_default();
            let date: String = row.get::<_, Option<String>>(4)?.unwrap_or_default();
            let time: String = row.get::<_, Option<String>>(5)?.unwrap_or_default();
            println!(
                "  id {}: {} ({}) confidence {:.2} at {} {}",
                id, common, scientific, confidence, date, time
            );
        }
    }

    println!("\nDatabase check passed");
    Ok(())
}

/// Shows the effective configuration, creating the file when missing.
pub fn check_config(config_path: &Path) -> Result<()> {
    let config = AppConfig::load_or_create(config_path)?;

    println!("Configuration: {}", config_path.display());
    println!("  database_path = {}", config.database_path);
    println!("  post_url = {}", config.post_url);
    println!("  max_species = {}", config.max_species);
    println!("  poll_interval = {}", config.poll_interval);
    println!("  cooldown_minutes = {}", config.cooldown_minutes);
    println!("  log_level = {}", config.log_level);

    let database_path = config.database_file();
    if database_path.exists() {
        println!("Database file found at {}", database_path.display());
    } else {
        println!("Warning: database file not found at {}", database_path.display());
    }
    if config.post_url.is_empty() {
        println!("Warning: post_url is not set; the service will refuse to start");
    }

    println!("\nConfig check passed");
    Ok(())
}
