// src/db/schema.rs

//! Database schema definitions and migrations
//!
//! One table holds the package index. The composite key is
//! (identifier, version); the UNIQUE constraint is what ultimately enforces
//! the store's key-uniqueness invariant.

use crate::error::Result;
use rusqlite::Connection;
use tracing::{debug, info};

/// Current schema version
pub const SCHEMA_VERSION: i32 = 1;

fn init_schema_version(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;
    Ok(())
}

/// Get the current schema version from the database
pub fn get_schema_version(conn: &Connection) -> Result<i32> {
    init_schema_version(conn)?;

    let version = conn
        .query_row(
            "SELECT version FROM schema_version ORDER BY version DESC LIMIT 1",
            [],
            |row| row.get(0),
        )
        .unwrap_or(0);

    Ok(version)
}

fn set_schema_version(conn: &Connection, version: i32) -> Result<()> {
    conn.execute(
        "INSERT INTO schema_version (version) VALUES (?1)",
        [version],
    )?;
    Ok(())
}

/// Apply all pending migrations to bring the database up to date
pub fn migrate(conn: &Connection) -> Result<()> {
    let current_version = get_schema_version(conn)?;

    if current_version >= SCHEMA_VERSION {
        debug!("Schema is up to date (version {})", current_version);
        return Ok(());
    }

    for version in (current_version + 1)..=SCHEMA_VERSION {
        info!("Applying schema migration to version {}", version);
        apply_migration(conn, version)?;
        set_schema_version(conn, version)?;
    }

    Ok(())
}

fn apply_migration(conn: &Connection, version: i32) -> Result<()> {
    match version {
        1 => migrate_v1(conn),
        _ => unreachable!("unknown migration version: {version}"),
    }
}

/// Initial schema - Version 1
///
/// One row per package version; columns mirror the v2 feed's property set.
fn migrate_v1(conn: &Connection) -> Result<()> {
    debug!("Creating schema version 1");

    conn.execute_batch(
        "
        CREATE TABLE packages (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            identifier TEXT NOT NULL,
            version TEXT NOT NULL,
            normalized_version TEXT,
            title TEXT NOT NULL,
            authors TEXT,
            owners TEXT,
            copyright TEXT,
            created TEXT NOT NULL,
            dependencies TEXT NOT NULL,
            development_dependency TEXT,
            description TEXT,
            download_count INTEGER NOT NULL DEFAULT 0,
            gallery_details_url TEXT,
            icon_url TEXT,
            is_latest_version INTEGER NOT NULL DEFAULT 0,
            is_absolute_latest_version INTEGER NOT NULL DEFAULT 0,
            is_prerelease INTEGER NOT NULL DEFAULT 0,
            language TEXT,
            last_updated TEXT NOT NULL,
            published TEXT NOT NULL,
            package_hash TEXT NOT NULL,
            package_hash_algorithm TEXT NOT NULL,
            package_size INTEGER NOT NULL,
            project_url TEXT,
            report_abuse_url TEXT,
            release_notes TEXT,
            require_license_acceptance INTEGER NOT NULL DEFAULT 0,
            summary TEXT,
            tags TEXT,
            version_download_count INTEGER NOT NULL DEFAULT 0,
            min_client_version TEXT,
            last_edited TEXT,
            target_frameworks TEXT NOT NULL,
            license_url TEXT,
            license_names TEXT,
            license_report_url TEXT,
            UNIQUE(identifier, version)
        );

        CREATE INDEX idx_packages_identifier ON packages(identifier);
        ",
    )?;

    Ok(())
}
