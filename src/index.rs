// src/index.rs

//! Index building
//!
//! `rebuild` scans the archive directory, derives a candidate record per
//! archive, and diffs the candidate set against the store by
//! (identifier, version). All reads happen before the first store mutation,
//! so a failed or cancelled scan leaves the previous index intact; the
//! add/update/delete set is then committed as one transaction, so readers
//! only ever see the old or the new index.

use crate::archive::{self, ArchiveContents};
use crate::db::{self, models::PackageRecord};
use crate::error::Result;
use crate::manifest::{self, Nuspec};
use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde::Serialize;
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info};

/// Outcome of one rebuild, as returned by the `/BuildIndex` endpoint
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexSummary {
    pub added_count: usize,
    pub added: Vec<String>,
    pub updated_count: usize,
    pub updated: Vec<String>,
    pub deleted_count: usize,
    pub deleted: Vec<String>,
}

impl IndexSummary {
    fn new(added: Vec<String>, updated: Vec<String>, deleted: Vec<String>) -> Self {
        Self {
            added_count: added.len(),
            added,
            updated_count: updated.len(),
            updated,
            deleted_count: deleted.len(),
            deleted,
        }
    }

    /// True when the scan changed nothing
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.updated.is_empty() && self.deleted.is_empty()
    }
}

/// Rebuild the index from every `.nupkg` under `directory`.
///
/// `base_url` is the server's own address, baked into each record's
/// gallery-details URL. Rescanning an unchanged directory is a no-op:
/// candidates whose derived fields match the stored record are neither
/// written nor reported.
pub fn rebuild(conn: &mut Connection, directory: &Path, base_url: &str) -> Result<IndexSummary> {
    let archives = archive::list_archives(directory)?;
    info!(
        directory = %directory.display(),
        archives = archives.len(),
        "rebuilding package index"
    );

    let now = Utc::now();
    let mut candidates = Vec::with_capacity(archives.len());
    for path in &archives {
        let contents = archive::read_archive(path)?;
        let spec = manifest::parse(&contents.manifest)?;
        candidates.push(candidate_record(spec, &contents, base_url, now)?);
    }

    let summary = db::transaction(conn, |tx| {
        let mut added = Vec::new();
        let mut updated = Vec::new();
        let mut seen = HashSet::new();

        for mut candidate in candidates {
            seen.insert((candidate.identifier.clone(), candidate.version.clone()));
            match PackageRecord::find_by_key(tx, &candidate.identifier, &candidate.version)? {
                None => {
                    candidate.insert(tx)?;
                    added.push(candidate.key());
                }
                Some(existing) if existing.same_content(&candidate) => {
                    debug!(key = %candidate.key(), "unchanged, skipping");
                }
                Some(_) => {
                    candidate.update(tx)?;
                    updated.push(candidate.key());
                }
            }
        }

        let mut deleted = Vec::new();
        for record in PackageRecord::list_all(tx)? {
            if !seen.contains(&(record.identifier.clone(), record.version.clone())) {
                PackageRecord::delete(tx, &record.identifier, &record.version)?;
                deleted.push(record.key());
            }
        }

        Ok(IndexSummary::new(added, updated, deleted))
    })?;

    info!(
        added = summary.added_count,
        updated = summary.updated_count,
        deleted = summary.deleted_count,
        "index rebuild complete"
    );
    Ok(summary)
}

/// Derive a store record from one archive's manifest and contents
fn candidate_record(
    spec: Nuspec,
    contents: &ArchiveContents,
    base_url: &str,
    now: DateTime<Utc>,
) -> Result<PackageRecord> {
    let metadata = spec.metadata;
    let title = metadata.title_or_id().to_string();
    let dependencies = match metadata.dependencies {
        Some(section) => manifest::dependency_string(&section.into_groups()?)?,
        None => String::new(),
    };

    Ok(PackageRecord {
        id: None,
        gallery_details_url: Some(format!(
            "{base_url}/Package/{}/{}",
            metadata.id, metadata.version
        )),
        is_prerelease: manifest::is_prerelease(&metadata.version),
        target_frameworks: manifest::target_frameworks_string(&contents.lib_folders),
        dependencies,
        title,
        identifier: metadata.id,
        version: metadata.version,
        normalized_version: None,
        authors: metadata.authors,
        owners: metadata.owners,
        copyright: metadata.copyright,
        created: now,
        development_dependency: metadata.development_dependency,
        description: metadata.description,
        download_count: 0,
        icon_url: metadata.icon_url,
        is_latest_version: false,
        is_absolute_latest_version: false,
        language: metadata.language,
        last_updated: now,
        published: now,
        package_hash: contents.hash.clone(),
        package_hash_algorithm: contents.hash_algorithm.name().to_string(),
        package_size: contents.size as i64,
        project_url: metadata.project_url,
        report_abuse_url: None,
        release_notes: metadata.release_notes,
        require_license_acceptance: metadata.require_license_acceptance,
        summary: metadata.summary,
        tags: metadata.tags,
        version_download_count: 0,
        min_client_version: metadata.min_client_version,
        last_edited: None,
        license_url: metadata.license_url,
        license_names: None,
        license_report_url: None,
    })
}
