// src/db/models.rs

//! Data model for the package index
//!
//! `PackageRecord` is the stored, queryable representation of one package
//! version. Version strings are kept exactly as the manifest spelled them;
//! nothing here parses them into numeric components.

use crate::error::Result;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};

/// One package version in the index, keyed by (identifier, version)
#[derive(Debug, Clone, PartialEq)]
pub struct PackageRecord {
    pub id: Option<i64>,
    pub identifier: String,
    pub version: String,
    pub normalized_version: Option<String>,
    pub title: String,
    pub authors: Option<String>,
    pub owners: Option<String>,
    pub copyright: Option<String>,
    pub created: DateTime<Utc>,
    pub dependencies: String,
    pub development_dependency: Option<String>,
    pub description: Option<String>,
    pub download_count: i64,
    pub gallery_details_url: Option<String>,
    pub icon_url: Option<String>,
    pub is_latest_version: bool,
    pub is_absolute_latest_version: bool,
    pub is_prerelease: bool,
    pub language: Option<String>,
    pub last_updated: DateTime<Utc>,
    pub published: DateTime<Utc>,
    pub package_hash: String,
    pub package_hash_algorithm: String,
    pub package_size: i64,
    pub project_url: Option<String>,
    pub report_abuse_url: Option<String>,
    pub release_notes: Option<String>,
    pub require_license_acceptance: bool,
    pub summary: Option<String>,
    pub tags: Option<String>,
    pub version_download_count: i64,
    pub min_client_version: Option<String>,
    pub last_edited: Option<DateTime<Utc>>,
    pub target_frameworks: String,
    pub license_url: Option<String>,
    pub license_names: Option<String>,
    pub license_report_url: Option<String>,
}

impl PackageRecord {
    /// Composite key, the `identifier:version` form used in rebuild summaries
    pub fn key(&self) -> String {
        format!("{}:{}", self.identifier, self.version)
    }

    /// Whether `candidate` carries the same builder-derived content.
    ///
    /// Row id, both download counters and the timestamps are deliberately
    /// left out: a rescan of an unchanged archive must be a no-op.
    pub fn same_content(&self, candidate: &PackageRecord) -> bool {
        self.identifier == candidate.identifier
            && self.version == candidate.version
            && self.title == candidate.title
            && self.authors == candidate.authors
            && self.owners == candidate.owners
            && self.copyright == candidate.copyright
            && self.dependencies == candidate.dependencies
            && self.development_dependency == candidate.development_dependency
            && self.description == candidate.description
            && self.gallery_details_url == candidate.gallery_details_url
            && self.icon_url == candidate.icon_url
            && self.is_prerelease == candidate.is_prerelease
            && self.language == candidate.language
            && self.package_hash == candidate.package_hash
            && self.package_hash_algorithm == candidate.package_hash_algorithm
            && self.package_size == candidate.package_size
            && self.project_url == candidate.project_url
            && self.release_notes == candidate.release_notes
            && self.require_license_acceptance == candidate.require_license_acceptance
            && self.summary == candidate.summary
            && self.tags == candidate.tags
            && self.min_client_version == candidate.min_client_version
            && self.target_frameworks == candidate.target_frameworks
            && self.license_url == candidate.license_url
    }

    /// Insert this record, storing the new row id back on `self`
    pub fn insert(&mut self, conn: &Connection) -> Result<i64> {
        conn.execute(
            "INSERT INTO packages (
                identifier, version, normalized_version, title, authors, owners,
                copyright, created, dependencies, development_dependency, description,
                download_count, gallery_details_url, icon_url, is_latest_version,
                is_absolute_latest_version, is_prerelease, language, last_updated,
                published, package_hash, package_hash_algorithm, package_size,
                project_url, report_abuse_url, release_notes, require_license_acceptance,
                summary, tags, version_download_count, min_client_version, last_edited,
                target_frameworks, license_url, license_names, license_report_url
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16,
                ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25, ?26, ?27, ?28, ?29, ?30,
                ?31, ?32, ?33, ?34, ?35, ?36
            )",
            params![
                self.identifier,
                self.version,
                self.normalized_version,
                self.title,
                self.authors,
                self.owners,
                self.copyright,
                self.created,
                self.dependencies,
                self.development_dependency,
                self.description,
                self.download_count,
                self.gallery_details_url,
                self.icon_url,
                self.is_latest_version,
                self.is_absolute_latest_version,
                self.is_prerelease,
                self.language,
                self.last_updated,
                self.published,
                self.package_hash,
                self.package_hash_algorithm,
                self.package_size,
                self.project_url,
                self.report_abuse_url,
                self.release_notes,
                self.require_license_acceptance,
                self.summary,
                self.tags,
                self.version_download_count,
                self.min_client_version,
                self.last_edited,
                self.target_frameworks,
                self.license_url,
                self.license_names,
                self.license_report_url,
            ],
        )?;
        let id = conn.last_insert_rowid();
        self.id = Some(id);
        Ok(id)
    }

    /// Overwrite the stored record's derived fields in place.
    ///
    /// The row id, both download counters, `created` and `published` are
    /// preserved; `last_updated` comes from `self`.
    pub fn update(&self, conn: &Connection) -> Result<()> {
        conn.execute(
            "UPDATE packages SET
                normalized_version = ?3, title = ?4, authors = ?5, owners = ?6,
                copyright = ?7, dependencies = ?8, development_dependency = ?9,
                description = ?10, gallery_details_url = ?11, icon_url = ?12,
                is_prerelease = ?13, language = ?14, last_updated = ?15,
                package_hash = ?16, package_hash_algorithm = ?17, package_size = ?18,
                project_url = ?19, release_notes = ?20,
                require_license_acceptance = ?21, summary = ?22, tags = ?23,
                min_client_version = ?24, target_frameworks = ?25, license_url = ?26
             WHERE identifier = ?1 AND version = ?2",
            params![
                self.identifier,
                self.version,
                self.normalized_version,
                self.title,
                self.authors,
                self.owners,
                self.copyright,
                self.dependencies,
                self.development_dependency,
                self.description,
                self.gallery_details_url,
                self.icon_url,
                self.is_prerelease,
                self.language,
                self.last_updated,
                self.package_hash,
                self.package_hash_algorithm,
                self.package_size,
                self.project_url,
                self.release_notes,
                self.require_license_acceptance,
                self.summary,
                self.tags,
                self.min_client_version,
                self.target_frameworks,
                self.license_url,
            ],
        )?;
        Ok(())
    }

    /// Remove a record by composite key
    pub fn delete(conn: &Connection, identifier: &str, version: &str) -> Result<()> {
        conn.execute(
            "DELETE FROM packages WHERE identifier = ?1 AND version = ?2",
            params![identifier, version],
        )?;
        Ok(())
    }

    /// Look up one record by composite key
    pub fn find_by_key(
        conn: &Connection,
        identifier: &str,
        version: &str,
    ) -> Result<Option<PackageRecord>> {
        let record = conn
            .query_row(
                &format!("{SELECT_ALL} WHERE identifier = ?1 AND version = ?2"),
                params![identifier, version],
                Self::from_row,
            )
            .optional()?;
        Ok(record)
    }

    /// All versions of one identifier, in store-natural order
    pub fn find_by_identifier(conn: &Connection, identifier: &str) -> Result<Vec<PackageRecord>> {
        let mut stmt =
            conn.prepare(&format!("{SELECT_ALL} WHERE identifier = ?1 ORDER BY id"))?;
        let records = stmt
            .query_map(params![identifier], Self::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(records)
    }

    /// Every record in the index, in store-natural order
    pub fn list_all(conn: &Connection) -> Result<Vec<PackageRecord>> {
        let mut stmt = conn.prepare(&format!("{SELECT_ALL} ORDER BY id"))?;
        let records = stmt
            .query_map([], Self::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(records)
    }

    fn from_row(row: &Row<'_>) -> std::result::Result<PackageRecord, rusqlite::Error> {
        Ok(PackageRecord {
            id: row.get("id")?,
            identifier: row.get("identifier")?,
            version: row.get("version")?,
            normalized_version: row.get("normalized_version")?,
            title: row.get("title")?,
            authors: row.get("authors")?,
            owners: row.get("owners")?,
            copyright: row.get("copyright")?,
            created: row.get("created")?,
            dependencies: row.get("dependencies")?,
            development_dependency: row.get("development_dependency")?,
            description: row.get("description")?,
            download_count: row.get("download_count")?,
            gallery_details_url: row.get("gallery_details_url")?,
            icon_url: row.get("icon_url")?,
            is_latest_version: row.get("is_latest_version")?,
            is_absolute_latest_version: row.get("is_absolute_latest_version")?,
            is_prerelease: row.get("is_prerelease")?,
            language: row.get("language")?,
            last_updated: row.get("last_updated")?,
            published: row.get("published")?,
            package_hash: row.get("package_hash")?,
            package_hash_algorithm: row.get("package_hash_algorithm")?,
            package_size: row.get("package_size")?,
            project_url: row.get("project_url")?,
            report_abuse_url: row.get("report_abuse_url")?,
            release_notes: row.get("release_notes")?,
            require_license_acceptance: row.get("require_license_acceptance")?,
            summary: row.get("summary")?,
            tags: row.get("tags")?,
            version_download_count: row.get("version_download_count")?,
            min_client_version: row.get("min_client_version")?,
            last_edited: row.get("last_edited")?,
            target_frameworks: row.get("target_frameworks")?,
            license_url: row.get("license_url")?,
            license_names: row.get("license_names")?,
            license_report_url: row.get("license_report_url")?,
        })
    }
}

const SELECT_ALL: &str = "SELECT * FROM packages";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    pub(crate) fn sample_record(identifier: &str, version: &str) -> PackageRecord {
        let now = Utc::now();
        PackageRecord {
            id: None,
            identifier: identifier.to_string(),
            version: version.to_string(),
            normalized_version: None,
            title: identifier.to_string(),
            authors: Some("Jane Dev".to_string()),
            owners: None,
            copyright: None,
            created: now,
            dependencies: String::new(),
            development_dependency: None,
            description: Some("A test package.".to_string()),
            download_count: 0,
            gallery_details_url: None,
            icon_url: None,
            is_latest_version: false,
            is_absolute_latest_version: false,
            is_prerelease: false,
            language: None,
            last_updated: now,
            published: now,
            package_hash: "aGFzaA==".to_string(),
            package_hash_algorithm: "SHA512".to_string(),
            package_size: 42,
            project_url: None,
            report_abuse_url: None,
            release_notes: None,
            require_license_acceptance: false,
            summary: None,
            tags: Some("test".to_string()),
            version_download_count: 0,
            min_client_version: None,
            last_edited: None,
            target_frameworks: "net461".to_string(),
            license_url: None,
            license_names: None,
            license_report_url: None,
        }
    }

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        db::schema::migrate(&conn).unwrap();
        conn
    }

    #[test]
    fn test_insert_and_find() {
        let conn = test_conn();
        let mut record = sample_record("Foo", "1.0.0");
        let id = record.insert(&conn).unwrap();
        assert_eq!(record.id, Some(id));

        let found = PackageRecord::find_by_key(&conn, "Foo", "1.0.0")
            .unwrap()
            .unwrap();
        assert_eq!(found.key(), "Foo:1.0.0");
        assert_eq!(found.title, "Foo");
        assert!(found.same_content(&record));
    }

    #[test]
    fn test_key_uniqueness_enforced() {
        let conn = test_conn();
        sample_record("Foo", "1.0.0").insert(&conn).unwrap();
        assert!(sample_record("Foo", "1.0.0").insert(&conn).is_err());
        // same identifier, different version is fine
        sample_record("Foo", "1.0.1").insert(&conn).unwrap();
    }

    #[test]
    fn test_update_preserves_counters_and_created() {
        let conn = test_conn();
        let mut record = sample_record("Foo", "1.0.0");
        record.insert(&conn).unwrap();
        conn.execute(
            "UPDATE packages SET download_count = 7, version_download_count = 3",
            [],
        )
        .unwrap();

        let mut changed = sample_record("Foo", "1.0.0");
        changed.description = Some("New description.".to_string());
        changed.update(&conn).unwrap();

        let found = PackageRecord::find_by_key(&conn, "Foo", "1.0.0")
            .unwrap()
            .unwrap();
        assert_eq!(found.description.as_deref(), Some("New description."));
        assert_eq!(found.download_count, 7);
        assert_eq!(found.version_download_count, 3);
        assert_eq!(found.id, record.id);
        assert_eq!(found.created, record.created);
    }

    #[test]
    fn test_delete() {
        let conn = test_conn();
        sample_record("Foo", "1.0.0").insert(&conn).unwrap();
        PackageRecord::delete(&conn, "Foo", "1.0.0").unwrap();
        assert!(
            PackageRecord::find_by_key(&conn, "Foo", "1.0.0")
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn test_same_content_ignores_counters() {
        let a = sample_record("Foo", "1.0.0");
        let mut b = sample_record("Foo", "1.0.0");
        b.download_count = 99;
        assert!(a.same_content(&b));

        b.tags = Some("changed".to_string());
        assert!(!a.same_content(&b));
    }
}
