// src/feed.rs

//! Atom/OData feed serialization
//!
//! Search and lookup responses are rendered into the fixed-namespace feed
//! format v2 package-manager clients parse. Element and attribute names and
//! the namespace set are wire contract; do not touch them.
//!
//! Field access goes through one closed table mapping each OData property
//! name to a typed accessor. The same table backs `$select` projection and
//! `$orderBy` resolution, so an unknown name means the same thing everywhere.

use crate::db::models::PackageRecord;
use chrono::{DateTime, SecondsFormat, Utc};
use quick_xml::escape::escape;
use std::cmp::Ordering;
use std::fmt::Write;

/// A typed field value pulled out of a record
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Str(String),
    Bool(bool),
    Int32(i64),
    Int64(i64),
    Date(DateTime<Utc>),
}

impl FieldValue {
    /// Wire-level type marker, `None` for plain strings
    fn edm_type(&self) -> Option<&'static str> {
        match self {
            FieldValue::Str(_) => None,
            FieldValue::Bool(_) => Some("Edm.Boolean"),
            FieldValue::Int32(_) => Some("Edm.Int32"),
            FieldValue::Int64(_) => Some("Edm.Int64"),
            FieldValue::Date(_) => Some("Edm.DateTime"),
        }
    }

    /// Textual form as rendered into the feed
    fn render(&self) -> String {
        match self {
            FieldValue::Str(s) => s.clone(),
            FieldValue::Bool(b) => b.to_string(),
            FieldValue::Int32(n) | FieldValue::Int64(n) => n.to_string(),
            FieldValue::Date(d) => format_timestamp(*d),
        }
    }

    /// Ordering between values of the same field
    pub fn compare(&self, other: &FieldValue) -> Ordering {
        match (self, other) {
            (FieldValue::Str(a), FieldValue::Str(b)) => a.cmp(b),
            (FieldValue::Bool(a), FieldValue::Bool(b)) => a.cmp(b),
            (FieldValue::Int32(a), FieldValue::Int32(b)) => a.cmp(b),
            (FieldValue::Int64(a), FieldValue::Int64(b)) => a.cmp(b),
            (FieldValue::Date(a), FieldValue::Date(b)) => a.cmp(b),
            // mixed kinds only arise from a broken table; order arbitrarily
            _ => Ordering::Equal,
        }
    }
}

/// One entry in the closed field table
pub struct Field {
    pub name: &'static str,
    accessor: fn(&PackageRecord) -> FieldValue,
}

impl Field {
    pub fn value(&self, record: &PackageRecord) -> FieldValue {
        (self.accessor)(record)
    }
}

fn opt(value: &Option<String>) -> FieldValue {
    FieldValue::Str(value.clone().unwrap_or_default())
}

/// Every OData property the feed knows, in full-entry render order.
///
/// The trailing entries (`Identifier`, `Owners`, `DevelopmentDependency`,
/// `TargetFrameworks`) are addressable through `$select`/`$orderBy` but are
/// not part of the fixed full-entry property set.
pub static FIELDS: &[Field] = &[
    Field { name: "Id", accessor: |p| FieldValue::Str(p.identifier.clone()) },
    Field { name: "Version", accessor: |p| FieldValue::Str(p.version.clone()) },
    Field {
        name: "NormalizedVersion",
        accessor: |p| {
            FieldValue::Str(p.normalized_version.clone().unwrap_or_else(|| p.version.clone()))
        },
    },
    Field { name: "Authors", accessor: |p| opt(&p.authors) },
    Field { name: "Copyright", accessor: |p| opt(&p.copyright) },
    Field { name: "Created", accessor: |p| FieldValue::Date(p.created) },
    Field { name: "Dependencies", accessor: |p| FieldValue::Str(p.dependencies.clone()) },
    Field { name: "Description", accessor: |p| opt(&p.description) },
    Field { name: "DownloadCount", accessor: |p| FieldValue::Int32(p.download_count) },
    Field { name: "GalleryDetailsUrl", accessor: |p| opt(&p.gallery_details_url) },
    Field { name: "IconUrl", accessor: |p| opt(&p.icon_url) },
    Field { name: "IsLatestVersion", accessor: |p| FieldValue::Bool(p.is_latest_version) },
    Field {
        name: "IsAbsoluteLatestVersion",
        accessor: |p| FieldValue::Bool(p.is_absolute_latest_version),
    },
    Field { name: "IsPrerelease", accessor: |p| FieldValue::Bool(p.is_prerelease) },
    Field { name: "Language", accessor: |p| opt(&p.language) },
    Field { name: "LastUpdated", accessor: |p| FieldValue::Date(p.last_updated) },
    Field { name: "Published", accessor: |p| FieldValue::Date(p.published) },
    Field { name: "PackageHash", accessor: |p| FieldValue::Str(p.package_hash.clone()) },
    Field {
        name: "PackageHashAlgorithm",
        accessor: |p| FieldValue::Str(p.package_hash_algorithm.clone()),
    },
    Field { name: "PackageSize", accessor: |p| FieldValue::Int64(p.package_size) },
    Field { name: "ProjectUrl", accessor: |p| opt(&p.project_url) },
    Field { name: "ReportAbuseUrl", accessor: |p| opt(&p.report_abuse_url) },
    Field { name: "ReleaseNotes", accessor: |p| opt(&p.release_notes) },
    Field {
        name: "RequireLicenseAcceptance",
        accessor: |p| FieldValue::Bool(p.require_license_acceptance),
    },
    Field { name: "Summary", accessor: |p| opt(&p.summary) },
    Field { name: "Tags", accessor: |p| opt(&p.tags) },
    Field { name: "Title", accessor: |p| FieldValue::Str(p.title.clone()) },
    Field {
        name: "VersionDownloadCount",
        accessor: |p| FieldValue::Int32(p.version_download_count),
    },
    Field { name: "MinClientVersion", accessor: |p| opt(&p.min_client_version) },
    Field {
        name: "LastEdited",
        accessor: |p| {
            FieldValue::Str(p.last_edited.map(format_timestamp).unwrap_or_default())
        },
    },
    Field { name: "LicenseUrl", accessor: |p| opt(&p.license_url) },
    Field { name: "LicenseNames", accessor: |p| opt(&p.license_names) },
    Field { name: "LicenseReportUrl", accessor: |p| opt(&p.license_report_url) },
    // addressable but outside the fixed full-entry set
    Field { name: "Identifier", accessor: |p| FieldValue::Str(p.identifier.clone()) },
    Field { name: "Owners", accessor: |p| opt(&p.owners) },
    Field {
        name: "DevelopmentDependency",
        accessor: |p| opt(&p.development_dependency),
    },
    Field {
        name: "TargetFrameworks",
        accessor: |p| FieldValue::Str(p.target_frameworks.clone()),
    },
];

/// Number of leading `FIELDS` entries in the fixed full-entry property set
const FULL_ENTRY_FIELDS: usize = 33;

/// Look up a field by its OData property name (case-sensitive)
pub fn field(name: &str) -> Option<&'static Field> {
    FIELDS.iter().find(|f| f.name == name)
}

/// Round-trippable timestamp form used for every date in the feed
fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Render a complete feed document.
///
/// `count` is the total match count before pagination. When `selected` is
/// given, each entry's property set is restricted to those fields; the
/// identifier, authors and version always ride along in the entry envelope.
///
/// Side effect observable to clients: rendering an entry stamps that
/// record's `published` timestamp (in memory only, never persisted) to the
/// current date.
pub fn render_feed(
    records: &mut [PackageRecord],
    count: usize,
    base_url: &str,
    selected: Option<&[String]>,
) -> String {
    let updated = format_timestamp(Utc::now());
    let mut entries = String::new();
    for record in records.iter_mut() {
        stamp_published(record);
        render_entry(&mut entries, record, base_url, &updated, selected);
    }

    format!(
        r#"<?xml version="1.0" encoding="utf-8"?><feed xml:base="https://www.nuget.org/api/v2" xmlns="http://www.w3.org/2005/Atom" xmlns:d="http://schemas.microsoft.com/ado/2007/08/dataservices" xmlns:m="http://schemas.microsoft.com/ado/2007/08/dataservices/metadata" xmlns:georss="http://www.georss.org/georss" xmlns:gml="http://www.opengis.net/gml"><m:count>{count}</m:count><id>http://schemas.datacontract.org/2004/07/</id><title /><updated>{updated}</updated><link rel="self" href="{base_url}/Packages" />{entries}</feed>"#
    )
}

/// Stamp the rendered record's published timestamp to the current date
fn stamp_published(record: &mut PackageRecord) {
    let today = Utc::now()
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .expect("midnight is always valid")
        .and_utc();
    record.published = today;
}

fn render_entry(
    out: &mut String,
    record: &PackageRecord,
    base_url: &str,
    updated: &str,
    selected: Option<&[String]>,
) {
    let id = escape(&record.identifier);
    let version = escape(&record.version);
    let authors = escape(record.authors.as_deref().unwrap_or_default());
    let entry_id = format!("{base_url}/Packages(Id='{id}',Version='{version}')");

    write!(
        out,
        r#"<entry><id>{entry_id}</id><category term="NuGetGallery.OData.V2FeedPackage" scheme="http://schemas.microsoft.com/ado/2007/08/dataservices/scheme" /><link rel="edit" href="{entry_id}" /><link rel="self" href="{entry_id}" /><title type="text">{id}</title><updated>{updated}</updated><author><name>{authors}</name></author><content type="application/zip" src="{base_url}/Package/{id}/{version}" /><m:properties>"#,
    )
    .expect("writing to a String cannot fail");

    match selected {
        None => {
            for f in &FIELDS[..FULL_ENTRY_FIELDS] {
                render_property(out, f, record);
            }
        }
        Some(names) => {
            for name in names {
                if let Some(f) = field(name) {
                    render_property(out, f, record);
                }
            }
        }
    }

    out.push_str("</m:properties></entry>");
}

fn render_property(out: &mut String, f: &Field, record: &PackageRecord) {
    let value = f.value(record);
    let text = escape(&value.render()).into_owned();
    let name = f.name;
    match value.edm_type() {
        None => write!(out, "<d:{name}>{text}</d:{name}>"),
        Some(edm) => write!(out, r#"<d:{name} m:type="{edm}">{text}</d:{name}>"#),
    }
    .expect("writing to a String cannot fail");
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record() -> PackageRecord {
        let ts = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        PackageRecord {
            id: Some(1),
            identifier: "Foo".into(),
            version: "1.0.0".into(),
            normalized_version: None,
            title: "Foo".into(),
            authors: Some("Jane Dev".into()),
            owners: None,
            copyright: None,
            created: ts,
            dependencies: "A:[1.0, ):net461".into(),
            development_dependency: None,
            description: Some("Tools & helpers".into()),
            download_count: 12,
            gallery_details_url: Some("http://localhost/Package/Foo/1.0.0".into()),
            icon_url: None,
            is_latest_version: false,
            is_absolute_latest_version: false,
            is_prerelease: false,
            language: None,
            last_updated: ts,
            published: ts,
            package_hash: "aGFzaA==".into(),
            package_hash_algorithm: "SHA512".into(),
            package_size: 42,
            project_url: None,
            report_abuse_url: None,
            release_notes: None,
            require_license_acceptance: false,
            summary: None,
            tags: Some("tools".into()),
            version_download_count: 3,
            min_client_version: None,
            last_edited: None,
            target_frameworks: "net461".into(),
            license_url: None,
            license_names: None,
            license_report_url: None,
        }
    }

    #[test]
    fn test_field_lookup_is_case_sensitive() {
        assert!(field("DownloadCount").is_some());
        assert!(field("downloadcount").is_none());
        assert!(field("NoSuchField").is_none());
    }

    #[test]
    fn test_full_entry_markup() {
        let mut records = vec![record()];
        let feed = render_feed(&mut records, 1, "http://localhost:5000", None);

        assert!(feed.starts_with(r#"<?xml version="1.0" encoding="utf-8"?><feed xml:base="https://www.nuget.org/api/v2""#));
        assert!(feed.contains("<m:count>1</m:count>"));
        assert!(feed.contains(
            r#"<id>http://localhost:5000/Packages(Id='Foo',Version='1.0.0')</id>"#
        ));
        assert!(feed.contains(
            r#"<content type="application/zip" src="http://localhost:5000/Package/Foo/1.0.0" />"#
        ));
        // typed markers
        assert!(feed.contains(r#"<d:DownloadCount m:type="Edm.Int32">12</d:DownloadCount>"#));
        assert!(feed.contains(r#"<d:PackageSize m:type="Edm.Int64">42</d:PackageSize>"#));
        assert!(feed.contains(r#"<d:IsPrerelease m:type="Edm.Boolean">false</d:IsPrerelease>"#));
        assert!(feed.contains(r#"<d:Created m:type="Edm.DateTime">2024-03-01T12:00:00.000000Z</d:Created>"#));
        // strings are untyped and escaped
        assert!(feed.contains("<d:Description>Tools &amp; helpers</d:Description>"));
        assert!(feed.contains("<d:Dependencies>A:[1.0, ):net461</d:Dependencies>"));
    }

    #[test]
    fn test_projection_restricts_properties() {
        let mut records = vec![record()];
        let selected = vec!["Tags".to_string()];
        let feed = render_feed(&mut records, 1, "http://localhost:5000", Some(&selected));

        assert!(feed.contains("<d:Tags>tools</d:Tags>"));
        assert!(!feed.contains("<d:Description>"));
        assert!(!feed.contains("<d:DownloadCount"));
        // identifier, authors and version still ride in the envelope
        assert!(feed.contains(r#"<title type="text">Foo</title>"#));
        assert!(feed.contains("<author><name>Jane Dev</name></author>"));
        assert!(feed.contains("Version='1.0.0'"));
    }

    #[test]
    fn test_unknown_selected_field_is_skipped() {
        let mut records = vec![record()];
        let selected = vec!["NoSuchField".to_string(), "Title".to_string()];
        let feed = render_feed(&mut records, 1, "http://localhost", Some(&selected));
        assert!(feed.contains("<d:Title>Foo</d:Title>"));
        assert!(!feed.contains("NoSuchField"));
    }

    #[test]
    fn test_rendering_stamps_published_to_today() {
        let mut records = vec![record()];
        render_feed(&mut records, 1, "http://localhost", None);
        assert_eq!(records[0].published.date_naive(), Utc::now().date_naive());
        assert_eq!(records[0].published.time(), chrono::NaiveTime::MIN);
    }

    #[test]
    fn test_id_selection_renders_identifier() {
        let mut records = vec![record()];
        let selected = vec!["Id".to_string()];
        let feed = render_feed(&mut records, 1, "http://localhost", Some(&selected));
        assert!(feed.contains("<d:Id>Foo</d:Id>"));
    }
}
