// src/query.rs

//! Query engine over the package index
//!
//! Translates the v2 query-string contract into a filtered, ordered,
//! paginated view over the records. Semantics downstream clients rely on
//! are preserved exactly:
//!
//! - free-text search is the deduplicated union of six case-sensitive
//!   substring/prefix passes over identifier, title, tags and description;
//! - the default (non-prerelease) filter excludes versions containing
//!   `beta` or `alpha`, independently of the stored prerelease flag's
//!   beta-only rule;
//! - the `IsLatestVersion`/`IsAbsoluteLatestVersion` filter tokens are
//!   accepted and have no effect;
//! - an unknown `$orderBy` field is silently ignored.

use crate::db::models::PackageRecord;
use crate::error::{Error, Result};
use crate::feed;
use std::collections::{HashMap, HashSet};

/// Default page size when `$top` is not supplied
pub const DEFAULT_TAKE: usize = 5;

/// Request-scoped query parameters
#[derive(Debug, Clone)]
pub struct QueryParameters {
    pub search_term: Option<String>,
    pub target_framework: Option<String>,
    pub include_prerelease: bool,
    pub order_by: Option<String>,
    pub order_by_descending: bool,
    pub skip: usize,
    pub take: usize,
    /// Recognized filter token; intentionally applies no filtering
    pub is_latest_version: bool,
    /// Recognized filter token; intentionally applies no filtering
    pub is_absolute_latest_version: bool,
    pub selected_fields: Option<Vec<String>>,
}

impl Default for QueryParameters {
    fn default() -> Self {
        Self {
            search_term: None,
            target_framework: None,
            include_prerelease: false,
            order_by: None,
            order_by_descending: false,
            skip: 0,
            take: DEFAULT_TAKE,
            is_latest_version: false,
            is_absolute_latest_version: false,
            selected_fields: None,
        }
    }
}

impl QueryParameters {
    /// Parse the recognized query-string parameters.
    ///
    /// `$filter` carries either a quoted free-text term or one of the two
    /// latest-version tokens; `searchTerm` is the alternate free-text input.
    /// Malformed `$skip`/`$top` values are client errors.
    pub fn from_query(query: &HashMap<String, String>) -> Result<Self> {
        let mut params = QueryParameters::default();

        if let Some(filter) = query.get("$filter") {
            if filter.starts_with('\'') && filter.ends_with('\'') {
                params.search_term = Some(trim_quotes(filter));
            } else if filter == "IsLatestVersion" {
                params.is_latest_version = true;
            } else if filter == "IsAbsoluteLatestVersion" {
                params.is_absolute_latest_version = true;
            }
        }

        if let Some(framework) = query.get("targetFramework") {
            params.target_framework = Some(trim_quotes(framework));
        }

        if let Some(order_by) = query.get("$orderBy") {
            let mut parts = order_by.split(' ');
            params.order_by = parts.next().map(str::to_string);
            params.order_by_descending = parts.next() == Some("desc");
        }

        if let Some(skip) = query.get("$skip") {
            params.skip = skip
                .parse()
                .map_err(|_| Error::argument("$skip", skip.clone()))?;
        }

        if let Some(top) = query.get("$top") {
            params.take = top
                .parse()
                .map_err(|_| Error::argument("$top", top.clone()))?;
        }

        if let Some(select) = query.get("$select") {
            params.selected_fields =
                Some(select.split(',').map(|s| s.trim().to_string()).collect());
        }

        if let Some(term) = query.get("searchTerm") {
            params.search_term = Some(trim_quotes(term));
        }

        if let Some(include) = query.get("includePrerelease") {
            params.include_prerelease = include.eq_ignore_ascii_case("true");
        }

        Ok(params)
    }
}

fn trim_quotes(value: &str) -> String {
    value.trim_matches('\'').to_string()
}

/// Apply search, framework and prerelease filters, then ordering.
///
/// Pagination is separate (`paginate`): callers need the filtered count
/// before slicing, and the by-identifier lookup never paginates.
pub fn apply_filters(
    mut records: Vec<PackageRecord>,
    params: &QueryParameters,
) -> Vec<PackageRecord> {
    if let Some(term) = params.search_term.as_deref()
        && !term.is_empty()
    {
        records = search_union(&records, term);
    }

    if let Some(framework) = params.target_framework.as_deref()
        && !framework.is_empty()
    {
        records.retain(|p| p.target_frameworks.contains(framework));
    }

    if !params.include_prerelease {
        records.retain(|p| !p.version.contains("beta") && !p.version.contains("alpha"));
    }

    if let Some(order_by) = params.order_by.as_deref() {
        // unknown field names leave store-natural order
        if let Some(field) = feed::field(order_by) {
            records.sort_by(|a, b| field.value(a).compare(&field.value(b)));
            if params.order_by_descending {
                records.reverse();
            }
        }
    }

    // is_latest_version / is_absolute_latest_version: accepted, no effect

    records
}

/// Skip/take over the final ordered sequence
pub fn paginate(records: Vec<PackageRecord>, params: &QueryParameters) -> Vec<PackageRecord> {
    records
        .into_iter()
        .skip(params.skip)
        .take(params.take)
        .collect()
}

/// Union of the six search passes, deduplicated by composite key.
///
/// Pass order decides result order: all identifier-prefix matches come
/// before identifier-substring matches, and so on.
fn search_union(records: &[PackageRecord], term: &str) -> Vec<PackageRecord> {
    let passes: [fn(&PackageRecord, &str) -> bool; 6] = [
        |p, t| p.identifier.starts_with(t),
        |p, t| p.identifier.contains(t),
        |p, t| p.title.starts_with(t),
        |p, t| p.title.contains(t),
        |p, t| p.tags.as_deref().is_some_and(|tags| tags.contains(t)),
        |p, t| p.description.as_deref().is_some_and(|d| d.contains(t)),
    ];

    let mut seen = HashSet::new();
    let mut matched = Vec::new();
    for pass in passes {
        for record in records {
            if pass(record, term)
                && seen.insert((record.identifier.clone(), record.version.clone()))
            {
                matched.push(record.clone());
            }
        }
    }
    matched
}
