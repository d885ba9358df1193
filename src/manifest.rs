// src/manifest.rs

//! Nuspec manifest parsing and normalization
//!
//! The manifest is the package's embedded descriptor document. Deserialization
//! goes through quick-xml's serde support; the awkward part of the format is
//! the `<dependencies>` element, which holds either a flat `<dependency>` list
//! or one or more `<group>` elements. Both shapes resolve to one canonical
//! group list before any flattening happens.
//!
//! Downstream clients parse the flattened dependency string, so its grammar
//! is fixed: entries render as `id`, `id:[version, )` or
//! `id:[version, ):moniker`; a group with no dependencies but a framework
//! renders as `::moniker`; groups and entries alike are joined with `|`.

use crate::error::{Error, Result};
use serde::Deserialize;

/// Long framework-family names as they appear in nuspec `targetFramework`
/// attributes, with the moniker prefix each maps to.
const NETFRAMEWORK_NAME: &str = ".NETFramework";
const NETFRAMEWORK_MONIKER: &str = "net";
const NETCOREAPP_NAME: &str = ".NETCoreApp";
const NETCOREAPP_MONIKER: &str = "netcoreapp";
const NETSTANDARD_NAME: &str = ".NETStandard";
const NETSTANDARD_MONIKER: &str = "netstandard";

/// Root of a nuspec document
#[derive(Debug, Deserialize)]
pub struct Nuspec {
    pub metadata: NuspecMetadata,
    /// `<files>` section; present in real manifests, unused by the indexer
    #[serde(default)]
    pub files: Option<NuspecFiles>,
}

#[derive(Debug, Deserialize)]
pub struct NuspecMetadata {
    #[serde(rename = "@minClientVersion")]
    pub min_client_version: Option<String>,
    pub id: String,
    pub version: String,
    pub title: Option<String>,
    pub authors: Option<String>,
    pub owners: Option<String>,
    #[serde(rename = "licenseUrl")]
    pub license_url: Option<String>,
    #[serde(rename = "projectUrl")]
    pub project_url: Option<String>,
    #[serde(rename = "iconUrl")]
    pub icon_url: Option<String>,
    #[serde(rename = "requireLicenseAcceptance", default)]
    pub require_license_acceptance: bool,
    #[serde(rename = "developmentDependency")]
    pub development_dependency: Option<String>,
    pub description: Option<String>,
    pub summary: Option<String>,
    #[serde(rename = "releaseNotes")]
    pub release_notes: Option<String>,
    pub copyright: Option<String>,
    pub language: Option<String>,
    pub tags: Option<String>,
    #[serde(default)]
    pub dependencies: Option<NuspecDependencies>,
}

#[derive(Debug, Default, Deserialize)]
pub struct NuspecDependencies {
    #[serde(rename = "$value", default)]
    items: Vec<DependencyItem>,
}

/// The two shapes a `<dependencies>` child can take
#[derive(Debug, Deserialize)]
enum DependencyItem {
    #[serde(rename = "dependency")]
    Dependency(NuspecDependency),
    #[serde(rename = "group")]
    Group(NuspecDependencyGroup),
}

#[derive(Debug, Clone, Deserialize)]
pub struct NuspecDependency {
    #[serde(rename = "@id")]
    pub id: String,
    #[serde(rename = "@version")]
    pub version: Option<String>,
    #[serde(rename = "@include")]
    pub include: Option<String>,
    #[serde(rename = "@exclude")]
    pub exclude: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NuspecDependencyGroup {
    #[serde(rename = "@targetFramework")]
    pub target_framework: Option<String>,
    #[serde(rename = "dependency", default)]
    pub dependencies: Vec<NuspecDependency>,
}

#[derive(Debug, Deserialize)]
pub struct NuspecFiles {
    #[serde(rename = "file", default)]
    pub files: Vec<NuspecFile>,
}

#[derive(Debug, Deserialize)]
pub struct NuspecFile {
    #[serde(rename = "@src")]
    pub src: String,
    #[serde(rename = "@target")]
    pub target: Option<String>,
    #[serde(rename = "@exclude")]
    pub exclude: Option<String>,
}

/// Parse a nuspec document from raw manifest bytes
pub fn parse(bytes: &[u8]) -> Result<Nuspec> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| Error::format(format!("manifest is not valid UTF-8: {e}")))?;
    quick_xml::de::from_str(text).map_err(|e| Error::format(format!("malformed manifest: {e}")))
}

impl NuspecDependencies {
    /// Resolve the flat-list-or-groups shape into one canonical group list.
    ///
    /// A flat list becomes a single ungrouped group. Mixing `<dependency>`
    /// and `<group>` at the same level is malformed.
    pub fn into_groups(self) -> Result<Vec<NuspecDependencyGroup>> {
        let mut flat = Vec::new();
        let mut groups = Vec::new();
        for item in self.items {
            match item {
                DependencyItem::Dependency(dep) => flat.push(dep),
                DependencyItem::Group(group) => groups.push(group),
            }
        }
        match (flat.is_empty(), groups.is_empty()) {
            (true, _) => Ok(groups),
            (false, true) => Ok(vec![NuspecDependencyGroup {
                target_framework: None,
                dependencies: flat,
            }]),
            (false, false) => Err(Error::format(
                "manifest mixes grouped and ungrouped dependencies",
            )),
        }
    }
}

impl NuspecMetadata {
    /// Title falls back to the identifier when the manifest supplies none
    pub fn title_or_id(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.id)
    }
}

/// Map a long framework-family name to its canonical moniker.
///
/// `.NETFramework4.6.1` becomes `net461` (dots stripped); `.NETCoreApp2.0`
/// and `.NETStandard2.0` keep their version as-is. Anything else is a
/// format error rather than silently dropped data.
pub fn framework_name_to_moniker(framework_name: &str) -> Result<String> {
    if framework_name.contains(NETFRAMEWORK_NAME) {
        let version = framework_name.replace(NETFRAMEWORK_NAME, "");
        return Ok(format!(
            "{NETFRAMEWORK_MONIKER}{}",
            version.replace('.', "")
        ));
    }
    if framework_name.contains(NETCOREAPP_NAME) {
        let version = framework_name.replace(NETCOREAPP_NAME, "");
        return Ok(format!("{NETCOREAPP_MONIKER}{version}"));
    }
    if framework_name.contains(NETSTANDARD_NAME) {
        let version = framework_name.replace(NETSTANDARD_NAME, "");
        return Ok(format!("{NETSTANDARD_MONIKER}{version}"));
    }
    Err(Error::format(format!(
        "unrecognized framework family: {framework_name}"
    )))
}

/// Monikers a library folder satisfies, for indexing and search.
///
/// netstandard libraries are consumable from the frameworks that implement
/// that standard version, so those folders expand to a fixed compatibility
/// set. Everything else stands for itself.
pub fn compatible_framework_names(folder: &str) -> Vec<String> {
    if folder.contains(NETSTANDARD_MONIKER) {
        netstandard_compatible_monikers(folder)
    } else {
        vec![folder.to_string()]
    }
}

fn netstandard_compatible_monikers(moniker: &str) -> Vec<String> {
    let names: &[&str] = match moniker {
        "netstandard1.6" => &[
            "netstandard1.6",
            "netstandard2.0",
            "net461",
            "netcoreapp1.0",
            "netcoreapp1.1",
        ],
        "netstandard2.0" => &["netstandard2.0", "net461", "netcoreapp2.0"],
        _ => &[],
    };
    names.iter().map(|s| s.to_string()).collect()
}

/// Comma-joined target-framework string over the archive's lib folders
pub fn target_frameworks_string(lib_folders: &[String]) -> String {
    lib_folders
        .iter()
        .flat_map(|folder| compatible_framework_names(folder))
        .collect::<Vec<_>>()
        .join(",")
}

/// Prerelease detection for the stored flag.
///
/// Deliberately a bare substring test on `beta`, not a semver pre-release
/// parse; the query-side default filter has its own, wider rule.
pub fn is_prerelease(version: &str) -> bool {
    version.contains("beta")
}

/// Flatten canonical dependency groups into the stored dependency string
pub fn dependency_string(groups: &[NuspecDependencyGroup]) -> Result<String> {
    let rendered: Vec<String> = groups
        .iter()
        .map(render_group)
        .collect::<Result<Vec<_>>>()?;
    Ok(rendered.join("|"))
}

fn render_group(group: &NuspecDependencyGroup) -> Result<String> {
    if group.dependencies.is_empty() {
        return match &group.target_framework {
            Some(framework) => Ok(format!("::{}", framework_name_to_moniker(framework)?)),
            None => Ok(String::new()),
        };
    }

    let entries: Vec<String> = match &group.target_framework {
        None => group
            .dependencies
            .iter()
            .map(|dep| match dep.version.as_deref() {
                None | Some("") => dep.id.clone(),
                Some(version) => format!("{}:[{version}, )", dep.id),
            })
            .collect(),
        Some(framework) => {
            let moniker = framework_name_to_moniker(framework)?;
            group
                .dependencies
                .iter()
                .map(|dep| {
                    format!(
                        "{}:[{}, ):{moniker}",
                        dep.id,
                        dep.version.as_deref().unwrap_or_default()
                    )
                })
                .collect()
        }
    };
    Ok(entries.join("|"))
}
