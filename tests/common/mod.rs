// tests/common/mod.rs
//! Shared fixtures: generated .nupkg archives and a scratch index database.

#![allow(dead_code)]

use std::io::Write;
use std::path::{Path, PathBuf};
use zip::write::{SimpleFileOptions, ZipWriter};

/// Minimal nuspec document for fixture packages
pub fn simple_nuspec(id: &str, version: &str, description: &str, tags: &str) -> String {
    format!(
        r#"<?xml version="1.0"?>
<package xmlns="http://schemas.microsoft.com/packaging/2013/05/nuspec.xsd">
  <metadata>
    <id>{id}</id>
    <version>{version}</version>
    <authors>Jane Dev</authors>
    <description>{description}</description>
    <tags>{tags}</tags>
  </metadata>
</package>"#
    )
}

/// Write a `.nupkg` named `<id>.<version>.nupkg` into `dir`
pub fn write_nupkg(
    dir: &Path,
    id: &str,
    version: &str,
    nuspec: &str,
    lib_folders: &[&str],
) -> PathBuf {
    let path = dir.join(format!("{id}.{version}.nupkg"));
    let file = std::fs::File::create(&path).unwrap();
    let mut writer = ZipWriter::new(file);

    writer
        .start_file(format!("{id}.nuspec"), SimpleFileOptions::default())
        .unwrap();
    writer.write_all(nuspec.as_bytes()).unwrap();

    for folder in lib_folders {
        writer
            .start_file(format!("lib/{folder}/{id}.dll"), SimpleFileOptions::default())
            .unwrap();
        writer.write_all(b"MZ").unwrap();
    }

    writer.finish().unwrap();
    path
}

/// Convenience wrapper for the common one-liner fixture
pub fn write_simple_nupkg(dir: &Path, id: &str, version: &str) -> PathBuf {
    let nuspec = simple_nuspec(id, version, "A test package.", "test");
    write_nupkg(dir, id, version, &nuspec, &["net461"])
}
