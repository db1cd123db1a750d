//! Serialization of a bundle for the apply step.

use anyhow::{Context, bail};
use pkg_constants::paths::MANIFEST_EXTENSION;
use pkg_types::descriptor::ResourceDescriptor;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// A `v1/List`, which `kubectl apply -f` accepts as a single JSON document.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct List<'a> {
    api_version: &'static str,
    kind: &'static str,
    items: &'a [ResourceDescriptor],
}

/// One YAML document per descriptor, in bundle order.
pub fn render_yaml(descriptors: &[ResourceDescriptor]) -> anyhow::Result<String> {
    let mut out = String::new();
    for descriptor in descriptors {
        let doc = serde_yaml::to_string(descriptor)
            .with_context(|| format!("failed to serialize {}", descriptor))?;
        out.push_str("---\n");
        out.push_str(&doc);
    }
    Ok(out)
}

pub fn render_json(descriptors: &[ResourceDescriptor]) -> anyhow::Result<String> {
    let list = List {
        api_version: "v1",
        kind: "List",
        items: descriptors,
    };
    let mut out = serde_json::to_string_pretty(&list).context("failed to serialize bundle")?;
    out.push('\n');
    Ok(out)
}

/// `NN-<kind>-<name>.yaml`; the position prefix keeps lexical order equal to
/// bundle order.
pub fn manifest_file_name(position: usize, descriptor: &ResourceDescriptor) -> String {
    format!(
        "{:02}-{}-{}.{}",
        position,
        descriptor.kind().to_string().to_lowercase(),
        descriptor.name(),
        MANIFEST_EXTENSION
    )
}

/// Write each descriptor to its own file under `dir`. Returns the written
/// paths in bundle order.
///
/// `dir` must be missing or empty, so no stale manifest from an earlier run
/// gets applied alongside the new ones. Files are staged in a sibling
/// directory and renamed into place once all of them are written.
pub fn write_manifests(
    dir: &Path,
    descriptors: &[ResourceDescriptor],
) -> anyhow::Result<Vec<PathBuf>> {
    if dir.exists() {
        let mut entries = std::fs::read_dir(dir)
            .with_context(|| format!("failed to read output directory {}", dir.display()))?;
        if entries.next().is_some() {
            bail!("output directory {} is not empty", dir.display());
        }
    }

    let parent = match dir.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent)
        .with_context(|| format!("failed to create {}", parent.display()))?;
    let staging = tempfile::Builder::new()
        .prefix(".ksm-manifests-")
        .tempdir_in(parent)
        .with_context(|| format!("failed to create staging directory in {}", parent.display()))?;

    let mut names = Vec::with_capacity(descriptors.len());
    for (i, descriptor) in descriptors.iter().enumerate() {
        let name = manifest_file_name(i + 1, descriptor);
        let path = staging.path().join(&name);
        let doc = serde_yaml::to_string(descriptor)
            .with_context(|| format!("failed to serialize {}", descriptor))?;
        std::fs::write(&path, doc)
            .with_context(|| format!("failed to write {}", path.display()))?;
        debug!("Staged {} as {}", descriptor, name);
        names.push(name);
    }

    if dir.exists() {
        std::fs::remove_dir(dir)
            .with_context(|| format!("failed to replace {}", dir.display()))?;
    }
    std::fs::rename(staging.path(), dir)
        .with_context(|| format!("failed to move manifests into {}", dir.display()))?;

    let written: Vec<PathBuf> = names.iter().map(|name| dir.join(name)).collect();
    info!("Wrote {} manifests to {}", written.len(), dir.display());
    Ok(written)
}
