//! Artifact directory walking
//!
//! Expects one subdirectory per build number, each holding that build's
//! JSON artifacts:
//!
//! ```text
//! artifacts/
//!   1041/APIResponsiveness_density.json
//!   1041/ResourceUsageSummary_density.json
//!   1042/...
//! ```

use anyhow::{Context, Result};
use perfdash_lib::{ArtifactRules, BuildData, DisambiguationRules};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Reads build artifacts from disk and feeds them to the decoders
pub struct Collector {
    rules: ArtifactRules,
    normalizer: DisambiguationRules,
}

impl Collector {
    pub fn new(rules: ArtifactRules, normalizer: DisambiguationRules) -> Self {
        Self { rules, normalizer }
    }

    /// Decode every recognized artifact under `root`, oldest build first
    pub fn collect(&self, root: &Path) -> Result<BuildData> {
        let builds = list_builds(root)?;
        let mut result = BuildData::new();
        let mut decoded_files = 0usize;

        for (build_number, dir) in builds {
            decoded_files += self.collect_build(build_number, &dir, &mut result);
        }

        info!(
            builds = result.build_count(),
            files = decoded_files,
            version = %result.version,
            "Collected build artifacts"
        );
        Ok(result)
    }

    /// Returns the number of files handed to a decoder
    fn collect_build(&self, build_number: u64, dir: &Path, result: &mut BuildData) -> usize {
        let files = match list_files(dir) {
            Ok(files) => files,
            Err(e) => {
                warn!(build = build_number, error = %e, "Failed to list build directory");
                return 0;
            }
        };

        let mut decoded = 0;
        for path in files {
            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();

            let Some(kind) = self.rules.classify(&file_name) else {
                debug!(build = build_number, file = %file_name, "Ignoring unrecognized artifact");
                continue;
            };

            let data = match fs::read(&path) {
                Ok(data) => data,
                Err(e) => {
                    warn!(build = build_number, file = %file_name, error = %e, "Failed to read artifact");
                    continue;
                }
            };

            let report = kind.decode_with(&data, build_number, result, &self.normalizer);
            debug!(
                build = build_number,
                file = %file_name,
                kind = ?kind,
                appended = report.appended_count(),
                "Decoded artifact"
            );
            decoded += 1;
        }

        decoded
    }
}

/// Numbered build directories under `root`, ascending
fn list_builds(root: &Path) -> Result<Vec<(u64, PathBuf)>> {
    let entries = fs::read_dir(root)
        .with_context(|| format!("Failed to read artifact directory {}", root.display()))?;

    let mut builds = Vec::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("Failed to read {}", root.display()))?;
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }

        let name = entry.file_name().to_string_lossy().to_string();
        match name.parse::<u64>() {
            Ok(build_number) => builds.push((build_number, path)),
            Err(_) => debug!(dir = %name, "Skipping non-build directory"),
        }
    }

    builds.sort_by_key(|(build_number, _)| *build_number);
    Ok(builds)
}

/// Regular files in `dir`, sorted by name
fn list_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
