use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::analysis::compare_repositories;
use crate::error::Result;
use crate::models::{RepoRef, RepositoryResult};

const RESULT_PREFIX: &str = "metrics_";
const COMPARATIVE_FILE: &str = "comparative_analysis.json";

/// Pretty-printed JSON dumps: one file per repository plus a comparative
/// summary.
pub struct JsonStore {
    dir: PathBuf,
}

impl JsonStore {
    pub fn new<P: AsRef<Path>>(dir: P) -> Result<Self> {
        fs::create_dir_all(dir.as_ref())?;
        Ok(Self {
            dir: dir.as_ref().to_path_buf(),
        })
    }

    pub fn result_path(&self, repo: &RepoRef) -> PathBuf {
        self.dir
            .join(format!("{}{}_{}.json", RESULT_PREFIX, repo.owner, repo.name))
    }

    pub fn comparative_path(&self) -> PathBuf {
        self.dir.join(COMPARATIVE_FILE)
    }

    /// Writes every repository result and the comparative analysis.
    /// Returns the paths written.
    pub fn save_all(&self, results: &BTreeMap<String, RepositoryResult>) -> Result<Vec<PathBuf>> {
        let mut written = Vec::with_capacity(results.len() + 1);

        for result in results.values() {
            let path = self.result_path(&result.repository);
            write_json(&path, result)?;
            tracing::info!("Saved {}", path.display());
            written.push(path);
        }

        let path = self.comparative_path();
        write_json(&path, &compare_repositories(results))?;
        tracing::info!("Saved {}", path.display());
        written.push(path);

        Ok(written)
    }

    pub fn load(&self, repo: &RepoRef) -> Result<Option<RepositoryResult>> {
        let path = self.result_path(repo);
        if !path.exists() {
            return Ok(None);
        }
        let reader = BufReader::new(File::open(path)?);
        Ok(Some(serde_json::from_reader(reader)?))
    }

    /// Every repository result in the directory, keyed by `owner/name`.
    pub fn load_all(&self) -> Result<BTreeMap<String, RepositoryResult>> {
        let mut results = BTreeMap::new();

        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            let is_result = path
                .file_name()
                .and_then(|n| n.to_str())
                .map(|n| n.starts_with(RESULT_PREFIX) && n.ends_with(".json"))
                .unwrap_or(false);
            if !is_result {
                continue;
            }

            let reader = BufReader::new(File::open(&path)?);
            let result: RepositoryResult = serde_json::from_reader(reader)?;
            results.insert(result.repository.full_name(), result);
        }

        Ok(results)
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}
