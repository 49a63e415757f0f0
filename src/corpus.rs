//! Loading a node collection from JSON.
//!
//! A corpus is either a single JSON file holding an array of nodes, or a directory tree of such
//! files. Directory entries are visited in file-name order so the resulting node order, and
//! therefore every ordered output of the pipeline, is stable across platforms.

use std::{
    fs::read_to_string,
    path::{Path, PathBuf},
};
use walkdir::WalkDir;

use crate::{error::DossierError, properties::Node};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Corpus {
    pub nodes: Vec<Node>,
    /// Files the nodes were read from, in load order.
    pub sources: Vec<PathBuf>,
}

impl Corpus {
    pub fn from_json_str(content: &str) -> Result<Corpus, DossierError> {
        let nodes: Vec<Node> = serde_json::from_str(content)?;
        Ok(Corpus {
            nodes,
            sources: vec![],
        })
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Corpus, DossierError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(DossierError::NotFound(format!("{}", path.display())));
        }
        if path.is_file() {
            let mut corpus = Corpus::from_json_str(&read_to_string(path)?)?;
            corpus.sources.push(path.to_path_buf());
            tracing::debug!("Loaded {} nodes from {:?}", corpus.nodes.len(), path);
            return Ok(corpus);
        }

        let mut corpus = Corpus::default();
        for entry in WalkDir::new(path).sort_by_file_name() {
            let entry = entry?;
            let is_json = entry.file_type().is_file()
                && entry
                    .path()
                    .extension()
                    .map(|ext| ext.eq_ignore_ascii_case("json"))
                    .unwrap_or(false);
            if !is_json {
                continue;
            }
            let content = read_to_string(entry.path())?;
            let nodes: Vec<Node> = serde_json::from_str(&content).map_err(|e| {
                DossierError::Serialization(format!("{}: {e}", entry.path().display()))
            })?;
            tracing::debug!("Loaded {} nodes from {:?}", nodes.len(), entry.path());
            corpus.nodes.extend(nodes);
            corpus.sources.push(entry.into_path());
        }
        Ok(corpus)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn to_json_string(&self) -> Result<String, DossierError> {
        Ok(serde_json::to_string_pretty(&self.nodes)?)
    }
}
