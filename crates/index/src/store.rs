//! Persistent vector store
//!
//! Pairs the flat index with two parallel sequences (source texts and
//! metadata maps) and persists both: the vectors as a binary snapshot,
//! the texts/metadatas as a JSON sidecar. Corrupted persisted state is
//! never fatal — the store degrades to the safest empty state, logs a
//! warning, and continues.
//!
//! Writes follow a single-writer discipline: callers serialize
//! `add`+`save` externally, while reads of a loaded instance are safe to
//! run concurrently with other reads.

use crate::flat::{FlatIpIndex, IndexSnapshot};
use polyglot_common::errors::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Per-record metadata map
///
/// Always carries `source` (provenance identifier) and `lang` (language
/// of the source text); may carry `table_html` and `image_path`.
pub type Metadata = BTreeMap<String, String>;

/// Index file name within the persist directory
const INDEX_FILE: &str = "vectors.bin";

/// Metadata sidecar file name within the persist directory
const META_FILE: &str = "meta.json";

/// A retrieval hit: source text, metadata, and inner-product score
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub text: String,
    pub metadata: Metadata,
    pub score: f32,
}

/// Sidecar schema: parallel texts and metadata maps
#[derive(Debug, Default, Serialize, Deserialize)]
struct MetaSidecar {
    texts: Vec<String>,
    metadatas: Vec<Metadata>,
}

/// Persistent nearest-neighbor store over fixed-dimension vectors
pub struct VectorStore {
    index: FlatIpIndex,
    texts: Vec<String>,
    metadatas: Vec<Metadata>,
    index_path: PathBuf,
    meta_path: PathBuf,
}

impl VectorStore {
    /// Open a store at `persist_dir`, loading any persisted state
    ///
    /// A missing or unparsable sidecar degrades to an empty metadata set;
    /// a corrupt or dimension-incompatible index file degrades to an
    /// empty index. Nothing persisted yields a fresh empty store.
    pub fn open(dimension: usize, persist_dir: impl AsRef<Path>) -> Result<Self> {
        if dimension == 0 {
            return Err(AppError::Validation {
                message: "index dimension must be non-zero".to_string(),
            });
        }

        let dir = persist_dir.as_ref();
        fs::create_dir_all(dir)?;

        let index_path = dir.join(INDEX_FILE);
        let meta_path = dir.join(META_FILE);

        let index = if index_path.exists() {
            Self::load_index(&index_path, dimension)
        } else {
            FlatIpIndex::new(dimension)
        };

        let (texts, metadatas) = if index_path.exists() {
            Self::load_sidecar(&meta_path)
        } else {
            (Vec::new(), Vec::new())
        };

        debug!(
            records = index.len(),
            dimension,
            dir = %dir.display(),
            "Opened vector store"
        );

        Ok(Self {
            index,
            texts,
            metadatas,
            index_path,
            meta_path,
        })
    }

    fn load_index(path: &Path, dimension: usize) -> FlatIpIndex {
        let loaded = fs::read(path)
            .map_err(AppError::from)
            .and_then(|bytes| {
                bincode::deserialize::<IndexSnapshot>(&bytes).map_err(|e| AppError::Index {
                    message: format!("failed to decode index file: {}", e),
                })
            })
            .and_then(FlatIpIndex::from_snapshot);

        match loaded {
            Ok(index) if index.dimension() == dimension => index,
            Ok(index) => {
                warn!(
                    persisted = index.dimension(),
                    configured = dimension,
                    "Persisted index dimension disagrees with configuration, starting empty"
                );
                FlatIpIndex::new(dimension)
            }
            Err(e) => {
                warn!(error = %e, "Failed to load index file, starting empty");
                FlatIpIndex::new(dimension)
            }
        }
    }

    fn load_sidecar(path: &Path) -> (Vec<String>, Vec<Metadata>) {
        if !path.exists() {
            warn!(path = %path.display(), "Metadata sidecar missing, starting with empty metadata");
            return (Vec::new(), Vec::new());
        }

        match fs::read_to_string(path)
            .map_err(AppError::from)
            .and_then(|raw| serde_json::from_str::<MetaSidecar>(&raw).map_err(AppError::from))
        {
            Ok(sidecar) => (sidecar.texts, sidecar.metadatas),
            Err(e) => {
                warn!(error = %e, "Failed to read metadata sidecar, starting with empty metadata");
                (Vec::new(), Vec::new())
            }
        }
    }

    /// Append records to the store
    ///
    /// The three sequences must have equal length; violating that is a
    /// programming error in the caller. An empty batch is a no-op.
    /// Vectors of the wrong dimension are a runtime error.
    pub fn add(
        &mut self,
        vectors: &[Vec<f32>],
        texts: &[String],
        metadatas: &[Metadata],
    ) -> Result<()> {
        assert_eq!(
            vectors.len(),
            texts.len(),
            "vectors and texts must be parallel sequences"
        );
        assert_eq!(
            vectors.len(),
            metadatas.len(),
            "vectors and metadatas must be parallel sequences"
        );

        if vectors.is_empty() {
            return Ok(());
        }

        self.index.add(vectors)?;
        self.texts.extend_from_slice(texts);
        self.metadatas.extend_from_slice(metadatas);
        Ok(())
    }

    /// Return up to `k` results by descending inner product
    ///
    /// `k` is clamped to the record count; an empty store returns an
    /// empty list. A position with no sidecar entry (index/metadata
    /// desync) yields an empty text/metadata rather than failing the
    /// whole search.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchResult>> {
        let hits = self.index.search(query, k)?;

        Ok(hits
            .into_iter()
            .map(|(position, score)| SearchResult {
                text: self.texts.get(position).cloned().unwrap_or_default(),
                metadata: self.metadatas.get(position).cloned().unwrap_or_default(),
                score,
            })
            .collect())
    }

    /// Persist the index and its metadata sidecar
    ///
    /// Both files are written to a temporary path and renamed into
    /// place, so a reload reproduces the same searchable state.
    /// Repeated saves of unchanged state are safe.
    pub fn save(&self) -> Result<()> {
        let snapshot = self.index.snapshot();
        let encoded = bincode::serialize(&snapshot).map_err(|e| AppError::Persistence {
            message: format!("failed to encode index: {}", e),
        })?;
        write_atomic(&self.index_path, &encoded)?;

        let sidecar = MetaSidecar {
            texts: self.texts.clone(),
            metadatas: self.metadatas.clone(),
        };
        // serde_json leaves non-ASCII unescaped, matching the sidecar contract
        let raw = serde_json::to_string(&sidecar)?;
        write_atomic(&self.meta_path, raw.as_bytes())?;

        debug!(records = self.len(), "Saved vector store");
        Ok(())
    }

    /// Number of stored records
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Vector dimension this store was opened with
    pub fn dimension(&self) -> usize {
        self.index.dimension()
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)?;
    Ok(())
}
