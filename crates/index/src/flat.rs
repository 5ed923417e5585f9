//! Flat inner-product index
//!
//! Exact nearest-neighbor search by brute-force scan. Scores are raw
//! inner products; callers normalize vectors beforehand if cosine
//! semantics are desired. Results are ordered by descending score with
//! ties broken by insertion order, so a fixed index state always ranks
//! identically.

use polyglot_common::errors::{AppError, Result};
use serde::{Deserialize, Serialize};

/// In-memory flat index over fixed-dimension vectors
#[derive(Debug, Clone)]
pub struct FlatIpIndex {
    dimension: usize,
    // Row-major storage, one vector per `dimension` floats
    data: Vec<f32>,
}

/// Serializable snapshot of the index state
#[derive(Debug, Serialize, Deserialize)]
pub struct IndexSnapshot {
    pub dimension: usize,
    pub data: Vec<f32>,
}

impl FlatIpIndex {
    /// Create an empty index for the given dimension
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            data: Vec::new(),
        }
    }

    /// Rebuild an index from a persisted snapshot
    pub fn from_snapshot(snapshot: IndexSnapshot) -> Result<Self> {
        if snapshot.dimension == 0 || snapshot.data.len() % snapshot.dimension != 0 {
            return Err(AppError::Index {
                message: format!(
                    "snapshot of {} floats does not divide into dimension {}",
                    snapshot.data.len(),
                    snapshot.dimension
                ),
            });
        }
        Ok(Self {
            dimension: snapshot.dimension,
            data: snapshot.data,
        })
    }

    /// Capture the current state for persistence
    pub fn snapshot(&self) -> IndexSnapshot {
        IndexSnapshot {
            dimension: self.dimension,
            data: self.data.clone(),
        }
    }

    /// Number of stored vectors
    pub fn len(&self) -> usize {
        if self.dimension == 0 {
            0
        } else {
            self.data.len() / self.dimension
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Vector dimension this index was created with
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Append vectors to the index
    pub fn add(&mut self, vectors: &[Vec<f32>]) -> Result<()> {
        for vector in vectors {
            if vector.len() != self.dimension {
                return Err(AppError::DimensionMismatch {
                    expected: self.dimension,
                    actual: vector.len(),
                });
            }
        }
        for vector in vectors {
            self.data.extend_from_slice(vector);
        }
        Ok(())
    }

    /// Return up to `k` (position, score) pairs by descending inner product
    ///
    /// `k` is clamped to the number of stored vectors; an empty index
    /// returns an empty list.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<(usize, f32)>> {
        if query.len() != self.dimension {
            return Err(AppError::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }

        if self.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        let mut scored: Vec<(usize, f32)> = self
            .data
            .chunks_exact(self.dimension)
            .enumerate()
            .map(|(i, row)| (i, dot(row, query)))
            .collect();

        // Descending score; equal scores keep insertion order
        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });

        scored.truncate(k.min(self.len()));
        Ok(scored)
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_search() {
        let mut index = FlatIpIndex::new(3);
        index
            .add(&[
                vec![1.0, 0.0, 0.0],
                vec![0.0, 1.0, 0.0],
                vec![0.0, 0.0, 1.0],
            ])
            .unwrap();

        let results = index.search(&[0.0, 1.0, 0.0], 2).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].0, 1);
        assert!((results[0].1 - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_k_clamped_to_len() {
        let mut index = FlatIpIndex::new(2);
        index.add(&[vec![1.0, 0.0], vec![0.0, 1.0]]).unwrap();

        let results = index.search(&[1.0, 1.0], 10).unwrap();
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn test_empty_index_returns_nothing() {
        let index = FlatIpIndex::new(4);
        let results = index.search(&[0.0; 4], 5).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_dimension_mismatch_rejected() {
        let mut index = FlatIpIndex::new(3);
        assert!(index.add(&[vec![1.0, 2.0]]).is_err());
        assert!(index.search(&[1.0, 2.0], 1).is_err());
    }

    #[test]
    fn test_equal_scores_keep_insertion_order() {
        let mut index = FlatIpIndex::new(2);
        index
            .add(&[vec![1.0, 0.0], vec![1.0, 0.0], vec![1.0, 0.0]])
            .unwrap();

        let results = index.search(&[1.0, 0.0], 3).unwrap();
        let positions: Vec<usize> = results.iter().map(|r| r.0).collect();
        assert_eq!(positions, vec![0, 1, 2]);
    }

    #[test]
    fn test_snapshot_round_trip() {
        let mut index = FlatIpIndex::new(2);
        index.add(&[vec![0.5, 0.5], vec![0.1, 0.9]]).unwrap();

        let restored = FlatIpIndex::from_snapshot(index.snapshot()).unwrap();
        assert_eq!(restored.len(), 2);
        assert_eq!(restored.dimension(), 2);
    }

    #[test]
    fn test_corrupt_snapshot_rejected() {
        let snapshot = IndexSnapshot {
            dimension: 3,
            data: vec![1.0, 2.0],
        };
        assert!(FlatIpIndex::from_snapshot(snapshot).is_err());
    }
}
