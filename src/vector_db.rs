use ndarray::{Array1, Array2, ArrayView1, Axis};
use tracing::debug;

use crate::corpus::Passage;
use crate::error::{CorepError, Result};

/// A passage and its squared Euclidean distance to the query.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredPassage {
    pub passage: Passage,
    pub distance: f32,
}

/// Ranked nearest-first, at most `k` long.
pub type RetrievalResult = Vec<ScoredPassage>;

/// Exact k-nearest-neighbour index over passage embeddings.
///
/// Brute force is fine for a corpus of tens of passages. Any replacement
/// search strategy must keep the same ordering: ascending distance, ties
/// in insertion order.
#[derive(Debug, Default)]
pub struct VectorDB {
    passages: Vec<Passage>,
    embeddings: Option<Array2<f32>>,
}

impl VectorDB {
    pub fn new() -> Self {
        VectorDB::default()
    }

    /// Associates each passage with its vector, replacing any previous build.
    pub fn build(&mut self, passages: Vec<Passage>, vectors: Vec<Vec<f32>>) -> Result<()> {
        if passages.len() != vectors.len() {
            return Err(CorepError::LengthMismatch {
                passages: passages.len(),
                vectors: vectors.len(),
            });
        }

        let dims = vectors.first().map_or(0, Vec::len);
        if let Some(bad) = vectors.iter().find(|v| v.len() != dims) {
            return Err(CorepError::DimensionMismatch {
                expected: dims,
                found: bad.len(),
            });
        }

        let flat: Vec<f32> = vectors.into_iter().flatten().collect();
        let matrix = Array2::from_shape_vec((passages.len(), dims), flat).map_err(|_| {
            CorepError::DimensionMismatch {
                expected: dims,
                found: 0,
            }
        })?;

        debug!(passages = passages.len(), dims, "similarity index built");
        self.passages = passages;
        self.embeddings = Some(matrix);
        Ok(())
    }

    pub fn is_built(&self) -> bool {
        self.embeddings.is_some()
    }

    pub fn len(&self) -> usize {
        self.passages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passages.is_empty()
    }

    /// Vector dimension, or `None` before `build`.
    pub fn dimensions(&self) -> Option<usize> {
        self.embeddings.as_ref().map(|m| m.ncols())
    }

    /// The `k` passages nearest to `query`. `k` is clamped to the corpus size
    /// and `k == 0` gives an empty result.
    pub fn search(&self, query: &[f32], k: usize) -> Result<RetrievalResult> {
        let embeddings = self.embeddings.as_ref().ok_or(CorepError::IndexNotBuilt)?;
        if k == 0 || self.passages.is_empty() {
            return Ok(Vec::new());
        }
        if query.len() != embeddings.ncols() {
            return Err(CorepError::DimensionMismatch {
                expected: embeddings.ncols(),
                found: query.len(),
            });
        }

        let query = ArrayView1::from(query);
        let mut distances: Vec<(usize, f32)> = embeddings
            .axis_iter(Axis(0))
            .enumerate()
            .map(|(i, row)| (i, squared_euclidean(row, query)))
            .collect();

        // sort_by is stable, so equal distances keep insertion order
        distances.sort_by(|a, b| a.1.total_cmp(&b.1));

        Ok(distances
            .into_iter()
            .take(k)
            .map(|(i, distance)| ScoredPassage {
                passage: self.passages[i].clone(),
                distance,
            })
            .collect())
    }
}

fn squared_euclidean(a: ArrayView1<f32>, b: ArrayView1<f32>) -> f32 {
    let diff: Array1<f32> = &a - &b;
    diff.dot(&diff)
}
