use std::sync::{Mutex, OnceLock};
use tracing::{debug, info};

use crate::corpus::Corpus;
use crate::embeddings::EmbeddingProvider;
use crate::error::Result;
use crate::vector_db::{RetrievalResult, VectorDB};

/// Embeds questions and searches the corpus index.
///
/// The index is built from the corpus on first use and then reused for the
/// lifetime of the retriever. Construction runs at most once even when
/// several threads hit the first call together; a failed build leaves the
/// retriever unbuilt so a later call can try again.
pub struct Retriever {
    corpus: Corpus,
    embedder: Box<dyn EmbeddingProvider>,
    index: OnceLock<VectorDB>,
    build_guard: Mutex<()>,
}

impl Retriever {
    pub fn new(corpus: Corpus, embedder: Box<dyn EmbeddingProvider>) -> Self {
        Retriever {
            corpus,
            embedder,
            index: OnceLock::new(),
            build_guard: Mutex::new(()),
        }
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    pub fn is_index_built(&self) -> bool {
        self.index.get().is_some()
    }

    /// The built index, constructing it if this is the first call.
    pub fn index(&self) -> Result<&VectorDB> {
        if let Some(index) = self.index.get() {
            return Ok(index);
        }

        // A poisoned guard only means another builder panicked; the OnceLock
        // is still consistent.
        let _guard = self
            .build_guard
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(index) = self.index.get() {
            return Ok(index);
        }

        info!(
            passages = self.corpus.len(),
            model = self.embedder.model_name(),
            "building similarity index"
        );
        let texts: Vec<String> = self.corpus.passages().iter().map(|p| p.body.clone()).collect();
        let vectors = self.embedder.embed_batch(&texts)?;

        let mut index = VectorDB::new();
        index.build(self.corpus.passages().to_vec(), vectors)?;
        Ok(self.index.get_or_init(|| index))
    }

    pub fn retrieve(&self, query: &str, top_k: usize) -> Result<RetrievalResult> {
        let index = self.index()?;
        let query_vector = self.embedder.embed(query)?;
        let results = index.search(&query_vector, top_k)?;

        for hit in &results {
            debug!(
                id = %hit.passage.id,
                source = %hit.passage.source,
                locator = %hit.passage.locator,
                distance = hit.distance,
                "retrieved passage"
            );
        }
        Ok(results)
    }
}
