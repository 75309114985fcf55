//! In-memory vector index.
//!
//! Entries live in a `Vec` behind a shared `RwLock`; search is brute-force
//! cosine similarity over every stored vector. A [`Retriever`] handed out by
//! [`VectorIndex::retriever`] shares the same storage, so it always sees the
//! current contents of the index.

use std::collections::HashSet;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use anyhow::{bail, Result};

use crate::embedding::{cosine_similarity, embed_query, EmbeddingProvider};
use crate::models::{Chunk, IndexStats};

struct IndexEntry {
    chunk: Chunk,
    vector: Vec<f32>,
}

type Entries = Arc<RwLock<Vec<IndexEntry>>>;

fn read(entries: &Entries) -> RwLockReadGuard<'_, Vec<IndexEntry>> {
    entries.read().unwrap_or_else(|e| e.into_inner())
}

fn write(entries: &Entries) -> RwLockWriteGuard<'_, Vec<IndexEntry>> {
    entries.write().unwrap_or_else(|e| e.into_inner())
}

pub struct VectorIndex {
    entries: Entries,
    embeddings: Arc<dyn EmbeddingProvider>,
    batch_size: usize,
    top_k: usize,
}

impl VectorIndex {
    pub fn new(embeddings: Arc<dyn EmbeddingProvider>, batch_size: usize, top_k: usize) -> Self {
        Self {
            entries: Arc::new(RwLock::new(Vec::new())),
            embeddings,
            batch_size: batch_size.max(1),
            top_k: top_k.max(1),
        }
    }

    /// Embeds and stores the chunks.
    ///
    /// Every chunk is embedded before anything is inserted, so a failed
    /// embedding call leaves the index unchanged.
    pub async fn add(&self, chunks: &[Chunk]) -> Result<()> {
        let mut vectors = Vec::with_capacity(chunks.len());

        for batch in chunks.chunks(self.batch_size) {
            let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
            let embedded = self.embeddings.embed_texts(&texts).await?;
            if embedded.len() != batch.len() {
                bail!(
                    "embedding provider returned {} vectors for {} texts",
                    embedded.len(),
                    batch.len()
                );
            }
            tracing::debug!(batch = batch.len(), "embedded batch");
            vectors.extend(embedded);
        }

        let mut entries = write(&self.entries);
        entries.extend(
            chunks
                .iter()
                .cloned()
                .zip(vectors)
                .map(|(chunk, vector)| IndexEntry { chunk, vector }),
        );
        tracing::info!(added = chunks.len(), total = entries.len(), "indexed chunks");

        Ok(())
    }

    pub fn retriever(&self) -> Retriever {
        Retriever {
            entries: Arc::clone(&self.entries),
            embeddings: Arc::clone(&self.embeddings),
            top_k: self.top_k,
        }
    }

    /// Removes every entry.
    pub fn clear(&self) {
        let mut entries = write(&self.entries);
        let removed = entries.len();
        entries.clear();
        tracing::info!(removed, "cleared vector index");
    }

    pub fn len(&self) -> usize {
        read(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> IndexStats {
        let entries = read(&self.entries);
        let sources: HashSet<&str> = entries.iter().map(|e| e.chunk.source.as_str()).collect();
        IndexStats {
            entries: entries.len(),
            sources: sources.len(),
            dims: entries.first().map(|e| e.vector.len()),
        }
    }
}

/// Top-k similarity lookup against a [`VectorIndex`].
#[derive(Clone)]
pub struct Retriever {
    entries: Entries,
    embeddings: Arc<dyn EmbeddingProvider>,
    top_k: usize,
}

impl Retriever {
    /// Returns the `top_k` chunks most similar to `query`, best first.
    ///
    /// An empty index yields an empty result without calling the embedder.
    pub async fn retrieve(&self, query: &str) -> Result<Vec<Chunk>> {
        if read(&self.entries).is_empty() {
            return Ok(Vec::new());
        }

        let query_vec = embed_query(self.embeddings.as_ref(), query).await?;

        let entries = read(&self.entries);
        let mut scored: Vec<(f32, &IndexEntry)> = entries
            .iter()
            .map(|e| (cosine_similarity(&query_vec, &e.vector), e))
            .collect();
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

        Ok(scored
            .into_iter()
            .take(self.top_k)
            .map(|(_, e)| e.chunk.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Maps each text onto counts of a few marker words.
    struct KeywordEmbedder {
        calls: AtomicUsize,
    }

    impl KeywordEmbedder {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl EmbeddingProvider for KeywordEmbedder {
        fn model_name(&self) -> &str {
            "keyword"
        }

        async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(texts
                .iter()
                .map(|t| {
                    let t = t.to_lowercase();
                    ["cat", "dog", "fish"]
                        .iter()
                        .map(|w| t.matches(w).count() as f32)
                        .collect()
                })
                .collect())
        }
    }

    struct FailingEmbedder;

    #[async_trait]
    impl EmbeddingProvider for FailingEmbedder {
        fn model_name(&self) -> &str {
            "failing"
        }

        async fn embed_texts(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
            bail!("embedding service unavailable")
        }
    }

    fn chunk(text: &str, source: &str) -> Chunk {
        Chunk {
            text: text.to_string(),
            source: source.to_string(),
            page: 1,
        }
    }

    #[tokio::test]
    async fn empty_index_returns_nothing_without_embedding() {
        let embedder = Arc::new(KeywordEmbedder::new());
        let index = VectorIndex::new(embedder.clone(), 8, 4);
        let found = index.retriever().retrieve("cat").await.unwrap();
        assert!(found.is_empty());
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn retrieves_most_similar_first() {
        let index = VectorIndex::new(Arc::new(KeywordEmbedder::new()), 8, 2);
        index
            .add(&[
                chunk("a dog barks", "a.pdf"),
                chunk("the cat sleeps", "a.pdf"),
                chunk("a fish swims", "b.pdf"),
            ])
            .await
            .unwrap();

        let found = index.retriever().retrieve("where is the cat").await.unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].text, "the cat sleeps");
    }

    #[tokio::test]
    async fn add_batches_requests() {
        let embedder = Arc::new(KeywordEmbedder::new());
        let index = VectorIndex::new(embedder.clone(), 2, 4);
        let chunks: Vec<Chunk> = (0..5).map(|i| chunk(&format!("cat {}", i), "a.pdf")).collect();
        index.add(&chunks).await.unwrap();
        assert_eq!(index.len(), 5);
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn failed_embedding_leaves_index_unchanged() {
        let index = VectorIndex::new(Arc::new(FailingEmbedder), 8, 4);
        assert!(index.add(&[chunk("cat", "a.pdf")]).await.is_err());
        assert!(index.is_empty());
    }

    #[tokio::test]
    async fn clear_empties_index_and_live_retrievers() {
        let index = VectorIndex::new(Arc::new(KeywordEmbedder::new()), 8, 4);
        let retriever = index.retriever();
        index.add(&[chunk("cat", "a.pdf")]).await.unwrap();
        assert_eq!(retriever.retrieve("cat").await.unwrap().len(), 1);

        index.clear();
        index.clear();
        assert!(index.is_empty());
        assert!(retriever.retrieve("cat").await.unwrap().is_empty());
        assert_eq!(index.stats(), IndexStats::default());
    }

    #[tokio::test]
    async fn stats_count_entries_and_sources() {
        let index = VectorIndex::new(Arc::new(KeywordEmbedder::new()), 8, 4);
        index
            .add(&[
                chunk("cat", "a.pdf"),
                chunk("dog", "a.pdf"),
                chunk("fish", "b.pdf"),
            ])
            .await
            .unwrap();
        let stats = index.stats();
        assert_eq!(stats.entries, 3);
        assert_eq!(stats.sources, 2);
        assert_eq!(stats.dims, Some(3));
    }
}
