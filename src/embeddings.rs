//! Embedding providers that turn text into fixed-length vectors.

use lazy_static::lazy_static;
use regex::Regex;
use rustc_hash::{FxHashMap, FxHashSet, FxHasher};
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};
use unicode_normalization::UnicodeNormalization;

use crate::config::{EmbeddingBackend, EmbeddingConfig};
use crate::error::{CorepError, Result};

/// Maps text to vectors of a uniform dimension.
///
/// Implementations must return identical vectors for identical input within
/// one process run.
pub trait EmbeddingProvider: Send + Sync {
    fn embed(&self, text: &str) -> Result<Vec<f32>>;

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|text| self.embed(text)).collect()
    }

    fn dimensions(&self) -> usize;

    fn model_name(&self) -> &str;
}

lazy_static! {
    static ref STOP_WORDS: FxHashSet<&'static str> = {
        let words = vec![
            "a", "an", "and", "are", "as", "at", "be", "by", "for", "from",
            "has", "he", "in", "is", "it", "its", "of", "on", "that", "the",
            "to", "was", "were", "will", "with", "shall", "or", "this",
        ];
        words.into_iter().collect()
    };
    static ref NON_WORD: Regex = Regex::new(r"[^\w\s]").expect("static regex");
}

/// Lowercased, NFC-normalised word tokens with punctuation and stop-words removed.
pub fn tokenize(text: &str) -> Vec<String> {
    let text = text.nfc().collect::<String>().to_lowercase();
    let text = NON_WORD.replace_all(&text, " ");

    text.split_whitespace()
        .filter(|&token| !STOP_WORDS.contains(token))
        .map(|token| token.to_string())
        .collect()
}

/// Local, dependency-free provider: term frequencies feature-hashed into a
/// fixed number of signed buckets, then L2-normalised.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dims: usize,
}

impl HashingEmbedder {
    pub fn new(dims: usize) -> Result<Self> {
        if dims == 0 {
            return Err(CorepError::Config(
                "embedding dimensions must be positive".to_string(),
            ));
        }
        Ok(HashingEmbedder { dims })
    }

    fn bucket(&self, token: &str) -> (usize, f32) {
        let mut hasher = FxHasher::default();
        token.hash(&mut hasher);
        let hash = hasher.finish();
        let sign = if hash >> 63 == 0 { 1.0 } else { -1.0 };
        ((hash % self.dims as u64) as usize, sign)
    }
}

impl EmbeddingProvider for HashingEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let tokens = tokenize(text);
        let mut vector = vec![0.0f32; self.dims];
        if tokens.is_empty() {
            return Ok(vector);
        }

        let mut term_freq: FxHashMap<&str, f32> = FxHashMap::default();
        for token in &tokens {
            *term_freq.entry(token.as_str()).or_insert(0.0) += 1.0;
        }

        let tokens_count = tokens.len() as f32;
        for (term, count) in term_freq {
            let (idx, sign) = self.bucket(term);
            vector[idx] += sign * count / tokens_count;
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|v| *v /= norm);
        }
        Ok(vector)
    }

    fn dimensions(&self) -> usize {
        self.dims
    }

    fn model_name(&self) -> &str {
        "hashing-tf"
    }
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

/// Blocking client for an OpenAI-compatible `/embeddings` endpoint.
pub struct OpenAiEmbedder {
    client: reqwest::blocking::Client,
    endpoint: String,
    api_key: String,
    model: String,
    dims: usize,
}

impl OpenAiEmbedder {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let api_key = config.api_key.clone().ok_or_else(|| {
            CorepError::Config("OpenAI embedding API key not set. Set OPENAI_API_KEY.".to_string())
        })?;
        Ok(OpenAiEmbedder {
            client: reqwest::blocking::Client::new(),
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            api_key,
            model: config.model.clone(),
            dims: config.dimensions,
        })
    }

    fn request(&self, texts: &[String]) -> std::result::Result<EmbeddingResponse, String> {
        let url = format!("{}/embeddings", self.endpoint);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&EmbeddingRequest {
                model: &self.model,
                input: texts,
            })
            .send()
            .map_err(|e| e.to_string())?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(format!("API error {status}: {body}"));
        }
        response.json().map_err(|e| e.to_string())
    }
}

impl EmbeddingProvider for OpenAiEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_batch(&[text.to_string()])?
            .into_iter()
            .next()
            .ok_or_else(|| CorepError::EmbeddingFailure("empty embedding response".to_string()))
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let response = self.request(texts).map_err(CorepError::EmbeddingFailure)?;
        check_response(texts.len(), self.dims, response)
    }

    fn dimensions(&self) -> usize {
        self.dims
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// One vector per requested text, each of the configured dimension.
fn check_response(
    expected: usize,
    dims: usize,
    response: EmbeddingResponse,
) -> Result<Vec<Vec<f32>>> {
    if response.data.len() != expected {
        return Err(CorepError::EmbeddingFailure(format!(
            "requested {} embeddings, received {}",
            expected,
            response.data.len()
        )));
    }

    let vectors: Vec<Vec<f32>> = response.data.into_iter().map(|d| d.embedding).collect();
    if let Some(bad) = vectors.iter().find(|v| v.len() != dims) {
        return Err(CorepError::EmbeddingFailure(format!(
            "expected {}-dimensional embeddings, received {}",
            dims,
            bad.len()
        )));
    }
    Ok(vectors)
}

pub fn provider_from_config(config: &EmbeddingConfig) -> Result<Box<dyn EmbeddingProvider>> {
    match config.provider {
        EmbeddingBackend::Hashing => Ok(Box::new(HashingEmbedder::new(config.dimensions)?)),
        EmbeddingBackend::OpenAi => Ok(Box::new(OpenAiEmbedder::new(config)?)),
    }
}
