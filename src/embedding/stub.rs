//! Deterministic feature-hashing encoder used when no model is configured.
//!
//! Each lowercase token adds `±1` to a BLAKE3-chosen bucket; the vector is then
//! L2-normalized. Profiles sharing skills get proportionally similar vectors, which is
//! enough for tests and model-less deployments.

use tracing::debug;

use crate::hashing::hash_token;

/// Splits skill text into lowercase tokens. `+`, `#` and `.` stay inside tokens
/// (`C++`, `C#`, `Node.js`).
pub fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| c.is_whitespace() || c == ',' || c == '/' || c == ';')
        .map(|t| {
            t.trim_matches(|c: char| !(c.is_alphanumeric() || c == '+' || c == '#'))
                .to_lowercase()
        })
        .filter(|t| !t.is_empty())
}

/// Feature-hashed, L2-normalized bag of tokens. Text with no word tokens (only
/// punctuation, say) hashes as a single raw token; blank text yields the zero vector.
pub fn hashed_bag_of_words(text: &str, dim: usize) -> Vec<f32> {
    let mut embedding = vec![0.0f32; dim];
    if dim == 0 {
        return embedding;
    }

    let mut tokens = tokenize(text).peekable();
    if tokens.peek().is_none() {
        let raw = text.trim();
        if !raw.is_empty() {
            let (bucket, sign) = hash_token(raw, dim);
            embedding[bucket] += sign;
        }
    }
    for token in tokens {
        let (bucket, sign) = hash_token(&token, dim);
        embedding[bucket] += sign;
    }

    let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in &mut embedding {
            *x /= norm;
        }
    }

    debug!(text_len = text.len(), "Generated stub embedding");
    embedding
}

#[derive(Debug, Clone)]
pub struct HashingEncoder {
    dim: usize,
}

impl HashingEncoder {
    pub fn new(dim: usize) -> Self {
        Self { dim }
    }

    pub fn output_dim(&self) -> usize {
        self.dim
    }

    pub fn encode(&self, texts: &[String]) -> Vec<Vec<f32>> {
        texts
            .iter()
            .map(|t| hashed_bag_of_words(t, self.dim))
            .collect()
    }
}
