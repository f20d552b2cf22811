//! Vocabulary loading and token lookup
//!
//! Vocabulary files are one token per line; the line number is the token
//! id, with the first four lines conventionally the reserved markers.
//! Construction of vocabulary files is an upstream concern.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use super::UNK_ID;
use crate::data::{DataError, Result};

#[derive(Debug, Clone)]
pub struct Vocabulary {
    token_to_id: HashMap<String, u32>,
    id_to_token: Vec<String>,
}

impl Vocabulary {
    /// Load a vocabulary file. Fails with an I/O error if unreadable.
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .map_err(|e| DataError::Io { path: path.to_path_buf(), source: e })?;
        let mut tokens = Vec::new();
        for line in BufReader::new(file).lines() {
            let line = line.map_err(|e| DataError::Io { path: path.to_path_buf(), source: e })?;
            tokens.push(line.trim_end().to_string());
        }
        Ok(Self::from_tokens(tokens))
    }

    /// Build a vocabulary from an ordered token list
    #[must_use]
    pub fn from_tokens(tokens: Vec<String>) -> Self {
        let token_to_id = tokens
            .iter()
            .enumerate()
            .map(|(id, token)| (token.clone(), id as u32))
            .collect();
        Self { token_to_id, id_to_token: tokens }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.id_to_token.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.id_to_token.is_empty()
    }

    /// Map a whitespace-tokenized sentence to ids; unknown tokens map to
    /// the UNK id.
    #[must_use]
    pub fn encode_sentence(&self, sentence: &str) -> Vec<u32> {
        sentence
            .split_whitespace()
            .map(|token| self.token_to_id.get(token).copied().unwrap_or(UNK_ID))
            .collect()
    }

    #[must_use]
    pub fn token(&self, id: u32) -> Option<&str> {
        self.id_to_token.get(id as usize).map(String::as_str)
    }

    /// Join token ids back into a sentence; out-of-range ids render as the
    /// UNK token's text.
    #[must_use]
    pub fn decode_tokens(&self, ids: &[u32]) -> String {
        let unk = self.token(UNK_ID).unwrap_or("_UNK");
        ids.iter()
            .map(|&id| self.token(id).unwrap_or(unk))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    pub(crate) fn tiny_vocab() -> Vocabulary {
        let mut tokens: Vec<String> =
            ["_PAD", "_GO", "_EOS", "_UNK"].iter().map(|s| s.to_string()).collect();
        tokens.extend(["the", "cat", "sat", "mat", "on"].iter().map(|s| s.to_string()));
        Vocabulary::from_tokens(tokens)
    }

    #[test]
    fn test_encode_sentence_with_unknowns() {
        let vocab = tiny_vocab();
        assert_eq!(vocab.encode_sentence("the cat sat"), vec![4, 5, 6]);
        assert_eq!(vocab.encode_sentence("the dog sat"), vec![4, UNK_ID, 6]);
        assert!(vocab.encode_sentence("").is_empty());
    }

    #[test]
    fn test_decode_tokens_roundtrip() {
        let vocab = tiny_vocab();
        let ids = vocab.encode_sentence("cat on mat");
        assert_eq!(vocab.decode_tokens(&ids), "cat on mat");
        // out-of-range ids render as UNK text
        assert_eq!(vocab.decode_tokens(&[99]), "_UNK");
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vocab");
        let mut f = std::fs::File::create(&path).unwrap();
        for token in ["_PAD", "_GO", "_EOS", "_UNK", "hola"] {
            writeln!(f, "{token}").unwrap();
        }

        let vocab = Vocabulary::load(&path).unwrap();
        assert_eq!(vocab.len(), 5);
        assert_eq!(vocab.encode_sentence("hola"), vec![4]);
    }
}
