//! TF-IDF feature extraction for linear text classifiers.
//!
//! Only the inference half lives here: the vocabulary and idf weights come
//! from a trained artifact and are applied to incoming messages.

use ndarray::Array1;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::ModelError;

static TOKEN_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?u)\b\w\w+\b").expect("valid token pattern"));

static NON_ALPHA: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-zA-Z\s]").expect("valid non-alpha pattern"));

/// Common English stop words, dropped when `stop_words` is enabled.
///
/// Entries are in token form: contractions appear as the tokenizer leaves
/// them, split at the apostrophe ("don") or with it stripped ("dont").
const STOP_WORDS: &[&str] = &[
    "about", "above", "after", "again", "against", "all", "am", "an", "and", "any",
    "are", "aren", "arent", "as", "at", "be", "because", "been", "before", "being",
    "below", "between", "both", "but", "by", "can", "cannot", "cant", "could",
    "couldn", "couldnt", "did", "didn", "didnt", "do", "does", "doesn", "doesnt",
    "doing", "don", "dont", "down", "during", "each", "few", "for", "from",
    "further", "had", "hadn", "hadnt", "has", "hasn", "hasnt", "have", "haven",
    "havent", "having", "he", "her", "here", "hers", "herself", "him", "himself",
    "his", "how", "if", "in", "into", "is", "isn", "isnt", "it", "its", "itself",
    "me", "more", "most", "my", "myself", "no", "nor", "not", "of", "off", "on",
    "once", "only", "or", "other", "our", "ours", "ourselves", "out", "over", "own",
    "same", "she", "should", "so", "some", "such", "than", "that", "the", "their",
    "theirs", "them", "themselves", "then", "there", "these", "they", "this",
    "those", "through", "to", "too", "under", "until", "up", "very", "was", "we",
    "were", "what", "when", "where", "which", "while", "who", "whom", "why", "with",
    "would", "you", "your", "yours", "yourself", "yourselves",
];

fn is_stop_word(token: &str) -> bool {
    STOP_WORDS.iter().any(|w| w.eq_ignore_ascii_case(token))
}

fn default_true() -> bool {
    true
}

fn default_ngram_range() -> (usize, usize) {
    (1, 1)
}

/// A fitted TF-IDF vectorizer, as persisted alongside a linear model.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct TfidfVectorizer {
    /// term -> feature column
    pub vocabulary: HashMap<String, usize>,
    /// idf weight per feature column
    pub idf: Vec<f32>,
    #[serde(default = "default_ngram_range")]
    pub ngram_range: (usize, usize),
    #[serde(default = "default_true")]
    pub lowercase: bool,
    #[serde(default)]
    pub sublinear_tf: bool,
    #[serde(default)]
    pub strip_non_alpha: bool,
    #[serde(default)]
    pub stop_words: bool,
}

impl TfidfVectorizer {
    pub fn n_features(&self) -> usize {
        self.idf.len()
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        if self.vocabulary.len() != self.idf.len() {
            return Err(ModelError::Invalid(format!(
                "vocabulary has {} terms but idf has {} weights",
                self.vocabulary.len(),
                self.idf.len()
            )));
        }
        if let Some((term, &col)) = self.vocabulary.iter().find(|(_, &col)| col >= self.idf.len()) {
            return Err(ModelError::Invalid(format!(
                "term '{}' maps to column {} outside {} features",
                term,
                col,
                self.idf.len()
            )));
        }
        let (min_n, max_n) = self.ngram_range;
        if min_n == 0 || min_n > max_n {
            return Err(ModelError::Invalid(format!(
                "invalid ngram range ({}, {})",
                min_n, max_n
            )));
        }
        Ok(())
    }

    /// Splits text into the unigram tokens the vocabulary was built from.
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let mut text = if self.lowercase {
            text.to_lowercase()
        } else {
            text.to_string()
        };
        if self.strip_non_alpha {
            text = NON_ALPHA.replace_all(&text, "").into_owned();
        }
        TOKEN_PATTERN
            .find_iter(&text)
            .map(|m| m.as_str().to_string())
            .filter(|t| !self.stop_words || !is_stop_word(t))
            .collect()
    }

    fn ngrams(&self, tokens: &[String]) -> Vec<String> {
        let (min_n, max_n) = self.ngram_range;
        let mut terms = Vec::new();
        for n in min_n..=max_n {
            if n > tokens.len() {
                break;
            }
            terms.extend(tokens.windows(n).map(|w| w.join(" ")));
        }
        terms
    }

    /// Maps a message to its l2-normalised TF-IDF vector.
    pub fn transform(&self, text: &str) -> Array1<f32> {
        let mut features = Array1::<f32>::zeros(self.n_features());
        let tokens = self.tokenize(text);
        for term in self.ngrams(&tokens) {
            if let Some(&col) = self.vocabulary.get(&term) {
                features[col] += 1.0;
            }
        }
        if self.sublinear_tf {
            features.mapv_inplace(|tf| if tf > 0.0 { 1.0 + tf.ln() } else { 0.0 });
        }
        for (value, idf) in features.iter_mut().zip(self.idf.iter()) {
            *value *= idf;
        }
        let norm = features.dot(&features).sqrt();
        if norm > 0.0 {
            features /= norm;
        }
        features
    }
}
