//! Label predictors: phrase matching over normalised words, and TF-IDF
//! features scored by a linear model.

use ndarray::{Array1, Array2};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{ModelError, PredictError};
use crate::tfidf::TfidfVectorizer;

/// A trained text classifier. The cascade only ever asks for a label.
///
/// Predictors are immutable once loaded, so a single instance is shared by
/// every session.
pub trait Predictor: Send + Sync {
    /// Artifact name, used in logs.
    fn name(&self) -> &str;

    fn predict(&self, text: &str) -> Result<String, PredictError>;
}

/// One label and the phrases that select it.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PatternGroup {
    pub label: String,
    pub patterns: Vec<String>,
}

static WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w+").expect("valid word pattern"));

/// Lowercased words of `text`. Apostrophes are dropped first, so "don't",
/// "don’t" and "dont" all give `dont`.
fn words(text: &str) -> Vec<String> {
    let folded: String = text
        .to_lowercase()
        .chars()
        .filter(|c| !matches!(c, '\'' | '\u{2018}' | '\u{2019}'))
        .collect();
    WORD.find_iter(&folded).map(|m| m.as_str().to_string()).collect()
}

/// True when every word of `phrase` occurs in `message` in the same order.
/// Other words may sit between them.
fn contains_in_order(message: &[String], phrase: &[String]) -> bool {
    let mut rest = message.iter();
    phrase.iter().all(|word| rest.any(|m| m == word))
}

#[derive(Debug, Clone)]
struct CompiledGroup {
    label: String,
    phrases: Vec<Vec<String>>,
}

/// Phrase-matching classifier built from the labelled pattern sets.
///
/// Groups are checked in declaration order and the first group with a
/// matching phrase wins. A phrase matches when its words appear in the
/// message in order, ignoring case, punctuation and apostrophes.
#[derive(Debug, Clone)]
pub struct KeywordPredictor {
    name: String,
    groups: Vec<CompiledGroup>,
    fallback: String,
}

impl KeywordPredictor {
    pub fn new(
        name: impl Into<String>,
        groups: Vec<PatternGroup>,
        fallback: impl Into<String>,
    ) -> Result<Self, ModelError> {
        let name = name.into();
        let fallback = fallback.into();
        if fallback.trim().is_empty() {
            return Err(ModelError::Invalid(format!(
                "keyword model '{}' has a blank fallback label",
                name
            )));
        }
        let mut compiled = Vec::with_capacity(groups.len());
        for group in groups {
            if group.label.trim().is_empty() {
                return Err(ModelError::Invalid(format!(
                    "keyword model '{}' has a group without a label",
                    name
                )));
            }
            let phrases: Vec<Vec<String>> = group
                .patterns
                .iter()
                .map(|p| words(p))
                .filter(|p| !p.is_empty())
                .collect();
            if phrases.is_empty() {
                return Err(ModelError::Invalid(format!(
                    "keyword model '{}' has no patterns for label '{}'",
                    name, group.label
                )));
            }
            compiled.push(CompiledGroup {
                label: group.label,
                phrases,
            });
        }
        Ok(Self {
            name,
            groups: compiled,
            fallback,
        })
    }
}

impl Predictor for KeywordPredictor {
    fn name(&self) -> &str {
        &self.name
    }

    fn predict(&self, text: &str) -> Result<String, PredictError> {
        let message = words(text);
        let matched = self
            .groups
            .iter()
            .find(|g| g.phrases.iter().any(|p| contains_in_order(&message, p)));
        Ok(matched
            .map(|g| g.label.clone())
            .unwrap_or_else(|| self.fallback.clone()))
    }
}

/// Training algorithm that produced a linear model's weights.
///
/// All three reduce to `W·x + b` at prediction time; the value is kept for
/// logging only.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Algorithm {
    LogisticRegression,
    LinearSvm,
    /// Multinomial naive Bayes: `W` holds feature log-probabilities and `b`
    /// the class log-priors.
    NaiveBayes,
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Algorithm::LogisticRegression => "logistic regression",
            Algorithm::LinearSvm => "linear SVM",
            Algorithm::NaiveBayes => "naive Bayes",
        };
        f.write_str(name)
    }
}

/// TF-IDF features followed by a linear decision function.
#[derive(Debug, Clone)]
pub struct LinearPredictor {
    name: String,
    algorithm: Algorithm,
    vectorizer: TfidfVectorizer,
    classes: Vec<String>,
    coef: Array2<f32>,
    intercept: Array1<f32>,
}

impl LinearPredictor {
    pub fn new(
        name: impl Into<String>,
        algorithm: Algorithm,
        vectorizer: TfidfVectorizer,
        classes: Vec<String>,
        coef: Array2<f32>,
        intercept: Array1<f32>,
    ) -> Result<Self, ModelError> {
        let name = name.into();
        vectorizer.validate()?;
        if classes.len() < 2 {
            return Err(ModelError::Invalid(format!(
                "linear model '{}' needs at least two classes, found {}",
                name,
                classes.len()
            )));
        }
        let rows = coef.nrows();
        // A two-class model may store a single decision row.
        let rows_ok = rows == classes.len() || (rows == 1 && classes.len() == 2);
        if !rows_ok {
            return Err(ModelError::Invalid(format!(
                "linear model '{}' has {} coefficient rows for {} classes",
                name,
                rows,
                classes.len()
            )));
        }
        if coef.ncols() != vectorizer.n_features() {
            return Err(ModelError::Invalid(format!(
                "linear model '{}' has {} coefficient columns but {} features",
                name,
                coef.ncols(),
                vectorizer.n_features()
            )));
        }
        if intercept.len() != rows {
            return Err(ModelError::Invalid(format!(
                "linear model '{}' has {} intercepts for {} coefficient rows",
                name,
                intercept.len(),
                rows
            )));
        }
        Ok(Self {
            name,
            algorithm,
            vectorizer,
            classes,
            coef,
            intercept,
        })
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Raw decision values, one per coefficient row.
    pub fn decision_function(&self, text: &str) -> Array1<f32> {
        let features = self.vectorizer.transform(text);
        self.coef.dot(&features) + &self.intercept
    }
}

impl Predictor for LinearPredictor {
    fn name(&self) -> &str {
        &self.name
    }

    fn predict(&self, text: &str) -> Result<String, PredictError> {
        let scores = self.decision_function(text);

        if scores.len() == 1 {
            let decision = scores[0];
            if !decision.is_finite() {
                return Err(PredictError::NonFinite {
                    class: self.classes[1].clone(),
                });
            }
            let idx = if decision > 0.0 { 1 } else { 0 };
            return Ok(self.classes[idx].clone());
        }

        let mut best: Option<(usize, f32)> = None;
        for (i, &score) in scores.iter().enumerate() {
            if !score.is_finite() {
                return Err(PredictError::NonFinite {
                    class: self.classes[i].clone(),
                });
            }
            match best {
                Some((_, best_score)) if score <= best_score => {}
                _ => best = Some((i, score)),
            }
        }
        best
            .map(|(i, _)| self.classes[i].clone())
            .ok_or(PredictError::NoClasses)
    }
}
