//! TF-IDF vectorization for the free-text amenity columns

use crate::error::{HomevalError, Result};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Splits text on non-alphanumeric characters. Tokens shorter than
/// `min_token_length` are dropped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextTokenizer {
    lowercase: bool,
    min_token_length: usize,
}

impl TextTokenizer {
    pub fn new() -> Self {
        Self {
            lowercase: true,
            min_token_length: 2,
        }
    }

    pub fn with_min_length(mut self, len: usize) -> Self {
        self.min_token_length = len.max(1);
        self
    }

    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let processed = if self.lowercase {
            text.to_lowercase()
        } else {
            text.to_string()
        };

        processed
            .split(|c: char| !c.is_alphanumeric())
            .filter(|s| s.len() >= self.min_token_length)
            .map(|s| s.to_string())
            .collect()
    }
}

impl Default for TextTokenizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Count-based vectorizer with a lexicographically sorted vocabulary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountVectorizer {
    tokenizer: TextTokenizer,
    vocabulary: Vec<String>,
    min_df: usize,
    max_features: Option<usize>,
    is_fitted: bool,
}

impl CountVectorizer {
    pub fn new() -> Self {
        Self {
            tokenizer: TextTokenizer::new(),
            vocabulary: Vec::new(),
            min_df: 1,
            max_features: None,
            is_fitted: false,
        }
    }

    pub fn with_min_df(mut self, min_df: usize) -> Self {
        self.min_df = min_df.max(1);
        self
    }

    pub fn with_max_features(mut self, n: usize) -> Self {
        self.max_features = Some(n);
        self
    }

    /// The learned terms, sorted. May be empty when every document was blank.
    pub fn vocabulary(&self) -> &[String] {
        &self.vocabulary
    }

    pub fn fit(&mut self, documents: &[&str]) -> Result<&mut Self> {
        let mut doc_freq: HashMap<String, usize> = HashMap::new();
        for doc in documents {
            let unique: BTreeSet<String> = self.tokenizer.tokenize(doc).into_iter().collect();
            for term in unique {
                *doc_freq.entry(term).or_insert(0) += 1;
            }
        }

        let mut terms: Vec<(String, usize)> = doc_freq
            .into_iter()
            .filter(|(_, df)| *df >= self.min_df)
            .collect();

        if let Some(max_n) = self.max_features {
            // keep the most frequent terms, then restore sorted order
            terms.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
            terms.truncate(max_n);
        }
        terms.sort_by(|a, b| a.0.cmp(&b.0));

        self.vocabulary = terms.into_iter().map(|(t, _)| t).collect();
        self.is_fitted = true;
        Ok(self)
    }

    pub fn transform(&self, documents: &[&str]) -> Result<Array2<f64>> {
        if !self.is_fitted {
            return Err(HomevalError::ModelNotFitted);
        }

        let mut result = Array2::zeros((documents.len(), self.vocabulary.len()));
        for (i, doc) in documents.iter().enumerate() {
            for token in self.tokenizer.tokenize(doc) {
                if let Ok(j) = self.vocabulary.binary_search(&token) {
                    result[[i, j]] += 1.0;
                }
            }
        }
        Ok(result)
    }

    pub fn fit_transform(&mut self, documents: &[&str]) -> Result<Array2<f64>> {
        self.fit(documents)?;
        self.transform(documents)
    }
}

impl Default for CountVectorizer {
    fn default() -> Self {
        Self::new()
    }
}

/// TF-IDF vectorizer: term counts weighted by smoothed inverse document
/// frequency, rows L2-normalized.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TfidfVectorizer {
    count_vectorizer: CountVectorizer,
    idf: Option<Array1<f64>>,
}

impl TfidfVectorizer {
    pub fn new() -> Self {
        Self {
            count_vectorizer: CountVectorizer::new(),
            idf: None,
        }
    }

    pub fn with_min_df(mut self, min_df: usize) -> Self {
        self.count_vectorizer = self.count_vectorizer.with_min_df(min_df);
        self
    }

    pub fn with_max_features(mut self, n: usize) -> Self {
        self.count_vectorizer = self.count_vectorizer.with_max_features(n);
        self
    }

    pub fn vocabulary(&self) -> &[String] {
        self.count_vectorizer.vocabulary()
    }

    /// Number of output columns once fitted.
    pub fn n_features(&self) -> usize {
        self.count_vectorizer.vocabulary().len()
    }

    pub fn fit(&mut self, documents: &[&str]) -> Result<&mut Self> {
        let counts = self.count_vectorizer.fit_transform(documents)?;
        let n_docs = documents.len() as f64;

        let mut idf = Array1::zeros(counts.ncols());
        for j in 0..counts.ncols() {
            let df = counts.column(j).iter().filter(|&&v| v > 0.0).count() as f64;
            idf[j] = ((n_docs + 1.0) / (df + 1.0)).ln() + 1.0;
        }

        self.idf = Some(idf);
        Ok(self)
    }

    pub fn transform(&self, documents: &[&str]) -> Result<Array2<f64>> {
        let idf = self.idf.as_ref().ok_or(HomevalError::ModelNotFitted)?;
        let mut matrix = self.count_vectorizer.transform(documents)?;

        for mut row in matrix.rows_mut() {
            for (j, v) in row.iter_mut().enumerate() {
                *v *= idf[j];
            }
            let norm: f64 = row.iter().map(|&v| v * v).sum::<f64>().sqrt();
            if norm > 0.0 {
                row.mapv_inplace(|v| v / norm);
            }
        }

        Ok(matrix)
    }

    pub fn fit_transform(&mut self, documents: &[&str]) -> Result<Array2<f64>> {
        self.fit(documents)?;
        self.transform(documents)
    }
}

impl Default for TfidfVectorizer {
    fn default() -> Self {
        Self::new()
    }
}
