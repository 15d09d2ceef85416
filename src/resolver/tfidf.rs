use ndarray::{Array1, Array2};
use std::collections::HashMap;

use super::normalize::char_ngrams;

/// Character n-gram TF-IDF vectors of a fixed document set, rows L2-normalized
#[derive(Debug, Clone)]
pub struct TfIdfIndex {
    vocabulary: HashMap<String, usize>,
    idf: Array1<f64>,
    documents: Array2<f64>,
}

impl TfIdfIndex {
    pub fn build(documents: &[String]) -> Self {
        let grams: Vec<Vec<String>> = documents.iter().map(|doc| char_ngrams(doc)).collect();

        let mut vocabulary = HashMap::new();
        for doc in &grams {
            for gram in doc {
                let next = vocabulary.len();
                vocabulary.entry(gram.clone()).or_insert(next);
            }
        }

        let n_docs = documents.len();
        let n_terms = vocabulary.len();
        let mut counts = Array2::<f64>::zeros((n_docs, n_terms));
        for (row, doc) in grams.iter().enumerate() {
            for gram in doc {
                counts[[row, vocabulary[gram]]] += 1.0;
            }
        }

        let idf = smoothed_idf(&counts);
        let mut weighted = counts * &idf;
        for mut row in weighted.rows_mut() {
            let norm = row.dot(&row).sqrt();
            if norm > 0.0 {
                row /= norm;
            }
        }

        Self {
            vocabulary,
            idf,
            documents: weighted,
        }
    }

    /// Cosine similarity of `text` against every document, in document order
    pub fn scores(&self, text: &str) -> Array1<f64> {
        match self.vectorize(text) {
            Some(query) => self.documents.dot(&query),
            None => Array1::zeros(self.documents.nrows()),
        }
    }

    pub fn len(&self) -> usize {
        self.documents.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // Grams unseen in the document set carry no weight
    fn vectorize(&self, text: &str) -> Option<Array1<f64>> {
        let mut query = Array1::<f64>::zeros(self.vocabulary.len());
        for gram in char_ngrams(text) {
            if let Some(&column) = self.vocabulary.get(&gram) {
                query[column] += 1.0;
            }
        }
        query *= &self.idf;
        let norm = query.dot(&query).sqrt();
        (norm > 0.0).then(|| query / norm)
    }
}

/// ln((N + 1) / (df + 1)) + 1 per column
fn smoothed_idf(counts: &Array2<f64>) -> Array1<f64> {
    let n_docs = counts.nrows() as f64;
    let mut idf = Array1::<f64>::zeros(counts.ncols());
    for (column, weight) in counts.columns().into_iter().zip(idf.iter_mut()) {
        let df = column.iter().filter(|&&count| count > 0.0).count() as f64;
        *weight = ((n_docs + 1.0) / (df + 1.0)).ln() + 1.0;
    }
    idf
}
