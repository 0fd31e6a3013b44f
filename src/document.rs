use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Term occurrence counts for one document.
pub type TermCounts = IndexMap<String, u32>;

/// Term weights for one document (tf-idf scores, centroid entries, ...).
pub type TermWeights = IndexMap<String, f64>;

/// Count term occurrences in a token sequence, preserving first-seen order.
pub fn count_terms<T>(tokens: &[T]) -> TermCounts
where
    T: AsRef<str>,
{
    let mut counts = TermCounts::new();
    for token in tokens {
        *counts.entry(token.as_ref().to_string()).or_insert(0) += 1;
    }
    counts
}

/// A labeled document reduced to token sequences and term counts.
///
/// The loading stage produces the topic label and the normalized title/text
/// tokens; `tf` is derived from the text tokens. The weighting index writes
/// `tfidf` and `tfidfie` back onto the document once per training run, and
/// every classifier reads them afterwards without further mutation.
///
/// `vector` is the retrieval-facing weight map. Which field it mirrors is a
/// caller decision: training documents typically carry their `tfidfie`
/// weights, while query documents carry raw `tf` counts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Document {
    /// Topic label, assigned at load time and never changed afterwards.
    pub topic: String,
    /// Normalized title tokens, in document order.
    pub title_tokens: Vec<String>,
    /// Normalized body tokens, in document order.
    pub text_tokens: Vec<String>,
    /// Term frequency over the text tokens.
    pub tf: TermCounts,
    /// Corpus tf-idf weights, sparsified to the top entries.
    pub tfidf: TermWeights,
    /// Entropy-weighted tf-idf, sparsified to the top entries.
    pub tfidfie: TermWeights,
    /// Similarity vector used by nearest-neighbour search.
    pub vector: TermWeights,
}

impl Document {
    /// Create a document from its label and token sequences.
    /// `tf` is counted from the text tokens.
    pub fn new<S>(topic: S, title_tokens: Vec<String>, text_tokens: Vec<String>) -> Self
    where
        S: Into<String>,
    {
        let tf = count_terms(&text_tokens);
        Document {
            topic: topic.into(),
            title_tokens,
            text_tokens,
            tf,
            tfidf: TermWeights::new(),
            tfidfie: TermWeights::new(),
            vector: TermWeights::new(),
        }
    }

    /// Title and text occurrence counts merged into one map.
    /// This is the clustering representation of the document.
    pub fn combined_terms(&self) -> TermCounts {
        let mut counts = count_terms(&self.title_tokens);
        for token in &self.text_tokens {
            *counts.entry(token.clone()).or_insert(0) += 1;
        }
        counts
    }

    /// Point `vector` at the entropy-weighted tf-idf map.
    /// The convention for documents that take part in training.
    pub fn assign_vector_from_tfidfie(&mut self) {
        self.vector = self.tfidfie.clone();
    }

    /// Point `vector` at the raw term counts.
    /// The convention for held-out documents queried against the corpus.
    pub fn assign_vector_from_tf(&mut self) {
        self.vector = self
            .tf
            .iter()
            .map(|(term, &count)| (term.clone(), f64::from(count)))
            .collect();
    }

    /// Occurrence count of one term in the text partition.
    #[inline]
    pub fn term_count(&self, term: &str) -> u32 {
        self.tf.get(term).copied().unwrap_or(0)
    }

    /// Whether the text partition contains the term.
    #[inline]
    pub fn contains_term(&self, term: &str) -> bool {
        self.tf.contains_key(term)
    }
}
