use ahash::AHashSet;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::classify::{argmax_topic, Classifier};
use crate::document::Document;
use crate::error::{Error, Result};

/// Multinomial-style Naive Bayes over per-class document frequencies.
///
/// The per-class term statistic counts *documents* of the class containing
/// the term, not raw occurrences. The smoothing formula below is defined on
/// that document-frequency reading, so the statistic is named accordingly;
/// substituting an occurrence count changes the model.
///
/// Scoring per class:
/// `log10(prior) + sum_t tf(t) * log10((class_term_doc_freq(t) + 1) /
/// (class_token_count + vocab_count))` with add-one smoothing, so unseen
/// terms contribute a finite penalty instead of negative infinity.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NaiveBayesClassifier {
    /// Documents per class.
    class_doc_count: IndexMap<String, usize>,
    /// Class priors: document share of each class.
    class_priors: IndexMap<String, f64>,
    /// Per-class document frequency of each term.
    class_term_doc_freq: IndexMap<String, IndexMap<String, usize>>,
    /// Per-class sum of the document-frequency counts.
    class_token_count: IndexMap<String, usize>,
    /// Distinct terms across the whole training set.
    vocab_count: usize,
}

impl NaiveBayesClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prior probability of `topic`, zero when unseen.
    #[inline]
    pub fn prior(&self, topic: &str) -> f64 {
        self.class_priors.get(topic).copied().unwrap_or(0.0)
    }

    /// Class priors keyed by topic.
    #[inline]
    pub fn class_priors(&self) -> &IndexMap<String, f64> {
        &self.class_priors
    }

    /// Vocabulary size seen at training time.
    #[inline]
    pub fn vocab_count(&self) -> usize {
        self.vocab_count
    }

    /// Smoothed log10 probability of `term` under `topic`.
    fn term_log_prob(&self, topic: &str, term: &str) -> f64 {
        let doc_freq = self
            .class_term_doc_freq
            .get(topic)
            .and_then(|freqs| freqs.get(term))
            .copied()
            .unwrap_or(0);
        let token_count = self.class_token_count.get(topic).copied().unwrap_or(0);
        ((doc_freq as f64 + 1.0) / (token_count + self.vocab_count) as f64).log10()
    }
}

impl Classifier for NaiveBayesClassifier {
    fn train(&mut self, documents: &[Document]) -> Result<()> {
        if documents.is_empty() {
            return Err(Error::EmptyTrainingSet);
        }

        self.class_doc_count.clear();
        self.class_priors.clear();
        self.class_term_doc_freq.clear();
        self.class_token_count.clear();

        let mut vocab: AHashSet<&str> = AHashSet::new();

        for doc in documents {
            *self.class_doc_count.entry(doc.topic.clone()).or_insert(0) += 1;

            let term_freqs = self.class_term_doc_freq.entry(doc.topic.clone()).or_default();
            for term in doc.tf.keys() {
                *term_freqs.entry(term.clone()).or_insert(0) += 1;
                *self.class_token_count.entry(doc.topic.clone()).or_insert(0) += 1;
                vocab.insert(term.as_str());
            }
        }

        self.vocab_count = vocab.len();

        let total = documents.len() as f64;
        for (topic, &count) in &self.class_doc_count {
            self.class_priors.insert(topic.clone(), count as f64 / total);
        }

        info!(
            classes = self.class_priors.len(),
            vocabulary = self.vocab_count,
            documents = documents.len(),
            "naive bayes trained"
        );
        Ok(())
    }

    fn classify(&self, documents: &[Document]) -> Result<Vec<String>> {
        if self.class_priors.is_empty() {
            return Err(Error::EmptyTrainingSet);
        }

        let mut predictions = Vec::with_capacity(documents.len());
        for doc in documents {
            let mut scores: IndexMap<String, f64> = IndexMap::new();
            for (topic, &prior) in &self.class_priors {
                let mut score = prior.log10();
                for (term, &count) in &doc.tf {
                    score += f64::from(count) * self.term_log_prob(topic, term);
                }
                scores.insert(topic.clone(), score);
            }
            // class_priors is non-empty, so the argmax always exists
            predictions.push(argmax_topic(&scores).unwrap());
        }
        Ok(predictions)
    }
}
