pub mod local;

use ahash::AHashSet;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::document::{Document, TermWeights};

pub use local::{LocalTopicIndex, PartitionIndex};

/// Per-topic document-frequency statistics over title and text tokens.
///
/// A token counts as "common" when its document-frequency fraction exceeds
/// 0.1 in more than half of the topics. Common tokens are generic vocabulary
/// shared across topics; the per-topic indices exclude them so their weights
/// concentrate on discriminative terms.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TopicSet {
    /// topic -> token -> fraction of that topic's documents whose title
    /// contains the token.
    pub title_doc_freqs: IndexMap<String, TermWeights>,
    /// topic -> token -> fraction of that topic's documents whose text
    /// contains the token.
    pub text_doc_freqs: IndexMap<String, TermWeights>,
    /// Tokens common across topics in titles, in first-seen order.
    pub title_common_tokens: Vec<String>,
    /// Tokens common across topics in text bodies, in first-seen order.
    pub text_common_tokens: Vec<String>,
}

impl TopicSet {
    /// Compute the per-topic statistics for `docs`, one entry per topic in
    /// `topics`. Topics without documents get empty frequency maps.
    pub fn new(docs: &[Document], topics: &[String]) -> Self {
        let mut title_doc_freqs = IndexMap::with_capacity(topics.len());
        let mut text_doc_freqs = IndexMap::with_capacity(topics.len());

        for topic in topics {
            let title_lists: Vec<&[String]> = docs
                .iter()
                .filter(|d| d.topic == *topic)
                .map(|d| d.title_tokens.as_slice())
                .collect();
            let text_lists: Vec<&[String]> = docs
                .iter()
                .filter(|d| d.topic == *topic)
                .map(|d| d.text_tokens.as_slice())
                .collect();

            title_doc_freqs.insert(topic.clone(), Self::doc_frequency_fractions(&title_lists));
            text_doc_freqs.insert(topic.clone(), Self::doc_frequency_fractions(&text_lists));
        }

        let title_common_tokens = Self::find_common_tokens(&title_doc_freqs);
        let text_common_tokens = Self::find_common_tokens(&text_doc_freqs);

        TopicSet {
            title_doc_freqs,
            text_doc_freqs,
            title_common_tokens,
            text_common_tokens,
        }
    }

    /// Fraction of documents containing each token, over one topic's lists.
    fn doc_frequency_fractions(token_lists: &[&[String]]) -> TermWeights {
        let doc_count = token_lists.len();
        let mut freqs = TermWeights::new();
        if doc_count == 0 {
            return freqs;
        }

        for tokens in token_lists {
            let mut seen = AHashSet::with_capacity(tokens.len());
            for token in tokens.iter() {
                if seen.insert(token.as_str()) {
                    *freqs.entry(token.clone()).or_insert(0.0) += 1.0;
                }
            }
        }
        for fraction in freqs.values_mut() {
            *fraction /= doc_count as f64;
        }
        freqs
    }

    /// Tokens whose fraction exceeds 0.1 in more than `floor(#topics / 2)`
    /// topics.
    fn find_common_tokens(doc_freqs: &IndexMap<String, TermWeights>) -> Vec<String> {
        let threshold = doc_freqs.len() / 2;

        let mut token_count: IndexMap<String, usize> = IndexMap::new();
        for freqs in doc_freqs.values() {
            for (token, &fraction) in freqs {
                if fraction > 0.1 {
                    *token_count.entry(token.clone()).or_insert(0) += 1;
                }
            }
        }

        token_count
            .into_iter()
            .filter(|(_, count)| *count > threshold)
            .map(|(token, _)| token)
            .collect()
    }
}
