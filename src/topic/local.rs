use ahash::AHashSet;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::document::{count_terms, Document, TermWeights};

/// Index over one token partition (title or text) of one topic's documents.
///
/// The per-document and topic-aggregate weights both use the formula
/// `(1 + tf / length) * (1 + df / doc_count)`. The document-frequency factor
/// grows with df rather than shrinking, so locally frequent terms are
/// boosted, not damped. That inversion is deliberate ranking behavior here
/// and must not be swapped for a conventional idf without sign-off.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PartitionIndex {
    /// Filtered token lists, one per document, exclusions already applied.
    pub tokens: Vec<Vec<String>>,
    /// Number of this topic's documents containing each term.
    pub doc_freqs: IndexMap<String, usize>,
    /// Postings: term -> list of (doc-local id, occurrence count).
    pub tf_index: IndexMap<String, Vec<(usize, u32)>>,
    /// Token count of each document's filtered partition.
    pub lengths: Vec<usize>,
    /// Mean of `lengths`.
    pub mean_length: f64,
    /// Per-document local weights: doc-local id -> (term, weight) list.
    pub doc_tfidf: IndexMap<usize, Vec<(String, f64)>>,
    /// Topic-aggregate weight per term.
    pub topic_tfidf: TermWeights,
}

impl PartitionIndex {
    fn build(token_lists: Vec<Vec<String>>) -> Self {
        let doc_count = token_lists.len();

        let mut doc_freqs: IndexMap<String, usize> = IndexMap::new();
        let mut tf_index: IndexMap<String, Vec<(usize, u32)>> = IndexMap::new();
        let mut lengths = Vec::with_capacity(doc_count);

        for (doc_id, tokens) in token_lists.iter().enumerate() {
            lengths.push(tokens.len());
            for (term, count) in count_terms(tokens) {
                *doc_freqs.entry(term.clone()).or_insert(0) += 1;
                tf_index.entry(term).or_default().push((doc_id, count));
            }
        }

        let total_tokens: usize = lengths.iter().sum();
        let mean_length = if doc_count > 0 {
            total_tokens as f64 / doc_count as f64
        } else {
            0.0
        };

        // Per-document weights. Postings only list documents that contain
        // the term, so the length divisor is never zero here.
        let mut doc_tfidf: IndexMap<usize, Vec<(String, f64)>> = IndexMap::new();
        for (term, postings) in &tf_index {
            let df_fraction = doc_freqs[term] as f64 / doc_count as f64;
            for &(doc_id, count) in postings {
                let score =
                    (1.0 + f64::from(count) / lengths[doc_id] as f64) * (1.0 + df_fraction);
                doc_tfidf.entry(doc_id).or_default().push((term.clone(), score));
            }
        }

        // Topic-aggregate weight: one value per term over the whole topic.
        let mut topic_tfidf = TermWeights::new();
        for (term, postings) in &tf_index {
            let term_total: u32 = postings.iter().map(|&(_, count)| count).sum();
            let df_fraction = doc_freqs[term] as f64 / doc_count as f64;
            let score =
                (1.0 + f64::from(term_total) / total_tokens as f64) * (1.0 + df_fraction);
            topic_tfidf.insert(term.clone(), score);
        }

        PartitionIndex {
            tokens: token_lists,
            doc_freqs,
            tf_index,
            lengths,
            mean_length,
            doc_tfidf,
            topic_tfidf,
        }
    }
}

/// Per-topic tf index built from that topic's training documents only.
///
/// Title and text partitions are indexed separately. The exclusion sets
/// hold the cross-topic common tokens detected by
/// [`TopicSet`](crate::topic::TopicSet); the title partition drops tokens
/// from either set, the text partition drops the text set only.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LocalTopicIndex {
    /// Index over the filtered title tokens.
    pub title: PartitionIndex,
    /// Index over the filtered text tokens.
    pub text: PartitionIndex,
}

impl LocalTopicIndex {
    /// Build both partition indices for one topic's documents.
    pub fn new(
        docs: &[&Document],
        text_exclude: &AHashSet<String>,
        title_exclude: &AHashSet<String>,
    ) -> Self {
        let title_lists: Vec<Vec<String>> = docs
            .iter()
            .map(|d| {
                d.title_tokens
                    .iter()
                    .filter(|t| !title_exclude.contains(*t) && !text_exclude.contains(*t))
                    .cloned()
                    .collect()
            })
            .collect();
        let text_lists: Vec<Vec<String>> = docs
            .iter()
            .map(|d| {
                d.text_tokens
                    .iter()
                    .filter(|t| !text_exclude.contains(*t))
                    .cloned()
                    .collect()
            })
            .collect();

        LocalTopicIndex {
            title: PartitionIndex::build(title_lists),
            text: PartitionIndex::build(text_lists),
        }
    }

    /// Topic-aggregate title weight for `term`.
    #[inline]
    pub fn topic_title_tfidf(&self, term: &str) -> Option<f64> {
        self.title.topic_tfidf.get(term).copied()
    }

    /// Topic-aggregate text weight for `term`.
    #[inline]
    pub fn topic_text_tfidf(&self, term: &str) -> Option<f64> {
        self.text.topic_tfidf.get(term).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(title: &[&str], text: &[&str]) -> Document {
        Document::new(
            "t",
            title.iter().map(|t| t.to_string()).collect(),
            text.iter().map(|t| t.to_string()).collect(),
        )
    }

    fn no_excludes() -> AHashSet<String> {
        AHashSet::new()
    }

    #[test]
    fn postings_carry_local_ids_and_counts() {
        let d0 = doc(&[], &["x", "x", "y"]);
        let d1 = doc(&[], &["y"]);
        let index = LocalTopicIndex::new(&[&d0, &d1], &no_excludes(), &no_excludes());
        assert_eq!(index.text.tf_index["x"], vec![(0, 2)]);
        assert_eq!(index.text.tf_index["y"], vec![(0, 1), (1, 1)]);
        assert_eq!(index.text.lengths, vec![3, 1]);
        assert!((index.text.mean_length - 2.0).abs() < 1e-12);
    }

    #[test]
    fn excluded_tokens_are_dropped_from_both_partitions() {
        let d0 = doc(&["common", "headline"], &["common", "body"]);
        let mut text_exclude = AHashSet::new();
        text_exclude.insert("common".to_string());
        let index = LocalTopicIndex::new(&[&d0], &text_exclude, &no_excludes());
        assert!(index.topic_text_tfidf("common").is_none());
        assert!(index.topic_title_tfidf("common").is_none());
        assert!(index.topic_title_tfidf("headline").is_some());
        assert!(index.topic_text_tfidf("body").is_some());
    }

    #[test]
    fn weight_rises_with_document_frequency() {
        // "both" is in two documents, "solo" in one, same counts and
        // lengths otherwise. The inverted df factor must rank "both" higher.
        let d0 = doc(&[], &["both", "solo"]);
        let d1 = doc(&[], &["both", "filler"]);
        let index = LocalTopicIndex::new(&[&d0, &d1], &no_excludes(), &no_excludes());
        let both = index.topic_text_tfidf("both").unwrap();
        let solo = index.topic_text_tfidf("solo").unwrap();
        assert!(both > solo);
    }

    #[test]
    fn topic_aggregate_matches_the_closed_form() {
        // One document, tokens [x, x, y]: total 3 tokens.
        // x: (1 + 2/3) * (1 + 1/1) = 10/3.
        let d0 = doc(&[], &["x", "x", "y"]);
        let index = LocalTopicIndex::new(&[&d0], &no_excludes(), &no_excludes());
        let x = index.topic_text_tfidf("x").unwrap();
        assert!((x - 10.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn per_document_weight_uses_the_partition_length() {
        // Document 0 has length 2, x count 1, df 1/1:
        // (1 + 1/2) * (1 + 1) = 3.0.
        let d0 = doc(&[], &["x", "y"]);
        let index = LocalTopicIndex::new(&[&d0], &no_excludes(), &no_excludes());
        let weights = &index.text.doc_tfidf[&0];
        let x = weights.iter().find(|(t, _)| t == "x").unwrap().1;
        assert!((x - 3.0).abs() < 1e-12);
    }
}
