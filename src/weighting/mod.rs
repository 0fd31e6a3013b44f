use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::document::{Document, TermWeights};
use crate::utils::vector::normalize_in_place;

/// Number of entries kept per document after sparsification.
pub const SPARSE_TOP_TERMS: usize = 30;

/// Corpus-wide term weighting index.
///
/// Built once over a training corpus. Computes tf-idf and entropy-weighted
/// tf-idf ("tfidfie") for every document, L2-normalizes both, sparsifies
/// them to the [`SPARSE_TOP_TERMS`] highest-weighted entries and writes the
/// results back onto the documents. The corpus statistics stay on the index
/// for lookups after the build.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WeightingIndex {
    /// Number of documents each term appears in.
    pub doc_freqs: IndexMap<String, usize>,
    /// Per-topic document frequency of each term.
    pub topic_doc_freqs: IndexMap<String, IndexMap<String, usize>>,
    /// Information entropy of each term's spread over topics.
    pub information_entropy: IndexMap<String, f64>,
}

impl WeightingIndex {
    /// Build the index over `docs` and write `tfidf`/`tfidfie` onto each one.
    pub fn build(docs: &mut [Document]) -> Self {
        let doc_count = docs.len();

        let tf_index = Self::create_tf_index(docs);
        let doc_freqs: IndexMap<String, usize> = tf_index
            .iter()
            .map(|(term, postings)| (term.clone(), postings.len()))
            .collect();

        // Raw tf-idf per document, then cosine normalization in place.
        let mut tfidf_list = Self::create_tfidf_list(docs, &doc_freqs);
        for weights in &mut tfidf_list {
            normalize_in_place(weights);
        }
        for (doc, weights) in docs.iter_mut().zip(tfidf_list.iter()) {
            doc.tfidf = Self::sparsify(weights);
        }

        let topic_doc_freqs = Self::count_topic_doc_frequencies(docs);
        let information_entropy = Self::information_entropy(&doc_freqs, &topic_doc_freqs);

        // tfidfie divides each (already normalized) tf-idf entry by the
        // term's entropy; the second normalization restores unit length.
        let mut tfidfie_list = tfidf_list;
        for weights in &mut tfidfie_list {
            for (term, w) in weights.iter_mut() {
                *w /= information_entropy[term];
            }
            normalize_in_place(weights);
        }
        for (doc, weights) in docs.iter_mut().zip(tfidfie_list.iter()) {
            doc.tfidfie = Self::sparsify(weights);
        }

        info!(
            documents = doc_count,
            vocabulary = doc_freqs.len(),
            topics = topic_doc_freqs.len(),
            "weighting index built"
        );

        WeightingIndex {
            doc_freqs,
            topic_doc_freqs,
            information_entropy,
        }
    }

    /// Postings index: term -> list of (doc id, occurrence count).
    fn create_tf_index(docs: &[Document]) -> IndexMap<String, Vec<(usize, u32)>> {
        let mut tf_index: IndexMap<String, Vec<(usize, u32)>> = IndexMap::new();
        for (doc_id, doc) in docs.iter().enumerate() {
            for (term, &count) in &doc.tf {
                tf_index.entry(term.clone()).or_default().push((doc_id, count));
            }
        }
        tf_index
    }

    /// Raw tf-idf maps, one per document: `tf(t,d) * ln(N / df(t))`.
    fn create_tfidf_list(
        docs: &[Document],
        doc_freqs: &IndexMap<String, usize>,
    ) -> Vec<TermWeights> {
        let doc_count = docs.len() as f64;
        docs.iter()
            .map(|doc| {
                doc.tf
                    .iter()
                    .map(|(term, &count)| {
                        let idf = (doc_count / doc_freqs[term] as f64).ln();
                        (term.clone(), f64::from(count) * idf)
                    })
                    .collect()
            })
            .collect()
    }

    /// Per-topic document frequency of each term.
    fn count_topic_doc_frequencies(docs: &[Document]) -> IndexMap<String, IndexMap<String, usize>> {
        let mut topic_doc_freqs: IndexMap<String, IndexMap<String, usize>> = IndexMap::new();
        for doc in docs {
            let term_freqs = topic_doc_freqs.entry(doc.topic.clone()).or_default();
            for term in doc.tf.keys() {
                *term_freqs.entry(term.clone()).or_insert(0) += 1;
            }
        }
        topic_doc_freqs
    }

    /// Entropy of each term's document distribution across topics.
    ///
    /// `entropy(t) = -sum_topic p ln(p)` with `p = topic_df(t) / df(t)`,
    /// summed over topics where the term occurs. A term confined to a single
    /// topic comes out at exactly zero and is clamped to 1.0 so the tfidfie
    /// division stays finite; the clamp also strips the discriminative boost
    /// such a term would otherwise get, which is intended behavior.
    fn information_entropy(
        doc_freqs: &IndexMap<String, usize>,
        topic_doc_freqs: &IndexMap<String, IndexMap<String, usize>>,
    ) -> IndexMap<String, f64> {
        let mut entropy = IndexMap::with_capacity(doc_freqs.len());
        for (term, &df) in doc_freqs {
            let mut score = 0.0;
            for term_freqs in topic_doc_freqs.values() {
                if let Some(&topic_df) = term_freqs.get(term) {
                    if topic_df != 0 {
                        let p = topic_df as f64 / df as f64;
                        score -= p * p.ln();
                    }
                }
            }
            if score == 0.0 {
                score = 1.0;
            }
            entropy.insert(term.clone(), score);
        }
        entropy
    }

    /// Keep the highest-weighted entries of a map, up to [`SPARSE_TOP_TERMS`].
    /// Equal weights rank lexicographically by term so the cut is stable
    /// across runs.
    fn sparsify(weights: &TermWeights) -> TermWeights {
        let mut entries: Vec<(&String, f64)> = weights.iter().map(|(t, &w)| (t, w)).collect();
        entries.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        entries
            .into_iter()
            .take(SPARSE_TOP_TERMS)
            .map(|(term, w)| (term.clone(), w))
            .collect()
    }
}

/// Lookup helpers
impl WeightingIndex {
    /// Number of documents containing `term`, zero when unseen.
    #[inline]
    pub fn doc_freq(&self, term: &str) -> usize {
        self.doc_freqs.get(term).copied().unwrap_or(0)
    }

    /// Entropy score for `term`, if the term occurred in the corpus.
    #[inline]
    pub fn entropy(&self, term: &str) -> Option<f64> {
        self.information_entropy.get(term).copied()
    }

    /// Number of distinct terms in the corpus.
    #[inline]
    pub fn vocab_size(&self) -> usize {
        self.doc_freqs.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::vector::l2_norm;

    fn doc(topic: &str, text: &[&str]) -> Document {
        Document::new(
            topic,
            vec!["title".to_string()],
            text.iter().map(|t| t.to_string()).collect(),
        )
    }

    #[test]
    fn tfidf_decreases_as_document_frequency_grows() {
        // "shared" is in both documents, "rare" in one. Same tf, same N.
        let mut docs = vec![
            doc("a", &["shared", "rare"]),
            doc("b", &["shared", "other"]),
        ];
        let index = WeightingIndex::build(&mut docs);
        assert_eq!(index.doc_freq("shared"), 2);
        assert_eq!(index.doc_freq("rare"), 1);

        // ln(2/2) == 0 for the shared term, ln(2/1) > 0 for the rare one.
        let rare = docs[0].tfidf.get("rare").copied().unwrap_or(0.0);
        let shared = docs[0].tfidf.get("shared").copied().unwrap_or(0.0);
        assert!(rare > shared);
    }

    #[test]
    fn weight_maps_are_unit_length_after_build() {
        let mut docs = vec![
            doc("a", &["x", "y", "y"]),
            doc("a", &["x", "z"]),
            doc("b", &["w", "z", "z"]),
        ];
        WeightingIndex::build(&mut docs);
        for d in &docs {
            if d.tfidf.values().any(|&w| w != 0.0) {
                assert!((l2_norm(&d.tfidf) - 1.0).abs() < 1e-9);
            }
            if d.tfidfie.values().any(|&w| w != 0.0) {
                assert!((l2_norm(&d.tfidfie) - 1.0).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn sparsification_caps_the_map_size() {
        let terms: Vec<String> = (0..50).map(|i| format!("t{i:02}")).collect();
        let mut docs = vec![
            Document::new("a", vec![], terms.clone()),
            Document::new("b", vec![], terms[..10].to_vec()),
        ];
        WeightingIndex::build(&mut docs);
        assert_eq!(docs[0].tfidf.len(), SPARSE_TOP_TERMS);
        assert_eq!(docs[0].tfidfie.len(), SPARSE_TOP_TERMS);
        assert!(docs[1].tfidf.len() <= SPARSE_TOP_TERMS);
    }

    #[test]
    fn sparsification_tie_break_is_lexicographic() {
        // 40 terms, each once, in one document: every weight ties, so the
        // cut must keep the lexicographically smallest 30.
        let terms: Vec<String> = (0..40).map(|i| format!("t{i:02}")).collect();
        let mut docs = vec![
            Document::new("a", vec![], terms.clone()),
            Document::new("b", vec![], vec!["other".to_string()]),
        ];
        WeightingIndex::build(&mut docs);
        assert!(docs[0].tfidf.contains_key("t00"));
        assert!(docs[0].tfidf.contains_key("t29"));
        assert!(!docs[0].tfidf.contains_key("t30"));
    }

    #[test]
    fn single_topic_term_entropy_clamps_to_one() {
        // "x" occurs in two documents, both of topic A.
        let mut docs = vec![doc("A", &["x", "y"]), doc("A", &["x"]), doc("B", &["y"])];
        let index = WeightingIndex::build(&mut docs);
        assert_eq!(index.entropy("x"), Some(1.0));
    }

    #[test]
    fn spread_term_entropy_is_positive_and_unclamped() {
        // "y" occurs once in topic A and once in topic B: p = 0.5 twice,
        // entropy = ln(2).
        let mut docs = vec![doc("A", &["x", "y"]), doc("A", &["x"]), doc("B", &["y"])];
        let index = WeightingIndex::build(&mut docs);
        let entropy = index.entropy("y").unwrap();
        assert!((entropy - 2.0_f64.ln()).abs() < 1e-12);
    }
}
