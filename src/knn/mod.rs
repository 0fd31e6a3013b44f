use crate::document::Document;
use crate::error::{Error, Result};
use crate::utils::vector::dot;

/// Similarity between two documents' assigned vectors.
///
/// A plain dot product: the caller controls the scale by choosing what the
/// `vector` field carries (unit-length tfidfie weights give true cosine
/// scores, raw counts give an unnormalized overlap). Only the smaller of
/// the two maps is walked, since terms missing from either side contribute
/// nothing.
#[inline]
pub fn cosine_similarity(doc1: &Document, doc2: &Document) -> f64 {
    dot(&doc1.vector, &doc2.vector)
}

/// Euclidean distance between two documents' assigned vectors, over the
/// union of their terms.
pub fn euclidean_distance(doc1: &Document, doc2: &Document) -> f64 {
    let mut distance = 0.0;
    for (term, &w1) in &doc1.vector {
        let w2 = doc2.vector.get(term).copied().unwrap_or(0.0);
        distance += (w1 - w2) * (w1 - w2);
    }
    for (term, &w2) in &doc2.vector {
        if !doc1.vector.contains_key(term) {
            distance += w2 * w2;
        }
    }
    distance.sqrt()
}

/// Nearest-neighbour search over a fixed candidate list.
///
/// Candidates are compared through whatever `vector` map they carry; the
/// search itself never inspects any other document field.
#[derive(Debug, Clone)]
pub struct KnnSimilaritySearch<'a> {
    docs: &'a [Document],
}

impl<'a> KnnSimilaritySearch<'a> {
    pub fn new(docs: &'a [Document]) -> Self {
        KnnSimilaritySearch { docs }
    }

    /// The `k` candidates most similar to `target`, best first.
    ///
    /// When `target` is itself one of the candidates it is excluded by
    /// identity, so a separate document with identical content stays
    /// eligible. Similarity ties keep the candidates' original order.
    /// Asking for more neighbours than eligible candidates exist is an
    /// error, never a silently shortened list.
    pub fn find_k_neighbours(&self, target: &Document, k: usize) -> Result<Vec<&'a Document>> {
        let candidates: Vec<&'a Document> = self
            .docs
            .iter()
            .filter(|doc| !std::ptr::eq(*doc, target))
            .collect();

        if k > candidates.len() {
            return Err(Error::NeighbourCountOutOfRange {
                requested: k,
                available: candidates.len(),
            });
        }

        let mut scored: Vec<(&'a Document, f64)> = candidates
            .into_iter()
            .map(|doc| (doc, cosine_similarity(doc, target)))
            .collect();
        // sort_by is stable, so equal scores preserve candidate order
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));

        Ok(scored.into_iter().take(k).map(|(doc, _)| doc).collect())
    }
}
