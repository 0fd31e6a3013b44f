use ahash::AHashMap;
use indexmap::IndexMap;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::classify::Classifier;
use crate::document::{Document, TermCounts, TermWeights};
use crate::error::{Error, Result};
use crate::utils::vector::{dot, sq_norm};

/// Iterations run per training call when not overridden.
pub const DEFAULT_ITERATIONS: usize = 10;

/// Prune threshold applied to each topic group during training.
pub const DEFAULT_MIN_DOC_FREQ: usize = 2;

/// Label-seeded k-means over combined title+text term counts.
///
/// One cluster per topic. The initial partition puts every training
/// document into the cluster of its own label (a semi-supervised warm
/// start), then the usual assign/update loop runs for a fixed number of
/// iterations with no convergence check. Reassignment distances can be
/// evaluated for all documents independently, so that phase fans out over
/// a thread pool; centroid recomputation and the partition rebuild stay
/// sequential.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KMeansClustering {
    topics: Vec<String>,
    iterations: usize,
    min_doc_freq: usize,
    state: Option<KMeansState>,
}

/// Model state from one training run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KMeansState {
    /// Pruned term maps of the training documents, by document id.
    documents: Vec<TermWeights>,
    /// Cluster membership: topic label -> document ids. Every id sits in
    /// exactly one cluster.
    k_cluster: IndexMap<String, Vec<usize>>,
    /// Cluster centroids: arithmetic mean of the member term maps.
    mean_vectors: IndexMap<String, TermWeights>,
    /// Cached squared norm per centroid.
    mean_norms: IndexMap<String, f64>,
    /// Cached squared norm per training document.
    doc_norm: Vec<f64>,
}

/// Remove terms occurring in fewer than `min_doc_freq` of the given maps.
/// Documents left without any terms are dropped from the result.
pub fn prune_terms(docs: &[TermCounts], min_doc_freq: usize) -> Vec<TermCounts> {
    let mut term_doc_freq: AHashMap<&str, usize> = AHashMap::new();
    for doc in docs {
        for term in doc.keys() {
            *term_doc_freq.entry(term.as_str()).or_insert(0) += 1;
        }
    }

    docs.iter()
        .filter_map(|doc| {
            let pruned: TermCounts = doc
                .iter()
                .filter(|(term, _)| term_doc_freq[term.as_str()] >= min_doc_freq)
                .map(|(term, &count)| (term.clone(), count))
                .collect();
            if pruned.is_empty() {
                None
            } else {
                Some(pruned)
            }
        })
        .collect()
}

fn counts_to_weights(counts: &TermCounts) -> TermWeights {
    counts
        .iter()
        .map(|(term, &count)| (term.clone(), f64::from(count)))
        .collect()
}

/// Euclidean distance given the precomputed `norm_sum = |doc|^2 + |mean|^2`.
/// Cancellation can push the sum a hair below zero, hence the clamp.
fn distance(doc: &TermWeights, mean: &TermWeights, norm_sum: f64) -> f64 {
    (norm_sum - 2.0 * dot(doc, mean)).max(0.0).sqrt()
}

impl KMeansClustering {
    /// One cluster per entry of `topics`; the order fixes the tie-break
    /// order for equidistant documents.
    pub fn new(topics: Vec<String>) -> Self {
        KMeansClustering {
            topics,
            iterations: DEFAULT_ITERATIONS,
            min_doc_freq: DEFAULT_MIN_DOC_FREQ,
            state: None,
        }
    }

    /// Override the fixed iteration count.
    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    /// Override the per-group prune threshold.
    pub fn with_min_doc_freq(mut self, min_doc_freq: usize) -> Self {
        self.min_doc_freq = min_doc_freq;
        self
    }

    /// Cluster labels, in tie-break order.
    #[inline]
    pub fn topics(&self) -> &[String] {
        &self.topics
    }

    /// Cluster membership from the last training run.
    pub fn clusters(&self) -> Option<&IndexMap<String, Vec<usize>>> {
        self.state.as_ref().map(|s| &s.k_cluster)
    }

    /// Centroid of `topic` from the last training run.
    pub fn centroid(&self, topic: &str) -> Option<&TermWeights> {
        self.state.as_ref().and_then(|s| s.mean_vectors.get(topic))
    }

    /// Sum of distances from every training document to its assigned
    /// centroid. Reporting diagnostic only; no convergence decision is
    /// made from it.
    pub fn error(&self) -> f64 {
        let Some(state) = self.state.as_ref() else {
            return 0.0;
        };
        let mut error = 0.0;
        for (topic, members) in &state.k_cluster {
            let Some(mean) = state.mean_vectors.get(topic) else {
                continue;
            };
            let mean_norm = state.mean_norms.get(topic).copied().unwrap_or(0.0);
            for &doc_id in members {
                error += distance(&state.documents[doc_id], mean, mean_norm + state.doc_norm[doc_id]);
            }
        }
        error
    }
}

impl KMeansState {
    /// Recompute each centroid as the mean of its members' term maps.
    /// A cluster with no members keeps its previous centroid.
    fn compute_means(&mut self, topics: &[String]) {
        for topic in topics {
            let members = match self.k_cluster.get(topic) {
                Some(members) if !members.is_empty() => members,
                _ => continue,
            };

            let mut mean = TermWeights::new();
            for &doc_id in members {
                for (term, &weight) in &self.documents[doc_id] {
                    *mean.entry(term.clone()).or_insert(0.0) += weight;
                }
            }
            let count = members.len() as f64;
            for weight in mean.values_mut() {
                *weight /= count;
            }
            self.mean_vectors.insert(topic.clone(), mean);
        }

        self.mean_norms = self
            .mean_vectors
            .iter()
            .map(|(topic, mean)| (topic.clone(), sq_norm(mean)))
            .collect();
    }

    /// Index into `topics` of the nearest centroid. The first cluster in
    /// topic order wins exact distance ties.
    fn nearest_cluster(&self, topics: &[String], terms: &TermWeights, term_norm: f64) -> usize {
        let mut assigned = 0;
        let mut min_distance = f64::INFINITY;
        for (cluster, topic) in topics.iter().enumerate() {
            let d = match self.mean_vectors.get(topic) {
                Some(mean) => {
                    let mean_norm = self.mean_norms.get(topic).copied().unwrap_or(0.0);
                    distance(terms, mean, mean_norm + term_norm)
                }
                // Never-populated cluster: distance to the zero vector.
                None => term_norm.sqrt(),
            };
            if d < min_distance {
                assigned = cluster;
                min_distance = d;
            }
        }
        assigned
    }

    /// Reassign every document to its nearest centroid and rebuild the
    /// partition. Distance evaluation shards across documents; the rebuild
    /// is sequential so membership order stays deterministic.
    fn compute_clusters(&mut self, topics: &[String]) {
        let state = &*self;
        let assignments: Vec<usize> = state
            .documents
            .par_iter()
            .enumerate()
            .map(|(doc_id, doc)| state.nearest_cluster(topics, doc, state.doc_norm[doc_id]))
            .collect();

        let mut k_cluster: IndexMap<String, Vec<usize>> =
            topics.iter().map(|t| (t.clone(), Vec::new())).collect();
        for (doc_id, &cluster) in assignments.iter().enumerate() {
            if let Some((_, members)) = k_cluster.get_index_mut(cluster) {
                members.push(doc_id);
            }
        }
        self.k_cluster = k_cluster;
    }

    fn cluster_sizes(&self) -> Vec<usize> {
        self.k_cluster.values().map(|members| members.len()).collect()
    }
}

impl Classifier for KMeansClustering {
    fn train(&mut self, documents: &[Document]) -> Result<()> {
        if documents.is_empty() {
            return Err(Error::EmptyTrainingSet);
        }

        // Group the combined term maps by topic; documents with labels
        // outside the configured topic list take no part in clustering.
        let mut grouped: IndexMap<&String, Vec<TermCounts>> =
            self.topics.iter().map(|t| (t, Vec::new())).collect();
        for doc in documents {
            if let Some(group) = grouped.get_mut(&doc.topic) {
                group.push(doc.combined_terms());
            }
        }

        let mut state = KMeansState::default();
        for (topic, group) in &grouped {
            let pruned = prune_terms(group, self.min_doc_freq);
            let members = state.k_cluster.entry((*topic).clone()).or_default();
            for counts in &pruned {
                let weights = counts_to_weights(counts);
                members.push(state.documents.len());
                state.doc_norm.push(sq_norm(&weights));
                state.documents.push(weights);
            }
        }

        state.compute_means(&self.topics);
        for iteration in 0..self.iterations {
            state.compute_clusters(&self.topics);
            state.compute_means(&self.topics);
            debug!(iteration, sizes = ?state.cluster_sizes(), "kmeans iteration");
        }

        info!(
            clusters = self.topics.len(),
            documents = state.documents.len(),
            iterations = self.iterations,
            "kmeans trained"
        );
        self.state = Some(state);
        Ok(())
    }

    fn classify(&self, documents: &[Document]) -> Result<Vec<String>> {
        let state = self.state.as_ref().ok_or(Error::EmptyTrainingSet)?;

        let mut predictions = Vec::with_capacity(documents.len());
        for doc in documents {
            let terms = counts_to_weights(&doc.combined_terms());
            let term_norm = sq_norm(&terms);
            let cluster = state.nearest_cluster(&self.topics, &terms, term_norm);
            predictions.push(self.topics[cluster].clone());
        }
        Ok(predictions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(topic: &str, text: &[&str]) -> Document {
        Document::new(topic, vec![], text.iter().map(|t| t.to_string()).collect())
    }

    fn counts(entries: &[(&str, u32)]) -> TermCounts {
        entries.iter().map(|(t, c)| (t.to_string(), *c)).collect()
    }

    fn weights(entries: &[(&str, f64)]) -> TermWeights {
        entries.iter().map(|(t, w)| (t.to_string(), *w)).collect()
    }

    #[test]
    fn distance_matches_the_closed_form() {
        let doc = weights(&[("x", 1.0)]);
        let mean = weights(&[("x", 0.5)]);
        // |doc|^2 = 1, |mean|^2 = 0.25, dot = 0.5.
        let d = distance(&doc, &mean, 1.0 + 0.25);
        assert!((d - 0.5).abs() < 1e-12);
    }

    #[test]
    fn prune_drops_rare_terms_and_emptied_documents() {
        let docs = vec![
            counts(&[("shared", 1), ("rare", 4)]),
            counts(&[("shared", 2)]),
            counts(&[("lonely", 1)]),
        ];
        let pruned = prune_terms(&docs, 2);
        // "rare" and "lonely" occur in a single document each; the third
        // document loses its only term and disappears.
        assert_eq!(pruned.len(), 2);
        assert_eq!(pruned[0], counts(&[("shared", 1)]));
        assert_eq!(pruned[1], counts(&[("shared", 2)]));
    }

    fn train_set() -> Vec<Document> {
        vec![
            doc("A", &["stock", "price", "stock"]),
            doc("A", &["stock", "price", "market"]),
            doc("A", &["price", "market", "stock"]),
            doc("B", &["goal", "team", "goal"]),
            doc("B", &["goal", "team", "match"]),
            doc("B", &["team", "match", "goal"]),
        ]
    }

    #[test]
    fn every_document_lands_in_exactly_one_cluster() {
        let mut km = KMeansClustering::new(vec!["A".to_string(), "B".to_string()]);
        km.train(&train_set()).unwrap();

        let clusters = km.clusters().unwrap();
        let mut seen: Vec<usize> = clusters.values().flatten().copied().collect();
        seen.sort_unstable();
        let total: usize = clusters.values().map(|m| m.len()).sum();
        assert_eq!(total, 6);
        assert_eq!(seen, (0..6).collect::<Vec<_>>());
    }

    #[test]
    fn warm_start_keeps_separable_topics_apart() {
        let mut km = KMeansClustering::new(vec!["A".to_string(), "B".to_string()]);
        km.train(&train_set()).unwrap();

        let test = vec![doc("", &["goal", "team"]), doc("", &["stock", "price"])];
        assert_eq!(
            km.classify(&test).unwrap(),
            vec!["B".to_string(), "A".to_string()]
        );
    }

    #[test]
    fn error_is_zero_for_identical_cluster_members() {
        // All documents of each topic are identical, so every centroid
        // coincides with its members.
        let docs = vec![
            doc("A", &["x", "y"]),
            doc("A", &["x", "y"]),
            doc("B", &["z", "w"]),
            doc("B", &["z", "w"]),
        ];
        let mut km = KMeansClustering::new(vec!["A".to_string(), "B".to_string()]);
        km.train(&docs).unwrap();
        assert!(km.error() < 1e-9);
    }

    #[test]
    fn classify_before_train_is_rejected() {
        let km = KMeansClustering::new(vec!["A".to_string()]);
        assert_eq!(
            km.classify(&[doc("", &["x"])]),
            Err(Error::EmptyTrainingSet)
        );
    }

    #[test]
    fn iteration_count_is_configurable() {
        let mut km =
            KMeansClustering::new(vec!["A".to_string(), "B".to_string()]).with_iterations(1);
        km.train(&train_set()).unwrap();
        assert!(km.clusters().is_some());
    }
}
