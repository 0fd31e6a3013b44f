/// This crate is a batch Topic Classification and Retrieval Engine.
/// It operates over a fixed, in-memory corpus of labeled documents that a
/// loading stage has already reduced to token sequences and term counts.
pub mod classify;
pub mod document;
pub mod error;
pub mod knn;
pub mod topic;
pub mod utils;
pub mod weighting;

/// Document model
/// A labeled document reduced to title/text token sequences and term counts.
/// The weighting index writes `tfidf` and `tfidfie` weight maps back onto
/// each document once per training run; the `vector` field is assigned by
/// the caller and feeds nearest-neighbour search.
pub use document::{count_terms, Document, TermCounts, TermWeights};

/// Corpus-wide weighting index
/// Builds document frequencies, per-topic document frequencies and term
/// entropy over a training corpus, then derives tf-idf and entropy-weighted
/// tf-idf ("tfidfie") vectors per document. Both weight maps are
/// L2-normalized and sparsified to the top 30 entries before being written
/// onto the documents.
pub use weighting::{WeightingIndex, SPARSE_TOP_TERMS};

/// Per-topic statistics and local indices
/// `TopicSet` detects tokens whose document-frequency fraction clears 0.1
/// in more than half the topics; those are generic vocabulary and get
/// suppressed. `LocalTopicIndex` indexes one topic's documents (title and
/// text separately) and exposes the topic-aggregate term weights the rank
/// classifier scores against.
pub use topic::{LocalTopicIndex, TopicSet};

/// Classifiers
/// Three independent topic classifiers behind one `Classifier` contract:
/// - `NaiveBayesClassifier`: multinomial-style scoring over Laplace-smoothed
///   per-class document frequencies
/// - `RankClassifier`: title/text overlap scoring against each topic's
///   local index
/// - `KMeansClustering`: label-seeded clustering of combined term vectors,
///   classifying by nearest centroid
pub use classify::{Classifier, KMeansClustering, NaiveBayesClassifier, RankClassifier};

/// Nearest-neighbour search
/// Similarity search over whatever `vector` map the caller assigned to the
/// documents. `find_k_neighbours` returns the top `k` candidates most
/// similar to a target, best first, and refuses requests larger than the
/// eligible candidate pool.
pub use knn::{cosine_similarity, euclidean_distance, KnnSimilaritySearch};

/// Error type
/// Every failure is a precondition violation on the input: an empty
/// training set, a document with an empty token partition, or a neighbour
/// request exceeding the candidate pool.
pub use error::{Error, Result};
