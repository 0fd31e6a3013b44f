pub mod bayes;
pub mod kmeans;
pub mod rank;

use indexmap::IndexMap;

use crate::document::Document;
use crate::error::Result;

pub use bayes::NaiveBayesClassifier;
pub use kmeans::KMeansClustering;
pub use rank::RankClassifier;

/// Common train/classify contract of the topic classifiers.
///
/// `train` consumes labeled documents and builds internal state; `classify`
/// returns one predicted topic label per input document, in input order.
/// The evaluation stage pairs the predictions with the true labels.
pub trait Classifier {
    /// Build classifier state from labeled training documents.
    fn train(&mut self, documents: &[Document]) -> Result<()>;

    /// Predict a topic label for each document.
    fn classify(&self, documents: &[Document]) -> Result<Vec<String>>;
}

/// Topic with the highest score. Exact score ties go to the
/// lexicographically smaller label so predictions are reproducible.
pub(crate) fn argmax_topic(scores: &IndexMap<String, f64>) -> Option<String> {
    let mut best: Option<(&String, f64)> = None;
    for (topic, &score) in scores {
        best = match best {
            None => Some((topic, score)),
            Some((best_topic, best_score)) => {
                if score > best_score || (score == best_score && topic < best_topic) {
                    Some((topic, score))
                } else {
                    Some((best_topic, best_score))
                }
            }
        };
    }
    best.map(|(topic, _)| topic.clone())
}

/// Unique topic labels in first-seen order.
pub(crate) fn topic_list(documents: &[Document]) -> Vec<String> {
    let mut topics = Vec::new();
    for doc in documents {
        if !topics.contains(&doc.topic) {
            topics.push(doc.topic.clone());
        }
    }
    topics
}
