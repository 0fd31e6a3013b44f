use ahash::AHashSet;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::classify::{argmax_topic, topic_list, Classifier};
use crate::document::Document;
use crate::error::{Error, Result};
use crate::topic::{LocalTopicIndex, TopicSet};

/// Rank classifier over per-topic local indices.
///
/// Training builds one [`LocalTopicIndex`] per topic from that topic's
/// documents, with the cross-topic common text tokens suppressed.
/// Classification scores a document against every topic index: title tokens
/// found in the topic's title index count double, title tokens only found
/// in the text index count 1.5x, text tokens count once. Both sums are
/// divided by their partition length before being added, so title and text
/// contribute on the same scale regardless of document size.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RankClassifier {
    topics: Vec<String>,
    topic_set: Option<TopicSet>,
    index_dict: IndexMap<String, LocalTopicIndex>,
}

impl RankClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Topic labels seen at training time, in first-seen order.
    #[inline]
    pub fn topics(&self) -> &[String] {
        &self.topics
    }

    /// Common-token statistics from the last training run.
    #[inline]
    pub fn topic_set(&self) -> Option<&TopicSet> {
        self.topic_set.as_ref()
    }

    /// Per-topic index from the last training run.
    #[inline]
    pub fn index(&self, topic: &str) -> Option<&LocalTopicIndex> {
        self.index_dict.get(topic)
    }

    fn score(doc: &Document, index: &LocalTopicIndex) -> f64 {
        let title_len = doc.title_tokens.len() as f64;
        let text_len = doc.text_tokens.len() as f64;

        let mut title_score = 0.0;
        for token in &doc.title_tokens {
            if let Some(weight) = index.topic_title_tfidf(token) {
                title_score += 2.0 * weight;
            } else if let Some(weight) = index.topic_text_tfidf(token) {
                title_score += 1.5 * weight;
            }
        }

        let mut text_score = 0.0;
        for token in &doc.text_tokens {
            if let Some(weight) = index.topic_text_tfidf(token) {
                text_score += weight;
            }
        }

        title_score / title_len + text_score / text_len
    }
}

impl Classifier for RankClassifier {
    fn train(&mut self, documents: &[Document]) -> Result<()> {
        if documents.is_empty() {
            return Err(Error::EmptyTrainingSet);
        }

        self.topics = topic_list(documents);
        let topic_set = TopicSet::new(documents, &self.topics);

        // The text common tokens are the suppression set for both
        // partitions; no separate title exclusions are fed in.
        let text_exclude: AHashSet<String> =
            topic_set.text_common_tokens.iter().cloned().collect();
        let title_exclude = AHashSet::new();

        self.index_dict = IndexMap::with_capacity(self.topics.len());
        for topic in &self.topics {
            let topic_docs: Vec<&Document> =
                documents.iter().filter(|d| d.topic == *topic).collect();
            self.index_dict.insert(
                topic.clone(),
                LocalTopicIndex::new(&topic_docs, &text_exclude, &title_exclude),
            );
        }

        info!(
            topics = self.topics.len(),
            suppressed_tokens = text_exclude.len(),
            documents = documents.len(),
            "rank classifier trained"
        );
        self.topic_set = Some(topic_set);
        Ok(())
    }

    fn classify(&self, documents: &[Document]) -> Result<Vec<String>> {
        if self.index_dict.is_empty() {
            return Err(Error::EmptyTrainingSet);
        }

        let mut predictions = Vec::with_capacity(documents.len());
        for (position, doc) in documents.iter().enumerate() {
            if doc.title_tokens.is_empty() || doc.text_tokens.is_empty() {
                return Err(Error::DegenerateDocument { position });
            }

            let mut scores: IndexMap<String, f64> = IndexMap::new();
            for (topic, index) in &self.index_dict {
                scores.insert(topic.clone(), Self::score(doc, index));
            }
            // index_dict is non-empty, so the argmax always exists
            predictions.push(argmax_topic(&scores).unwrap());
        }
        Ok(predictions)
    }
}
