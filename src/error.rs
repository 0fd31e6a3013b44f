use thiserror::Error;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the indexing, classification and retrieval components.
///
/// The engine is a pure batch computation, so every variant maps to a
/// precondition violation on the input rather than a runtime fault.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A classifier was trained on (or asked to classify with) zero documents.
    /// Priors and centroid averages are undefined in that case.
    #[error("cannot train or classify with an empty document set")]
    EmptyTrainingSet,

    /// A document reached rank scoring with an empty title or text partition.
    /// Both partition lengths are score divisors, so the caller must filter
    /// such documents out beforehand.
    #[error("document at position {position} has an empty title or text token list")]
    DegenerateDocument {
        /// Position of the offending document in the classify input.
        position: usize,
    },

    /// More neighbours were requested than candidates exist.
    /// The search reports this instead of returning a short list.
    #[error("requested {requested} neighbours but only {available} candidates are eligible")]
    NeighbourCountOutOfRange {
        /// Requested neighbour count.
        requested: usize,
        /// Number of eligible candidates after excluding the target.
        available: usize,
    },
}
