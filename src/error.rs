/// Failures surfaced by the practice engine.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Not enough cards, vocabulary or sentences to build the requested structure.
    #[error("not enough content to build {0}")]
    ContentInsufficient(String),

    /// Segmentation or alignment produced offsets that do not reconstruct the input.
    #[error("alignment invariant violated: {0}")]
    AlignmentInvariant(String),

    /// Caller passed input a sampler cannot work with (e.g. an empty pool).
    #[error("precondition violated: {0}")]
    Precondition(&'static str),
}

impl EngineError {
    pub fn insufficient(what: impl Into<String>) -> Self {
        EngineError::ContentInsufficient(what.into())
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
