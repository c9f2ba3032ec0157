//! Index lifecycle states

/// Lifecycle state of an index
///
/// Staleness is advisory: `Stale`, `Building`, and `Failed` indexes keep
/// serving reads against the last successfully built vector structure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexState {
    /// No documents yet
    Empty,
    /// Documents changed since the last successful rebuild
    Stale,
    /// A rebuild is running; at most one per index
    Building,
    /// Vector structure matches the document set
    Ready,
    /// Last rebuild failed, or the persisted store is corrupt
    Failed { cause: String },
}

impl IndexState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Stale => "stale",
            Self::Building => "building",
            Self::Ready => "ready",
            Self::Failed { .. } => "failed",
        }
    }

    pub fn is_building(&self) -> bool {
        matches!(self, Self::Building)
    }

    pub fn failure_cause(&self) -> Option<&str> {
        match self {
            Self::Failed { cause } => Some(cause),
            _ => None,
        }
    }

    /// State after a document mutation
    ///
    /// While building, the mutation is recorded in the store but the
    /// staleness effect is deferred to build completion.
    pub fn after_mutation(&self) -> IndexState {
        match self {
            Self::Building => Self::Building,
            _ => Self::Stale,
        }
    }
}
