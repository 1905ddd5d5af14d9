use crate::store::StoreError;

#[derive(Debug)]
pub enum EngineError {
    /// Missing or malformed input, or a value outside its closed set.
    Validation(String),
    /// Space, user, or reservation absent. Also covers ownership mismatches,
    /// which are deliberately indistinguishable from absence.
    NotFound(String),
    /// A requested hour-slot is already held. Names the first losing hour.
    Conflict {
        hour: u8,
        /// Whether hours claimed earlier in the same request were all
        /// released again. When false, some of them may remain committed.
        rolled_back: bool,
    },
    /// The store or a directory misbehaved. Safe to retry.
    Dependency(String),
}

impl EngineError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, EngineError::Dependency(_))
    }
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::Validation(msg) => write!(f, "{msg}"),
            EngineError::NotFound(msg) => write!(f, "{msg}"),
            EngineError::Conflict { hour, rolled_back } => {
                if *rolled_back {
                    write!(
                        f,
                        "hour {hour} is already reserved; earlier hours in this request were released"
                    )
                } else {
                    write!(
                        f,
                        "hour {hour} is already reserved; earlier hours in this request may remain committed"
                    )
                }
            }
            EngineError::Dependency(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for EngineError {}

impl From<StoreError> for EngineError {
    fn from(e: StoreError) -> Self {
        EngineError::Dependency(e.to_string())
    }
}
