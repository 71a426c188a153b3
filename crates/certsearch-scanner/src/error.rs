use certsearch_core::ScanRange;
use certsearch_db::DatabaseError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("could not decode results of batch {range}: {source}")]
    Decode {
        range: ScanRange,
        #[source]
        source: DatabaseError,
    },
}

pub type Result<T> = std::result::Result<T, ScanError>;
