use crate::domain::amount::Sat;
use crate::domain::ports::IssueError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PayoutError>;

#[derive(Error, Debug)]
pub enum PayoutError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("ledger node query failed: {0}")]
    UpstreamQuery(String),
    #[error("invoice issuance failed: {0}")]
    Issuance(#[from] IssueError),
    #[error("sum of payouts {split} does not match settled total {settled}")]
    Consistency { split: Sat, settled: Sat },
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
