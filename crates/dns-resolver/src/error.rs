#[derive(Clone, Debug, thiserror::Error, PartialEq)]
pub enum DnsError {
    #[error("invalid DNS name: {0}")]
    InvalidName(String),
    #[error("DNS query failed: {0}")]
    QueryFailed(String),
    #[error("no records found")]
    NoRecords,
    #[error("DNS query timed out")]
    Timeout,
}
