use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("receive timed out")]
    ReceiveTimeout,
    #[error("peer closed the connection (got {received} of {expected} bytes)")]
    ConnectionClosed { expected: usize, received: usize },
    #[error("send failed: {0}")]
    SendFailure(#[source] std::io::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TransportError {
    pub fn closed(expected: usize, received: usize) -> Self {
        Self::ConnectionClosed { expected, received }
    }
}

pub type Result<T> = std::result::Result<T, TransportError>;
