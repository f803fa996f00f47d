use thiserror::Error;

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("buffer too short: need {needed} bytes at offset {offset}, have {available}")]
    OutOfBounds {
        offset: usize,
        needed: usize,
        available: usize,
    },
    #[error("insufficient bytes: need {needed} for {what}, have {available}")]
    Insufficient {
        what: &'static str,
        needed: usize,
        available: usize,
    },
    #[error("invalid UTF-8 in flex string")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),
}

impl CodecError {
    pub fn insufficient(what: &'static str, needed: usize, available: usize) -> Self {
        Self::Insufficient {
            what,
            needed,
            available,
        }
    }
}

pub type Result<T> = std::result::Result<T, CodecError>;
