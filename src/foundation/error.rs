pub type MemeResult<T> = Result<T, MemeError>;

#[derive(thiserror::Error, Debug)]
pub enum MemeError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("decode error: {0}")]
    Decode(String),

    #[error("encode error: {0}")]
    Encode(String),

    #[error("store error: {0}")]
    Store(String),

    #[error("an export is already in progress")]
    Busy,

    #[error("animation '{0}' requires VIP access")]
    VipRequired(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl MemeError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }
}
