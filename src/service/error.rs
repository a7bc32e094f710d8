use thiserror::Error;

/// Domain errors the HTTP layer maps onto status codes. Anything the
/// services cannot classify becomes `Unexpected` and is logged at the point
/// of escalation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ServiceError {
    #[error("invalid credentials: {0}")]
    InvalidCredentials(String),

    #[error("user already exists")]
    UserAlreadyExists,

    #[error("invalid token")]
    InvalidToken,

    #[error("token expired")]
    TokenExpired,

    #[error("invalid order number")]
    InvalidOrderNumber,

    #[error("order already uploaded by this user")]
    UploadedBySameUser,

    #[error("order already uploaded by another user")]
    UploadedByAnotherUser,

    #[error("sum must be positive")]
    InvalidSum,

    #[error("insufficient funds")]
    InsufficientFunds,

    #[error("unexpected error")]
    Unexpected,
}
