//! Cart operation errors.
//!
//! Every failure a cart operation can hit is one of these. The UI-facing
//! controller operations reduce them to a log entry; the `try_` variants hand
//! them to the caller.

use cart_drawer_core::DecodeError;
use thiserror::Error;

/// Errors that can occur while talking to the remote cart or rendering it.
#[derive(Debug, Error)]
pub enum CartError {
    /// The request never completed (connection refused, reset, TLS, ...).
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("Cart rejected request: {status} - {message}")]
    Rejected { status: u16, message: String },

    /// The server answered, but not with the expected shape.
    #[error("Malformed response: {0}")]
    Malformed(#[from] DecodeError),

    /// The drawer template failed to render.
    #[error("Render error: {0}")]
    Render(#[from] askama::Error),
}

impl CartError {
    /// Short machine-readable category, used as a structured log field.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Network(_) => "network",
            Self::Rejected { .. } => "rejected",
            Self::Malformed(_) => "malformed",
            Self::Render(_) => "render",
        }
    }
}

/// Result type alias for `CartError`.
pub type Result<T> = std::result::Result<T, CartError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cart_error_display() {
        let err = CartError::Rejected {
            status: 422,
            message: "Cannot find variant".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Cart rejected request: 422 - Cannot find variant"
        );

        let err = CartError::from(DecodeError::MissingItemId);
        assert_eq!(err.to_string(), "Malformed response: response has no item id");
    }

    #[test]
    fn test_cart_error_kind() {
        assert_eq!(CartError::from(DecodeError::EmptyKey).kind(), "malformed");
        assert_eq!(
            CartError::Rejected {
                status: 500,
                message: String::new()
            }
            .kind(),
            "rejected"
        );
    }
}
