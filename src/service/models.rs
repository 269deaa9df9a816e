//! Request and response models for the fairness service
//!
//! Every type here is the wire shape of one boundary operation.

use crate::errors::FairnessError;
use crate::games::{GameOutcome, GameType};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitRequest {
    pub owner_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommitResponse {
    pub commitment_id: String,
    pub server_seed_hash: String,
    pub round_index: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayRequest {
    pub commitment_id: String,
    pub owner_id: String,
    pub game_type: String,
    pub client_seed: String,
    pub bet_amount: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayResponse {
    pub outcome: GameOutcome,
    pub round_index: u64,
    pub server_seed_hash: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevealRequest {
    pub commitment_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RevealResponse {
    pub server_seed: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyRequest {
    pub game_type: String,
    pub client_seed: String,
    pub server_seed: String,
    pub server_seed_hash: String,
    pub round_index: u64,
    pub claimed_outcome: GameOutcome,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VerifyResponse {
    pub verified: bool,
}

/// Hand-off to the ledger once an outcome is final
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Settlement {
    pub owner_id: String,
    pub commitment_id: String,
    pub game_type: GameType,
    pub bet_amount: u64,
    pub payout_amount: u64,
}

/// Transport-neutral classification of a failure, with its HTTP status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorStatus {
    BadRequest,
    Forbidden,
    NotFound,
    Conflict,
    InternalError,
}

impl ErrorStatus {
    pub fn http_code(&self) -> u16 {
        match self {
            ErrorStatus::BadRequest => 400,
            ErrorStatus::Forbidden => 403,
            ErrorStatus::NotFound => 404,
            ErrorStatus::Conflict => 409,
            ErrorStatus::InternalError => 500,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ErrorStatus::BadRequest => "BAD_REQUEST",
            ErrorStatus::Forbidden => "FORBIDDEN",
            ErrorStatus::NotFound => "NOT_FOUND",
            ErrorStatus::Conflict => "CONFLICT",
            ErrorStatus::InternalError => "INTERNAL_ERROR",
        }
    }
}

impl From<&FairnessError> for ErrorStatus {
    fn from(err: &FairnessError) -> Self {
        match err {
            FairnessError::InvalidInput(_) | FairnessError::UnknownGameType(_) => ErrorStatus::BadRequest,
            FairnessError::OwnerMismatch { .. } => ErrorStatus::Forbidden,
            FairnessError::NotFound(_) => ErrorStatus::NotFound,
            FairnessError::AlreadyUsed(_) | FairnessError::NotRevealable(_) => ErrorStatus::Conflict,
            FairnessError::Storage(_) | FairnessError::Configuration(_) => ErrorStatus::InternalError,
        }
    }
}

/// Structured error body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub status: u16,
    pub code: String,
    pub message: String,
}

impl From<&FairnessError> for ErrorBody {
    fn from(err: &FairnessError) -> Self {
        let status = ErrorStatus::from(err);
        // Infrastructure detail stays in the logs.
        let message = if err.is_infrastructure() {
            "internal error".to_string()
        } else {
            err.to_string()
        };

        Self {
            status: status.http_code(),
            code: status.code().to_string(),
            message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::StorageError;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (FairnessError::NotFound("c".into()), 404),
            (FairnessError::AlreadyUsed("c".into()), 409),
            (FairnessError::NotRevealable("c".into()), 409),
            (FairnessError::UnknownGameType("craps".into()), 400),
            (FairnessError::InvalidInput("bet".into()), 400),
            (
                FairnessError::OwnerMismatch {
                    commitment_id: "c".into(),
                    owner_id: "bob".into(),
                },
                403,
            ),
            (StorageError::ReadFailed("io".into()).into(), 500),
        ];

        for (err, code) in cases {
            assert_eq!(ErrorStatus::from(&err).http_code(), code, "{}", err);
        }
    }

    #[test]
    fn test_error_body_hides_storage_detail() {
        let err: FairnessError = StorageError::ReadFailed("/var/lib/secret path".into()).into();
        let body = ErrorBody::from(&err);
        assert_eq!(body.code, "INTERNAL_ERROR");
        assert!(!body.message.contains("secret"));

        let body = ErrorBody::from(&FairnessError::AlreadyUsed("c-9".into()));
        assert_eq!(body.status, 409);
        assert!(body.message.contains("c-9"));
    }
}
