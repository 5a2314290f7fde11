//! Error types for fee-token

use solana_client::client_error::{ClientError, ClientErrorKind};
use solana_sdk::{program_error::ProgramError, pubkey::Pubkey, transaction::TransactionError};
use thiserror::Error;

/// Library error type
#[derive(Error, Debug)]
pub enum FeeTokenError {
    /// Fee rate above 100%
    #[error("Invalid fee basis points: {0} exceeds 10000")]
    InvalidFeeBasisPoints(u16),

    /// Human amount does not fit in base units
    #[error("Amount overflow: {0}")]
    AmountOverflow(String),

    /// Invalid parameters
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    /// Metadata failed validation
    #[error("Invalid metadata: {0}")]
    InvalidMetadata(String),

    /// Handoff requested after the mint authority was revoked
    #[error("Mint authority already revoked")]
    AuthorityRevoked,

    /// Plan requires a signature nobody provided
    #[error("Missing signer: {0}")]
    MissingSigner(Pubkey),

    /// Token program refused to build an instruction
    #[error("Instruction error: {0}")]
    Instruction(String),

    /// Plan does not fit in one transaction packet
    #[error("Transaction too large: {size} bytes exceeds {limit}")]
    TransactionTooLarge { size: usize, limit: usize },

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Key store error
    #[error("Key error: {0}")]
    Key(String),

    /// Configuration file error
    #[error("Config error: {0}")]
    Config(String),

    /// Read-only ledger query failed
    #[error("RPC error: {0}")]
    Rpc(String),

    /// Ledger submission failed; carried through unchanged
    #[error(transparent)]
    Submission(#[from] SubmissionError),
}

/// Failure reported by a [`crate::LedgerSubmitter`]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmissionError {
    #[error("Network failure: {0}")]
    Network(String),

    #[error("Signature mismatch: {0}")]
    SignatureMismatch(String),

    #[error("Program rejected transaction: {0}")]
    ProgramRejected(String),

    #[error("Insufficient balance: {0}")]
    InsufficientBalance(String),
}

impl From<ClientError> for SubmissionError {
    fn from(err: ClientError) -> Self {
        let message = err.to_string();
        if let Some(tx_err) = err.get_transaction_error() {
            return match tx_err {
                TransactionError::InsufficientFundsForFee
                | TransactionError::InsufficientFundsForRent { .. } => {
                    SubmissionError::InsufficientBalance(message)
                }
                TransactionError::SignatureFailure | TransactionError::MissingSignatureForFee => {
                    SubmissionError::SignatureMismatch(message)
                }
                _ => SubmissionError::ProgramRejected(message),
            };
        }
        match err.kind() {
            ClientErrorKind::SigningError(_) => SubmissionError::SignatureMismatch(message),
            _ => SubmissionError::Network(message),
        }
    }
}

impl From<ProgramError> for FeeTokenError {
    fn from(err: ProgramError) -> Self {
        FeeTokenError::Instruction(err.to_string())
    }
}

impl From<std::io::Error> for FeeTokenError {
    fn from(err: std::io::Error) -> Self {
        FeeTokenError::Key(err.to_string())
    }
}

impl From<toml::de::Error> for FeeTokenError {
    fn from(err: toml::de::Error) -> Self {
        FeeTokenError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for FeeTokenError {
    fn from(err: toml::ser::Error) -> Self {
        FeeTokenError::Config(err.to_string())
    }
}

pub type FeeTokenResult<T> = Result<T, FeeTokenError>;
