use thiserror::Error;

use crate::strategy::ActionKind;

/// Fixed-point conversion failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnitsError {
    #[error("value does not fit in a decimal with {decimals} fraction digits")]
    Overflow { decimals: u32 },
    #[error("negative amount")]
    Negative,
    #[error("amount has more than {decimals} fraction digits")]
    TooPrecise { decimals: u32 },
    #[error("amount is below the minimum of {min}")]
    BelowMinimum { min: rust_decimal::Decimal },
    #[error("invalid amount: {0}")]
    Parse(String),
}

/// Wallet connection failures. All of them are retryable by connecting again.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectError {
    #[error("no wallet configured")]
    NoWallet,
    #[error("no account connected")]
    NotConnected,
    #[error("wallet rejected the connection: {0}")]
    Rejected(String),
    #[error("wrong network: expected chain {expected}, wallet is on {actual}")]
    WrongNetwork { expected: u64, actual: u64 },
    #[error("rpc error: {0}")]
    Rpc(String),
}

impl ConnectError {
    /// Message shown to the user.
    pub fn user_message(&self) -> String {
        match self {
            Self::NoWallet => "Please configure a wallet!".to_string(),
            Self::NotConnected => "Please connect your wallet!".to_string(),
            Self::WrongNetwork { expected, .. } => {
                format!("Please switch to chain {} manually!", expected)
            }
            Self::Rejected(_) | Self::Rpc(_) => "Failed to connect wallet".to_string(),
        }
    }
}

/// A read in the snapshot batch failed. The whole batch is discarded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReadError {
    #[error("reading {field} failed: {reason}")]
    Call { field: &'static str, reason: String },
    #[error("decoding {field} failed: {source}")]
    Decode {
        field: &'static str,
        #[source]
        source: UnitsError,
    },
    #[error("unknown winning side code {0}")]
    UnknownSide(u8),
}

/// A mutating action failed or was refused before submission.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WriteError {
    #[error("another transaction is still pending")]
    Busy,
    #[error("{0:?} is not allowed in the current market state")]
    NotPermitted(ActionKind),
    #[error("invalid amount: {0}")]
    Amount(#[from] UnitsError),
    #[error("transaction rejected: {0}")]
    Rejected(String),
    #[error("transaction {tx_hash} reverted")]
    Reverted { tx_hash: String },
}
