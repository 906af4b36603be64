//! Typed access to the external market contract, the price oracle and the
//! wallet. The traits are what the view model depends on; the alloy types
//! in the submodules bind them to a JSON-RPC endpoint.

mod contract;
mod oracle;
mod wallet;

pub use contract::AlloyMarket;
pub use oracle::{AlloyOracle, ETH_USD_FEED};
pub use wallet::AlloyWallet;

use std::future::Future;

use alloy_primitives::{Address, I256, U256};

use crate::error::{ConnectError, ReadError, WriteError};

/// Read-only calls on the market contract. Values come back in their raw
/// on-chain encoding; scaling happens in the snapshot builder.
pub trait MarketReader: Send + Sync {
    fn owner(&self) -> impl Future<Output = Result<Address, ReadError>> + Send;
    fn market_opened(&self) -> impl Future<Output = Result<bool, ReadError>> + Send;
    fn market_resolved(&self) -> impl Future<Output = Result<bool, ReadError>> + Send;
    fn start_price(&self) -> impl Future<Output = Result<I256, ReadError>> + Send;
    fn end_price(&self) -> impl Future<Output = Result<I256, ReadError>> + Send;
    fn betting_deadline(&self) -> impl Future<Output = Result<U256, ReadError>> + Send;
    fn total_up_bet(&self) -> impl Future<Output = Result<U256, ReadError>> + Send;
    fn total_down_bet(&self) -> impl Future<Output = Result<U256, ReadError>> + Send;
    fn contract_balance(&self) -> impl Future<Output = Result<U256, ReadError>> + Send;
    fn up_bet(&self, account: Address) -> impl Future<Output = Result<U256, ReadError>> + Send;
    fn down_bet(&self, account: Address) -> impl Future<Output = Result<U256, ReadError>> + Send;
    fn claimed(&self, account: Address) -> impl Future<Output = Result<bool, ReadError>> + Send;
    /// Side code {0 none, 1 up, 2 down}. Only meaningful once resolved.
    fn winning_side(&self) -> impl Future<Output = Result<u8, ReadError>> + Send;
}

/// A confirmed, successful transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxReceipt {
    pub tx_hash: String,
}

/// State-changing calls. Each future resolves once the receipt is in.
pub trait MarketWriter: Send + Sync {
    fn bet_up(&self, wei: U256) -> impl Future<Output = Result<TxReceipt, WriteError>> + Send;
    fn bet_down(&self, wei: U256) -> impl Future<Output = Result<TxReceipt, WriteError>> + Send;
    fn claim(&self) -> impl Future<Output = Result<TxReceipt, WriteError>> + Send;
    fn open_market(&self, duration_secs: u64) -> impl Future<Output = Result<TxReceipt, WriteError>> + Send;
    fn resolve_market(&self) -> impl Future<Output = Result<TxReceipt, WriteError>> + Send;
}

/// Latest oracle round, unscaled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OracleRound {
    pub answer: I256,
    pub decimals: u8,
}

/// Price feed used for the live chart. Display only.
pub trait OracleReader: Send + Sync {
    fn latest_round(&self) -> impl Future<Output = Result<OracleRound, ReadError>> + Send;
}

/// The wallet/session collaborator.
pub trait WalletProvider: Send + Sync {
    /// Account that signs for this session.
    fn connect(&self) -> impl Future<Output = Result<Address, ConnectError>> + Send;
    /// Chain the wallet is currently on.
    fn chain_id(&self) -> impl Future<Output = Result<u64, ConnectError>> + Send;
    /// Ask the wallet to move to another chain.
    fn switch_chain(&self, chain_id: u64) -> impl Future<Output = Result<(), ConnectError>> + Send;
}
