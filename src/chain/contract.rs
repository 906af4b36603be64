use alloy::contract::Error as ContractError;
use alloy::network::Ethereum;
use alloy::providers::{DynProvider, PendingTransactionBuilder};
use alloy::sol;
use alloy_primitives::{Address, I256, U256};
use tracing::debug;

use super::{MarketReader, MarketWriter, TxReceipt};
use crate::error::{ReadError, WriteError};

sol! {
    #[sol(rpc)]
    interface ISimplePredictionMarket {
        function owner() external view returns (address);
        function marketOpened() external view returns (bool);
        function marketResolved() external view returns (bool);
        function startPrice() external view returns (int256);
        function endPrice() external view returns (int256);
        function bettingDeadline() external view returns (uint256);
        function totalUpBet() external view returns (uint256);
        function totalDownBet() external view returns (uint256);
        function getContractBalance() external view returns (uint256);
        function upBets(address account) external view returns (uint256);
        function downBets(address account) external view returns (uint256);
        function claimed(address account) external view returns (bool);
        function getWinningSide() external view returns (uint8);

        function betUp() external payable;
        function betDown() external payable;
        function claim() external;
        function openMarket(uint256 duration) external;
        function resolveMarket() external;
    }
}

/// The market contract behind a JSON-RPC provider.
#[derive(Clone)]
pub struct AlloyMarket {
    contract: ISimplePredictionMarket::ISimplePredictionMarketInstance<DynProvider>,
}

impl AlloyMarket {
    pub fn new(address: Address, provider: DynProvider) -> Self {
        Self {
            contract: ISimplePredictionMarket::new(address, provider),
        }
    }

    pub fn address(&self) -> Address {
        *self.contract.address()
    }
}

fn read_err(field: &'static str) -> impl FnOnce(ContractError) -> ReadError {
    move |e| ReadError::Call {
        field,
        reason: e.to_string(),
    }
}

/// Wait for the receipt and turn a revert into an error.
async fn confirm(
    sent: Result<PendingTransactionBuilder<Ethereum>, ContractError>,
) -> Result<TxReceipt, WriteError> {
    let pending = sent.map_err(|e| WriteError::Rejected(e.to_string()))?;
    debug!(tx = %pending.tx_hash(), "transaction submitted");
    let receipt = pending
        .get_receipt()
        .await
        .map_err(|e| WriteError::Rejected(e.to_string()))?;
    let tx_hash = receipt.transaction_hash.to_string();
    if !receipt.status() {
        return Err(WriteError::Reverted { tx_hash });
    }
    Ok(TxReceipt { tx_hash })
}

impl MarketReader for AlloyMarket {
    async fn owner(&self) -> Result<Address, ReadError> {
        self.contract.owner().call().await.map_err(read_err("owner"))
    }

    async fn market_opened(&self) -> Result<bool, ReadError> {
        self.contract
            .marketOpened()
            .call()
            .await
            .map_err(read_err("marketOpened"))
    }

    async fn market_resolved(&self) -> Result<bool, ReadError> {
        self.contract
            .marketResolved()
            .call()
            .await
            .map_err(read_err("marketResolved"))
    }

    async fn start_price(&self) -> Result<I256, ReadError> {
        self.contract
            .startPrice()
            .call()
            .await
            .map_err(read_err("startPrice"))
    }

    async fn end_price(&self) -> Result<I256, ReadError> {
        self.contract
            .endPrice()
            .call()
            .await
            .map_err(read_err("endPrice"))
    }

    async fn betting_deadline(&self) -> Result<U256, ReadError> {
        self.contract
            .bettingDeadline()
            .call()
            .await
            .map_err(read_err("bettingDeadline"))
    }

    async fn total_up_bet(&self) -> Result<U256, ReadError> {
        self.contract
            .totalUpBet()
            .call()
            .await
            .map_err(read_err("totalUpBet"))
    }

    async fn total_down_bet(&self) -> Result<U256, ReadError> {
        self.contract
            .totalDownBet()
            .call()
            .await
            .map_err(read_err("totalDownBet"))
    }

    async fn contract_balance(&self) -> Result<U256, ReadError> {
        self.contract
            .getContractBalance()
            .call()
            .await
            .map_err(read_err("getContractBalance"))
    }

    async fn up_bet(&self, account: Address) -> Result<U256, ReadError> {
        self.contract
            .upBets(account)
            .call()
            .await
            .map_err(read_err("upBets"))
    }

    async fn down_bet(&self, account: Address) -> Result<U256, ReadError> {
        self.contract
            .downBets(account)
            .call()
            .await
            .map_err(read_err("downBets"))
    }

    async fn claimed(&self, account: Address) -> Result<bool, ReadError> {
        self.contract
            .claimed(account)
            .call()
            .await
            .map_err(read_err("claimed"))
    }

    async fn winning_side(&self) -> Result<u8, ReadError> {
        self.contract
            .getWinningSide()
            .call()
            .await
            .map_err(read_err("getWinningSide"))
    }
}

impl MarketWriter for AlloyMarket {
    async fn bet_up(&self, wei: U256) -> Result<TxReceipt, WriteError> {
        confirm(self.contract.betUp().value(wei).send().await).await
    }

    async fn bet_down(&self, wei: U256) -> Result<TxReceipt, WriteError> {
        confirm(self.contract.betDown().value(wei).send().await).await
    }

    async fn claim(&self) -> Result<TxReceipt, WriteError> {
        confirm(self.contract.claim().send().await).await
    }

    async fn open_market(&self, duration_secs: u64) -> Result<TxReceipt, WriteError> {
        confirm(
            self.contract
                .openMarket(U256::from(duration_secs))
                .send()
                .await,
        )
        .await
    }

    async fn resolve_market(&self) -> Result<TxReceipt, WriteError> {
        confirm(self.contract.resolveMarket().send().await).await
    }
}
