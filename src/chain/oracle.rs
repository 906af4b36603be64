use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::sol;
use alloy_primitives::{address, Address};
use reqwest::Url;

use super::{OracleReader, OracleRound};
use crate::error::ReadError;

/// Chainlink ETH/USD aggregator on mainnet.
pub const ETH_USD_FEED: Address = address!("0x5f4eC3Df9cbd43714FE2740f5E3616155c5b8419");

sol! {
    #[sol(rpc)]
    interface AggregatorV3Interface {
        function decimals() external view returns (uint8);
        function latestRoundData() external view returns (
            uint80 roundId,
            int256 answer,
            uint256 startedAt,
            uint256 updatedAt,
            uint80 answeredInRound
        );
    }
}

/// Chainlink-style aggregator read over its own (read-only) provider.
#[derive(Clone)]
pub struct AlloyOracle {
    feed: AggregatorV3Interface::AggregatorV3InterfaceInstance<DynProvider>,
}

impl AlloyOracle {
    pub fn new(address: Address, provider: DynProvider) -> Self {
        Self {
            feed: AggregatorV3Interface::new(address, provider),
        }
    }

    /// Read-only oracle on a separate endpoint (usually mainnet).
    pub fn connect_http(rpc_url: Url, address: Address) -> Self {
        let provider = ProviderBuilder::new().connect_http(rpc_url).erased();
        Self::new(address, provider)
    }
}

impl OracleReader for AlloyOracle {
    async fn latest_round(&self) -> Result<OracleRound, ReadError> {
        let decimals = self.feed.decimals();
        let round = self.feed.latestRoundData();
        let (decimals, round) = tokio::try_join!(decimals.call(), round.call()).map_err(|e| {
            ReadError::Call {
                field: "latestRoundData",
                reason: e.to_string(),
            }
        })?;
        Ok(OracleRound {
            answer: round.answer,
            decimals,
        })
    }
}
