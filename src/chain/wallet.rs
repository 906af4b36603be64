use alloy::network::EthereumWallet;
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::signers::local::PrivateKeySigner;
use alloy_primitives::Address;
use reqwest::Url;

use super::{AlloyMarket, WalletProvider};
use crate::error::ConnectError;

/// A local private-key signer on one JSON-RPC endpoint.
///
/// The endpoint decides the chain, so a chain switch can only be done by
/// pointing the config at another RPC url.
#[derive(Clone)]
pub struct AlloyWallet {
    provider: DynProvider,
    signer: Option<Address>,
}

impl AlloyWallet {
    /// Build the provider. Without a key the wallet can read but `connect`
    /// fails with `NoWallet`.
    pub fn connect_http(rpc_url: Url, private_key: Option<&str>) -> Result<Self, ConnectError> {
        match private_key {
            Some(key) => {
                let signer: PrivateKeySigner = key
                    .trim()
                    .parse()
                    .map_err(|e| ConnectError::Rejected(format!("invalid private key: {}", e)))?;
                let address = signer.address();
                let provider = ProviderBuilder::new()
                    .wallet(EthereumWallet::from(signer))
                    .connect_http(rpc_url)
                    .erased();
                Ok(Self {
                    provider,
                    signer: Some(address),
                })
            }
            None => Ok(Self {
                provider: ProviderBuilder::new().connect_http(rpc_url).erased(),
                signer: None,
            }),
        }
    }

    /// Market contract handle that signs with this wallet.
    pub fn market(&self, address: Address) -> AlloyMarket {
        AlloyMarket::new(address, self.provider.clone())
    }
}

impl WalletProvider for AlloyWallet {
    async fn connect(&self) -> Result<Address, ConnectError> {
        self.signer.ok_or(ConnectError::NoWallet)
    }

    async fn chain_id(&self) -> Result<u64, ConnectError> {
        self.provider
            .get_chain_id()
            .await
            .map_err(|e| ConnectError::Rpc(e.to_string()))
    }

    async fn switch_chain(&self, chain_id: u64) -> Result<(), ConnectError> {
        Err(ConnectError::Rejected(format!(
            "rpc endpoint cannot switch to chain {}",
            chain_id
        )))
    }
}
