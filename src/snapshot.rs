use alloy_primitives::{Address, U256};
use rust_decimal::Decimal;

use crate::chain::MarketReader;
use crate::error::{ReadError, UnitsError};
use crate::events::WinningSide;
use crate::state::units::{from_signed_units, from_units, NATIVE_DECIMALS, PRICE_DECIMALS};
use crate::state::{MarketSnapshot, MarketView, UserPosition};

/// Fetch one consistent view of the market and the account's position.
///
/// Every read is issued at once and joined; nothing is returned unless all
/// of them succeed. Returns `Ok(None)` without touching the network when
/// there is no contract or no account.
pub async fn fetch<R: MarketReader>(
    reader: Option<&R>,
    account: Option<Address>,
    now_secs: u64,
) -> Result<Option<MarketView>, ReadError> {
    let (Some(reader), Some(account)) = (reader, account) else {
        return Ok(None);
    };

    let (
        owner,
        opened,
        resolved,
        start_price,
        end_price,
        deadline,
        up_total,
        down_total,
        balance,
        user_up,
        user_down,
        claimed,
    ) = tokio::try_join!(
        reader.owner(),
        reader.market_opened(),
        reader.market_resolved(),
        reader.start_price(),
        reader.end_price(),
        reader.betting_deadline(),
        reader.total_up_bet(),
        reader.total_down_bet(),
        reader.contract_balance(),
        reader.up_bet(account),
        reader.down_bet(account),
        reader.claimed(account),
    )?;

    // The side code is undefined before resolution, so don't ask
    let winning_side = if resolved {
        let code = reader.winning_side().await?;
        WinningSide::from_code(code).ok_or(ReadError::UnknownSide(code))?
    } else {
        WinningSide::None
    };

    let snapshot = MarketSnapshot {
        owner,
        opened,
        resolved,
        start_price: decode("startPrice", from_signed_units(start_price, PRICE_DECIMALS))?,
        end_price: decode("endPrice", from_signed_units(end_price, PRICE_DECIMALS))?,
        betting_deadline: timestamp("bettingDeadline", deadline)?,
        total_up_stake: ether("totalUpBet", up_total)?,
        total_down_stake: ether("totalDownBet", down_total)?,
        contract_balance: ether("getContractBalance", balance)?,
        winning_side,
    };
    let position = UserPosition {
        up_stake: ether("upBets", user_up)?,
        down_stake: ether("downBets", user_down)?,
        claimed,
    };

    Ok(Some(MarketView {
        snapshot,
        position,
        fetched_at: now_secs,
    }))
}

fn decode(field: &'static str, value: Result<Decimal, UnitsError>) -> Result<Decimal, ReadError> {
    value.map_err(|source| ReadError::Decode { field, source })
}

fn ether(field: &'static str, raw: U256) -> Result<Decimal, ReadError> {
    decode(field, from_units(raw, NATIVE_DECIMALS))
}

fn timestamp(field: &'static str, raw: U256) -> Result<u64, ReadError> {
    u64::try_from(raw).map_err(|_| ReadError::Decode {
        field,
        source: UnitsError::Overflow { decimals: 0 },
    })
}
