use std::time::Duration;

use rust_decimal::Decimal;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::chain::OracleReader;
use crate::clock::now_ms;
use crate::error::ReadError;
use crate::events::Event;
use crate::state::units::from_signed_units;

/// Shortest poll period the feed accepts.
pub const MIN_POLL: Duration = Duration::from_secs(1);

/// Read the latest oracle round and scale it by the feed's decimals.
pub async fn latest_price<O: OracleReader>(oracle: &O) -> Result<Decimal, ReadError> {
    let round = oracle.latest_round().await?;
    from_signed_units(round.answer, u32::from(round.decimals)).map_err(|source| {
        ReadError::Decode {
            field: "latestRoundData",
            source,
        }
    })
}

/// Spawns a task that polls the oracle and sends OraclePrice events.
/// Failures are logged and skipped; the market view never depends on them.
/// Periods below `MIN_POLL` are raised to it.
pub fn spawn<O>(oracle: O, every: Duration, tx: mpsc::Sender<Event>) -> JoinHandle<()>
where
    O: OracleReader + 'static,
{
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every.max(MIN_POLL));
        loop {
            interval.tick().await;
            match latest_price(&oracle).await {
                Ok(price) => {
                    debug!(%price, "oracle price");
                    let event = Event::OraclePrice {
                        price,
                        at_ms: now_ms(),
                    };
                    if tx.send(event).await.is_err() {
                        return;
                    }
                }
                Err(e) => {
                    warn!(error = %e, "oracle read failed");
                }
            }
        }
    })
}
