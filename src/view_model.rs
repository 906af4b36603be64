use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use alloy_primitives::Address;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::chain::{MarketReader, MarketWriter, TxReceipt};
use crate::clock::Clock;
use crate::error::{ReadError, WriteError};
use crate::events::Side;
use crate::snapshot;
use crate::state::MarketView;
use crate::strategy::{self, validate_bet, Action, Context, Permissions};

/// What the watch channel carries: the latest view and the fetch that
/// produced it.
#[derive(Debug, Clone, Default)]
pub struct Published {
    pub seq: u64,
    pub view: Option<Arc<MarketView>>,
}

/// Result of one refresh cycle. Failures are reported, never raised.
#[derive(Debug, Clone, PartialEq)]
pub enum RefreshOutcome {
    Updated,
    /// No account or contract; nothing was fetched
    Skipped,
    /// A newer fetch already published
    Superseded,
    /// The batch failed and the previous view is still current
    Failed(ReadError),
}

/// At most one mutating action at a time.
#[derive(Debug, Default)]
pub struct SingleFlight {
    busy: AtomicBool,
}

/// Held while an action is outstanding. Releases on drop, error or not.
#[derive(Debug)]
pub struct FlightGuard<'a> {
    flight: &'a SingleFlight,
}

impl SingleFlight {
    pub fn try_acquire(&self) -> Option<FlightGuard<'_>> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| FlightGuard { flight: self })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.flight.busy.store(false, Ordering::Release);
    }
}

/// Market state for one connected account, plus the actions it may take.
pub struct MarketViewModel<C> {
    contract: Arc<C>,
    account: Option<Address>,
    clock: Arc<dyn Clock>,
    view_tx: watch::Sender<Published>,
    status_tx: watch::Sender<Option<String>>,
    flight: SingleFlight,
    next_seq: AtomicU64,
}

impl<C> MarketViewModel<C>
where
    C: MarketReader + MarketWriter,
{
    pub fn new(contract: Arc<C>, account: Option<Address>, clock: Arc<dyn Clock>) -> Self {
        let (view_tx, _) = watch::channel(Published::default());
        let (status_tx, _) = watch::channel(None);
        Self {
            contract,
            account,
            clock,
            view_tx,
            status_tx,
            flight: SingleFlight::default(),
            next_seq: AtomicU64::new(1),
        }
    }

    pub fn account(&self) -> Option<Address> {
        self.account
    }

    pub fn now_secs(&self) -> u64 {
        self.clock.now_secs()
    }

    /// Latest published view, if any refresh has succeeded yet.
    pub fn view(&self) -> Option<Arc<MarketView>> {
        self.view_tx.borrow().view.clone()
    }

    /// Watch every published view.
    pub fn subscribe(&self) -> watch::Receiver<Published> {
        self.view_tx.subscribe()
    }

    /// Latest user-facing status message.
    pub fn status(&self) -> Option<String> {
        self.status_tx.borrow().clone()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<Option<String>> {
        self.status_tx.subscribe()
    }

    pub fn tx_in_flight(&self) -> bool {
        self.flight.is_busy()
    }

    /// Seconds until the betting deadline of the latest view, from the
    /// local clock only. Zero without a view or once the deadline passed.
    pub fn seconds_remaining(&self) -> u64 {
        self.view()
            .map(|v| v.snapshot.time_remaining_secs(self.clock.now_secs()))
            .unwrap_or(0)
    }

    /// Permissions against the latest view and the current clock.
    pub fn permissions(&self) -> Permissions {
        self.permissions_at(self.clock.now_secs(), self.flight.is_busy())
    }

    fn permissions_at(&self, now_secs: u64, tx_in_flight: bool) -> Permissions {
        let ctx = Context {
            now_secs,
            tx_in_flight,
            account: self.account,
        };
        match self.view() {
            Some(view) => strategy::evaluate(&view.snapshot, &view.position, &ctx),
            None => Permissions::default(),
        }
    }

    /// Re-read the whole market and publish it if every read succeeded.
    pub async fn refresh(&self) -> RefreshOutcome {
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        let fetched = snapshot::fetch(
            Some(self.contract.as_ref()),
            self.account,
            self.clock.now_secs(),
        )
        .await;

        match fetched {
            Ok(Some(view)) => {
                let view = Arc::new(view);
                let published = self.view_tx.send_if_modified(|current| {
                    // Fetches can overlap (timer vs post-action refresh);
                    // an older batch never replaces a newer one.
                    if seq < current.seq {
                        return false;
                    }
                    if let Some(previous) = &current.view {
                        if !view.follows(previous) {
                            warn!(seq, "snapshot regressed within a round; trusting the chain");
                        }
                    }
                    *current = Published {
                        seq,
                        view: Some(view.clone()),
                    };
                    true
                });
                if published {
                    debug!(seq, resolved = view.snapshot.resolved, "market snapshot published");
                    RefreshOutcome::Updated
                } else {
                    RefreshOutcome::Superseded
                }
            }
            Ok(None) => RefreshOutcome::Skipped,
            Err(e) => {
                warn!(error = %e, "market refresh failed, keeping previous snapshot");
                RefreshOutcome::Failed(e)
            }
        }
    }

    /// Submit one action, wait for its receipt, then refresh once.
    ///
    /// Fails fast with `Busy` while another action is pending. Every outcome
    /// is also published as a status message.
    pub async fn execute(&self, action: Action) -> Result<TxReceipt, WriteError> {
        let Some(_guard) = self.flight.try_acquire() else {
            return Err(WriteError::Busy);
        };

        let perms = self.permissions_at(self.clock.now_secs(), false);
        if !perms.allows(&action) {
            self.set_status(action.failure_message());
            return Err(WriteError::NotPermitted(action.kind()));
        }

        self.set_status(action.pending_message());
        match self.submit(&action).await {
            Ok(receipt) => {
                info!(kind = ?action.kind(), tx = %receipt.tx_hash, "transaction confirmed");
                self.set_status(action.success_message());
                self.refresh().await;
                Ok(receipt)
            }
            Err(e) => {
                warn!(kind = ?action.kind(), error = %e, "transaction failed");
                self.set_status(action.failure_message());
                Err(e)
            }
        }
    }

    async fn submit(&self, action: &Action) -> Result<TxReceipt, WriteError> {
        match action {
            Action::Bet { side, amount } => {
                let wei = validate_bet(*amount)?;
                match side {
                    Side::Up => self.contract.bet_up(wei).await,
                    Side::Down => self.contract.bet_down(wei).await,
                }
            }
            Action::Claim => self.contract.claim().await,
            Action::OpenMarket { duration_secs } => self.contract.open_market(*duration_secs).await,
            Action::ResolveMarket => self.contract.resolve_market().await,
        }
    }

    /// Publish a user-facing message.
    pub fn set_status(&self, message: impl Into<String>) {
        let message = message.into();
        info!(status = %message);
        self.status_tx.send_replace(Some(message));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::WinningSide;
    use crate::snapshot::tests::{account, live_state, ChainState, MockMarket, WEI};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::sync::atomic::AtomicU64;
    use std::time::Duration;

    const NOW: u64 = 1_700_000_000;

    struct FixedClock(AtomicU64);

    impl Clock for FixedClock {
        fn now_secs(&self) -> u64 {
            self.0.load(Ordering::SeqCst)
        }
    }

    fn view_model(state: ChainState) -> (Arc<MockMarket>, MarketViewModel<MockMarket>) {
        let market = Arc::new(MockMarket::new(state));
        let clock = Arc::new(FixedClock(AtomicU64::new(NOW)));
        let vm = MarketViewModel::new(market.clone(), Some(account()), clock);
        (market, vm)
    }

    #[test]
    fn test_single_flight() {
        let flight = SingleFlight::default();
        let guard = flight.try_acquire();
        assert!(guard.is_some());
        assert!(flight.is_busy());
        assert!(flight.try_acquire().is_none());

        drop(guard);
        assert!(!flight.is_busy());
        assert!(flight.try_acquire().is_some());
    }

    #[tokio::test]
    async fn test_refresh_publishes_whole_view() {
        let (_, vm) = view_model(live_state(NOW + 300));
        assert!(vm.view().is_none());
        assert_eq!(vm.permissions(), Permissions::default());

        assert_eq!(vm.refresh().await, RefreshOutcome::Updated);
        let view = vm.view().expect("view");
        assert_eq!(view.snapshot.total_up_stake, dec!(3));
        assert_eq!(vm.seconds_remaining(), 300);

        let perms = vm.permissions();
        assert!(perms.can_bet);
        assert!(!perms.can_claim);
        assert!(!perms.can_resolve);
        assert!(perms.is_owner);
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_previous_view() {
        let (market, vm) = view_model(live_state(NOW + 300));
        vm.refresh().await;
        let before = vm.view().unwrap();

        market.state.lock().unwrap().total_up = 10 * WEI;
        market.fail("claimed");
        assert!(matches!(vm.refresh().await, RefreshOutcome::Failed(_)));
        assert_eq!(vm.view().unwrap(), before);

        market.heal();
        assert_eq!(vm.refresh().await, RefreshOutcome::Updated);
        assert_eq!(vm.view().unwrap().snapshot.total_up_stake, dec!(10));
    }

    #[tokio::test]
    async fn test_refresh_without_account_is_noop() {
        let market = Arc::new(MockMarket::new(live_state(NOW + 300)));
        let clock = Arc::new(FixedClock(AtomicU64::new(NOW)));
        let vm = MarketViewModel::new(market.clone(), None, clock);
        assert_eq!(vm.refresh().await, RefreshOutcome::Skipped);
        assert_eq!(market.total_reads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_bet_refreshes_once() {
        let (market, vm) = view_model(live_state(NOW + 300));
        vm.refresh().await;
        let reads_before = market.total_reads.load(Ordering::SeqCst);

        let receipt = vm.execute(Action::bet(Side::Up, dec!(0.5))).await;
        assert!(receipt.is_ok());
        assert_eq!(vm.status().as_deref(), Some("UP bet placed successfully!"));
        assert!(!vm.tx_in_flight());

        let view = vm.view().unwrap();
        assert_eq!(view.position.up_stake, dec!(0.5));
        assert_eq!(view.snapshot.total_up_stake, dec!(3.5));
        // Exactly one follow-up batch of twelve reads
        assert_eq!(market.total_reads.load(Ordering::SeqCst) - reads_before, 12);
    }

    #[tokio::test]
    async fn test_bet_after_deadline_refused() {
        let (market, vm) = view_model(live_state(NOW - 1));
        vm.refresh().await;

        let result = vm.execute(Action::bet(Side::Down, dec!(0.01))).await;
        assert!(matches!(result, Err(WriteError::NotPermitted(_))));
        assert_eq!(market.writes.load(Ordering::SeqCst), 0);
        assert_eq!(vm.status().as_deref(), Some("Failed to place bet"));
    }

    #[tokio::test]
    async fn test_bet_below_minimum_refused() {
        let (market, vm) = view_model(live_state(NOW + 300));
        vm.refresh().await;

        let result = vm.execute(Action::bet(Side::Up, dec!(0.0001))).await;
        assert!(matches!(result, Err(WriteError::Amount(_))));
        assert_eq!(market.writes.load(Ordering::SeqCst), 0);
        assert!(!vm.tx_in_flight());
    }

    #[tokio::test]
    async fn test_rejected_write_releases_guard() {
        let (market, vm) = view_model(live_state(NOW + 300));
        vm.refresh().await;
        *market.reject_writes.lock().unwrap() = Some("user denied".to_string());

        let result = vm.execute(Action::bet(Side::Up, dec!(0.01))).await;
        assert_eq!(result, Err(WriteError::Rejected("user denied".to_string())));
        assert!(!vm.tx_in_flight());
        assert_eq!(vm.status().as_deref(), Some("Failed to place bet"));
        // Nothing applied locally
        assert_eq!(vm.view().unwrap().position.up_stake, Decimal::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_action_is_busy() {
        let (market, vm) = view_model(live_state(NOW + 300));
        vm.refresh().await;
        *market.write_delay.lock().unwrap() = Some(Duration::from_secs(12));
        let vm = Arc::new(vm);

        let first = tokio::spawn({
            let vm = vm.clone();
            async move { vm.execute(Action::bet(Side::Up, dec!(0.01))).await }
        });
        // Let the first action reach the contract
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(vm.tx_in_flight());
        assert!(!vm.permissions().can_bet);

        let second = vm.execute(Action::bet(Side::Down, dec!(0.01))).await;
        assert_eq!(second, Err(WriteError::Busy));

        assert!(first.await.unwrap().is_ok());
        assert!(!vm.tx_in_flight());
        assert!(vm.permissions().can_bet);
        assert_eq!(market.writes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_claim_round_trip() {
        let (_, vm) = view_model(ChainState {
            resolved: true,
            winning_code: 1,
            user_up: 2 * WEI,
            ..live_state(NOW - 60)
        });
        vm.refresh().await;
        assert_eq!(vm.view().unwrap().snapshot.winning_side, WinningSide::Up);
        assert!(vm.permissions().can_claim);

        assert!(vm.execute(Action::Claim).await.is_ok());
        assert!(vm.view().unwrap().position.claimed);
        assert!(!vm.permissions().can_claim);

        let again = vm.execute(Action::Claim).await;
        assert!(matches!(again, Err(WriteError::NotPermitted(_))));
    }

    #[tokio::test]
    async fn test_owner_actions_need_owner() {
        let other: Address = "0x2222222222222222222222222222222222222222".parse().unwrap();
        let (market, vm) = view_model(ChainState {
            owner: other,
            opened: false,
            ..live_state(NOW)
        });
        vm.refresh().await;
        assert!(vm.permissions().can_open);
        assert!(!vm.permissions().is_owner);

        let result = vm.execute(Action::open_market(300)).await;
        assert!(matches!(result, Err(WriteError::NotPermitted(_))));
        assert_eq!(market.writes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_owner_opens_and_resolves() {
        let (_, vm) = view_model(ChainState {
            opened: false,
            ..live_state(NOW)
        });
        vm.refresh().await;

        assert!(vm.execute(Action::open_market(300)).await.is_ok());
        let perms = vm.permissions();
        assert!(perms.can_bet);
        assert!(!perms.can_open);
        assert!(!perms.can_resolve);

        // Too early to resolve
        let early = vm.execute(Action::ResolveMarket).await;
        assert!(matches!(early, Err(WriteError::NotPermitted(_))));
    }
}
