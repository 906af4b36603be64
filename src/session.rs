use std::sync::Arc;

use alloy_primitives::Address;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::chain::{MarketReader, MarketWriter, WalletProvider};
use crate::clock::Clock;
use crate::error::ConnectError;
use crate::events::Event;
use crate::scheduler::{RefreshScheduler, SchedulerConfig};
use crate::view_model::MarketViewModel;

/// Wallet connection plus the expected-network precondition. Owns the
/// connection timers so they cannot outlive the account they poll for.
pub struct Session<W, C> {
    wallet: W,
    expected_chain: u64,
    /// Chain the wallet was last seen on, while it is the wrong one
    wrong_chain: Option<u64>,
    account: Option<Address>,
    connection: Option<Connection<C>>,
}

impl<W, C> Session<W, C>
where
    W: WalletProvider,
    C: MarketReader + MarketWriter + 'static,
{
    pub fn new(wallet: W, expected_chain: u64) -> Self {
        Self {
            wallet,
            expected_chain,
            wrong_chain: None,
            account: None,
            connection: None,
        }
    }

    /// Set while the wallet sits on another chain. Blocks every action.
    pub fn wrong_network(&self) -> bool {
        self.wrong_chain.is_some()
    }

    pub fn account(&self) -> Option<Address> {
        self.account
    }

    /// Check the chain, asking the wallet to switch if needed, then return
    /// the signing account. Retry by calling again.
    ///
    /// A wrong network or a different account closes the current connection.
    pub async fn connect(&mut self) -> Result<Address, ConnectError> {
        let chain = self.wallet.chain_id().await?;
        if chain != self.expected_chain {
            warn!(expected = self.expected_chain, actual = chain, "wallet on wrong network");
            self.block(chain);
            if let Err(e) = self.wallet.switch_chain(self.expected_chain).await {
                warn!(error = %e, "network switch failed");
                return Err(ConnectError::WrongNetwork {
                    expected: self.expected_chain,
                    actual: chain,
                });
            }
            let chain = self.wallet.chain_id().await?;
            if chain != self.expected_chain {
                self.block(chain);
                return Err(ConnectError::WrongNetwork {
                    expected: self.expected_chain,
                    actual: chain,
                });
            }
        }
        self.wrong_chain = None;

        let account = self.wallet.connect().await?;
        if self.account != Some(account) {
            self.close_connection();
        }
        info!(%account, chain = self.expected_chain, "wallet connected");
        self.account = Some(account);
        Ok(account)
    }

    /// Start the view model and its timers for the connected account.
    /// Replaces any connection already open.
    pub fn open(
        &mut self,
        contract: Arc<C>,
        clock: Arc<dyn Clock>,
        config: SchedulerConfig,
        tx: mpsc::Sender<Event>,
    ) -> Result<Arc<MarketViewModel<C>>, ConnectError> {
        if let Some(actual) = self.wrong_chain {
            return Err(ConnectError::WrongNetwork {
                expected: self.expected_chain,
                actual,
            });
        }
        let account = self.account.ok_or(ConnectError::NotConnected)?;
        self.close_connection();

        let conn = Connection::start(contract, account, clock, config, tx);
        let vm = conn.vm.clone();
        self.connection = Some(conn);
        Ok(vm)
    }

    pub fn connection(&self) -> Option<&Connection<C>> {
        self.connection.as_ref()
    }

    /// Forget the account and stop both timers.
    pub fn disconnect(&mut self) {
        self.close_connection();
        self.account = None;
    }

    fn block(&mut self, actual: u64) {
        self.wrong_chain = Some(actual);
        self.close_connection();
        self.account = None;
    }

    fn close_connection(&mut self) {
        if let Some(mut conn) = self.connection.take() {
            conn.close();
        }
    }
}

/// Everything that lives only while an account is connected: the view
/// model and its timers.
pub struct Connection<C> {
    pub vm: Arc<MarketViewModel<C>>,
    scheduler: RefreshScheduler,
}

impl<C> Connection<C>
where
    C: MarketReader + MarketWriter + 'static,
{
    fn start(
        contract: Arc<C>,
        account: Address,
        clock: Arc<dyn Clock>,
        config: SchedulerConfig,
        tx: mpsc::Sender<Event>,
    ) -> Self {
        let vm = Arc::new(MarketViewModel::new(contract, Some(account), clock));
        let scheduler = RefreshScheduler::start(vm.clone(), config, tx);
        Self { vm, scheduler }
    }

    pub fn is_active(&self) -> bool {
        self.scheduler.is_running()
    }

    /// Stop both timers. The view model stays readable.
    pub fn close(&mut self) {
        self.scheduler.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::tests::{account, live_state, MockMarket};
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    struct MockWallet {
        chain: AtomicU64,
        can_switch: bool,
        signer: Option<Address>,
        switch_requests: Mutex<Vec<u64>>,
    }

    impl MockWallet {
        fn new(chain: u64, can_switch: bool) -> Self {
            Self {
                chain: AtomicU64::new(chain),
                can_switch,
                signer: Some(account()),
                switch_requests: Mutex::new(Vec::new()),
            }
        }
    }

    impl WalletProvider for MockWallet {
        async fn connect(&self) -> Result<Address, ConnectError> {
            self.signer.ok_or(ConnectError::NoWallet)
        }

        async fn chain_id(&self) -> Result<u64, ConnectError> {
            Ok(self.chain.load(Ordering::SeqCst))
        }

        async fn switch_chain(&self, chain_id: u64) -> Result<(), ConnectError> {
            self.switch_requests.lock().unwrap().push(chain_id);
            if self.can_switch {
                self.chain.store(chain_id, Ordering::SeqCst);
                Ok(())
            } else {
                Err(ConnectError::Rejected("user rejected".to_string()))
            }
        }
    }

    struct Fixed;

    impl Clock for Fixed {
        fn now_secs(&self) -> u64 {
            1_000
        }
    }

    const SEPOLIA: u64 = 11155111;

    fn session(wallet: MockWallet) -> Session<MockWallet, MockMarket> {
        Session::new(wallet, SEPOLIA)
    }

    fn open(
        session: &mut Session<MockWallet, MockMarket>,
    ) -> (Result<Arc<MarketViewModel<MockMarket>>, ConnectError>, mpsc::Receiver<Event>) {
        let market = Arc::new(MockMarket::new(live_state(1_300)));
        let (tx, rx) = mpsc::channel(64);
        let vm = session.open(market, Arc::new(Fixed), SchedulerConfig::default(), tx);
        (vm, rx)
    }

    async fn wait_refreshed(rx: &mut mpsc::Receiver<Event>) {
        while let Some(event) = rx.recv().await {
            if event == Event::Refreshed {
                return;
            }
        }
        panic!("channel closed before a refresh");
    }

    /// Both timer tasks are gone once every sender they held is dropped.
    async fn assert_timers_gone(rx: &mut mpsc::Receiver<Event>) {
        let drained = tokio::time::timeout(Duration::from_secs(60), async {
            while rx.recv().await.is_some() {}
        })
        .await;
        assert!(drained.is_ok(), "a timer is still running");
    }

    #[tokio::test]
    async fn test_connect_on_right_chain() {
        let mut session = session(MockWallet::new(SEPOLIA, false));
        let account = session.connect().await.unwrap();
        assert_eq!(account, crate::snapshot::tests::account());
        assert_eq!(session.account(), Some(account));
        assert!(!session.wrong_network());
    }

    #[tokio::test]
    async fn test_wrong_network_blocks() {
        let mut session = session(MockWallet::new(1, false));
        let result = session.connect().await;
        assert_eq!(
            result,
            Err(ConnectError::WrongNetwork {
                expected: SEPOLIA,
                actual: 1
            })
        );
        assert!(session.wrong_network());
        assert_eq!(session.account(), None);
        assert_eq!(*session.wallet.switch_requests.lock().unwrap(), vec![SEPOLIA]);
    }

    #[tokio::test]
    async fn test_switch_then_connect() {
        let mut session = session(MockWallet::new(1, true));
        assert!(session.connect().await.is_ok());
        assert!(!session.wrong_network());
    }

    #[tokio::test]
    async fn test_no_wallet() {
        let mut wallet = MockWallet::new(SEPOLIA, false);
        wallet.signer = None;
        let mut session = session(wallet);
        let err = session.connect().await.unwrap_err();
        assert_eq!(err, ConnectError::NoWallet);
        assert_eq!(err.user_message(), "Please configure a wallet!");

        // Retry after a wallet appears
        session.wallet.signer = Some(account());
        assert!(session.connect().await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_open_needs_an_account() {
        let mut session = session(MockWallet::new(SEPOLIA, false));
        let (result, _rx) = open(&mut session);
        assert_eq!(result.err(), Some(ConnectError::NotConnected));
        assert!(session.connection().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_open_refused_on_wrong_network() {
        let mut session = session(MockWallet::new(1, false));
        assert!(session.connect().await.is_err());
        let (result, _rx) = open(&mut session);
        assert_eq!(
            result.err(),
            Some(ConnectError::WrongNetwork {
                expected: SEPOLIA,
                actual: 1
            })
        );
        assert!(session.connection().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_disconnect_stops_timers() {
        let mut session = session(MockWallet::new(SEPOLIA, false));
        session.connect().await.unwrap();
        let (vm, mut rx) = open(&mut session);
        let vm = vm.unwrap();
        assert!(session.connection().is_some_and(|c| c.is_active()));

        wait_refreshed(&mut rx).await;
        assert!(vm.view().is_some());

        session.disconnect();
        assert_eq!(session.account(), None);
        assert!(session.connection().is_none());
        assert_timers_gone(&mut rx).await;
        // View stays readable after the timers are gone
        assert_eq!(vm.seconds_remaining(), 300);
    }

    #[tokio::test(start_paused = true)]
    async fn test_network_change_stops_timers() {
        let mut session = session(MockWallet::new(SEPOLIA, false));
        session.connect().await.unwrap();
        let (vm, mut rx) = open(&mut session);
        assert!(vm.is_ok());
        wait_refreshed(&mut rx).await;

        // Wallet moves to mainnet and refuses to come back
        session.wallet.chain.store(1, Ordering::SeqCst);
        assert!(session.connect().await.is_err());
        assert!(session.wrong_network());
        assert_eq!(session.account(), None);
        assert!(session.connection().is_none());
        assert_timers_gone(&mut rx).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_reopen_replaces_connection() {
        let mut session = session(MockWallet::new(SEPOLIA, false));
        session.connect().await.unwrap();
        let (_, mut first) = open(&mut session);
        let (vm, mut second) = open(&mut session);
        assert!(vm.is_ok());

        assert_timers_gone(&mut first).await;
        wait_refreshed(&mut second).await;
        assert!(session.connection().is_some_and(|c| c.is_active()));
    }
}
