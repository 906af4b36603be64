use rust_decimal::Decimal;

// Everything the main loop reacts to. Producers are the scheduler tasks,
// the oracle feed and the Ctrl+C handler.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    // A refresh completed and a new snapshot is published
    Refreshed,

    // A refresh failed; the previous snapshot is still current
    RefreshFailed { reason: String },

    // Local countdown tick (every second)
    Countdown { remaining_secs: u64 },

    // New oracle price, already scaled by the feed decimals
    OraclePrice { price: Decimal, at_ms: i64 },

    // Ctrl+C or kill signal
    Shutdown,
}

/// Side a bet is placed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub enum Side {
    Up,
    Down,
}

impl Side {
    pub fn label(&self) -> &'static str {
        match self {
            Side::Up => "UP",
            Side::Down => "DOWN",
        }
    }
}

/// Outcome of a round as reported by the contract.
///
/// `None` covers both "not resolved yet" and "resolved as a tie"; only the
/// snapshot's `resolved` flag tells them apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
pub enum WinningSide {
    #[default]
    None,
    Up,
    Down,
}

impl WinningSide {
    /// Decode the contract's side code {0, 1, 2}.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::None),
            1 => Some(Self::Up),
            2 => Some(Self::Down),
            _ => None,
        }
    }

    /// The winning bet side, if there is one.
    pub fn side(&self) -> Option<Side> {
        match self {
            Self::None => None,
            Self::Up => Some(Side::Up),
            Self::Down => Some(Side::Down),
        }
    }
}
