//! Client-side view model for an UP/DOWN prediction market that settles
//! on chain against a price oracle.
//!
//! The contract does the accounting. This crate reads it into one
//! consistent [`state::MarketView`], decides which actions are legal
//! ([`strategy::evaluate`]), serializes writes through a single-flight
//! guard ([`view_model::MarketViewModel::execute`]) and keeps the view
//! fresh ([`scheduler::RefreshScheduler`]).

pub mod chain;
pub mod clock;
pub mod config;
pub mod error;
pub mod events;
pub mod feeds;
pub mod scheduler;
pub mod session;
pub mod snapshot;
pub mod state;
pub mod strategy;
pub mod view_model;
