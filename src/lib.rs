//! emon — terminal client for the Smart Energy Monitoring backend.
//!
//! The library is built around one generic refresh pipeline:
//!
//! - [`client`] fetches a backend endpoint and normalizes every outcome
//!   (payload, HTTP error, bad body) into a [`fetch::FetchOutcome`];
//! - [`poll`] re-runs a fetch on a fixed wall-clock interval with at most
//!   one request in flight, behind a cancellable [`poll::PollHandle`];
//! - [`view`] folds delivered outcomes into the latest displayable state,
//!   keeping last-good data on transient failures.
//!
//! Every view the binary renders — live watch, analytics, alerts, the
//! dashboard — goes through this same pipeline, parameterized only by
//! endpoint and payload type. [`demo`] provides an offline dataset that
//! plugs in where the HTTP client normally sits.

pub mod cli;
pub mod client;
pub mod config;
pub mod demo;
pub mod fetch;
pub mod poll;
pub mod view;
