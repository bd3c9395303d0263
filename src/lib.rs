//! # asset-courier
//!
//! Finds the first complete asset group in an S3-compatible bucket, downloads it to a
//! local staging directory, forwards the files to a Telegram chat and records which
//! location was published.
//!
//! An asset group is a basename whose objects carry exactly the three required
//! extensions (metadata, image, video; `json`, `png`, `mp4` by default). Locations
//! are scanned in priority order and the run stops at the first group that downloads
//! completely.
//!
//! ## Quick Start
//!
//! ```no_run
//! use asset_courier::{Config, Pipeline, S3ObjectStore, TelegramChannel};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env()?;
//!     let store = Arc::new(S3ObjectStore::new(&config.store).await);
//!     let channel = Arc::new(TelegramChannel::new(&config.delivery)?);
//!
//!     let pipeline = Pipeline::new(config, store, channel)?;
//!
//!     // Subscribe to events
//!     let mut events = pipeline.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     let outcome = pipeline.run().await?;
//!     std::process::exit(outcome.exit_code().into());
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Configuration types
pub mod config;
/// Delivery channels and the size gate
pub mod delivery;
/// Error types
pub mod error;
/// Subscriber setup for stdout and the operation log
pub mod logging;
/// Run controller
pub mod pipeline;
/// Retry logic with exponential backoff
pub mod retry;
/// Publication state file
pub mod state;
/// Object store abstraction and S3 backend
pub mod store;
/// Group downloads into the staging area
pub mod transfer;
/// Core types and events
pub mod types;
/// Asset group detection
pub mod validator;

// Re-export commonly used types
pub use config::{Config, DeliveryConfig, DeliveryScope, RetryConfig, StoreConfig};
pub use delivery::{DeliveryChannel, TelegramChannel};
pub use error::{DeliveryError, Error, Result, StoreError, ToExitCode, TransferError};
pub use pipeline::Pipeline;
pub use state::StateStore;
pub use store::{ObjectStore, S3ObjectStore};
pub use types::{
    AssetExtensions, AssetGroup, AssetKind, DeliveryOutcome, Event, ObjectEntry,
    PublicationState, PublishReport, RunOutcome, Stage,
};
