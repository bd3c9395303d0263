//! Pipeline controller
//!
//! Scans the configured locations in priority order for the first complete asset
//! group, downloads it, hands the files to the delivery channel and records the
//! location in the publication state file.
//!
//! Candidate groups come from a lazy stream: a location is only listed when the
//! previous candidate has been rejected, so scanning stops at the first group whose
//! download succeeds.
//!
//! ```text
//! Idle -> Scanning -> Validating -> Downloading -> Delivering -> Publishing -> Done
//!            ^            |              |
//!            +------------+--------------+   (empty listing, no match, failed download)
//! ```

use crate::config::{Config, DeliveryScope};
use crate::delivery::{DeliveryChannel, deliver_file, staged_files};
use crate::error::{Error, Result};
use crate::retry::with_retry;
use crate::state::StateStore;
use crate::store::ObjectStore;
use crate::transfer::download_group;
use crate::types::{AssetGroup, DeliveryOutcome, Event, PublishReport, RunOutcome, Stage};
use crate::validator::find_complete_group;
use futures::{Stream, StreamExt};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn};

/// Capacity of the event broadcast channel
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Runs one discovery and transfer cycle
pub struct Pipeline {
    config: Config,
    store: Arc<dyn ObjectStore>,
    channel: Arc<dyn DeliveryChannel>,
    state: StateStore,
    event_tx: broadcast::Sender<Event>,
    stage: watch::Sender<Stage>,
}

impl Pipeline {
    /// Create a pipeline; the configuration is validated here, before any scanning
    pub fn new(
        config: Config,
        store: Arc<dyn ObjectStore>,
        channel: Arc<dyn DeliveryChannel>,
    ) -> Result<Self> {
        config.validate()?;
        let state = StateStore::new(config.paths.state_file.clone());
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let (stage, _) = watch::channel(Stage::Idle);

        Ok(Self {
            config,
            store,
            channel,
            state,
            event_tx,
            stage,
        })
    }

    /// Subscribe to pipeline events
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Current stage of the run
    pub fn stage(&self) -> Stage {
        *self.stage.borrow()
    }

    /// Configuration the pipeline was built with
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Publication state store used by this pipeline
    pub fn state_store(&self) -> &StateStore {
        &self.state
    }

    fn enter(&self, stage: Stage) {
        debug!(?stage, "pipeline stage");
        self.stage.send_replace(stage);
    }

    fn emit_event(&self, event: Event) {
        // No subscribers is fine
        self.event_tx.send(event).ok();
    }

    /// Execute one run
    ///
    /// Returns `Err` only for fatal problems: the staging directory cannot be created
    /// or the state file cannot be written. Listing, download and delivery failures
    /// are logged and handled by moving on.
    pub async fn run(&self) -> Result<RunOutcome> {
        let staging_dir = &self.config.paths.staging_dir;
        if let Err(e) = tokio::fs::create_dir_all(staging_dir).await {
            warn!(path = %staging_dir.display(), error = %e, "cannot create staging directory");
            self.enter(Stage::Failed);
            return Err(e.into());
        }

        info!(
            locations = ?self.config.scan.locations,
            store = self.store.name(),
            channel = self.channel.name(),
            "starting asset scan"
        );

        let scanned = AtomicUsize::new(0);
        let mut download_failures = 0;
        let mut candidates = std::pin::pin!(self.candidates(&scanned));

        while let Some(group) = candidates.next().await {
            self.enter(Stage::Downloading);
            let files = match download_group(
                self.store.as_ref(),
                &group,
                staging_dir,
                &self.config.retry,
                &self.event_tx,
            )
            .await
            {
                Ok(files) => files,
                Err(e) => {
                    download_failures += 1;
                    self.emit_event(Event::DownloadFailed {
                        location: group.location.clone(),
                        basename: group.basename.clone(),
                        error: e.to_string(),
                    });
                    continue;
                }
            };

            let deliveries = self.deliver(&files).await;

            self.enter(Stage::Publishing);
            if let Err(e) = self.publish_state(&group.location).await {
                self.enter(Stage::Failed);
                return Err(e);
            }
            self.emit_event(Event::Published {
                location: group.location.clone(),
            });

            let delivered = deliveries.iter().filter(|d| d.is_delivered()).count();
            info!(
                location = %group.location,
                basename = %group.basename,
                delivered,
                attempted = deliveries.len(),
                "run complete"
            );
            self.enter(Stage::Done);

            return Ok(RunOutcome::Published(PublishReport {
                group,
                files,
                deliveries,
            }));
        }

        let locations_scanned = scanned.load(Ordering::Relaxed);
        warn!(
            locations_scanned,
            download_failures, "no complete group found in any location"
        );
        self.emit_event(Event::Exhausted);
        self.enter(Stage::Done);

        Ok(RunOutcome::NothingFound {
            locations_scanned,
            download_failures,
        })
    }

    /// Write the state file on the blocking pool (it fsyncs before the rename)
    async fn publish_state(&self, location: &str) -> Result<()> {
        let state = self.state.clone();
        let location = location.to_string();
        tokio::task::spawn_blocking(move || state.publish(&location))
            .await
            .map_err(|e| Error::Other(format!("state write task failed: {e}")))??;
        Ok(())
    }

    /// Lazily yield one candidate group per location, in priority order
    fn candidates<'a>(&'a self, scanned: &'a AtomicUsize) -> impl Stream<Item = AssetGroup> + 'a {
        futures::stream::iter(self.config.scan.locations.iter())
            .then(move |location| {
                scanned.fetch_add(1, Ordering::Relaxed);
                self.scan_location(location)
            })
            .filter_map(futures::future::ready)
    }

    /// List one location and validate its contents
    async fn scan_location(&self, location: &str) -> Option<AssetGroup> {
        self.enter(Stage::Scanning);
        info!(location, "scanning location");
        self.emit_event(Event::ScanStarted {
            location: location.to_string(),
        });

        let entries = match with_retry(&self.config.retry, || self.store.list(location)).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!(location, error = %e, "cannot list location, skipping");
                self.emit_event(Event::ListingFailed {
                    location: location.to_string(),
                    error: e.to_string(),
                });
                return None;
            }
        };

        if entries.is_empty() {
            info!(location, "no files in location");
            self.emit_event(Event::LocationEmpty {
                location: location.to_string(),
            });
            return None;
        }

        self.enter(Stage::Validating);
        match find_complete_group(location, &entries, &self.config.scan.extensions) {
            Some(group) => {
                info!(location, basename = %group.basename, "found complete group");
                self.emit_event(Event::GroupFound {
                    location: location.to_string(),
                    basename: group.basename.clone(),
                });
                Some(group)
            }
            None => {
                info!(location, objects = entries.len(), "no complete group in location");
                self.emit_event(Event::NoCompleteGroup {
                    location: location.to_string(),
                });
                None
            }
        }
    }

    /// Hand files to the delivery channel one by one; failures never stop the loop
    async fn deliver(&self, downloaded: &[PathBuf]) -> Vec<DeliveryOutcome> {
        self.enter(Stage::Delivering);

        let files = match self.config.delivery.scope {
            DeliveryScope::Group => downloaded.to_vec(),
            DeliveryScope::StagingArea => {
                match staged_files(&self.config.paths.staging_dir).await {
                    Ok(files) => files,
                    Err(e) => {
                        warn!(
                            error = %e,
                            "cannot list staging directory, delivering downloaded files only"
                        );
                        downloaded.to_vec()
                    }
                }
            }
        };

        let mut outcomes = Vec::with_capacity(files.len());
        for path in files {
            let outcome = deliver_file(
                self.channel.as_ref(),
                &path,
                self.config.delivery.max_file_size,
                &self.config.retry,
            )
            .await;

            self.emit_event(match &outcome {
                DeliveryOutcome::Delivered { path } => Event::FileDelivered { path: path.clone() },
                DeliveryOutcome::Skipped { path, size, .. } => Event::DeliverySkipped {
                    path: path.clone(),
                    size: *size,
                },
                DeliveryOutcome::Failed { path, error } => Event::DeliveryFailed {
                    path: path.clone(),
                    error: error.clone(),
                },
            });
            outcomes.push(outcome);
        }
        outcomes
    }

    /// Send a short text message to check the delivery channel
    ///
    /// Returns whether the channel accepted it; failures are logged only.
    pub async fn probe_channel(&self) -> bool {
        match self
            .channel
            .send_message("asset-courier: delivery channel check")
            .await
        {
            Ok(()) => {
                info!(channel = self.channel.name(), "probe message delivered");
                true
            }
            Err(e) => {
                warn!(channel = self.channel.name(), error = %e, "probe message failed");
                false
            }
        }
    }
}
