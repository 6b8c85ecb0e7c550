use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, Utc};
use log::{debug, error, info};
use tokio_util::sync::CancellationToken;

use crate::core::detection::ChangeDetector;
use crate::core::notification::{compose_message, Notifier};
use crate::core::species::CooldownTracker;

/// Drives the poll, filter, batch, send cycle until cancelled.
pub struct NotificationPipeline {
    detector: ChangeDetector,
    gate: CooldownTracker,
    notifier: Box<dyn Notifier>,
    max_species: usize,
    poll_interval: Duration,
}

impl NotificationPipeline {
    pub fn new(
        detector: ChangeDetector,
        gate: CooldownTracker,
        notifier: Box<dyn Notifier>,
        max_species: usize,
        poll_interval: Duration,
    ) -> Self {
        Self {
            detector,
            gate,
            notifier,
            max_species,
            poll_interval,
        }
    }

    /// One polling cycle. `now` is the single timestamp used for every
    /// cooldown decision and record in this cycle, so the first qualifying
    /// occurrence of a species suppresses duplicates later in the batch.
    ///
    /// The watermark advances per row before the gate is consulted: filtered
    /// rows are consumed too, and a failed send does not bring a batch back.
    pub async fn poll_once(&mut self, now: DateTime<Utc>) -> Result<()> {
        let detections = self.detector.fetch_new().await?;
        if detections.is_empty() {
            return Ok(());
        }
        info!("Found {} new detections", detections.len());

        let mut qualifying: Vec<String> = Vec::new();
        for detection in &detections {
            self.detector.advance(detection.id);
            debug!(
                "Detection {}: {} ({}) confidence {:.2} at {} {}",
                detection.id,
                detection.display_name(),
                detection.scientific_name,
                detection.confidence,
                detection.date,
                detection.time,
            );

            let name = detection.display_name();
            if self.gate.should_notify(name, now) {
                self.gate.record(name, now);
                qualifying.push(name.to_string());
            }
        }

        if qualifying.is_empty() {
            return Ok(());
        }

        let message = compose_message(&qualifying, self.max_species);
        if let Err(e) = self.notifier.send(&message).await {
            error!("Failed to send notification: {:#}", e);
        }
        Ok(())
    }

    /// Polls, sleeps, repeats. The token is honored at the top of each cycle
    /// and across the sleep; a failed cycle is logged and the loop stays on
    /// schedule.
    pub async fn run(&mut self, cancel: CancellationToken) {
        while !cancel.is_cancelled() {
            if let Err(e) = self.poll_once(Utc::now()).await {
                error!("Polling cycle failed: {:#}", e);
            }

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.poll_interval) => {}
            }
        }
        info!("Notification service stopped");
    }
}
