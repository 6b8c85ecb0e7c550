use async_trait::async_trait;
use log::{error, info};

/// One species identification produced by the audio analyzer.
#[derive(Debug, Clone)]
pub struct Detection {
    pub id: i64,
    pub scientific_name: String,
    pub common_name: String,
    pub confidence: f64,
    pub date: String,
    pub time: String,
}

impl Detection {
    /// Human-readable name: the common name when present, otherwise the
    /// scientific name.
    pub fn display_name(&self) -> &str {
        if self.common_name.is_empty() {
            &self.scientific_name
        } else {
            &self.common_name
        }
    }
}

/// Read access to the append-only detection table.
#[async_trait]
pub trait DetectionStore: Send + Sync {
    /// Highest id currently in the store, 0 when empty.
    async fn max_id(&self) -> anyhow::Result<i64>;

    /// All rows with an id strictly greater than `id`, ascending by id.
    async fn detections_after(&self, id: i64) -> anyhow::Result<Vec<Detection>>;
}

/// Tracks the highest processed id and fetches only newer rows.
pub struct ChangeDetector {
    store: Box<dyn DetectionStore>,
    watermark: i64,
}

impl ChangeDetector {
    /// Seeds the watermark from the store's current maximum id so rows that
    /// predate this run are never notified. A failed probe is logged and
    /// treated as an empty store.
    pub async fn init(store: Box<dyn DetectionStore>) -> Self {
        let watermark = match store.max_id().await {
            Ok(id) => {
                info!("Current max id in detection store: {}", id);
                id
            }
            Err(e) => {
                error!("Error reading current max id, starting from 0: {:#}", e);
                0
            }
        };
        Self { store, watermark }
    }

    /// Rows newer than the watermark. The watermark is advanced by the
    /// caller per row, so a failed fetch is simply retried next cycle.
    pub async fn fetch_new(&self) -> anyhow::Result<Vec<Detection>> {
        self.store.detections_after(self.watermark).await
    }

    /// Never moves backwards.
    pub fn advance(&mut self, id: i64) {
        self.watermark = self.watermark.max(id);
    }

    #[cfg(test)]
    pub fn watermark(&self) -> i64 {
        self.watermark
    }
}
