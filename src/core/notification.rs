use async_trait::async_trait;

/// Joins qualifying display names into one outbound message, keeping at most
/// `max_names` entries and folding the rest into a "+ N more" suffix.
pub fn compose_message(names: &[String], max_names: usize) -> String {
    if names.len() > max_names {
        let shown = names[..max_names].join(", ");
        format!("{} + {} more", shown, names.len() - max_names)
    } else {
        names.join(", ")
    }
}

/// Outbound delivery of one composed message.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, message: &str) -> anyhow::Result<()>;
}
