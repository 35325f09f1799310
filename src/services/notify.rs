use async_trait::async_trait;

/// Outbound notification seam. Real delivery is out of scope, so the
/// default implementation only logs; tests inject a recording mock.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, client_id: &str, message: &str) -> anyhow::Result<()>;
}

pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, client_id: &str, message: &str) -> anyhow::Result<()> {
        tracing::info!(client_id, message, "notification");
        Ok(())
    }
}
