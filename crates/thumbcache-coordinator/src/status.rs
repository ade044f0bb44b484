//! Job-completion status channel: one pub/sub channel per fingerprint,
//! payload the literal string `"true"` or `"false"`.

use std::pin::Pin;

use futures_util::{Stream, StreamExt};
use redis::AsyncCommands;

use crate::client::CoordinatorStore;
use crate::error::CoordinatorResult;
use crate::keys::status_channel;
use thumbcache_models::Fingerprint;

impl CoordinatorStore {
    /// Publish the one terminal status a job ever publishes. Callers retry
    /// this with backoff at the call site (waiters depend on it); this
    /// method itself attempts exactly once.
    pub async fn publish_status(&self, fp: &Fingerprint, success: bool) -> CoordinatorResult<()> {
        let mut conn = self.connection().await?;
        let payload = if success { "true" } else { "false" };
        let _: i64 = conn.publish(status_channel(fp), payload).await?;
        Ok(())
    }

    /// Subscribe to a fingerprint's completion channel. Late subscribers
    /// (after the terminal status already fired) see nothing on this
    /// stream - they must re-read the artifact instead.
    pub async fn subscribe_status(
        &self,
        fp: &Fingerprint,
    ) -> CoordinatorResult<Pin<Box<dyn Stream<Item = bool> + Send>>> {
        let channel = status_channel(fp);
        let mut pubsub = self.raw_client().get_async_pubsub().await?;
        pubsub.subscribe(&channel).await?;

        let stream = pubsub.into_on_message().filter_map(|msg| async move {
            let payload: String = msg.get_payload().ok()?;
            match payload.as_str() {
                "true" => Some(true),
                "false" => Some(false),
                _ => None,
            }
        });

        Ok(Box::pin(stream))
    }
}
