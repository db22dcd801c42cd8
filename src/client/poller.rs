use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::api::ApiClient;
use super::error::ClientError;
use super::session::Session;
use crate::models::dto::ChatMessage;

pub const POLL_INTERVAL: Duration = Duration::from_secs(3);

/// Anything that can produce the current conversation of a complaint.
#[async_trait]
pub trait MessageSource: Send + Sync + 'static {
    async fn fetch_messages(&self, complaint_id: i32) -> Result<Vec<ChatMessage>, ClientError>;
}

/// The API, read with one session.
pub struct SessionSource {
    pub client: ApiClient,
    pub session: Session,
}

#[async_trait]
impl MessageSource for SessionSource {
    async fn fetch_messages(&self, complaint_id: i32) -> Result<Vec<ChatMessage>, ClientError> {
        self.client.messages(&self.session, complaint_id).await
    }
}

/// Re-fetches a conversation right away and then on every tick, publishing
/// each successful result. A failed fetch is logged and the last published
/// list stays. The task dies with the poller.
pub struct ConversationPoller {
    complaint_id: i32,
    messages: watch::Receiver<Vec<ChatMessage>>,
    handle: JoinHandle<()>,
}

impl ConversationPoller {
    pub fn start<S: MessageSource>(source: Arc<S>, complaint_id: i32, period: Duration) -> Self {
        let (tx, rx) = watch::channel(Vec::new());

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                match source.fetch_messages(complaint_id).await {
                    Ok(messages) => {
                        debug!("Complaint {}: {} messages", complaint_id, messages.len());
                        if tx.send(messages).is_err() {
                            break;
                        }
                    }
                    Err(e) => warn!("Polling messages of complaint {} failed: {}", complaint_id, e),
                }
            }
        });

        Self { complaint_id, messages: rx, handle }
    }

    pub fn complaint_id(&self) -> i32 {
        self.complaint_id
    }

    /// Most recently published conversation.
    pub fn latest(&self) -> Vec<ChatMessage> {
        self.messages.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<ChatMessage>> {
        self.messages.clone()
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    pub fn stop(self) {
        drop(self);
    }
}

impl Drop for ConversationPoller {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::models::PrincipalKind;

    #[derive(Default)]
    struct CountingSource {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl MessageSource for CountingSource {
        async fn fetch_messages(&self, complaint_id: i32) -> Result<Vec<ChatMessage>, ClientError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) as i32 + 1;
            if call == 3 {
                return Err(ClientError::Api { status: 500, message: "boom".to_string() });
            }
            let now = Utc::now();
            Ok((0..call)
                .map(|id| ChatMessage {
                    id,
                    complaint_id,
                    sender_id: 1,
                    sender_type: PrincipalKind::User,
                    sender: None,
                    message: format!("message {}", id),
                    attachment_path: None,
                    is_read: false,
                    created_at: now,
                    updated_at: now,
                })
                .collect())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_polls_immediately_then_every_interval() {
        let source = Arc::new(CountingSource::default());
        let poller = ConversationPoller::start(source.clone(), 9, POLL_INTERVAL);

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        assert_eq!(poller.latest().len(), 1);

        tokio::time::sleep(POLL_INTERVAL).await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
        assert_eq!(poller.latest().len(), 2);

        // third fetch fails, previous list stays
        tokio::time::sleep(POLL_INTERVAL).await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 3);
        assert_eq!(poller.latest().len(), 2);
        assert!(poller.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_stops_fetching() {
        let source = Arc::new(CountingSource::default());
        let poller = ConversationPoller::start(source.clone(), 9, POLL_INTERVAL);

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);

        poller.stop();
        tokio::time::sleep(POLL_INTERVAL * 5).await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_subscribers_see_updates() {
        let source = Arc::new(CountingSource::default());
        let poller = ConversationPoller::start(source, 4, POLL_INTERVAL);
        let mut rx = poller.subscribe();

        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().len(), 1);
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().len(), 2);
        assert_eq!(poller.complaint_id(), 4);
    }
}
