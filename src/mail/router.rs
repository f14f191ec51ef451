//! Inbound delivery routing: mail event in, owner notifications out.

use std::sync::Arc;

use async_trait::async_trait;

use super::extract::extract_addresses;
use crate::core::config::notify;
use crate::core::error::AppResult;
use crate::core::utils::escape_markdown_v2;
use crate::registry::Registry;
use crate::telegram::admin::is_admin;

/// One inbound mail event as the webhook hands it over: raw
/// recipient-bearing fields plus flat sender/subject/body text.
#[derive(Debug, Clone, Default)]
pub struct InboundEmail {
    pub recipient_fields: Vec<String>,
    pub sender: String,
    pub subject: String,
    pub body: String,
}

/// Outbound message sink. The production implementation talks to Telegram;
/// tests record.
#[async_trait]
pub trait Outbound: Send + Sync {
    async fn send(&self, owner: i64, text: &str) -> AppResult<()>;
}

/// Resolves inbound mail to owners and forwards notifications.
pub struct DeliveryRouter {
    registry: Arc<Registry>,
    outbound: Arc<dyn Outbound>,
}

impl DeliveryRouter {
    pub fn new(registry: Arc<Registry>, outbound: Arc<dyn Outbound>) -> Self {
        Self { registry, outbound }
    }

    /// Route one mail event. Returns how many owners were notified.
    ///
    /// Unknown addresses are normal (anyone can mail a name nobody minted)
    /// and skipped silently. A failed send to one owner never stops the
    /// rest, and no error escapes this function: the webhook answers 200
    /// either way because redelivery is the provider's job, not ours.
    pub async fn route(&self, event: InboundEmail) -> usize {
        let candidates = event.recipient_fields.join(" , ");
        let recipients = extract_addresses(&candidates);
        if recipients.is_empty() {
            log::debug!("Inbound mail carried no recognizable recipient address");
            return 0;
        }

        let mut delivered = 0;
        for address in recipients {
            let Some(owner) = self.registry.owner_of_address(&address).await else {
                continue;
            };

            if self.registry.is_blocked(owner).await && !is_admin(owner) {
                log::info!("Suppressing delivery to blocked owner {}", owner);
                continue;
            }

            let text = format_notification(&address, &event.sender, &event.subject, &event.body);
            match self.outbound.send(owner, &text).await {
                Ok(()) => delivered += 1,
                Err(e) => {
                    log::error!("Failed to deliver mail for {} to owner {}: {}", address, owner, e);
                }
            }
        }

        delivered
    }
}

/// Render one owner notification in MarkdownV2.
///
/// Sender, subject and body are attacker-controlled, so everything
/// interpolated outside a code span is escaped. The body is cut at
/// `notify::BODY_TRUNCATE_CHARS` characters with a marker appended.
pub fn format_notification(to_address: &str, sender: &str, subject: &str, body: &str) -> String {
    let body = body.trim();
    let mut shown: String = body.chars().take(notify::BODY_TRUNCATE_CHARS).collect();
    let truncated = body.chars().count() > notify::BODY_TRUNCATE_CHARS;

    shown = if shown.is_empty() {
        "(no text)".to_string()
    } else {
        escape_markdown_v2(&shown)
    };
    if truncated {
        shown.push_str(notify::TRUNCATION_MARKER);
    }

    format!(
        "📩 New mail received\n\nTo: `{}`\nFrom: {}\nSubject: {}\n\n{}",
        to_address,
        escape_markdown_v2(sender),
        escape_markdown_v2(subject),
        shown,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryStore;
    use std::sync::Mutex;

    /// Records every send; owners listed in `failing` error out instead.
    #[derive(Default)]
    struct RecordingOutbound {
        sent: Mutex<Vec<(i64, String)>>,
        failing: Vec<i64>,
    }

    #[async_trait]
    impl Outbound for RecordingOutbound {
        async fn send(&self, owner: i64, text: &str) -> AppResult<()> {
            if self.failing.contains(&owner) {
                return Err(crate::core::error::AppError::Io(std::io::Error::other("send failed")));
            }
            self.sent.lock().unwrap().push((owner, text.to_string()));
            Ok(())
        }
    }

    async fn registry_with(owners: &[(i64, &str)]) -> Arc<Registry> {
        let registry = Registry::load(Arc::new(InMemoryStore::new()), "tmp.example")
            .await
            .unwrap();
        for (owner, name) in owners {
            registry.mint_named(*owner, name).await.unwrap();
        }
        Arc::new(registry)
    }

    fn event_to(recipient: &str, body: &str) -> InboundEmail {
        InboundEmail {
            recipient_fields: vec![recipient.to_string()],
            sender: "someone@else.where".to_string(),
            subject: "hello".to_string(),
            body: body.to_string(),
        }
    }

    #[tokio::test]
    async fn routes_to_resolved_owner() {
        let registry = registry_with(&[(1, "jane")]).await;
        let outbound = Arc::new(RecordingOutbound::default());
        let router = DeliveryRouter::new(registry, outbound.clone());

        let delivered = router.route(event_to("Jane <jane@tmp.example>", "hi")).await;
        assert_eq!(delivered, 1);

        let sent = outbound.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, 1);
        assert!(sent[0].1.contains("`jane@tmp.example`"));
    }

    #[tokio::test]
    async fn unknown_addresses_are_skipped_silently() {
        let registry = registry_with(&[]).await;
        let outbound = Arc::new(RecordingOutbound::default());
        let router = DeliveryRouter::new(registry, outbound.clone());

        let delivered = router.route(event_to("ghost@tmp.example", "hi")).await;
        assert_eq!(delivered, 0);
        assert!(outbound.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn blocked_owner_gets_nothing_but_route_still_succeeds() {
        let registry = registry_with(&[(7, "muted")]).await;
        registry.block(7).await.unwrap();
        let outbound = Arc::new(RecordingOutbound::default());
        let router = DeliveryRouter::new(registry, outbound.clone());

        let delivered = router.route(event_to("muted@tmp.example", "hi")).await;
        assert_eq!(delivered, 0);
        assert!(outbound.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn one_failed_delivery_does_not_stop_the_rest() {
        let registry = registry_with(&[(1, "first"), (2, "second")]).await;
        let outbound = Arc::new(RecordingOutbound {
            failing: vec![1],
            ..Default::default()
        });
        let router = DeliveryRouter::new(registry, outbound.clone());

        let delivered = router
            .route(event_to("first@tmp.example, second@tmp.example", "hi"))
            .await;
        assert_eq!(delivered, 1);

        let sent = outbound.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, 2);
    }

    #[tokio::test]
    async fn multiple_recipients_each_get_their_copy() {
        let registry = registry_with(&[(1, "first"), (2, "second")]).await;
        let outbound = Arc::new(RecordingOutbound::default());
        let router = DeliveryRouter::new(registry, outbound.clone());

        let event = InboundEmail {
            recipient_fields: vec![
                "first@tmp.example".to_string(),
                "Second Person <second@tmp.example>".to_string(),
                String::new(),
            ],
            sender: "x@y.z".to_string(),
            subject: "fanout".to_string(),
            body: "body".to_string(),
        };
        assert_eq!(router.route(event).await, 2);
    }

    #[test]
    fn long_bodies_are_truncated_with_marker() {
        let body = "a".repeat(4000);
        let text = format_notification("x@tmp.example", "s", "subj", &body);
        assert!(text.ends_with(notify::TRUNCATION_MARKER));
        // 3500 body chars survive, the rest is gone.
        assert!(text.contains(&"a".repeat(3500)));
        assert!(!text.contains(&"a".repeat(3501)));
    }

    #[test]
    fn short_bodies_pass_through() {
        let text = format_notification("x@tmp.example", "s", "subj", "short body");
        assert!(text.contains("short body"));
        assert!(!text.contains(notify::TRUNCATION_MARKER));
    }

    #[test]
    fn empty_body_renders_placeholder() {
        let text = format_notification("x@tmp.example", "s", "subj", "   ");
        assert!(text.contains("(no text)"));
    }

    #[test]
    fn hostile_markup_is_escaped() {
        let text = format_notification(
            "x@tmp.example",
            "evil_*sender*",
            "[click](https://bad.example)",
            "`code` _injection_",
        );
        assert!(text.contains(r"evil\_\*sender\*"));
        assert!(text.contains(r"\[click\]\(https://bad\.example\)"));
        assert!(text.contains(r"\`code\` \_injection\_"));
    }
}
