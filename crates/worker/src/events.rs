//! Event kinds and the single dispatch point.
//!
//! Every platform event the worker handles goes through
//! [`WorkerContext::dispatch`]. The returned future represents the work the
//! event must wait for: the runtime keeps the worker alive exactly as long
//! as callers hold and await these futures, which makes the extend-lifetime
//! contract explicit instead of implicit.

use coinstash_core::Error;

use crate::messaging::{self, ControlMessage};
use crate::push::{self, NotificationIntent, PushPayload};
use crate::request::WorkerRequest;
use crate::response::WorkerResponse;
use crate::worker::WorkerContext;

/// One platform event delivered to a worker.
#[derive(Debug, Clone)]
pub enum WorkerEvent {
    /// Install this worker version (precache the manifest).
    Install,
    /// Activate this worker (evict stale generations, claim clients).
    Activate,
    /// An intercepted outgoing request.
    Fetch(WorkerRequest),
    /// A message posted from a foreground client.
    Message(serde_json::Value),
    /// The platform signalled a due sync tag.
    Sync { tag: String },
    /// An inbound push with its raw payload.
    Push { payload: Vec<u8> },
    /// The user clicked a rendered notification; `data` is the opaque data
    /// it was rendered with.
    NotificationClick { data: serde_json::Value },
}

/// What handling an event produced.
#[derive(Debug)]
pub enum EventOutcome {
    /// The event's side effects completed; nothing to hand back.
    Done,
    /// A response to return to the intercepted caller.
    Response(WorkerResponse),
    /// A notification to render.
    Notification(NotificationIntent),
    /// Close the notification and focus/open this target.
    OpenWindow(String),
    /// The waiting worker asked to be promoted now.
    SkipWaitingRequested,
    /// The event carried nothing this worker recognizes.
    Ignored,
}

impl WorkerContext {
    /// Dispatch one event to its handler.
    ///
    /// Callers must await the returned future before treating the event as
    /// settled; dropping it early may abandon in-flight cache writes.
    pub async fn dispatch(&self, event: WorkerEvent) -> Result<EventOutcome, Error> {
        match event {
            WorkerEvent::Install => self.install().await.map(|_| EventOutcome::Done),
            WorkerEvent::Activate => self.activate().await.map(|_| EventOutcome::Done),
            WorkerEvent::Fetch(request) => self.handle_fetch(&request).await.map(EventOutcome::Response),
            WorkerEvent::Message(value) => Ok(match messaging::parse_control(&value) {
                Some(ControlMessage::SkipWaiting) => EventOutcome::SkipWaitingRequested,
                None => {
                    tracing::debug!("unrecognized control message ignored");
                    EventOutcome::Ignored
                }
            }),
            WorkerEvent::Sync { tag } => {
                self.sync.fire(&tag).await;
                Ok(EventOutcome::Done)
            }
            WorkerEvent::Push { payload } => {
                let intent = NotificationIntent::from_payload(PushPayload::parse(&payload));
                Ok(EventOutcome::Notification(intent))
            }
            WorkerEvent::NotificationClick { data } => Ok(EventOutcome::OpenWindow(push::click_target(&data))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{self, FakeNetwork};
    use serde_json::json;

    #[tokio::test]
    async fn test_dispatch_skip_waiting_message() {
        let net = FakeNetwork::shared();
        let worker = testutil::context("v1", net).await;

        let outcome = worker
            .dispatch(WorkerEvent::Message(json!({"type": "SKIP_WAITING"})))
            .await
            .unwrap();
        assert!(matches!(outcome, EventOutcome::SkipWaitingRequested));
    }

    #[tokio::test]
    async fn test_dispatch_unknown_message_ignored() {
        let net = FakeNetwork::shared();
        let worker = testutil::context("v1", net).await;

        let outcome = worker
            .dispatch(WorkerEvent::Message(json!({"type": "NOPE"})))
            .await
            .unwrap();
        assert!(matches!(outcome, EventOutcome::Ignored));
    }

    #[tokio::test]
    async fn test_dispatch_push_yields_notification() {
        let net = FakeNetwork::shared();
        let worker = testutil::context("v1", net).await;

        let payload = br#"{"title":"Budget alert","data":{"url":"/expenses"}}"#.to_vec();
        let outcome = worker.dispatch(WorkerEvent::Push { payload }).await.unwrap();

        match outcome {
            EventOutcome::Notification(intent) => {
                assert_eq!(intent.title, "Budget alert");
                assert_eq!(intent.click_target(), "/expenses");
            }
            other => panic!("expected notification, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_dispatch_malformed_push_still_notifies() {
        let net = FakeNetwork::shared();
        let worker = testutil::context("v1", net).await;

        let outcome = worker
            .dispatch(WorkerEvent::Push { payload: b"garbage".to_vec() })
            .await
            .unwrap();
        match outcome {
            EventOutcome::Notification(intent) => assert_eq!(intent.title, "Coinstash"),
            other => panic!("expected notification, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_dispatch_notification_click() {
        let net = FakeNetwork::shared();
        let worker = testutil::context("v1", net).await;

        let outcome = worker
            .dispatch(WorkerEvent::NotificationClick { data: json!({"url": "/goals"}) })
            .await
            .unwrap();
        assert!(matches!(outcome, EventOutcome::OpenWindow(url) if url == "/goals"));

        let outcome = worker
            .dispatch(WorkerEvent::NotificationClick { data: json!({}) })
            .await
            .unwrap();
        assert!(matches!(outcome, EventOutcome::OpenWindow(url) if url == "/"));
    }

    #[tokio::test]
    async fn test_dispatch_sync_swallows_handler_error() {
        let net = FakeNetwork::shared();
        let worker = testutil::context("v1", net).await;

        worker
            .sync
            .register("sync-expenses", || async { Err(coinstash_core::Error::Network("offline".into())) })
            .await;

        let outcome = worker
            .dispatch(WorkerEvent::Sync { tag: "sync-expenses".into() })
            .await
            .unwrap();
        assert!(matches!(outcome, EventOutcome::Done));
    }

    #[tokio::test]
    async fn test_dispatch_fetch_returns_response() {
        let net = FakeNetwork::shared();
        net.route("http://localhost:3000/api/expenses", 200, br#"{"total":42}"#);
        let worker = testutil::context("v1", net).await;

        let request = WorkerRequest::get("http://localhost:3000/api/expenses").unwrap();
        let outcome = worker.dispatch(WorkerEvent::Fetch(request)).await.unwrap();
        match outcome {
            EventOutcome::Response(response) => assert_eq!(response.body().as_ref(), br#"{"total":42}"#),
            other => panic!("expected response, got {other:?}"),
        }
    }
}
