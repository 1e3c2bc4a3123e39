//! Offline worker runtime for the coinstash personal-finance app.
//!
//! This crate is the request-interception layer that sits between the
//! foreground application and the network: it maintains versioned cache
//! generations of static assets, a reserved store of API responses, and
//! serves every retrieval request through a per-class caching strategy so
//! the app keeps working without connectivity.
//!
//! ## Architecture
//!
//! ```text
//! WorkerHost (foreground registration)
//!     │
//!     ├── installing (WorkerContext)
//!     ├── waiting    (WorkerContext)   ──SKIP_WAITING──▶ promoted
//!     └── active     (WorkerContext)
//!             │
//!             ├── Router ── Cache-First ──▶ static generation
//!             │         └── Network-First ─▶ API store
//!             ├── Clients (update/controller notices)
//!             ├── SyncRegistry (deferred retry hooks)
//!             └── push (notification intents)
//! ```
//!
//! Every event (install, activate, fetch, message, sync, push) goes through
//! a single [`WorkerContext::dispatch`] call whose returned future is the
//! event's lifetime: callers must await it before treating the event as
//! settled.

pub mod events;
pub mod lifecycle;
pub mod messaging;
pub mod net;
pub mod push;
pub mod registration;
pub mod request;
pub mod response;
pub mod router;
pub mod strategy;
pub mod sync;
pub mod worker;

#[cfg(test)]
pub(crate) mod testutil;

pub use coinstash_core::{AppConfig, CacheDb, CacheNames, Error, StoredResponse};

pub use events::{EventOutcome, WorkerEvent};
pub use lifecycle::{WorkerId, WorkerState};
pub use messaging::{ClientId, ClientNotice, Clients, ControlMessage};
pub use net::{FetchOptions, HttpNetwork, NetConfig, Network};
pub use push::{NotificationAction, NotificationIntent, PushPayload};
pub use registration::WorkerHost;
pub use request::{RequestMode, WorkerRequest};
pub use response::{ResponseSource, WorkerResponse};
pub use router::RequestClass;
pub use sync::SyncRegistry;
pub use worker::{WorkerContext, WorkerPolicy};
