//! Snapshot broadcast server
//!
//! ```text
//!   any thread                       hub thread (current-thread runtime)
//!  ┌──────────────┐   HubCommand   ┌──────────────────────────────────────┐
//!  │ HubHandle    │ ─────────────► │ HubServer                            │
//!  │   .send(..)  │  (unbounded)   │   accept ──► configure ──► register  │
//!  └──────────────┘                │   Broadcast ──► BroadcastState       │
//!                                  │                  │ try_send per client│
//!                                  │     ┌────────────┼────────────┐      │
//!                                  │     ▼            ▼            ▼      │
//!                                  │  queue(3)     queue(3)     queue(3)  │
//!                                  │     │            │            │      │
//!                                  │  send loop    send loop    send loop │
//!                                  └─────┼────────────┼────────────┼──────┘
//!                                        ▼            ▼            ▼
//!                                       TCP          TCP          TCP
//! ```
//!
//! Slow viewers lose payloads once their queue is full; they are never
//! disconnected for it and never hold up other viewers or the sender.

pub mod config;
pub mod connection;
pub mod hub;
pub(crate) mod listener;
pub mod payload;
pub mod state;

pub use config::HubConfig;
pub use connection::{ClientConnection, ClientPhase};
pub use hub::{BroadcastHub, HubHandle};
pub use payload::{ClientId, Payload};
pub use state::{BroadcastState, FanOut};
