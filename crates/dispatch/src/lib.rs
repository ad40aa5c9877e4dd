//! Notification dispatch.
//!
//! Accepted notifications are pushed onto a bounded [`DispatchQueue`]. A
//! [`WorkerPool`] drains it and runs each notification through the
//! [`DispatchEngine`], which matches the recipient's rules and hands the
//! selected methods to a [`DeliveryChannel`].

pub mod delivery;
pub mod engine;
pub mod queue;

pub use delivery::twilio::TwilioChannel;
pub use delivery::{DeliveryChannel, DeliveryError, OutboundMessage};
pub use engine::{DispatchEngine, DispatchReport, Outcome};
pub use queue::{DispatchPermit, DispatchQueue, QueueError, WorkerPool};
