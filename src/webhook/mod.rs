//! GitHub webhook ingress: signature verification and event decoding.
//!
//! SYSTEM CONTEXT
//! ==============
//! `routes::webhook` verifies the delivery with [`signature::verify`],
//! decodes it with [`WebhookEvent::parse`], and hands the event to
//! `services::dispatch` on a background task.

pub mod event;
pub mod signature;

pub use event::{EventError, IssuePayload, PullRequestPayload, Repository, WebhookEvent};
pub use signature::SignatureError;
