//! Tokio driver for the [`Session`](crate::session::Session).
//!
//! One task owns the session and multiplexes timer deadlines, transport
//! events and UI commands. Each connect attempt runs in its own channel task.
//! Snapshots are published over a `watch` channel after every step.

mod channel;
mod client;

#[cfg(test)]
mod tests;

pub use client::{AvatarClient, ClientHandle, ClientOptions};
