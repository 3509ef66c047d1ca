//! # topicsub
//!
//! `topicsub` is an in-process, synchronous publish/subscribe dispatcher.
//! Callbacks subscribe to named topics, optionally narrowed to one message, and
//! a publish runs every matching callback before it returns.
//!
//! ## Core Modules
//!
//! - `dispatcher`: the topic registry and the subscribe, publish and unsubscribe operations.
//! - `config`: dispatcher settings, loadable from a file and the environment.
//! - `utils`: error types and a tracing bootstrap helper.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use topicsub::dispatcher::Dispatcher;
//!
//! let dispatcher = Dispatcher::default();
//! let hits = Arc::new(AtomicUsize::new(0));
//!
//! let counter = hits.clone();
//! dispatcher.on("orders", move |_| {
//!     counter.fetch_add(1, Ordering::SeqCst);
//!     Ok(())
//! });
//!
//! // "orders:eu" propagates to "orders"
//! dispatcher.publish("orders:eu", Some("created"), &[]).unwrap();
//! assert_eq!(hits.load(Ordering::SeqCst), 1);
//!
//! // subscriptions are one-shot
//! dispatcher.publish("orders", None, &[]).unwrap();
//! assert_eq!(hits.load(Ordering::SeqCst), 1);
//! ```

pub mod config;
pub mod dispatcher;
pub mod utils;

pub use crate::config::{DispatcherConfig, Settings};
pub use crate::dispatcher::{Delivery, Dispatcher, Subscribe, Token, Unsubscribe};
pub use crate::utils::error::{DispatchError, Result};
