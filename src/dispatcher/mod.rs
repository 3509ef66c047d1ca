//! The dispatcher: topic registry plus subscribe, publish and unsubscribe.
//!
//! Most callers only need [`Dispatcher`], [`Subscribe`] and [`Unsubscribe`].
//! [`global`] returns a process-wide dispatcher built with default settings
//! for code that does not want to thread an instance around.

pub mod engine;
pub mod subscription;
pub mod topic;

use once_cell::sync::Lazy;

pub use engine::Dispatcher;
pub use subscription::{
    Callback, CallbackResult, Context, Delivery, Receiver, Subscribe, Token, Unsubscribe,
};

static GLOBAL: Lazy<Dispatcher> = Lazy::new(Dispatcher::default);

/// Process-wide dispatcher with default settings, created on first use.
pub fn global() -> &'static Dispatcher {
    &GLOBAL
}
