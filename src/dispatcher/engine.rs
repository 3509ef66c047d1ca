//! Dispatcher engine
//!
//! This module contains the in-process dispatcher responsible for:
//! - registering subscriptions under a topic, optionally narrowed to a message
//! - delivering a publish to every matching subscription exactly once
//! - propagating a publish to parent topics (`"a:b:c"` -> `"a:b"` -> `"a"`)
//! - removing subscriptions by token or by topic subtree
//!
//! Concurrency and usage notes:
//! - Every public operation runs with the dispatcher's reentrant lock held, so
//!   a `Dispatcher` can be shared between threads and a callback may call back
//!   into the same dispatcher from inside a delivery.
//! - The registry is only borrowed while a subscription is popped or inserted,
//!   never while a callback runs.
//! - Delivery is one-shot: a subscription is removed from its queue before its
//!   callback is invoked, and subscriptions added while a topic is being
//!   delivered wait for the next publish.

use std::cell::RefCell;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::ReentrantMutex;
use serde_json::Value;
use tracing::info;

use crate::config::DispatcherConfig;
use crate::dispatcher::subscription::{
    Callback, CallbackResult, Context, Delivery, Subscribe, Subscription, Token, Unsubscribe,
};
use crate::dispatcher::topic::{Registry, parent_topic};
use crate::utils::error::{DispatchError, Result};

static NEXT_INSTANCE_ID: AtomicU64 = AtomicU64::new(0);

/// Topic registry plus the subscribe, publish and unsubscribe operations.
pub struct Dispatcher {
    id: u64,
    config: DispatcherConfig,
    registry: ReentrantMutex<RefCell<Registry>>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(DispatcherConfig::default())
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("id", &self.id)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    /// Creates a dispatcher with empty indexes and a fresh instance id.
    pub fn new(config: DispatcherConfig) -> Self {
        Self {
            id: NEXT_INSTANCE_ID.fetch_add(1, Ordering::Relaxed),
            config,
            registry: ReentrantMutex::new(RefCell::new(Registry::new())),
        }
    }

    /// Process-unique id, for diagnostics only.
    pub fn instance_id(&self) -> u64 {
        self.id
    }

    /// The configuration this dispatcher was built with.
    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    /// Register a subscription and return its token.
    ///
    /// Fails with [`DispatchError::InvalidCallback`] when the request carries no callback.
    pub fn subscribe(&self, request: Subscribe) -> Result<Token> {
        let Subscribe {
            topic,
            message,
            context,
            callback,
        } = request;
        let callback = callback.ok_or_else(|| DispatchError::InvalidCallback {
            topic: topic.clone(),
        })?;
        Ok(self.insert(topic, message, context, callback))
    }

    /// Subscribe `callback` to every publish on `topic`.
    pub fn on<F>(&self, topic: impl Into<String>, callback: F) -> Token
    where
        F: Fn(&Delivery<'_>) -> CallbackResult + Send + Sync + 'static,
    {
        self.insert(topic.into(), None, None, Arc::new(callback))
    }

    fn insert(
        &self,
        topic: String,
        message: Option<String>,
        context: Option<Context>,
        callback: Callback,
    ) -> Token {
        let guard = self.registry.lock();
        let mut registry = guard.borrow_mut();
        let subscription = Subscription {
            token: registry.issue_token(),
            topic,
            message,
            callback,
            context,
        };
        let token = subscription.token;
        self.log("subscribe", &subscription);
        registry.subscribe(subscription);
        token
    }

    /// Deliver `message` and `args` to the subscribers of `topic`, then to the
    /// subscribers of each parent topic when subtopics are enabled.
    ///
    /// Plain subscribers run before message subscribers, each in subscription order.
    /// An error returned by a callback stops the publish and is handed back to the
    /// caller; subscriptions consumed before it stay consumed.
    pub fn publish(&self, topic: &str, message: Option<&str>, args: &[Value]) -> Result<()> {
        let guard = self.registry.lock();

        let mut level = Some(topic);
        while let Some(current) = level {
            self.deliver(&guard, current, message, args)?;
            level = if self.config.subtopics {
                parent_topic(current, &self.config.subtopic_marker)
            } else {
                None
            };
        }
        Ok(())
    }

    fn deliver(
        &self,
        registry: &RefCell<Registry>,
        topic: &str,
        message: Option<&str>,
        args: &[Value],
    ) -> Result<()> {
        let cutoff = registry.borrow().watermark();

        self.drain(registry, topic, None, message, args, cutoff)?;
        if message.is_some() {
            self.drain(registry, topic, message, message, args, cutoff)?;
        }
        Ok(())
    }

    /// Pop and invoke subscriptions from one queue until it is empty or its head
    /// was issued at or after `cutoff`.
    fn drain(
        &self,
        registry: &RefCell<Registry>,
        topic: &str,
        queue: Option<&str>,
        published: Option<&str>,
        args: &[Value],
        cutoff: Token,
    ) -> Result<()> {
        loop {
            // The borrow ends with this statement; callbacks may re-enter.
            let next = registry.borrow_mut().pop_due(topic, queue, cutoff);
            let Some(subscription) = next else {
                return Ok(());
            };

            self.log("publish", &subscription);

            let delivery = Delivery {
                topic: &subscription.topic,
                message: subscription.message.as_deref(),
                token: subscription.token,
                published,
                args,
                dispatcher: self,
                context: subscription.context.as_ref(),
            };
            (subscription.callback)(&delivery).map_err(|source| DispatchError::Callback {
                topic: subscription.topic.clone(),
                token: subscription.token,
                source,
            })?;
        }
    }

    /// Remove subscriptions matching `selector` and return how many were removed.
    pub fn unsubscribe(&self, selector: Unsubscribe) -> usize {
        let guard = self.registry.lock();

        let removed = {
            let mut registry = guard.borrow_mut();
            let mut removed = Vec::new();
            if let Some(token) = selector.token {
                removed.extend(registry.unsubscribe_token(token));
            }
            if let Some(topic) = selector.topic_selector() {
                removed.extend(registry.remove_topic(topic, &self.config.subtopic_marker));
            }
            removed
        };

        for subscription in &removed {
            self.log("unsubscribe", subscription);
        }
        // Dropped here, after the borrow, in case a captured value re-enters on drop.
        removed.len()
    }

    /// Whether anything ever subscribed to `topic` and it was not removed since.
    pub fn has_topic(&self, topic: &str) -> bool {
        let guard = self.registry.lock();
        let registry = guard.borrow();
        registry.topics.contains_key(topic)
    }

    /// Pending plain subscriptions on `topic`.
    pub fn subscriber_count(&self, topic: &str) -> usize {
        let guard = self.registry.lock();
        let registry = guard.borrow();
        registry
            .topics
            .get(topic)
            .map_or(0, |t| t.subscribers.len())
    }

    /// Pending subscriptions on `topic` narrowed to `message`.
    pub fn message_subscriber_count(&self, topic: &str, message: &str) -> usize {
        let guard = self.registry.lock();
        let registry = guard.borrow();
        registry
            .topics
            .get(topic)
            .and_then(|t| t.messages.get(message))
            .map_or(0, |queue| queue.len())
    }

    /// Tokens pending on `topic`, plain subscriptions first, then message
    /// subscriptions, each in ascending order.
    pub fn tokens(&self, topic: &str) -> Vec<Token> {
        let guard = self.registry.lock();
        let registry = guard.borrow();
        let Some(entry) = registry.topics.get(topic) else {
            return Vec::new();
        };
        let mut scoped: Vec<Token> = entry
            .messages
            .values()
            .flat_map(|queue| queue.iter().map(|s| s.token))
            .collect();
        scoped.sort();
        entry
            .subscribers
            .iter()
            .map(|s| s.token)
            .chain(scoped)
            .collect()
    }

    /// Diagnostic hook. Emits an event only when logging is enabled in the config.
    pub fn log(&self, action: &str, detail: &impl fmt::Debug) {
        if self.config.log {
            info!(target: "topicsub", dispatcher = self.id, action, "{detail:?}");
        }
    }
}
