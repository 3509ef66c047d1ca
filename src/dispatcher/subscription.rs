//! Subscription records and the request/selector types around them
//!
//! A `Subscription` is what the dispatcher stores per subscribe call. Callers never
//! hold one directly: they build a `Subscribe` request, get a `Token` back, and
//! later hand that token (or a topic) to `Unsubscribe` to remove it.
//!
//! During delivery a callback sees a `Delivery`, which borrows the public fields
//! of the consumed subscription together with the published message and any
//! extra arguments.

use std::any::Any;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde_json::Value;

use crate::dispatcher::Dispatcher;
use crate::utils::error::{CallbackError, InvalidToken};

/// Value bound as a callback's receiver.
pub type Context = Arc<dyn Any + Send + Sync>;

/// What a callback returns; an error stops the publish it runs in.
pub type CallbackResult = Result<(), CallbackError>;

/// Shared callback invoked with each delivery.
pub type Callback = Arc<dyn Fn(&Delivery<'_>) -> CallbackResult + Send + Sync>;

/// Identifies one subscription within its dispatcher.
///
/// Tokens are handed out from a per-dispatcher counter and render as the
/// counter value in decimal (`"0"`, `"1"`, ...). They order numerically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Token(pub(crate) u64);

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Only the exact form a token renders as parses back: no sign, padding or
/// leading zeros.
impl FromStr for Token {
    type Err = InvalidToken;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u64>()
            .ok()
            .map(Token)
            .filter(|token| token.to_string() == s)
            .ok_or_else(|| InvalidToken(s.to_string()))
    }
}

/// One registered callback, stored in its topic's plain or message queue.
pub struct Subscription {
    pub token: Token,
    pub topic: String,
    /// `None` matches any publish on `topic`.
    pub message: Option<String>,
    pub(crate) callback: Callback,
    pub(crate) context: Option<Context>,
}

// Callbacks and contexts are opaque; only the routing fields are useful in logs.
impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("token", &self.token)
            .field("topic", &self.topic)
            .field("message", &self.message)
            .field("context", &self.context.is_some())
            .finish()
    }
}

/// A subscribe request.
///
/// ```rust
/// use topicsub::dispatcher::{Dispatcher, Subscribe};
///
/// let dispatcher = Dispatcher::default();
/// let token = dispatcher
///     .subscribe(
///         Subscribe::to("news")
///             .message("breaking")
///             .callback(|delivery| {
///                 println!("{} fired", delivery.token);
///                 Ok(())
///             }),
///     )
///     .unwrap();
/// assert_eq!(token.to_string(), "0");
/// ```
#[derive(Default)]
pub struct Subscribe {
    pub(crate) topic: String,
    pub(crate) message: Option<String>,
    pub(crate) context: Option<Context>,
    pub(crate) callback: Option<Callback>,
}

impl Subscribe {
    /// Start a request for `topic`.
    pub fn to(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            ..Self::default()
        }
    }

    /// Narrow the subscription to publishes carrying exactly this message.
    pub fn message(mut self, message: impl ToString) -> Self {
        self.message = Some(message.to_string());
        self
    }

    /// Bind `context` as the callback's receiver.
    pub fn context<T: Any + Send + Sync>(self, context: T) -> Self {
        self.shared_context(Arc::new(context))
    }

    /// Bind an already shared context as the callback's receiver.
    pub fn shared_context(mut self, context: Context) -> Self {
        self.context = Some(context);
        self
    }

    /// Set the callback run on a matching publish.
    pub fn callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(&Delivery<'_>) -> CallbackResult + Send + Sync + 'static,
    {
        self.callback = Some(Arc::new(callback));
        self
    }

    /// Set a callback that is already behind an `Arc`.
    pub fn shared_callback(mut self, callback: Callback) -> Self {
        self.callback = Some(callback);
        self
    }
}

/// Selects subscriptions to remove, by token, by topic (including subtopics), or both.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Unsubscribe {
    pub token: Option<Token>,
    pub topic: Option<String>,
}

impl Unsubscribe {
    /// Select the one subscription holding `token`.
    pub fn token(token: Token) -> Self {
        Self {
            token: Some(token),
            topic: None,
        }
    }

    /// Select by a token in its string form. Anything but the exact rendering of
    /// a token (empty, signed, padded, zero-prefixed) selects nothing.
    pub fn token_str(token: &str) -> Self {
        Self {
            token: token.parse().ok(),
            topic: None,
        }
    }

    /// Select `topic` and every topic below it.
    pub fn topic(topic: impl Into<String>) -> Self {
        Self {
            token: None,
            topic: Some(topic.into()),
        }
    }

    /// Also select the subscription holding `token`.
    pub fn and_token(mut self, token: Token) -> Self {
        self.token = Some(token);
        self
    }

    /// Also select `topic` and every topic below it.
    pub fn and_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    /// The topic selector, with the empty topic treated as absent.
    pub(crate) fn topic_selector(&self) -> Option<&str> {
        self.topic.as_deref().filter(|t| !t.is_empty())
    }
}

/// What a callback receives when its subscription is consumed.
pub struct Delivery<'a> {
    /// Topic the subscription was registered on. For propagated publishes this is
    /// the ancestor topic, not the one originally published to.
    pub topic: &'a str,
    /// The subscription's own message filter.
    pub message: Option<&'a str>,
    /// Token of the consumed subscription.
    pub token: Token,
    /// Message carried by the publish call.
    pub published: Option<&'a str>,
    /// Extra arguments passed to the publish call.
    pub args: &'a [Value],
    pub(crate) dispatcher: &'a Dispatcher,
    pub(crate) context: Option<&'a Context>,
}

/// The receiver a callback is bound to.
pub enum Receiver<'a> {
    Dispatcher(&'a Dispatcher),
    Context(&'a (dyn Any + Send + Sync)),
}

impl<'a> Delivery<'a> {
    /// Dispatcher running this delivery, for reentrant calls.
    pub fn dispatcher(&self) -> &'a Dispatcher {
        self.dispatcher
    }

    /// The bound context, falling back to the dispatcher when none was given.
    pub fn receiver(&self) -> Receiver<'a> {
        match self.context {
            Some(context) => Receiver::Context(&**context),
            None => Receiver::Dispatcher(self.dispatcher),
        }
    }

    /// Bind `context` as the callback's receiver.
    /// The bound context, if it is a `T`.
    pub fn context<T: Any>(&self) -> Option<&'a T> {
        self.context.and_then(|c| (**c).downcast_ref::<T>())
    }
}
