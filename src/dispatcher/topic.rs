//! Topic management
//!
//! A `Topic` holds the plain subscriptions for one topic name together with the
//! message-scoped subscriptions keyed by message. Both live in the same entry,
//! so they are created together the first time anything subscribes to the topic.
//!
//! `Registry` is the whole index plus the token counter. It never invokes
//! callbacks: the engine pops due subscriptions out of it one at a time and runs
//! them with no borrow held, which is what makes reentrant calls safe.

use std::collections::{HashMap, VecDeque};

use crate::dispatcher::subscription::{Subscription, Token};

/// Pending subscriptions for one topic name.
#[derive(Debug, Default)]
pub struct Topic {
    pub name: String,
    pub subscribers: VecDeque<Subscription>,
    pub messages: HashMap<String, VecDeque<Subscription>>,
}

impl Topic {
    /// Create an empty topic with the given name.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            subscribers: VecDeque::new(),
            messages: HashMap::new(),
        }
    }

    /// Append to the tail of the plain or message queue, depending on the
    /// subscription's message.
    pub fn subscribe(&mut self, subscription: Subscription) {
        match &subscription.message {
            None => self.subscribers.push_back(subscription),
            Some(message) => self
                .messages
                .entry(message.clone())
                .or_default()
                .push_back(subscription),
        }
    }

    /// Pending subscriptions across both queues.
    pub fn len(&self) -> usize {
        self.subscribers.len() + self.messages.values().map(VecDeque::len).sum::<usize>()
    }

    /// Whether no subscription is pending on this topic.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove the subscription holding `token`, if it is on this topic.
    pub fn unsubscribe(&mut self, token: Token) -> Option<Subscription> {
        std::iter::once(&mut self.subscribers)
            .chain(self.messages.values_mut())
            .find_map(|queue| {
                let pos = queue.iter().position(|s| s.token == token)?;
                queue.remove(pos)
            })
    }

    fn queue_mut(&mut self, message: Option<&str>) -> Option<&mut VecDeque<Subscription>> {
        match message {
            None => Some(&mut self.subscribers),
            Some(message) => self.messages.get_mut(message),
        }
    }
}

/// Every topic of one dispatcher plus its token counter.
#[derive(Debug, Default)]
pub struct Registry {
    pub topics: HashMap<String, Topic>,
    next_token: u64,
}

impl Registry {
    /// Create an empty registry whose first token is `0`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Hand out the next token. The counter only ever moves forward.
    pub fn issue_token(&mut self) -> Token {
        let token = Token(self.next_token);
        self.next_token += 1;
        token
    }

    /// First token that has not been issued yet.
    pub fn watermark(&self) -> Token {
        Token(self.next_token)
    }

    /// Store `subscription` under its topic, creating the topic on first use.
    pub fn subscribe(&mut self, subscription: Subscription) {
        self.topics
            .entry(subscription.topic.clone())
            .or_insert_with(|| Topic::new(&subscription.topic))
            .subscribe(subscription);
    }

    /// Pop the head of the plain (`message == None`) or message queue for `topic`,
    /// provided it was issued before `cutoff`.
    ///
    /// Queues are in token order, so a head at or past the cutoff means everything
    /// left was added after the current delivery started.
    pub fn pop_due(
        &mut self,
        topic: &str,
        message: Option<&str>,
        cutoff: Token,
    ) -> Option<Subscription> {
        let queue = self.topics.get_mut(topic)?.queue_mut(message)?;
        if queue.front()?.token >= cutoff {
            return None;
        }
        queue.pop_front()
    }

    /// Remove the subscription holding `token`, wherever it is.
    pub fn unsubscribe_token(&mut self, token: Token) -> Option<Subscription> {
        self.topics
            .values_mut()
            .find_map(|topic| topic.unsubscribe(token))
    }

    /// Drop `topic` and every topic below it (`topic` + `marker` + ...),
    /// returning the subscriptions they held.
    pub fn remove_topic(&mut self, topic: &str, marker: &str) -> Vec<Subscription> {
        let names: Vec<String> = self
            .topics
            .values()
            .filter(|entry| is_same_or_descendant(&entry.name, topic, marker))
            .map(|entry| entry.name.clone())
            .collect();

        let mut removed = Vec::new();
        for name in names {
            if let Some(mut entry) = self.topics.remove(&name) {
                removed.extend(entry.subscribers.drain(..));
                removed.extend(entry.messages.drain().flat_map(|(_, queue)| queue));
            }
        }
        removed
    }
}

/// Parent of `topic`: everything before the last `marker`. `None` when there is
/// no marker, the parent would be empty, or the marker itself is empty.
pub fn parent_topic<'t>(topic: &'t str, marker: &str) -> Option<&'t str> {
    if marker.is_empty() {
        return None;
    }
    topic
        .rfind(marker)
        .map(|idx| &topic[..idx])
        .filter(|parent| !parent.is_empty())
}

/// Whether `name` is `topic` itself or sits below it.
pub fn is_same_or_descendant(name: &str, topic: &str, marker: &str) -> bool {
    if name == topic {
        return true;
    }
    !marker.is_empty()
        && name
            .strip_prefix(topic)
            .is_some_and(|rest| rest.starts_with(marker))
}
