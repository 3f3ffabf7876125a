//! Per-request context
//!
//! A [`RequestContext`] is created when a request starts, threaded by `&mut`
//! through every hook that needs request state, and released when the request
//! ends. Nothing in it is shared between requests.

use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::HashMap;
use tracing::{debug, trace};

/// Number of characters kept by [`RequestId::short`].
pub const SHORT_ID_LENGTH: usize = 8;

/// Unique identifier for a request, used for tracing and correlation.
///
/// Uses UUID v7 so identifiers sort by creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(uuid::Uuid);

impl RequestId {
    /// Creates a new unique request ID using UUID v7.
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v7(uuid::Timestamp::now(uuid::NoContext)))
    }

    /// Returns the first [`SHORT_ID_LENGTH`] characters of the ID.
    pub fn short(&self) -> String {
        self.0.to_string().chars().take(SHORT_ID_LENGTH).collect()
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<uuid::Uuid> for RequestId {
    fn from(uuid: uuid::Uuid) -> Self {
        Self(uuid)
    }
}

impl std::str::FromStr for RequestId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        uuid::Uuid::parse_str(s).map(Self)
    }
}

/// Severity of a message queued for the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational
    Info,
    /// Warning
    Warn,
    /// Error, typically a failed validation
    Error,
}

/// A user-facing message produced while handling a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserMessage {
    /// Message severity
    pub severity: Severity,
    /// Short text
    pub summary: String,
    /// Long text
    pub detail: String,
}

impl UserMessage {
    /// Create a message with the same summary and detail.
    pub fn new(severity: Severity, text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            severity,
            summary: text.clone(),
            detail: text,
        }
    }

    /// Create an error message with the same summary and detail.
    pub fn error(text: impl Into<String>) -> Self {
        Self::new(Severity::Error, text)
    }
}

/// Request-scoped state: attribute bag plus message sink.
///
/// Attributes are keyed by string and typed on retrieval. Asking for an
/// attribute with the wrong type behaves as if it were absent.
pub struct RequestContext {
    request_id: RequestId,
    attributes: HashMap<String, Box<dyn Any + Send>>,
    messages: Vec<UserMessage>,
}

impl RequestContext {
    /// Start a new request.
    pub fn new() -> Self {
        Self::with_id(RequestId::new())
    }

    /// Start a new request with a known ID.
    pub fn with_id(request_id: RequestId) -> Self {
        trace!(request_id = %request_id, "request context opened");
        Self {
            request_id,
            attributes: HashMap::new(),
            messages: Vec::new(),
        }
    }

    /// The request ID.
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Whether an attribute is stored under `key`, whatever its type.
    pub fn has_attribute(&self, key: &str) -> bool {
        self.attributes.contains_key(key)
    }

    /// Borrow a typed attribute.
    pub fn attribute<T: Any + Send>(&self, key: &str) -> Option<&T> {
        self.attributes.get(key)?.downcast_ref::<T>()
    }

    /// Mutably borrow a typed attribute.
    pub fn attribute_mut<T: Any + Send>(&mut self, key: &str) -> Option<&mut T> {
        self.attributes.get_mut(key)?.downcast_mut::<T>()
    }

    /// Store an attribute, replacing whatever was stored under `key`.
    pub fn set_attribute<T: Any + Send>(&mut self, key: impl Into<String>, value: T) {
        self.attributes.insert(key.into(), Box::new(value));
    }

    /// Mutably borrow a typed attribute, creating it first when absent.
    ///
    /// A value of a different type stored under `key` is replaced.
    pub fn attribute_or_insert_with<T, F>(&mut self, key: &str, init: F) -> &mut T
    where
        T: Any + Send,
        F: FnOnce() -> T,
    {
        match self.attributes.get(key) {
            Some(existing) if existing.is::<T>() => {}
            Some(_) => {
                debug!(key = %key, "replacing attribute of unexpected type");
                self.attributes.insert(key.to_string(), Box::new(init()));
            }
            None => {
                self.attributes.insert(key.to_string(), Box::new(init()));
            }
        }
        match self
            .attributes
            .get_mut(key)
            .and_then(|slot| slot.downcast_mut::<T>())
        {
            Some(value) => value,
            None => unreachable!("attribute stored with the requested type above"),
        }
    }

    /// Remove and return a typed attribute.
    ///
    /// The attribute is left in place when its type does not match.
    pub fn take_attribute<T: Any + Send>(&mut self, key: &str) -> Option<T> {
        if !self.attributes.get(key)?.is::<T>() {
            return None;
        }
        let boxed = self.attributes.remove(key)?;
        boxed.downcast::<T>().ok().map(|value| *value)
    }

    /// Remove an attribute of any type.
    pub fn remove_attribute(&mut self, key: &str) -> bool {
        self.attributes.remove(key).is_some()
    }

    /// Queue a message for the user.
    pub fn add_message(&mut self, message: UserMessage) {
        debug!(
            request_id = %self.request_id,
            severity = ?message.severity,
            summary = %message.summary,
            "user message queued"
        );
        self.messages.push(message);
    }

    /// Messages queued so far.
    pub fn messages(&self) -> &[UserMessage] {
        &self.messages
    }

    /// Whether any error message has been queued.
    pub fn has_errors(&self) -> bool {
        self.messages
            .iter()
            .any(|message| message.severity == Severity::Error)
    }

    /// End the request: drop all attributes and hand back the queued messages.
    pub fn release(self) -> Vec<UserMessage> {
        trace!(
            request_id = %self.request_id,
            attributes = self.attributes.len(),
            messages = self.messages.len(),
            "request context released"
        );
        self.messages
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut keys: Vec<_> = self.attributes.keys().collect();
        keys.sort();
        f.debug_struct("RequestContext")
            .field("request_id", &self.request_id)
            .field("attributes", &keys)
            .field("messages", &self.messages)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_ids_are_unique_and_short_form_is_prefix() {
        let a = RequestId::new();
        let b = RequestId::new();
        assert_ne!(a, b);
        assert_eq!(a.short().len(), SHORT_ID_LENGTH);
        assert!(a.to_string().starts_with(&a.short()));
    }

    #[test]
    fn test_request_id_parses_back() {
        let id = RequestId::new();
        let parsed: RequestId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_typed_attributes() {
        let mut ctx = RequestContext::new();
        ctx.set_attribute("count", 3usize);

        assert!(ctx.has_attribute("count"));
        assert_eq!(ctx.attribute::<usize>("count"), Some(&3));
        assert_eq!(ctx.attribute::<String>("count"), None);

        *ctx.attribute_mut::<usize>("count").unwrap() += 1;
        assert_eq!(ctx.attribute::<usize>("count"), Some(&4));
    }

    #[test]
    fn test_take_attribute_with_wrong_type_leaves_it() {
        let mut ctx = RequestContext::new();
        ctx.set_attribute("list", vec![1, 2, 3]);

        assert_eq!(ctx.take_attribute::<String>("list"), None);
        assert!(ctx.has_attribute("list"));
        assert_eq!(ctx.take_attribute::<Vec<i32>>("list"), Some(vec![1, 2, 3]));
        assert!(!ctx.has_attribute("list"));
    }

    #[test]
    fn test_attribute_or_insert_with_creates_once() {
        let mut ctx = RequestContext::new();
        ctx.attribute_or_insert_with("list", Vec::<i32>::new).push(1);
        ctx.attribute_or_insert_with("list", Vec::<i32>::new).push(2);
        assert_eq!(ctx.attribute::<Vec<i32>>("list"), Some(&vec![1, 2]));
    }

    #[test]
    fn test_attribute_or_insert_with_replaces_foreign_type() {
        let mut ctx = RequestContext::new();
        ctx.set_attribute("slot", "text".to_string());
        ctx.attribute_or_insert_with("slot", Vec::<i32>::new).push(7);
        assert_eq!(ctx.attribute::<Vec<i32>>("slot"), Some(&vec![7]));
    }

    #[test]
    fn test_release_returns_messages() {
        let mut ctx = RequestContext::new();
        ctx.add_message(UserMessage::error("end date before start date"));
        ctx.add_message(UserMessage::new(Severity::Info, "saved"));
        assert!(ctx.has_errors());

        let messages = ctx.release();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].summary, messages[0].detail);
    }
}
