// src/message.rs
// Payloads are opaque: nothing here looks inside `body`.

pub use lapin::message::Delivery;

/// An outbound message: a content-type tag and raw bytes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Publishing {
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl Publishing {
    pub fn new(body: impl Into<Vec<u8>>) -> Self {
        Publishing {
            content_type: None,
            body: body.into(),
        }
    }

    /// A `text/plain` message.
    pub fn text(body: &str) -> Self {
        Self::new(body.as_bytes()).with_content_type("text/plain")
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}
