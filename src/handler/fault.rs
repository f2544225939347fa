//! Handler faults.
//!
//! A [`Fault`] is whatever error a handler returned. The dispatch core never
//! interprets it; response strategies may inspect it with [`Fault::is`] or
//! [`Fault::downcast_ref`].

use std::error::Error as StdError;
use std::fmt;

use thiserror::Error;

/// Type-erased error returned by a handler.
///
/// Any error type converts into a `Fault` with `?`. `Fault` itself does not
/// implement [`std::error::Error`].
pub struct Fault {
    inner: Box<dyn StdError + Send + Sync + 'static>,
}

impl Fault {
    /// Wrap an error value.
    pub fn new<E>(error: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self {
            inner: Box::new(error),
        }
    }

    /// A fault carrying only a message.
    pub fn msg(message: impl fmt::Display) -> Self {
        Self::new(MessageError(message.to_string()))
    }

    /// The fault's message, as echoed to clients by the default response.
    pub fn message(&self) -> String {
        self.inner.to_string()
    }

    /// True if the wrapped error is a `E`.
    pub fn is<E: StdError + 'static>(&self) -> bool {
        self.inner.is::<E>()
    }

    pub fn downcast_ref<E: StdError + 'static>(&self) -> Option<&E> {
        self.inner.downcast_ref::<E>()
    }

    /// True for [`InternalError`] faults, whose detail is not shown to clients.
    pub fn is_internal(&self) -> bool {
        self.is::<InternalError>()
    }

    /// Unwrap into the boxed error.
    pub fn into_inner(self) -> Box<dyn StdError + Send + Sync + 'static> {
        self.inner
    }
}

impl<E> From<E> for Fault
where
    E: StdError + Send + Sync + 'static,
{
    fn from(error: E) -> Self {
        Self::new(error)
    }
}

impl fmt::Debug for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.inner, f)
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.inner, f)
    }
}

#[derive(Debug, Error)]
#[error("{0}")]
struct MessageError(String);

/// An error whose detail must stay on the server.
///
/// The default response strategy answers these with a generic
/// `"internal error"` message.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct InternalError(String);

impl InternalError {
    pub fn new(detail: impl Into<String>) -> Self {
        Self(detail.into())
    }

    /// The hidden detail.
    pub fn detail(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_and_kind() {
        let fault = Fault::msg("user name is nil");
        assert_eq!(fault.message(), "user name is nil");
        assert!(!fault.is_internal());

        let fault: Fault = InternalError::new("db down").into();
        assert!(fault.is_internal());
        assert_eq!(fault.downcast_ref::<InternalError>().unwrap().detail(), "db down");
    }

    #[test]
    fn test_question_mark_conversion() {
        fn parse(raw: &str) -> Result<u32, Fault> {
            Ok(raw.parse::<u32>()?)
        }
        assert_eq!(parse("7").unwrap(), 7);
        assert!(parse("x").unwrap_err().is::<std::num::ParseIntError>());
    }
}
