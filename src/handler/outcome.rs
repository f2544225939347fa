//! Handler return values and their normalisation.
//!
//! # Responsibilities
//! - Describe each supported return type as a list of output kinds
//! - Lower a returned value into [`RawOutputs`]
//! - Reduce raw outputs to one optional payload plus one optional fault
//!
//! # Supported return types
//! ```text
//! Result<(), E>          -> (error)
//! Option<E>              -> (error)
//! Result<R, E>           -> (R, error)
//! (R, Option<E>)         -> (R, error), payload and fault may both be set
//! ```
//!
//! # Design Decisions
//! - Normalisation only extracts; response strategies interpret faults
//! - A result that fails to serialise becomes an [`InternalError`] fault

use serde::Serialize;
use serde_json::Value;

use crate::handler::fault::{Fault, InternalError};
use crate::handler::shape::{Pointee, Shape, ValueKind};
use crate::handler::signature::OutputKind;

/// First output of a two-output handler, already serialised.
#[derive(Debug, Clone, PartialEq)]
pub enum RawPayload {
    /// A pointer that was not set, or no result because the handler failed.
    Absent,
    /// A set pointer and what it points at.
    Pointer(Pointee, Value),
    Aggregate(Value),
    Sequence(Value),
    /// A kind the validator never lets through.
    Other(Value),
}

/// What a handler returned, before normalisation.
#[derive(Debug)]
pub enum RawOutputs {
    /// Single fault slot.
    Single(Option<Fault>),
    /// Result slot plus fault slot.
    Pair(RawPayload, Option<Fault>),
}

/// Result types a handler may return.
pub trait Reply: Shape + Serialize + Send + 'static {
    /// Serialise into the first output slot.
    fn into_payload(self) -> Result<RawPayload, Fault>;
}

impl<T> Reply for T
where
    T: Shape + Serialize + Send + 'static,
{
    fn into_payload(self) -> Result<RawPayload, Fault> {
        let value = serde_json::to_value(&self).map_err(|e| {
            Fault::new(InternalError::new(format!("failed to encode handler result: {e}")))
        })?;
        Ok(match T::KIND {
            ValueKind::Pointer(_) if value.is_null() => RawPayload::Absent,
            ValueKind::Pointer(pointee) => RawPayload::Pointer(pointee, value),
            ValueKind::Aggregate => RawPayload::Aggregate(value),
            ValueKind::Sequence => RawPayload::Sequence(value),
            _ => RawPayload::Other(value),
        })
    }
}

/// Return types a handler may produce.
pub trait Outcome: Send + 'static {
    /// Output kinds, in order.
    fn outputs() -> Vec<OutputKind>;

    fn into_raw(self) -> RawOutputs;
}

impl<R, E> Outcome for Result<R, E>
where
    R: Reply,
    E: Into<Fault> + Send + 'static,
{
    fn outputs() -> Vec<OutputKind> {
        if R::KIND == ValueKind::Unit {
            vec![OutputKind::Error]
        } else {
            vec![OutputKind::Value(R::KIND), OutputKind::Error]
        }
    }

    fn into_raw(self) -> RawOutputs {
        if R::KIND == ValueKind::Unit {
            return RawOutputs::Single(self.err().map(Into::into));
        }
        match self {
            Ok(result) => match result.into_payload() {
                Ok(payload) => RawOutputs::Pair(payload, None),
                Err(fault) => RawOutputs::Pair(RawPayload::Absent, Some(fault)),
            },
            Err(e) => RawOutputs::Pair(RawPayload::Absent, Some(e.into())),
        }
    }
}

impl<E> Outcome for Option<E>
where
    E: Into<Fault> + Send + 'static,
{
    fn outputs() -> Vec<OutputKind> {
        vec![OutputKind::Error]
    }

    fn into_raw(self) -> RawOutputs {
        RawOutputs::Single(self.map(Into::into))
    }
}

impl<R, E> Outcome for (R, Option<E>)
where
    R: Reply,
    E: Into<Fault> + Send + 'static,
{
    fn outputs() -> Vec<OutputKind> {
        vec![OutputKind::Value(R::KIND), OutputKind::Error]
    }

    fn into_raw(self) -> RawOutputs {
        let (result, fault) = self;
        let fault = fault.map(Into::into);
        match result.into_payload() {
            Ok(payload) => RawOutputs::Pair(payload, fault),
            Err(encode) => RawOutputs::Pair(RawPayload::Absent, fault.or(Some(encode))),
        }
    }
}

/// A handler returning nothing. Rejected at registration.
impl Outcome for () {
    fn outputs() -> Vec<OutputKind> {
        Vec::new()
    }

    fn into_raw(self) -> RawOutputs {
        RawOutputs::Single(None)
    }
}

/// Reduce raw outputs to `(payload, fault)`.
pub fn normalize(raw: RawOutputs) -> (Option<Value>, Option<Fault>) {
    match raw {
        RawOutputs::Single(fault) => (None, fault),
        RawOutputs::Pair(first, fault) => {
            let payload = match first {
                RawPayload::Pointer(Pointee::Aggregate, value) => Some(value),
                RawPayload::Sequence(value) | RawPayload::Aggregate(value) => Some(value),
                RawPayload::Pointer(Pointee::Other, _) | RawPayload::Other(_) | RawPayload::Absent => None,
            };
            (payload, fault)
        }
    }
}
