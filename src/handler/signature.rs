//! Handler signature validation.
//!
//! # Responsibilities
//! - Describe a handler's inputs and outputs as captured at registration
//! - Accept or reject that description against the supported handler shapes
//! - Produce the validated [`HandlerDescriptor`] used at request time
//!
//! # Supported shapes
//! ```text
//! function:  (ctx)              -> error
//!            (ctx, Payload)     -> error
//!            (ctx[, Payload])   -> (Result, error)
//! method:    (self, ctx[, Payload]) -> same outputs as above
//!
//! Payload: struct value
//! Result:  struct | pointer to struct | sequence
//! ```
//!
//! # Design Decisions
//! - Pure function over a data description; no handler is ever called here
//! - Rules are checked in a fixed order and the first violation is reported
//! - Positions in errors are zero-based and count the receiver for methods

use thiserror::Error;

use crate::handler::shape::{Pointee, ValueKind};

/// One positional input of a handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    /// The object a method is called on.
    Receiver,
    /// The per-request [`RequestContext`](crate::handler::RequestContext).
    Context,
    /// A value argument.
    Value(ValueKind),
}

/// One positional output of a handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    /// The fault slot.
    Error,
    /// A value result.
    Value(ValueKind),
}

/// Raw handler shape as captured by the registration call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub inputs: Vec<InputKind>,
    pub outputs: Vec<OutputKind>,
}

impl Signature {
    pub fn new(inputs: Vec<InputKind>, outputs: Vec<OutputKind>) -> Self {
        Self { inputs, outputs }
    }
}

/// How a handler is being registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationKind {
    /// A standalone function.
    Function,
    /// A method whose first input is the receiver.
    Method,
}

impl RegistrationKind {
    fn receiver_slots(self) -> usize {
        match self {
            RegistrationKind::Function => 0,
            RegistrationKind::Method => 1,
        }
    }
}

impl std::fmt::Display for RegistrationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistrationKind::Function => f.write_str("function"),
            RegistrationKind::Method => f.write_str("method"),
        }
    }
}

/// Output half of a validated handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputShape {
    /// A single fault slot.
    ErrorOnly,
    /// A result followed by a fault slot.
    PayloadThenError(ValueKind),
}

/// A handler shape that passed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandlerDescriptor {
    /// Kind of the payload input, when the handler takes one.
    pub payload: Option<ValueKind>,
    pub output: OutputShape,
}

impl HandlerDescriptor {
    /// True if requests must be bound before invocation.
    pub fn has_payload(&self) -> bool {
        self.payload.is_some()
    }
}

/// Registration-time rejection of a handler shape.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShapeError {
    #[error("{kind} must take {expected} inputs, found {found}")]
    InputArity {
        kind: RegistrationKind,
        expected: &'static str,
        found: usize,
    },

    #[error("method input 0 must be the receiver")]
    MissingReceiver,

    #[error("input {position} must be the request context")]
    NotContext { position: usize },

    #[error("input {position} must be a struct, found {found}")]
    PayloadNotAggregate { position: usize, found: String },

    #[error("handler must return 1 or 2 values, found {found}")]
    OutputArity { found: usize },

    #[error("output {position} must be the error type")]
    NotError { position: usize },

    #[error("first return value must be a struct, a pointer to a struct or a sequence, found {found}")]
    InvalidResult { found: String },
}

/// Validate a captured signature against the supported handler shapes.
pub fn validate(
    signature: &Signature,
    kind: RegistrationKind,
) -> Result<HandlerDescriptor, ShapeError> {
    let payload = check_inputs(&signature.inputs, kind)?;
    let output = check_outputs(&signature.outputs)?;
    Ok(HandlerDescriptor { payload, output })
}

fn check_inputs(
    inputs: &[InputKind],
    kind: RegistrationKind,
) -> Result<Option<ValueKind>, ShapeError> {
    let skip = kind.receiver_slots();
    let (min, max, expected) = match kind {
        RegistrationKind::Function => (1, 2, "1 or 2"),
        RegistrationKind::Method => (2, 3, "2 or 3"),
    };
    if inputs.len() < min || inputs.len() > max {
        return Err(ShapeError::InputArity {
            kind,
            expected,
            found: inputs.len(),
        });
    }

    if kind == RegistrationKind::Method && inputs[0] != InputKind::Receiver {
        return Err(ShapeError::MissingReceiver);
    }

    if inputs[skip] != InputKind::Context {
        return Err(ShapeError::NotContext { position: skip });
    }

    match inputs.get(skip + 1) {
        None => Ok(None),
        Some(InputKind::Value(ValueKind::Aggregate)) => Ok(Some(ValueKind::Aggregate)),
        Some(other) => Err(ShapeError::PayloadNotAggregate {
            position: skip + 1,
            found: describe_input(other),
        }),
    }
}

fn check_outputs(outputs: &[OutputKind]) -> Result<OutputShape, ShapeError> {
    match outputs {
        [OutputKind::Error] => Ok(OutputShape::ErrorOnly),
        [_] => Err(ShapeError::NotError { position: 0 }),
        [first, second] => {
            let result = match first {
                OutputKind::Value(
                    kind @ (ValueKind::Aggregate
                    | ValueKind::Sequence
                    | ValueKind::Pointer(Pointee::Aggregate)),
                ) => *kind,
                OutputKind::Value(other) => {
                    return Err(ShapeError::InvalidResult {
                        found: other.to_string(),
                    })
                }
                OutputKind::Error => {
                    return Err(ShapeError::InvalidResult {
                        found: "error".to_string(),
                    })
                }
            };
            if *second != OutputKind::Error {
                return Err(ShapeError::NotError { position: 1 });
            }
            Ok(OutputShape::PayloadThenError(result))
        }
        _ => Err(ShapeError::OutputArity {
            found: outputs.len(),
        }),
    }
}

fn describe_input(input: &InputKind) -> String {
    match input {
        InputKind::Receiver => "receiver".to_string(),
        InputKind::Context => "request context".to_string(),
        InputKind::Value(kind) => kind.to_string(),
    }
}
