//! Handler calling conventions
//!
//! A [`Shape`] describes what a handler takes and returns. Supported conventions:
//!
//! | parameters                    | returns                              |
//! |-------------------------------|--------------------------------------|
//! | `input`                       | `output, error`                      |
//! | `context, input`              | `output, status, error`              |
//! | `input, headers`              | `output, status, headers, error`     |
//! | `context, input, headers`     |                                      |
//!
//! Any parameter row combines with any return row. Input and output must be concrete record
//! types; `()` and `serde_json::Value` carry no structure to decode into or validate, and are
//! rejected.

use crate::error::ShapeError;
use std::any::TypeId;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeInfo {
    name: &'static str,
    id: TypeId,
}

impl TypeInfo {
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self { name: std::any::type_name::<T>(), id: TypeId::of::<T>() }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Returns true for the untyped stand-ins `()` and `serde_json::Value`.
    pub fn is_placeholder(&self) -> bool {
        self.id == TypeId::of::<()>() || self.id == TypeId::of::<serde_json::Value>()
    }
}

impl Display for TypeInfo {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Param {
    /// The router context, cloned into every call.
    Context,
    Input(TypeInfo),
    /// The raw request headers.
    Headers,
}

impl Display for Param {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Param::Context => f.write_str("context"),
            Param::Input(_) => f.write_str("input"),
            Param::Headers => f.write_str("headers"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Return {
    Output(TypeInfo),
    Status,
    Headers,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shape {
    params: Vec<Param>,
    returns: Vec<Return>,
}

impl Shape {
    pub fn new(params: Vec<Param>, returns: Vec<Return>) -> Self {
        Self { params, returns }
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    pub fn returns(&self) -> &[Return] {
        &self.returns
    }

    pub fn input(&self) -> Option<TypeInfo> {
        self.params.iter().find_map(|param| match param {
            Param::Input(info) => Some(*info),
            _ => None,
        })
    }

    pub fn output(&self) -> Option<TypeInfo> {
        self.returns.iter().find_map(|ret| match ret {
            Return::Output(info) => Some(*info),
            _ => None,
        })
    }

    pub fn validate(&self) -> Result<(), ShapeError> {
        self.validate_params()?;
        self.validate_returns()
    }

    fn validate_params(&self) -> Result<(), ShapeError> {
        if !(1..=3).contains(&self.params.len()) {
            return Err(ShapeError::ParamCount(self.params.len()));
        }

        let input = match self.params.as_slice() {
            [Param::Input(input)]
            | [Param::Context, Param::Input(input)]
            | [Param::Input(input), Param::Headers]
            | [Param::Context, Param::Input(input), Param::Headers] => input,
            params => {
                let layout = params.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ");
                return Err(ShapeError::ParamLayout(layout));
            }
        };

        if input.is_placeholder() {
            return Err(ShapeError::UntypedInput(input.name()));
        }
        Ok(())
    }

    fn validate_returns(&self) -> Result<(), ShapeError> {
        let count = self.returns.len();
        if !(2..=4).contains(&count) {
            return Err(ShapeError::ReturnCount(count));
        }

        if self.returns[count - 1] != Return::Error {
            return Err(ShapeError::ErrorNotLast);
        }

        let Return::Output(output) = self.returns[0] else {
            return Err(ShapeError::OutputNotFirst);
        };

        if count >= 3 && self.returns[1] != Return::Status {
            return Err(ShapeError::StatusExpected);
        }

        if count == 4 && self.returns[2] != Return::Headers {
            return Err(ShapeError::HeadersExpected);
        }

        if output.is_placeholder() {
            return Err(ShapeError::UntypedOutput(output.name()));
        }
        Ok(())
    }
}
