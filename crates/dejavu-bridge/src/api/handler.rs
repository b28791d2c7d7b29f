//! Operational handlers: typed functions that rewrite the line sent to the engine.
//!
//! Any closure taking `&mut Verifier` followed by up to eight parameters implementing [Param] can be registered as a handler.
//! The parameter types determine how the untyped event arguments are coerced before the call
//! and the return type is turned into an [Outcome] through [IntoOutcome].
//!
//! ```
//! use dejavu_bridge::{emit, Handler, Verifier};
//!
//! let handler = Handler::new(|v: &mut Verifier, amount: i64| {
//!     let total = v.shared().get_as::<i64>("total").unwrap_or(0) + amount;
//!     v.shared_mut().set("total", total);
//!     emit!["deposit", total]
//! })
//! .with_names(["amount"]);
//! assert_eq!(handler.info().required(), 1);
//! ```

use std::error::Error;
use std::fmt::{Debug, Display, Formatter};

use crate::api::verify::{VerifyError, Verifier};
use crate::storage::{Value, ValueConvertError, ValueType};

/// Builds the result of a handler, a list of values whose first element is the tag of the emitted event.
#[macro_export]
macro_rules! emit {
    ($($value:expr),* $(,)?) => {
        vec![$($crate::Value::from($value)),*]
    };
}

/// A type that event arguments and shared variables can be converted into.
pub trait FromValue: Sized {
    /// The type the raw argument is coerced into before the conversion.
    const TYPE: ValueType;

    /// Converts the value, coercing it into [Self::TYPE] first.
    fn from_value(value: Value) -> Result<Self, ValueConvertError>;
}

macro_rules! from_coerced {
    ($ty:ty, $target:ident, $variant:ident, |$v:ident| $convert:expr) => {
        impl FromValue for $ty {
            const TYPE: ValueType = ValueType::$target;

            fn from_value(value: Value) -> Result<Self, ValueConvertError> {
                match value.coerce(ValueType::$target)? {
                    Value::$variant($v) => $convert,
                    other => Err(ValueConvertError::Incompatible(other.kind())),
                }
            }
        }
    };
}

from_coerced!(bool, Bool, Bool, |b| Ok(b));
from_coerced!(i64, Signed, Signed, |i| Ok(i));
from_coerced!(i32, Signed, Signed, |i| {
    i32::try_from(i).map_err(|_| ValueConvertError::OutOfRange(i.to_string()))
});
from_coerced!(u64, Unsigned, Unsigned, |u| Ok(u));
from_coerced!(u32, Unsigned, Unsigned, |u| {
    u32::try_from(u).map_err(|_| ValueConvertError::OutOfRange(u.to_string()))
});
from_coerced!(usize, Unsigned, Unsigned, |u| {
    usize::try_from(u).map_err(|_| ValueConvertError::OutOfRange(u.to_string()))
});
from_coerced!(f64, Float, Float, |f| Ok(f.into_inner()));
from_coerced!(String, Str, Str, |s| Ok(s.into_string()));

impl FromValue for Value {
    const TYPE: ValueType = ValueType::Any;

    fn from_value(value: Value) -> Result<Self, ValueConvertError> {
        Ok(value)
    }
}

/// A handler parameter: either a [FromValue] type or an `Option` of one.
///
/// Optional parameters do not count towards the number of required arguments and receive `None` when no argument is left for them.
/// They should therefore be the trailing parameters of a handler.
pub trait Param: Sized {
    /// The coercion target of the parameter.
    const TYPE: ValueType;
    /// Whether an argument must be supplied for this parameter.
    const REQUIRED: bool;

    /// Converts an already coerced argument.
    fn from_arg(arg: Value) -> Result<Self, ValueConvertError>;
}

macro_rules! param_for {
    ($($ty:ty),*) => {
        $(
            impl Param for $ty {
                const TYPE: ValueType = <$ty as FromValue>::TYPE;
                const REQUIRED: bool = true;

                fn from_arg(arg: Value) -> Result<Self, ValueConvertError> {
                    <$ty as FromValue>::from_value(arg)
                }
            }

            impl Param for Option<$ty> {
                const TYPE: ValueType = <$ty as FromValue>::TYPE;
                const REQUIRED: bool = false;

                fn from_arg(arg: Value) -> Result<Self, ValueConvertError> {
                    match arg {
                        Value::None => Ok(None),
                        arg => <$ty as FromValue>::from_value(arg).map(Some),
                    }
                }
            }
        )*
    };
}

param_for!(bool, i64, i32, u64, u32, usize, f64, String, Value);

/// Describes the parameters of a handler. Built once when the handler is created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerInfo {
    names: Vec<String>,
    types: Vec<ValueType>,
    required: Vec<bool>,
}

impl HandlerInfo {
    fn push<P: Param>(&mut self) {
        self.names.push(format!("arg{}", self.names.len()));
        self.types.push(P::TYPE);
        self.required.push(P::REQUIRED);
    }

    /// The number of arguments an event must carry.
    pub fn required(&self) -> usize {
        self.required.iter().filter(|r| **r).count()
    }

    /// The total number of parameters, including optional ones.
    pub fn arity(&self) -> usize {
        self.types.len()
    }

    /// The parameter names used to match named arguments. Defaults to `arg0`, `arg1`, ...
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// The coercion target of every parameter.
    pub fn types(&self) -> &[ValueType] {
        &self.types
    }

    /// Whether the parameter at `index` may be left out.
    pub fn is_optional(&self, index: usize) -> bool {
        !self.required.get(index).copied().unwrap_or(true)
    }

    /// Returns the position of the parameter called `name`.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }
}

/**
The return value of a handler, as seen by the [Verifier].
*/
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The event is not sent to the engine.
    Skip,
    /// The canonical line of the event is sent to the engine unchanged.
    Forward,
    /// The values are formatted into the line sent to the engine. The first value is the event tag and has to be a string.
    Emit(Vec<Value>),
}

/// Types that handlers may return.
pub trait IntoOutcome {
    /// Converts the return value. An `Err` is a runtime failure of the handler.
    fn into_outcome(self) -> Result<Outcome, HandlerError>;
}

impl IntoOutcome for Outcome {
    fn into_outcome(self) -> Result<Outcome, HandlerError> {
        Ok(self)
    }
}

/// An empty list skips the event.
impl IntoOutcome for Vec<Value> {
    fn into_outcome(self) -> Result<Outcome, HandlerError> {
        if self.is_empty() {
            Ok(Outcome::Skip)
        } else {
            Ok(Outcome::Emit(self))
        }
    }
}

/// `None` skips the event.
impl<T: IntoOutcome> IntoOutcome for Option<T> {
    fn into_outcome(self) -> Result<Outcome, HandlerError> {
        match self {
            Some(t) => t.into_outcome(),
            None => Ok(Outcome::Skip),
        }
    }
}

/// Handlers without a result skip the event.
impl IntoOutcome for () {
    fn into_outcome(self) -> Result<Outcome, HandlerError> {
        Ok(Outcome::Skip)
    }
}

impl<T: IntoOutcome, E: Into<HandlerError>> IntoOutcome for Result<T, E> {
    fn into_outcome(self) -> Result<Outcome, HandlerError> {
        self.map_err(Into::<HandlerError>::into)?.into_outcome()
    }
}

/**
A runtime failure inside a handler.

Any error type converts into a `HandlerError`, so handlers can use `?` freely.
When the failure stems from processing a nested event, the [Verifier] recovers the original [VerifyError] and propagates it.
*/
pub struct HandlerError(Box<dyn Error>);

impl HandlerError {
    /// Creates an error from a message.
    pub fn msg(message: impl Display) -> Self {
        HandlerError(message.to_string().into())
    }

    /// Returns the underlying error.
    pub fn into_inner(self) -> Box<dyn Error> {
        self.0
    }

    pub(crate) fn into_verify_error(self) -> Result<VerifyError, HandlerError> {
        self.0.downcast::<VerifyError>().map(|e| *e).map_err(HandlerError)
    }
}

impl<E: Error + 'static> From<E> for HandlerError {
    fn from(e: E) -> Self {
        HandlerError(Box::new(e))
    }
}

impl Debug for HandlerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "HandlerError({:?})", self.0)
    }
}

impl Display for HandlerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

type HandlerFn = Box<dyn Fn(&mut Verifier, Vec<Value>) -> Result<Outcome, HandlerError>>;

/// Checks that a coerced argument converts into the parameter type, e.g. that it fits into an `i32`.
type ArgCheck = fn(&Value) -> Result<(), ValueConvertError>;

fn check_arg<P: Param>(arg: &Value) -> Result<(), ValueConvertError> {
    P::from_arg(arg.clone()).map(drop)
}

/// A type-erased handler together with its [HandlerInfo].
pub struct Handler {
    info: HandlerInfo,
    checks: Vec<ArgCheck>,
    func: HandlerFn,
}

impl Handler {
    /// Creates a handler from a closure or function.
    pub fn new<Args>(handler: impl IntoHandler<Args>) -> Self {
        handler.into_handler()
    }

    /// Names the parameters in order, overriding the default names `arg0`, `arg1`, ...
    /// Surplus names are ignored.
    pub fn with_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.info
            .names
            .iter_mut()
            .zip(names)
            .for_each(|(slot, name)| *slot = name.into());
        self
    }

    #[allow(missing_docs)]
    pub fn info(&self) -> &HandlerInfo {
        &self.info
    }

    /// Runs the final conversion of parameter `index` without calling the handler.
    pub(crate) fn check(&self, index: usize, arg: &Value) -> Result<(), ValueConvertError> {
        self.checks.get(index).map_or(Ok(()), |check| check(arg))
    }

    /// Calls the handler with arguments already coerced and checked according to its [HandlerInfo].
    pub(crate) fn call(&self, verifier: &mut Verifier, args: Vec<Value>) -> Result<Outcome, HandlerError> {
        (self.func)(verifier, args)
    }
}

impl Debug for Handler {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Handler").field("info", &self.info).finish_non_exhaustive()
    }
}

/// Converts closures and functions into a [Handler]. `Args` lists the parameter types after the `&mut Verifier`.
pub trait IntoHandler<Args> {
    /// Performs the conversion.
    fn into_handler(self) -> Handler;
}

impl IntoHandler<Handler> for Handler {
    fn into_handler(self) -> Handler {
        self
    }
}

macro_rules! impl_into_handler {
    ($($param:ident),*) => {
        impl<Func, Res, $($param,)*> IntoHandler<($($param,)*)> for Func
        where
            Func: Fn(&mut Verifier, $($param),*) -> Res + 'static,
            Res: IntoOutcome,
            $($param: Param + 'static,)*
        {
            #[allow(non_snake_case, unused_mut, unused_variables)]
            fn into_handler(self) -> Handler {
                let handler = self;
                let mut info = HandlerInfo {
                    names: Vec::new(),
                    types: Vec::new(),
                    required: Vec::new(),
                };
                $(info.push::<$param>();)*
                let checks: Vec<ArgCheck> = vec![$(check_arg::<$param> as ArgCheck),*];
                let func = move |verifier: &mut Verifier, args: Vec<Value>| -> Result<Outcome, HandlerError> {
                    let mut args = args.into_iter();
                    $(let $param = <$param as Param>::from_arg(args.next().unwrap_or(Value::None))?;)*
                    handler(verifier, $($param),*).into_outcome()
                };
                Handler {
                    info,
                    checks,
                    func: Box::new(func),
                }
            }
        }
    };
}

impl_into_handler!();
impl_into_handler!(A1);
impl_into_handler!(A1, A2);
impl_into_handler!(A1, A2, A3);
impl_into_handler!(A1, A2, A3, A4);
impl_into_handler!(A1, A2, A3, A4, A5);
impl_into_handler!(A1, A2, A3, A4, A5, A6);
impl_into_handler!(A1, A2, A3, A4, A5, A6, A7);
impl_into_handler!(A1, A2, A3, A4, A5, A6, A7, A8);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn info_counts_required_parameters() {
        let handler = Handler::new(|_: &mut Verifier, _a: i64, _b: bool, _c: Option<String>| ());
        let info = handler.info();
        assert_eq!(info.required(), 2);
        assert_eq!(info.arity(), 3);
        assert_eq!(info.types(), &[ValueType::Signed, ValueType::Bool, ValueType::Str]);
        assert_eq!(info.names(), &["arg0", "arg1", "arg2"]);
        assert!(info.is_optional(2));
        assert!(!info.is_optional(0));
    }

    #[test]
    fn names_can_be_overridden() {
        let handler = Handler::new(|_: &mut Verifier, _x: Value, _y: Value| ()).with_names(["x", "y", "z"]);
        assert_eq!(handler.info().names(), &["x", "y"]);
        assert_eq!(handler.info().position("y"), Some(1));
        assert_eq!(handler.info().position("z"), None);
        assert_eq!(handler.info().types(), &[ValueType::Any, ValueType::Any]);
    }

    #[test]
    fn nullary_handlers() {
        let handler = Handler::new(|_: &mut Verifier| emit!["tick"]);
        assert_eq!(handler.info().required(), 0);
    }

    #[test]
    fn outcomes() {
        assert_eq!(Vec::<Value>::new().into_outcome().unwrap(), Outcome::Skip);
        assert_eq!(().into_outcome().unwrap(), Outcome::Skip);
        assert_eq!(None::<Vec<Value>>.into_outcome().unwrap(), Outcome::Skip);
        assert_eq!(
            Some(emit!["a", 1i64]).into_outcome().unwrap(),
            Outcome::Emit(vec![Value::from("a"), Value::Signed(1)])
        );
        let failed: Result<Vec<Value>, HandlerError> = Err(HandlerError::msg("division by zero"));
        assert_eq!(failed.into_outcome().unwrap_err().to_string(), "division by zero");
    }

    #[test]
    fn optional_parameters_accept_none() {
        assert_eq!(<Option<i64> as Param>::from_arg(Value::None), Ok(None));
        assert_eq!(<Option<i64> as Param>::from_arg(Value::from("4")), Ok(Some(4)));
        assert!(<i32 as Param>::from_arg(Value::Signed(i64::MAX)).is_err());
    }

    #[test]
    fn checks_apply_the_final_conversion() {
        let handler = Handler::new(|_: &mut Verifier, _small: i32, _count: Option<u32>| ());
        assert_eq!(handler.check(0, &Value::Signed(7)), Ok(()));
        assert_eq!(
            handler.check(0, &Value::Signed(3_000_000_000)),
            Err(ValueConvertError::OutOfRange("3000000000".into()))
        );
        assert_eq!(handler.check(1, &Value::None), Ok(()));
        assert!(handler.check(1, &Value::Unsigned(u64::MAX)).is_err());
    }

    #[test]
    fn verify_errors_survive_the_round_trip() {
        let err = HandlerError::from(VerifyError::UndefinedProperty("p".into()));
        assert!(matches!(err.into_verify_error(), Ok(VerifyError::UndefinedProperty(p)) if p == "p"));
        assert!(HandlerError::msg("other").into_verify_error().is_err());
    }
}
