pub use self::shared_state::SharedState;
pub use self::value::{Value, ValueConvertError, ValueType, TRUE_TOKENS};

mod shared_state;
mod value;
