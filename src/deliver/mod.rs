mod core;


pub use self::core::{
    Deliver, DeliveryError, JsonLineSink, ResultKind, ResultMessage, RetryPolicy,
    deliver_with_retry,
};
