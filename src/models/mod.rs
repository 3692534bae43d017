pub mod alert;
pub mod enums;
pub mod event;
pub mod result;

pub use alert::CriticalAlert;
pub use enums::{DecodeError, Interpretation, ResultCategory, ResultLifecycle};
pub use event::{EventEnvelope, ResultEvent};
pub use result::{ClinicalResult, ReferenceRange, ResultValue};
