#![cfg_attr(not(test), no_std)]

pub mod config;
pub mod distance;
pub mod echo;
pub mod error;
pub mod report;
pub mod trigger;

pub use distance::{Distance, SharedDistance, Snapshot};
pub use echo::{EchoCapture, Edge, EdgeState};
pub use error::{CaptureError, CycleError, ReportError};
pub use report::{Reading, Reporter, SerialReporter};
pub use trigger::TriggerCycle;
