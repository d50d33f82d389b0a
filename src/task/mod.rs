//! Everything that talks to or about the external `task` binary.

pub mod report;
pub mod wrapper;

pub use report::{ReportError, ReportParser};
pub use wrapper::{TaskWrapper, WrapperError, WrapperEvent};
