//! Attendance core: geofenced check-in, one active session per course,
//! deduplicated auto-close, roster corrections and attendance reports.

pub mod attendance_ledger;
pub mod attendance_report;
pub mod attendance_session;
pub mod course_registry;
pub mod error;
pub mod geofence;
pub mod notification;
pub mod principal;
pub mod scheduler;

#[cfg(test)]
mod test_support;

pub use error::AppError;
