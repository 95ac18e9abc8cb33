//! Background tasks running inside the server process.

pub mod calendar;

pub use calendar::{start_calendar_polling_task, CalendarPollerConfig};
