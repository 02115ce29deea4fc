//! Interval scheduling driven by an external tick.
//!
//! `calltimer` holds the scheduler itself, `task` the per-registration record,
//! `handles` the handle allocator and `unit` the delay units.
pub mod calltimer;
pub mod handles;
pub mod task;
pub mod unit;
