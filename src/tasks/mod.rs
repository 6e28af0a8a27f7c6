//! Background Tasks Module
//!
//! Optional housekeeping that runs beside the store.
//!
//! # Tasks
//! - Expiry sweep: removes expired records at a configured interval

mod sweeper;

pub use sweeper::spawn_sweep_task;
