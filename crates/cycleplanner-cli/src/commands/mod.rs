pub mod class;
pub mod config;
pub mod cycle;
pub mod holiday;
pub mod sync;
pub mod year;
