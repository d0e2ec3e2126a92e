//! API middleware. Only access logging for now.

pub mod audit;
