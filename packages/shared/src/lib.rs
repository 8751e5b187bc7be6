//! Utilities shared by the Hiroba relay server and its client.

pub mod logger;
pub mod time;
