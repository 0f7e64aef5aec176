mod config;

pub use crate::config::{Config, Error};
