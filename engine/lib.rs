mod engine;

pub use crate::engine::{Engine, Error};
