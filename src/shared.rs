//! Small shared utilities used across the engine

pub use either::Either;

mod either;
