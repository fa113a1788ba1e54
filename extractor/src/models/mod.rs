//! Data model

mod report;
mod target;

pub use report::*;
pub use target::*;
