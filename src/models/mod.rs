pub mod enums;
pub mod lab;
pub mod report;
pub mod warning;

pub use enums::*;
pub use lab::*;
pub use report::*;
pub use warning::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Invalid value '{value}' for {field}")]
    InvalidEnum { field: String, value: String },
}
