pub mod config;
pub mod error;
pub mod pipeline;
pub mod process;
pub mod schema;
pub mod sink;

pub use config::ConvertOptions;
pub use error::{ConvertError, SinkError};
pub use pipeline::{convert, ConversionReport};
