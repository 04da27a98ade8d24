pub mod binarization;
pub mod bit_stream;
mod cabac_tables;
pub mod context_model;
pub mod decoder;
pub mod encoder;
pub mod params;
pub mod reader;
pub mod symbol_file;
pub mod writer;

#[doc(hidden)]
pub mod _internal_test_data;

pub use crate::binarization::{BinParams, BinarizationId};
pub use crate::decoder::{GabacDecodeError, GabacDecodeResult};
pub use crate::params::GabacParams;
pub use crate::reader::Reader;
pub use crate::writer::Writer;
