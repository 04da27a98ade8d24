//! Self-describing file holding a list of symbols coded as a single GABAC
//! unit.
//!
//! The header records everything the [`crate::Reader`] has to agree on with
//! the [`crate::Writer`] (binarization, its parameters, the number of contexts
//! and the bypass flag), so the file can be decoded without any side
//! information. A CRC-32 of the symbols guards against corrupted payloads.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io::{Cursor, ErrorKind, Read, Write};

use binrw::{BinRead, BinWrite};
use log::{debug, info};

pub use crate::symbol_file::common::{format_bytes, format_stats};
pub use crate::symbol_file::data::SymbolFileHeader;
use crate::binarization::{BinParams, BinarizationId, UnknownBinarizationId};
use crate::decoder::GabacDecodeError;
use crate::params::GabacParams;
use crate::reader::Reader;
use crate::symbol_file::no_seek::NoSeek;
use crate::writer::Writer;

mod common;
mod data;
mod no_seek;

pub const SYMBOL_FILE_VERSION: u8 = 1;

/// Upper bound of the number of bins a single payload byte can carry. A
/// context-coded bin in the most skewed state still costs more than 1/64 bit.
const MAX_BINS_PER_BYTE: u64 = 512;

/// Error occurring when writing or reading a symbol file.
#[derive(Debug)]
pub enum SymbolFileError {
    /// I/O error occurred when reading or writing the file.
    IoError(std::io::Error),
    /// Error occurred trying to serialize or deserialize the header.
    SerializeError(binrw::Error),
    /// The payload is not a valid GABAC stream.
    DecodeError(GabacDecodeError),
    InvalidVersion(u8),
    UnknownBinarization(UnknownBinarizationId),
    /// The binarization parameters cannot be used, or code no information.
    InvalidParams(BinarizationId, [u32; 4]),
    /// Context-coded session with fewer contexts than the binarization needs
    /// (needed, available).
    NotEnoughContexts(usize, usize),
    /// More symbols than the payload is able to hold.
    TooManySymbols(u64),
    /// Checksum of the decoded symbols does not match the header.
    ChecksumMismatch(u32, u32),
    /// The coded unit ends before the payload does.
    TrailingPayload(usize),
    PayloadTooLong(usize),
}

impl SymbolFileError {
    #[must_use]
    pub fn checksum_mismatch(actual: u32, expected: u32) -> Self {
        Self::ChecksumMismatch(actual, expected)
    }
}

impl From<std::io::Error> for SymbolFileError {
    fn from(e: std::io::Error) -> Self {
        Self::IoError(e)
    }
}

impl From<binrw::Error> for SymbolFileError {
    fn from(e: binrw::Error) -> Self {
        Self::SerializeError(e)
    }
}

impl From<GabacDecodeError> for SymbolFileError {
    fn from(e: GabacDecodeError) -> Self {
        Self::DecodeError(e)
    }
}

impl From<UnknownBinarizationId> for SymbolFileError {
    fn from(e: UnknownBinarizationId) -> Self {
        Self::UnknownBinarization(e)
    }
}

impl Display for SymbolFileError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SymbolFileError::IoError(e) => write!(f, "IO error: {}", e),
            SymbolFileError::SerializeError(e) => write!(f, "Serialize error: {}", e),
            SymbolFileError::DecodeError(e) => write!(f, "Decode error: {}", e),
            SymbolFileError::InvalidVersion(ver) => {
                write!(f, "Invalid symbol file version: {}", ver)
            }
            SymbolFileError::UnknownBinarization(e) => write!(f, "{}", e),
            SymbolFileError::InvalidParams(id, params) => {
                write!(f, "Invalid {} binarization parameters: {:?}", id, params)
            }
            SymbolFileError::NotEnoughContexts(needed, available) => write!(
                f,
                "Not enough contexts (needed: {}, available: {})",
                needed, available
            ),
            SymbolFileError::TooManySymbols(num) => {
                write!(f, "Symbol count {} too large for the payload", num)
            }
            SymbolFileError::ChecksumMismatch(actual, expected) => write!(
                f,
                "Invalid symbol checksum (actual: {:08X}, expected: {:08X})",
                actual, expected
            ),
            SymbolFileError::TrailingPayload(len) => {
                write!(f, "{} unexpected bytes after the coded unit", len)
            }
            SymbolFileError::PayloadTooLong(len) => {
                write!(f, "Payload too long to be stored: {} bytes", len)
            }
        }
    }
}

impl Error for SymbolFileError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            SymbolFileError::IoError(e) => Some(e),
            SymbolFileError::SerializeError(e) => Some(e),
            SymbolFileError::DecodeError(e) => Some(e),
            SymbolFileError::UnknownBinarization(e) => Some(e),
            _ => None,
        }
    }
}

/// The result of writing or reading a symbol file.
pub type SymbolFileResult<T> = Result<T, SymbolFileError>;

fn validate_params(
    id: BinarizationId,
    bin_params: &BinParams,
    params: GabacParams,
) -> SymbolFileResult<()> {
    if !id.params_valid(bin_params) || id.max_symbol(bin_params) == 0 {
        return Err(SymbolFileError::InvalidParams(id, bin_params.slots()));
    }

    let needed = id.context_count(bin_params);
    if !params.bypass() && params.num_contexts() < needed {
        return Err(SymbolFileError::NotEnoughContexts(
            needed,
            params.num_contexts(),
        ));
    }

    Ok(())
}

#[must_use]
pub fn symbol_checksum(symbols: &[u64]) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    for symbol in symbols {
        hasher.update(&symbol.to_be_bytes());
    }

    hasher.finalize()
}

/// Codes `symbols` with given binarization and writes them, together with the
/// header, to `writer`.
///
/// Returns the header that has been written.
///
/// # Panics
/// Panics if any of the symbols exceeds [`BinarizationId::max_symbol`].
pub fn write_symbol_file<W: Write>(
    mut writer: W,
    id: BinarizationId,
    bin_params: &BinParams,
    params: GabacParams,
    symbols: &[u64],
) -> SymbolFileResult<SymbolFileHeader> {
    validate_params(id, bin_params, params)?;

    let mut gabac_writer = Writer::new(params);
    for &symbol in symbols {
        gabac_writer.write_symbol(id, symbol, bin_params);
    }
    gabac_writer.close();
    let payload = gabac_writer.into_inner();

    let header = SymbolFileHeader {
        version: SYMBOL_FILE_VERSION,
        binarization: id.into(),
        bin_params: bin_params.slots(),
        bypass: params.bypass() as u8,
        num_contexts: params.num_contexts() as u32,
        symbol_num: symbols.len() as u64,
        symbol_checksum: symbol_checksum(symbols),
        payload_len: u32::try_from(payload.len())
            .map_err(|_| SymbolFileError::PayloadTooLong(payload.len()))?,
    };
    debug!("Writing symbol file header: {:?}", header);

    let mut header_data = Cursor::new(Vec::new());
    header.write_to(&mut header_data)?;
    writer.write_all(header_data.get_ref())?;
    writer.write_all(&payload)?;
    writer.flush()?;

    info!(
        "Encoded {} symbols as {} into {}",
        symbols.len(),
        id,
        format_bytes(payload.len())
    );

    Ok(header)
}

/// Reads and validates the header of a symbol file.
///
/// Besides the magic and version, checks that the binarization parameters
/// are usable with the contexts declared, and that the symbol count is not
/// larger than what the payload can encode.
pub fn read_symbol_file_header<R: Read>(reader: R) -> SymbolFileResult<SymbolFileHeader> {
    let header = SymbolFileHeader::read(&mut NoSeek::new(reader))?;
    debug!("Read symbol file header: {:?}", header);

    if header.version != SYMBOL_FILE_VERSION {
        return Err(SymbolFileError::InvalidVersion(header.version));
    }
    let id = header.binarization_id()?;
    validate_params(id, &header.bin_params(), header.gabac_params())?;

    if header.symbol_num > header.payload_len as u64 * MAX_BINS_PER_BYTE {
        return Err(SymbolFileError::TooManySymbols(header.symbol_num));
    }

    Ok(header)
}

/// Reads a whole symbol file, decoding the symbols and verifying their
/// checksum.
pub fn read_symbol_file<R: Read>(
    mut reader: R,
) -> SymbolFileResult<(SymbolFileHeader, Vec<u64>)> {
    let header = read_symbol_file_header(&mut reader)?;
    let id = header.binarization_id()?;
    let bin_params = header.bin_params();

    let mut payload = Vec::new();
    reader
        .by_ref()
        .take(header.payload_len as u64)
        .read_to_end(&mut payload)?;
    if payload.len() != header.payload_len as usize {
        return Err(SymbolFileError::IoError(std::io::Error::new(
            ErrorKind::UnexpectedEof,
            "Symbol file payload truncated",
        )));
    }

    let mut gabac_reader = Reader::new(&payload, header.gabac_params())?;
    let symbols = (0..header.symbol_num)
        .map(|_| gabac_reader.read_symbol(id, &bin_params))
        .collect::<Result<Vec<_>, _>>()?;
    let bytes_read = gabac_reader.close()?;
    if bytes_read != payload.len() {
        return Err(SymbolFileError::TrailingPayload(payload.len() - bytes_read));
    }

    let checksum = symbol_checksum(&symbols);
    if checksum != header.symbol_checksum {
        return Err(SymbolFileError::checksum_mismatch(
            checksum,
            header.symbol_checksum,
        ));
    }
    debug!("Decoded {} symbols, checksum {:08X}", symbols.len(), checksum);

    Ok((header, symbols))
}
