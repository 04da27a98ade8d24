use std::io::{BufReader, BufWriter, Read, Write};
use std::time::Instant;

use anyhow::Context;
use gabac::symbol_file::{format_stats, read_symbol_file};
use log::info;

pub fn decode<R: Read, W: Write>(reader: R, writer: W) -> anyhow::Result<()> {
    let start_time = Instant::now();

    let (header, symbols) =
        read_symbol_file(BufReader::new(reader)).context("Could not decode the symbol file")?;

    let mut writer = BufWriter::new(writer);
    for symbol in &symbols {
        writeln!(writer, "{}", symbol)?;
    }
    writer.flush()?;

    info!(
        "Decoded {} symbols: {}",
        symbols.len(),
        format_stats(start_time, header.payload_len as usize)
    );

    Ok(())
}
