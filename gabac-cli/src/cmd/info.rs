use std::io::Read;

use anyhow::Context;
use gabac::symbol_file::{format_bytes, read_symbol_file_header};

pub fn info<R: Read>(reader: R) -> anyhow::Result<()> {
    let header = read_symbol_file_header(reader).context("Could not read the symbol file header")?;
    let id = header.binarization_id()?;
    let bin_params = header.bin_params();

    let params = &bin_params.slots()[..id.param_num()];
    println!("Version:         {}", header.version);
    println!("Binarization:    {} {:?}", id, params);
    println!("Context offset:  {}", bin_params.context_offset());
    println!("Contexts:        {}", header.num_contexts);
    println!("Bypass:          {}", header.bypass != 0);
    println!("Symbols:         {}", header.symbol_num);
    println!("Checksum:        {:08X}", header.symbol_checksum);
    println!("Payload:         {}", format_bytes(header.payload_len as usize));
    println!("Bits per symbol: {:.3}", header.bits_per_symbol());
    if header.symbol_num > 0 {
        // relative to storing every symbol as a raw 64-bit integer
        let rate = header.payload_len as f64 / (header.symbol_num as f64 * 8.0);
        println!("Compression:     {:.2}%", rate * 100.0);
    }

    Ok(())
}
