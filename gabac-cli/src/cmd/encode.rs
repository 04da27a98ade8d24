use std::io::{BufWriter, Read, Write};
use std::time::Instant;

use anyhow::{ensure, Context};
use gabac::symbol_file::{format_stats, write_symbol_file};
use gabac::{BinParams, BinarizationId, GabacParams};
use log::info;

pub fn encode<R: Read, W: Write>(
    mut reader: R,
    writer: W,
    id: BinarizationId,
    params: &[u32],
    context_offset: u32,
    bypass: bool,
    contexts: Option<u32>,
) -> anyhow::Result<()> {
    let start_time = Instant::now();

    ensure!(
        params.len() == id.param_num(),
        "{} binarization takes {} parameter(s), {} given",
        id,
        id.param_num(),
        params.len()
    );
    let mut slots = [0; 4];
    slots[..params.len()].copy_from_slice(params);
    let bin_params = BinParams::from(slots).with_context_offset(context_offset);
    ensure!(
        id.params_valid(&bin_params),
        "Invalid {} parameters: {:?}",
        id,
        params
    );

    let mut input = String::new();
    reader
        .read_to_string(&mut input)
        .context("Could not read the input symbols")?;
    let symbols = parse_symbols(&input, id.max_symbol(&bin_params))?;

    let num_contexts = match contexts {
        Some(contexts) => contexts as usize,
        None => id.context_count(&bin_params),
    };
    ensure!(
        bypass || num_contexts >= id.context_count(&bin_params),
        "{} with parameters {:?} needs at least {} contexts",
        id,
        params,
        id.context_count(&bin_params)
    );
    let gabac_params = GabacParams::builder()
        .num_contexts(num_contexts)
        .bypass(bypass)
        .build();

    let header = write_symbol_file(BufWriter::new(writer), id, &bin_params, gabac_params, &symbols)
        .context("Could not write the symbol file")?;

    info!(
        "Encoded {} symbols ({:.3} bits per symbol): {}",
        header.symbol_num,
        header.bits_per_symbol(),
        format_stats(start_time, header.payload_len as usize)
    );

    Ok(())
}

fn parse_symbols(input: &str, max_symbol: u64) -> anyhow::Result<Vec<u64>> {
    input
        .split_ascii_whitespace()
        .enumerate()
        .map(|(index, text)| {
            let symbol: u64 = text
                .parse()
                .with_context(|| format!("Invalid symbol #{}: {:?}", index, text))?;
            ensure!(
                symbol <= max_symbol,
                "Symbol #{} ({}) exceeds the binarization maximum {}",
                index,
                symbol,
                max_symbol
            );
            Ok(symbol)
        })
        .collect()
}
