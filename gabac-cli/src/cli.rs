use std::path::PathBuf;

use clap::{Parser, PossibleValue, Subcommand, ValueEnum};
use clap_verbosity_flag::{InfoLevel, Verbosity};
use gabac::BinarizationId;
use lazy_static::lazy_static;

use crate::opts::{input_path, Input};

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
#[clap(propagate_version = true)]
pub struct Cli {
    #[clap(flatten)]
    pub verbose: Verbosity<InfoLevel>,

    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Copy, Clone, Debug)]
pub struct BinarizationIdCli {
    pub inner: BinarizationId,
}

impl BinarizationIdCli {
    #[must_use]
    pub fn new(inner: BinarizationId) -> Self {
        Self { inner }
    }

    #[must_use]
    pub fn variants() -> Vec<Self> {
        BinarizationId::VALUES
            .iter()
            .map(|&inner| BinarizationIdCli::new(inner))
            .collect()
    }
}

lazy_static! {
    static ref BINARIZATION_CLI_VARIANTS: Vec<BinarizationIdCli> = BinarizationIdCli::variants();
}

impl ValueEnum for BinarizationIdCli {
    fn value_variants<'a>() -> &'a [Self] {
        &BINARIZATION_CLI_VARIANTS
    }

    fn to_possible_value<'a>(&self) -> Option<PossibleValue<'a>> {
        let value = PossibleValue::new(self.inner.name());
        Some(value)
    }
}

impl From<&BinarizationIdCli> for BinarizationId {
    fn from(id: &BinarizationIdCli) -> Self {
        id.inner
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Encode a list of unsigned integers as a GABAC symbol file
    Encode {
        /// Input file with whitespace-separated symbols; `-` is the standard
        /// input
        #[clap(default_value_t, value_parser = input_path)]
        input: Input,

        /// Output file path; `-` is the standard output
        #[clap(short, long, value_parser)]
        output: Option<PathBuf>,

        /// Binarization to use
        #[clap(short, long, arg_enum, value_parser)]
        binarization: BinarizationIdCli,

        /// Binarization parameter (cMax, symbol size, unit size...); repeat
        /// for every parameter the binarization needs
        #[clap(short, long = "param", value_parser, value_name = "PARAM")]
        params: Vec<u32>,

        /// Index of the first context used by the binarization
        #[clap(default_value_t = 0, long, value_parser)]
        context_offset: u32,

        /// Code every bin as equiprobable, without any contexts
        #[clap(long, value_parser)]
        bypass: bool,

        /// Number of contexts to allocate; by default just enough for the
        /// binarization
        #[clap(long, value_parser)]
        contexts: Option<u32>,
    },

    /// Decode a GABAC symbol file to a list of integers, one per line
    Decode {
        /// Input symbol file to read; `-` is the standard input
        #[clap(default_value_t, value_parser = input_path)]
        input: Input,

        /// Output file path; `-` is the standard output
        #[clap(short, long, value_parser)]
        output: Option<PathBuf>,
    },

    /// Print the header and compression statistics of a GABAC symbol file
    Info {
        /// Input symbol file to read; `-` is the standard input
        #[clap(default_value_t, value_parser = input_path)]
        input: Input,
    },
}
