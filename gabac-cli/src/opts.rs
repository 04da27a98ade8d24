use std::fs::File;
use std::io;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use atty::Stream;
use log::info;

const STDIO_PATH: &str = "-";

/// Input given on the command line: a file path, or `-` for the standard
/// input.
#[derive(Debug, Clone, Default)]
pub enum Input {
    #[default]
    Stdin,
    File(PathBuf),
}

pub fn input_path(path: &str) -> Result<Input, String> {
    if path == STDIO_PATH {
        Ok(Input::Stdin)
    } else {
        Ok(Input::File(PathBuf::from(path)))
    }
}

impl std::fmt::Display for Input {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Input::Stdin => write!(f, "{}", STDIO_PATH),
            Input::File(path) => write!(f, "{}", path.display()),
        }
    }
}

impl Input {
    pub fn open(&self) -> anyhow::Result<Box<dyn Read>> {
        info!("Input file: {}", self);

        match self {
            Input::Stdin => Ok(Box::new(io::stdin())),
            Input::File(path) => {
                let file = File::open(path)
                    .with_context(|| format!("Could not open {}", path.display()))?;
                Ok(Box::new(file))
            }
        }
    }

    /// Path of the file `output` should go to when not given explicitly: the
    /// input with its extension replaced, or the standard output.
    pub fn output_path(&self, output: Option<&Path>, extension: &str) -> anyhow::Result<PathBuf> {
        if let Some(path) = output {
            return Ok(path.to_owned());
        }

        match self {
            Input::Stdin => Ok(PathBuf::from(STDIO_PATH)),
            Input::File(path) => {
                let output = path.with_extension(extension);
                if output == *path {
                    bail!(
                        "Input file {} already has the .{} extension; please use -o option",
                        path.display(),
                        extension
                    );
                }
                Ok(output)
            }
        }
    }
}

/// Opens `path` (`-` being the standard output) for writing. Binary data is
/// never written to a terminal.
pub fn open_output(path: &Path, binary: bool) -> anyhow::Result<Box<dyn Write>> {
    info!("Output file: {}", path.display());

    if path.as_os_str() != STDIO_PATH {
        let file =
            File::create(path).with_context(|| format!("Could not create {}", path.display()))?;
        return Ok(Box::new(file));
    }

    if binary && atty::is(Stream::Stdout) {
        bail!(
            "Refusing to write a GABAC symbol file to the terminal; \
             please use -o option or pipe the standard output"
        );
    }
    Ok(Box::new(io::stdout()))
}
