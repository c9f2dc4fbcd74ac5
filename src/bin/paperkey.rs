//! Thin CLI front end over the `paperkey` library: argument parsing, file
//! I/O, and exit-code mapping. All pipeline logic lives in the library; this
//! binary only wires stdio/file streams to it.

use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};

use paperkey::{extract, policy::DEFAULT_OUTPUT_WIDTH, restore, ByteStream, Framing, Policy};

#[derive(Parser, Debug)]
#[command(name = "paperkey", version, about = "Back up OpenPGP secret key material on paper")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract the secret portions of a transferable secret key into a paper-key artifact.
    Extract {
        /// Path to the OpenPGP secret key.
        #[arg(long)]
        secret_key: PathBuf,
        /// Where to write the paper-key artifact (stdout if omitted).
        #[arg(long)]
        output: Option<PathBuf>,
        /// Artifact framing to emit.
        #[arg(long, value_enum, default_value = "base16")]
        output_type: CliFraming,
        /// Column width for base-16 output lines.
        #[arg(long, default_value_t = DEFAULT_OUTPUT_WIDTH)]
        output_width: usize,
    },
    /// Reassemble a secret key from a public key and a paper-key artifact.
    Restore {
        /// Path to the matching OpenPGP public key.
        #[arg(long)]
        pubring: PathBuf,
        /// Path to the paper-key artifact.
        #[arg(long)]
        paperkey: PathBuf,
        /// Where to write the reassembled secret key (stdout if omitted).
        #[arg(long)]
        output: Option<PathBuf>,
        /// Artifact framing to expect.
        #[arg(long, value_enum, default_value = "auto")]
        input_type: CliInputFraming,
        /// Fail if the public key has a subkey with no matching paper-key record.
        #[arg(long)]
        strict: bool,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum CliFraming {
    Raw,
    Base16,
}

impl From<CliFraming> for Framing {
    fn from(value: CliFraming) -> Self {
        match value {
            CliFraming::Raw => Framing::Raw,
            CliFraming::Base16 => Framing::Base16,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum CliInputFraming {
    Raw,
    Base16,
    Auto,
}

impl From<CliInputFraming> for Framing {
    fn from(value: CliInputFraming) -> Self {
        match value {
            CliInputFraming::Raw => Framing::Raw,
            CliInputFraming::Base16 => Framing::Base16,
            CliInputFraming::Auto => Framing::Auto,
        }
    }
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    if let Err(err) = run(cli) {
        eprintln!("paperkey: {err}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Command::Extract {
            secret_key,
            output,
            output_type,
            output_width,
        } => {
            let mut input = ByteStream::from_vec(read_file(&secret_key)?);
            let mut out = ByteStream::new();
            extract(&mut input, &mut out, output_type.into(), output_width)?;
            write_output(output.as_deref(), out.as_slice())
        }
        Command::Restore {
            pubring,
            paperkey,
            output,
            input_type,
            strict,
        } => {
            let mut pub_stream = ByteStream::from_vec(read_file(&pubring)?);
            let mut paper_stream = ByteStream::from_vec(read_file(&paperkey)?);
            let mut out = ByteStream::new();
            let policy = if strict {
                Policy::strict()
            } else {
                Policy::permissive()
            };
            restore(
                &mut pub_stream,
                &mut paper_stream,
                &mut out,
                input_type.into(),
                policy,
            )?;
            write_output(output.as_deref(), out.as_slice())
        }
    }
}

fn read_file(path: &PathBuf) -> io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    fs::File::open(path)?.read_to_end(&mut buf)?;
    Ok(buf)
}

fn write_output(path: Option<&std::path::Path>, data: &[u8]) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(path) => {
            fs::File::create(path)?.write_all(data)?;
        }
        None => {
            io::stdout().write_all(data)?;
        }
    }
    Ok(())
}
