use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use pcon::{Count, Counter, Solid, Spectrum, ThresholdMethod, dump};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Count short canonical k-mers and convert counts.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,

    /// Raise log verbosity (-v info, -vv debug); RUST_LOG takes precedence
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Count k-mers of FASTA files
    Count(CountArgs),
    /// Convert a pcon count file
    Dump(DumpArgs),
}

#[derive(Args, Debug)]
struct CountArgs {
    /// K-mer length (odd, <= 31)
    #[arg(short = 'k', long = "kmer-size")]
    k: u8,

    /// Input FASTA paths
    #[arg(short, long = "inputs", required = true, num_args = 1..)]
    inputs: Vec<PathBuf>,

    /// Bits per counter (1..=32); counts saturate at 2^b - 1
    #[arg(short = 'b', long, default_value_t = 8)]
    bit_width: u8,

    /// Output pcon count file
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[command(flatten)]
    export: ExportArgs,
}

#[derive(Args, Debug)]
struct DumpArgs {
    /// Input pcon count file
    #[arg(short, long)]
    input: PathBuf,

    #[command(flatten)]
    export: ExportArgs,
}

#[derive(Args, Debug)]
struct ExportArgs {
    /// Minimal abundance for csv and solid outputs
    #[arg(short, long, default_value_t = 0)]
    abundance: Count,

    /// Write `sequence,count` csv
    #[arg(short, long)]
    csv: Option<PathBuf>,

    /// Write a binary solid map
    #[arg(short, long)]
    solid: Option<PathBuf>,

    /// Write solid k-mers as text, one per line
    #[arg(long)]
    solid_csv: Option<PathBuf>,

    /// Write the `count,frequency` spectrum
    #[arg(short = 'S', long)]
    spectrum: Option<PathBuf>,

    /// Pick the solid threshold from the spectrum instead of --abundance:
    /// first-minimum|rarefaction|percent-at-most|percent-at-least
    #[arg(long)]
    threshold: Option<ThresholdMethod>,

    /// Parameter of --threshold (limit or fraction)
    #[arg(long, default_value_t = 0.1)]
    threshold_param: f64,
}

impl ExportArgs {
    fn is_empty(&self) -> bool {
        self.csv.is_none()
            && self.solid.is_none()
            && self.solid_csv.is_none()
            && self.spectrum.is_none()
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn count(args: &CountArgs) -> Result<()> {
    let mut counter =
        Counter::new(args.k, args.bit_width).context("cannot allocate counter")?;
    for input in &args.inputs {
        counter
            .count_fasta(input)
            .with_context(|| format!("counting {}", input.display()))?;
    }
    if let Some(out) = &args.output {
        counter.save(out).with_context(|| writing(out))?;
    }
    export(&counter, &args.export)
}

fn dump_cmd(args: &DumpArgs) -> Result<()> {
    if args.export.is_empty() {
        bail!("dump needs at least one of --csv, --solid, --solid-csv or --spectrum");
    }
    let counter =
        Counter::load(&args.input).with_context(|| format!("reading {}", args.input.display()))?;
    export(&counter, &args.export)
}

fn solid_threshold(counter: &Counter, args: &ExportArgs) -> Count {
    let Some(method) = args.threshold else {
        return args.abundance;
    };
    match Spectrum::from_counter(counter).get_threshold(method, args.threshold_param) {
        Some(t) => {
            info!(?method, threshold = t, "threshold from spectrum");
            t
        }
        None => {
            warn!(?method, fallback = args.abundance, "no threshold found in spectrum");
            args.abundance
        }
    }
}

fn writing(p: &Path) -> String {
    format!("writing {}", p.display())
}

fn export(counter: &Counter, args: &ExportArgs) -> Result<()> {
    if let Some(p) = &args.csv {
        dump::dump_csv(counter, args.abundance, p).with_context(|| writing(p))?;
    }
    if let Some(p) = &args.spectrum {
        dump::dump_spectrum(counter, p).with_context(|| writing(p))?;
    }
    if args.solid.is_some() || args.solid_csv.is_some() {
        let threshold = solid_threshold(counter, args);
        if let Some(p) = &args.solid {
            Solid::from_counter(counter, threshold)?
                .save(p)
                .with_context(|| writing(p))?;
        }
        if let Some(p) = &args.solid_csv {
            dump::dump_solid(counter, threshold, p).with_context(|| writing(p))?;
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match &cli.cmd {
        Cmd::Count(args) => count(args),
        Cmd::Dump(args) => dump_cmd(args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dump_without_output_is_rejected() {
        let cli = Cli::try_parse_from(["pcon", "dump", "-i", "absent.pcon"]).unwrap();
        let Cmd::Dump(args) = &cli.cmd else {
            panic!("parsed {:?}", cli.cmd);
        };
        let err = dump_cmd(args).unwrap_err();
        assert!(err.to_string().contains("at least one"), "{err}");
    }
}
