#![forbid(unsafe_code)]

mod session;

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use iio_demo::{DemoInitParam, Direction, DEMO_CHANNEL_ATTR, DEMO_GLOBAL_ATTR};
use tracing_subscriber::EnvFilter;

use crate::session::{SessionPlan, SessionReport};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum DirectionArg {
    Input,
    Output,
}

impl From<DirectionArg> for Direction {
    fn from(arg: DirectionArg) -> Self {
        match arg {
            DirectionArg::Input => Direction::Input,
            DirectionArg::Output => Direction::Output,
        }
    }
}

#[derive(Debug, Parser)]
#[command(about = "Create an emulated IIO demo device and stream one buffer through it")]
struct Args {
    /// JSON file with device parameters.
    ///
    /// Without it, parameters come from the `IIO_DEMO_*` environment variables. The flags below
    /// override either source.
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    name: Option<String>,

    /// Number of channels (1-32).
    #[arg(long)]
    channels: Option<u16>,

    /// Device memory size in bytes.
    #[arg(long)]
    ddr_size: Option<usize>,

    /// Bus address of device memory (decimal or `0x` hex).
    #[arg(long, value_parser = parse_u64)]
    ddr_base: Option<u64>,

    #[arg(long, value_enum)]
    direction: Option<DirectionArg>,

    /// Text to store into `demo_global_attr` before streaming.
    #[arg(long)]
    set_global: Option<String>,

    /// Text to store into `demo_channel_attr` before streaming.
    #[arg(long)]
    set_channel: Option<String>,

    /// Frames of ramp data to stream.
    #[arg(long, default_value_t = 8)]
    frames: usize,

    /// Channel mask for the read-back (`0x`/`0b` prefixes accepted). Defaults to every channel.
    #[arg(long, value_parser = parse_u32)]
    mask: Option<u32>,

    /// Print the session report as JSON.
    #[arg(long)]
    json: bool,
}

fn parse_u64(raw: &str) -> Result<u64, String> {
    let raw = raw.trim();
    let parsed = if let Some(hex) = raw.strip_prefix("0x") {
        u64::from_str_radix(hex, 16)
    } else if let Some(bin) = raw.strip_prefix("0b") {
        u64::from_str_radix(bin, 2)
    } else {
        raw.parse()
    };
    parsed.map_err(|err| format!("invalid number {raw:?}: {err}"))
}

fn parse_u32(raw: &str) -> Result<u32, String> {
    u32::try_from(parse_u64(raw)?).map_err(|_| format!("{raw:?} does not fit in 32 bits"))
}

fn load_param(args: &Args) -> Result<DemoInitParam> {
    let mut param = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("read {}", path.display()))?;
            DemoInitParam::from_json(&text).with_context(|| format!("parse {}", path.display()))?
        }
        None => DemoInitParam::from_env().context("load IIO_DEMO_* environment")?,
    };

    if let Some(name) = &args.name {
        param.name = name.clone();
    }
    if let Some(channels) = args.channels {
        param.num_channels = channels;
    }
    if let Some(size) = args.ddr_size {
        param.ddr_base_size = size;
    }
    if let Some(base) = args.ddr_base {
        param.ddr_base_addr = base;
    }
    if let Some(direction) = args.direction {
        param.direction = direction.into();
    }
    Ok(param)
}

fn print_report(out: &mut impl Write, report: &SessionReport) -> Result<()> {
    writeln!(out, "device {}", report.device)?;
    writeln!(
        out,
        "descriptor {}",
        serde_json::to_string(&report.descriptor)?
    )?;
    writeln!(out, "{DEMO_GLOBAL_ATTR} = {}", report.global_attr)?;
    writeln!(out, "{DEMO_CHANNEL_ATTR} = {}", report.channel_attr)?;
    writeln!(out, "read mask {:#b}", report.read_mask)?;
    for (frame, samples) in report.frames.iter().enumerate() {
        write!(out, "  frame {frame:>3}:")?;
        for sample in samples {
            write!(out, " {sample:#06x}")?;
        }
        writeln!(out)?;
    }
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let param = load_param(&args)?;
    let plan = SessionPlan {
        frames: args.frames,
        read_mask: args.mask,
        set_global: args.set_global.clone(),
        set_channel: args.set_channel.clone(),
    };

    let report = session::run(&param, &plan)?;

    let mut stdout = io::stdout().lock();
    if args.json {
        serde_json::to_writer_pretty(&mut stdout, &report)?;
        writeln!(stdout)?;
    } else {
        print_report(&mut stdout, &report)?;
    }
    Ok(())
}
