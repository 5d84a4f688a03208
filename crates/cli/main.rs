use std::num::NonZeroUsize;

use anyhow::{Context, Result};
use clap::{Args as CommandArgs, Parser, Subcommand};
use loggen_core::{
    access::{self, AccessGenerator, AccessProfile},
    format, rng, synth, syslog,
    window::{self, TimeWindow},
    CorrelatedConfig, Datacenter, Target,
};
use time::Date;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about, args_conflicts_with_subcommands = true)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    correlated: CorrelatedArgs,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Address table plus a web log whose /api/foo latency depends on the
    /// client's datacenter (the default)
    Correlated(CorrelatedArgs),
    /// Common log format lines with a trailing latency
    Clf(AccessArgs),
    /// Combined log format lines with a trailing latency
    Combined(AccessArgs),
    /// Syslog-style lines from a handful of system daemons
    Syslog(SyslogArgs),
}

#[derive(CommandArgs, Debug)]
struct CorrelatedArgs {
    /// Number of unique IP addresses to generate
    #[arg(long, default_value = "1000")]
    ips: NonZeroUsize,

    /// Number of log lines to generate
    #[arg(long, default_value = "10000")]
    lines: NonZeroUsize,

    /// Random seed; the same seed and flags reproduce the same files
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Output CSV mapping each IP to its datacenter
    #[arg(long, default_value = "ipaddresses.csv")]
    ip_file: Target,

    /// Output combined-format log with a trailing latency field
    #[arg(long, default_value = "weblogs.log")]
    log_file: Target,

    /// Share of lines that request /api/foo
    #[arg(long, default_value_t = synth::DEFAULT_FRACTION)]
    fraction: f64,

    /// First day of the timestamp window (YYYY-MM-DD)
    #[arg(long, default_value = "2025-09-01", value_parser = window::parse_date)]
    start: Date,

    /// Length of the timestamp window in days
    #[arg(long, default_value_t = 7)]
    span_days: u32,
}

#[derive(CommandArgs, Debug)]
struct AccessArgs {
    /// Number of log lines to generate
    #[arg(long, default_value = "1000")]
    count: NonZeroUsize,

    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// First day of the timestamp window (YYYY-MM-DD)
    #[arg(long, default_value = "2025-09-01", value_parser = window::parse_date)]
    start: Date,

    #[arg(long, default_value_t = access::DEFAULT_DAYS)]
    span_days: u32,

    /// Output file, or - for stdout
    #[arg(long, default_value = "-")]
    output: Target,
}

#[derive(CommandArgs, Debug)]
struct SyslogArgs {
    /// Number of log lines to generate
    #[arg(long, default_value = "10000")]
    count: NonZeroUsize,

    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// First day of the timestamp window (YYYY-MM-DD)
    #[arg(long, default_value = "2025-09-01", value_parser = window::parse_date)]
    start: Date,

    #[arg(long, default_value_t = syslog::DEFAULT_DAYS)]
    span_days: u32,

    /// Output file, or - for stdout
    #[arg(long, default_value = "syslog_sample.log")]
    output: Target,
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match args.command.unwrap_or(Command::Correlated(args.correlated)) {
        Command::Correlated(args) => correlated(args),
        Command::Clf(args) => access_log(AccessProfile::Common, args),
        Command::Combined(args) => access_log(AccessProfile::Combined, args),
        Command::Syslog(args) => syslog_log(args),
    }
}

fn correlated(args: CorrelatedArgs) -> Result<()> {
    let config = CorrelatedConfig {
        unique: args.ips.get(),
        total: args.lines.get(),
        fraction: args.fraction,
        seed: args.seed,
        window: TimeWindow::days_from(args.start, args.span_days, window::CORRELATED_OFFSETS),
    };
    let dataset = loggen_core::generate(&config).context("failed to generate dataset")?;

    args.ip_file
        .write_with(|w| dataset.write_table(w))
        .with_context(|| format!("failed to write {}", args.ip_file))?;
    args.log_file
        .write_with(|w| dataset.write_log(w))
        .with_context(|| format!("failed to write {}", args.log_file))?;

    let summary = dataset.summary();
    info!(file = %args.ip_file, ips = summary.addresses, "wrote address table");
    for dc in Datacenter::ALL {
        info!(datacenter = %dc, ips = summary.per_datacenter[dc.index()]);
    }
    info!(
        file = %args.log_file,
        lines = summary.lines,
        distinguished = summary.distinguished,
        other = summary.lines - summary.distinguished,
        "wrote web log"
    );
    Ok(())
}

fn access_log(profile: AccessProfile, args: AccessArgs) -> Result<()> {
    let window = profile.window(args.start, args.span_days);
    let records = AccessGenerator::new(profile, window)?
        .generate(args.count.get(), &mut rng::seeded(args.seed));

    args.output
        .write_with(|w| format::write_lines(w, &records, profile.dialect()))
        .with_context(|| format!("failed to write {}", args.output))?;
    info!(file = %args.output, lines = records.len(), dialect = %profile.dialect(), "wrote access log");
    Ok(())
}

fn syslog_log(args: SyslogArgs) -> Result<()> {
    let window = syslog::window(args.start, args.span_days);
    let records = syslog::SyslogGenerator::new(window)?
        .generate(args.count.get(), &mut rng::seeded(args.seed));

    args.output
        .write_with(|w| syslog::write_records(w, &records))
        .with_context(|| format!("failed to write {}", args.output))?;
    info!(file = %args.output, lines = records.len(), "wrote syslog");
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn bare_invocation_runs_correlated_defaults() {
        let args = Args::try_parse_from(["loggen"]).unwrap();
        assert!(args.command.is_none());
        let c = args.correlated;
        assert_eq!(c.ips.get(), 1000);
        assert_eq!(c.lines.get(), 10_000);
        assert_eq!(c.seed, 42);
        assert_eq!(c.ip_file, Target::File("ipaddresses.csv".into()));
        assert_eq!(c.log_file, Target::File("weblogs.log".into()));
        assert_eq!(c.fraction, 0.30);
        assert_eq!(c.start, time::macros::date!(2025-09-01));
    }

    #[test]
    fn top_level_flags_and_subcommand_agree() {
        let flat = Args::try_parse_from(["loggen", "--ips", "100", "--lines", "1000"]).unwrap();
        assert_eq!(flat.correlated.ips.get(), 100);

        let sub = Args::try_parse_from(["loggen", "correlated", "--ips", "100"]).unwrap();
        match sub.command {
            Some(Command::Correlated(c)) => assert_eq!(c.ips.get(), 100),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn rejects_non_positive_counts() {
        assert!(Args::try_parse_from(["loggen", "--ips", "0"]).is_err());
        assert!(Args::try_parse_from(["loggen", "--lines", "-5"]).is_err());
        assert!(Args::try_parse_from(["loggen", "clf", "--count", "0"]).is_err());
        assert!(Args::try_parse_from(["loggen", "--start", "2025-02-30"]).is_err());
    }

    #[test]
    fn variant_defaults() {
        let args = Args::try_parse_from(["loggen", "syslog"]).unwrap();
        match args.command {
            Some(Command::Syslog(s)) => {
                assert_eq!(s.count.get(), 10_000);
                assert_eq!(s.output, Target::File("syslog_sample.log".into()));
            }
            other => panic!("unexpected {other:?}"),
        }

        let args = Args::try_parse_from(["loggen", "combined", "--output", "-"]).unwrap();
        match args.command {
            Some(Command::Combined(a)) => {
                assert_eq!(a.output, Target::Stdout);
                assert_eq!(a.span_days, 30);
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
