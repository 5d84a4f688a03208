use anyhow::{Context, Result};
use loggen_core::{
    access::{self, AccessGenerator, AccessProfile},
    format, rng, syslog,
    window::DEFAULT_START,
    CorrelatedConfig, Target,
};
use std::{
    io::{stdout, Write},
    path::PathBuf,
};

const DIR: &str = "tests/fixtures";

fn main() -> Result<()> {
    std::fs::create_dir_all(DIR)?;
    generate_correlated("ipaddresses.csv", "weblogs.log", 1000, 10_000, 42)?;
    generate_correlated("ipaddresses_small.csv", "weblogs_small.log", 100, 1000, 42)?;
    generate_access("clf_1000.log", AccessProfile::Common, 1000, 1)?;
    generate_access("combined_1000.log", AccessProfile::Combined, 1000, 2)?;
    generate_syslog("syslog_10000.log", 10_000, 3)?;
    Ok(())
}

fn target(name: &str) -> Target {
    Target::File(PathBuf::from(DIR).join(name))
}

fn report(name: &str, lines: usize) -> Result<()> {
    let mut stdout = stdout().lock();
    writeln!(stdout, "{DIR}/{name}: Wrote {lines} lines")?;
    stdout.flush()?;
    Ok(())
}

fn generate_correlated(
    table: &str,
    log: &str,
    unique: usize,
    total: usize,
    seed: u64,
) -> Result<()> {
    let config = CorrelatedConfig {
        unique,
        total,
        seed,
        ..Default::default()
    };
    let dataset = loggen_core::generate(&config)?;
    dataset
        .write_to(&target(table), &target(log))
        .with_context(|| format!("{table} / {log}"))?;
    report(table, unique + 1)?;
    report(log, total)
}

fn generate_access(name: &str, profile: AccessProfile, lines: usize, seed: u64) -> Result<()> {
    let window = profile.window(DEFAULT_START.date(), access::DEFAULT_DAYS);
    let records = AccessGenerator::new(profile, window)?.generate(lines, &mut rng::seeded(seed));
    target(name)
        .write_with(|w| format::write_lines(w, &records, profile.dialect()))
        .with_context(|| name.to_string())?;
    report(name, lines)
}

fn generate_syslog(name: &str, lines: usize, seed: u64) -> Result<()> {
    let window = syslog::window(DEFAULT_START.date(), syslog::DEFAULT_DAYS);
    let records = syslog::SyslogGenerator::new(window)?.generate(lines, &mut rng::seeded(seed));
    target(name)
        .write_with(|w| syslog::write_records(w, &records))
        .with_context(|| name.to_string())?;
    report(name, lines)
}
