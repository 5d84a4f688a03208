//! One correlated run: the address table and the web log built from it.

use std::{fmt, io::Write};

use crate::{
    err::{Error, Result},
    format::{self, Dialect},
    output::Target,
    pool::{Datacenter, IdentifierPool},
    record::LogRecord,
    rng,
    synth::{self, Synthesizer, DISTINGUISHED_PATH},
    window::TimeWindow,
};

#[derive(Debug, Clone)]
pub struct CorrelatedConfig {
    /// Number of distinct client addresses.
    pub unique: usize,
    /// Number of log lines.
    pub total: usize,
    /// Share of lines that request the distinguished endpoint.
    pub fraction: f64,
    pub seed: u64,
    pub window: TimeWindow,
}

impl Default for CorrelatedConfig {
    fn default() -> Self {
        Self {
            unique: 1000,
            total: 10_000,
            fraction: synth::DEFAULT_FRACTION,
            seed: 42,
            window: TimeWindow::default(),
        }
    }
}

impl CorrelatedConfig {
    pub fn validate(&self) -> Result<()> {
        if self.unique == 0 {
            return Err(Error::InvalidArgument(
                "unique address count must be positive".to_string(),
            ));
        }
        if self.total == 0 {
            return Err(Error::InvalidArgument(
                "log line count must be positive".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.fraction) {
            return Err(Error::InvalidArgument(format!(
                "fraction must be within [0, 1], got {}",
                self.fraction
            )));
        }
        self.window.validate()
    }
}

/// Everything a correlated run produces, held in memory until written.
#[derive(Debug, Clone)]
pub struct CorrelatedDataset {
    pub pool: IdentifierPool,
    pub records: Vec<LogRecord>,
}

/// Validate `config` and run the whole pipeline on a single random source:
/// pool sampling, partitioning, both record streams and the final shuffle.
pub fn generate(config: &CorrelatedConfig) -> Result<CorrelatedDataset> {
    config.validate()?;
    let mut rng = rng::seeded(config.seed);

    let pool = IdentifierPool::build(config.unique, &mut rng)?;
    let records =
        Synthesizer::new(&pool, config.window)?.synthesize(config.total, config.fraction, &mut rng)?;

    Ok(CorrelatedDataset { pool, records })
}

impl CorrelatedDataset {
    pub fn write_table<W: Write + ?Sized>(&self, w: &mut W) -> Result<()> {
        format::write_table(w, &self.pool)
    }

    /// Combined log format, each line ending in the latency in milliseconds.
    pub fn write_log<W: Write + ?Sized>(&self, w: &mut W) -> Result<()> {
        format::write_lines(w, &self.records, Dialect::Combined)
    }

    /// Write the table, then the log. Each destination is either fully
    /// written or left as it was.
    pub fn write_to(&self, table: &Target, log: &Target) -> Result<()> {
        table.write_with(|w| self.write_table(w))?;
        log.write_with(|w| self.write_log(w))
    }

    pub fn summary(&self) -> Summary {
        Summary {
            addresses: self.pool.len(),
            per_datacenter: self.pool.counts(),
            lines: self.records.len(),
            distinguished: self
                .records
                .iter()
                .filter(|r| r.path == DISTINGUISHED_PATH)
                .count(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub addresses: usize,
    pub per_datacenter: [usize; 4],
    pub lines: usize,
    pub distinguished: usize,
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} addresses (", self.addresses)?;
        for (i, dc) in Datacenter::ALL.into_iter().enumerate() {
            if i != 0 {
                f.write_str(", ")?;
            }
            write!(f, "{dc}: {}", self.per_datacenter[dc.index()])?;
        }
        write!(
            f,
            "), {} lines, {} to {DISTINGUISHED_PATH}, {} other",
            self.lines,
            self.distinguished,
            self.lines - self.distinguished
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::window::CORRELATED_OFFSETS;
    use time::macros::date;

    #[test]
    fn rejects_bad_parameters() {
        let bad = [
            CorrelatedConfig {
                unique: 0,
                ..Default::default()
            },
            CorrelatedConfig {
                total: 0,
                ..Default::default()
            },
            CorrelatedConfig {
                fraction: 1.5,
                ..Default::default()
            },
            CorrelatedConfig {
                fraction: f64::NAN,
                ..Default::default()
            },
            CorrelatedConfig {
                window: TimeWindow::days_from(date!(9999-12-30), 7, CORRELATED_OFFSETS),
                ..Default::default()
            },
            CorrelatedConfig {
                window: TimeWindow::days_from(date!(2025-09-01), u32::MAX, CORRELATED_OFFSETS),
                ..Default::default()
            },
        ];
        for config in bad {
            assert!(matches!(generate(&config), Err(Error::InvalidArgument(_))));
        }
    }

    #[test]
    fn summary_reads_naturally() {
        let dataset = generate(&CorrelatedConfig {
            unique: 100,
            total: 1000,
            ..Default::default()
        })
        .unwrap();
        assert_eq!(
            dataset.summary().to_string(),
            "100 addresses (datacenter1: 25, datacenter2: 25, datacenter3: 25, datacenter4: 25), \
             1000 lines, 300 to /api/foo, 700 other"
        );
    }

    #[test]
    fn same_seed_same_bytes() {
        let config = CorrelatedConfig {
            unique: 50,
            total: 400,
            seed: 1234,
            ..Default::default()
        };
        let render = |dataset: &CorrelatedDataset| {
            let mut table = Vec::new();
            let mut log = Vec::new();
            dataset.write_table(&mut table).unwrap();
            dataset.write_log(&mut log).unwrap();
            (table, log)
        };
        assert_eq!(
            render(&generate(&config).unwrap()),
            render(&generate(&config).unwrap())
        );

        let other = CorrelatedConfig { seed: 1235, ..config };
        assert_ne!(
            render(&generate(&config).unwrap()).1,
            render(&generate(&other).unwrap()).1
        );
    }
}
