//! Rendering [LogRecord]s into access-log lines, and parsing them back.

use std::{fmt, io::Write, net::Ipv4Addr};

use regex::Regex;
use time::{format_description::BorrowedFormatItem, macros::format_description, OffsetDateTime};

use crate::{
    err::{Error, Result},
    pool::IdentifierPool,
    record::{dash_none, LogRecord},
};

/// `10/Oct/2000:13:55:36 -0700`
pub const CLF_TIME: &[BorrowedFormatItem<'static>] = format_description!(
    "[day]/[month repr:short]/[year]:[hour]:[minute]:[second] [offset_hour sign:mandatory][offset_minute]"
);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// `%h %l %u %t "%r" %>s %b`
    Common,
    /// Common plus `"%{Referer}i" "%{User-agent}i"`.
    Combined,
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dialect::Common => f.write_str("common log format"),
            Dialect::Combined => f.write_str("combined log format"),
        }
    }
}

/// Render a record as a single line, without the trailing newline. A present
/// latency is appended as a bare integer after the dialect's last field.
pub fn render_line(record: &LogRecord, dialect: Dialect) -> Result<String> {
    let mut num = itoa::Buffer::new();
    let mut line = String::with_capacity(192);

    line.push_str(&record.address.to_string());
    line.push_str(" - ");
    line.push_str(record.user.as_deref().unwrap_or("-"));
    line.push_str(" [");
    line.push_str(&record.timestamp.format(CLF_TIME)?);
    line.push_str("] \"");
    line.push_str(record.method.as_str());
    line.push(' ');
    line.push_str(&record.path);
    line.push(' ');
    line.push_str(record.protocol.as_str());
    line.push_str("\" ");
    line.push_str(num.format(record.status));
    line.push(' ');
    if record.bytes == 0 {
        line.push('-');
    } else {
        line.push_str(num.format(record.bytes));
    }

    if dialect == Dialect::Combined {
        line.push_str(" \"");
        line.push_str(record.referrer.as_deref().unwrap_or("-"));
        line.push_str("\" \"");
        line.push_str(record.agent.as_deref().unwrap_or("-"));
        line.push('"');
    }

    if let Some(latency) = record.latency_ms {
        line.push(' ');
        line.push_str(num.format(latency));
    }
    Ok(line)
}

/// Write a record followed by `\n`.
pub fn write_line<W: Write + ?Sized>(w: &mut W, record: &LogRecord, dialect: Dialect) -> Result<()> {
    let line = render_line(record, dialect)?;
    w.write_all(line.as_bytes())?;
    w.write_all(b"\n")?;
    Ok(())
}

/// Write every record, one per line.
pub fn write_lines<W: Write + ?Sized>(w: &mut W, records: &[LogRecord], dialect: Dialect) -> Result<()> {
    for record in records {
        write_line(w, record, dialect)?;
    }
    Ok(())
}

/// Write the address table: an `ip,datacenter` header, then one row per
/// address in ascending address order.
pub fn write_table<W: Write + ?Sized>(w: &mut W, pool: &IdentifierPool) -> Result<()> {
    w.write_all(b"ip,datacenter\n")?;
    for (address, dc) in pool.rows() {
        writeln!(w, "{address},{dc}")?;
    }
    Ok(())
}

const COMMON_PATTERN: &str = r#"^(?P<addr>\S+) (?P<ident>\S+) (?P<user>\S+) \[(?P<ts>[^\]]+)\] "(?P<method>\S+) (?P<path>\S+) (?P<proto>\S+)" (?P<status>\d{3}) (?P<bytes>-|\d+)(?: (?P<latency>\d+))?$"#;

const COMBINED_PATTERN: &str = r#"^(?P<addr>\S+) (?P<ident>\S+) (?P<user>\S+) \[(?P<ts>[^\]]+)\] "(?P<method>\S+) (?P<path>\S+) (?P<proto>\S+)" (?P<status>\d{3}) (?P<bytes>-|\d+) "(?P<referrer>[^"]*)" "(?P<agent>[^"]*)"(?: (?P<latency>\d+))?$"#;

/// Parses lines of one dialect back into [LogRecord]s.
pub struct LineParser {
    dialect: Dialect,
    pattern: Regex,
}

impl LineParser {
    pub fn new(dialect: Dialect) -> Result<Self> {
        let pattern = match dialect {
            Dialect::Common => COMMON_PATTERN,
            Dialect::Combined => COMBINED_PATTERN,
        };
        Ok(Self {
            dialect,
            pattern: Regex::new(pattern)?,
        })
    }

    pub fn parse(&self, line: &str) -> Result<LogRecord> {
        let malformed = || Error::Malformed {
            dialect: self.dialect,
            line: line.to_string(),
        };
        let caps = self.pattern.captures(line).ok_or_else(malformed)?;
        let field = |name: &str| caps.name(name).map_or("", |m| m.as_str());

        if field("ident") != "-" {
            return Err(malformed());
        }

        Ok(LogRecord {
            address: field("addr")
                .parse::<Ipv4Addr>()
                .map_err(|_| malformed())?,
            user: dash_none(field("user")),
            timestamp: OffsetDateTime::parse(field("ts"), CLF_TIME)?,
            method: field("method").parse().map_err(|_| malformed())?,
            path: field("path").to_string(),
            protocol: field("proto").parse().map_err(|_| malformed())?,
            status: field("status").parse().map_err(|_| malformed())?,
            bytes: match field("bytes") {
                "-" => 0,
                n => n.parse().map_err(|_| malformed())?,
            },
            referrer: caps.name("referrer").and_then(|m| dash_none(m.as_str())),
            agent: caps.name("agent").and_then(|m| dash_none(m.as_str())),
            latency_ms: caps
                .name("latency")
                .map(|m| m.as_str().parse::<u32>())
                .transpose()
                .map_err(|_| malformed())?,
        })
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }
}
