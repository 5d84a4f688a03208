//! The structured form of a single access-log line.

use std::{fmt, net::Ipv4Addr, str::FromStr};

use time::OffsetDateTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "DELETE" => Ok(Method::Delete),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpVersion {
    Http10,
    Http11,
    Http20,
}

impl HttpVersion {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpVersion::Http10 => "HTTP/1.0",
            HttpVersion::Http11 => "HTTP/1.1",
            HttpVersion::Http20 => "HTTP/2.0",
        }
    }
}

impl fmt::Display for HttpVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpVersion {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "HTTP/1.0" => Ok(HttpVersion::Http10),
            "HTTP/1.1" => Ok(HttpVersion::Http11),
            "HTTP/2.0" => Ok(HttpVersion::Http20),
            _ => Err(()),
        }
    }
}

/// One request as it appears in an access log.
///
/// `bytes == 0` means no body was sent and is written as `-`. A `None`
/// user, referrer or agent is also written as `-`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub address: Ipv4Addr,
    pub user: Option<String>,
    pub timestamp: OffsetDateTime,
    pub method: Method,
    pub path: String,
    pub protocol: HttpVersion,
    pub status: u16,
    pub bytes: u64,
    pub referrer: Option<String>,
    pub agent: Option<String>,
    /// Trailing request latency. Omitted from the line when `None`.
    pub latency_ms: Option<u32>,
}

/// Maps the `-` placeholder used in catalogs and log lines to `None`.
pub(crate) fn dash_none(s: &str) -> Option<String> {
    (s != "-").then(|| s.to_string())
}
