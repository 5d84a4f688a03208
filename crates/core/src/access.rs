//! Free-standing access logs without any cross-file correlation, in either
//! the common or the combined dialect.

use std::net::Ipv4Addr;

use rand::{
    distr::Distribution,
    seq::IndexedRandom,
    Rng,
};
use time::{macros::offset, Date, UtcOffset};

use crate::{
    err::Result,
    format::Dialect,
    record::{dash_none, HttpVersion, LogRecord, Method},
    rng::Weighted,
    window::TimeWindow,
};

const COMMON_OFFSETS: &[UtcOffset] = &[
    UtcOffset::UTC,
    offset!(-7),
    offset!(+5:30),
    offset!(-4),
    offset!(+1),
];

const COMBINED_OFFSETS: &[UtcOffset] = &[offset!(-7), UtcOffset::UTC, offset!(+2), offset!(+5:30)];

const COMMON_USERS: &[&str] = &["-", "alice", "bob", "carol", "dan", "-"];

const COMMON_PATHS: &[&str] = &[
    "/index.html",
    "/home",
    "/api/v1/resource",
    "/login",
    "/logout",
    "/dashboard",
    "/settings",
    "/user/profile",
    "/search",
    "/products",
    "/cart",
    "/checkout",
];

const COMMON_QUERY_PARAMS: &[&str] = &[
    "user=123",
    "id=456",
    "q=test",
    "sort=asc",
    "page=2",
    "lang=en",
    "token=abcdef",
    "mode=full",
    "type=basic",
    "category=books",
    "filter=active",
    "ref=google",
];

const COMBINED_PATHS: &[&str] = &[
    "/home",
    "/about",
    "/api/data",
    "/login",
    "/logout",
    "/products",
    "/cart",
    "/checkout",
    "/search",
    "/blog",
    "/posts",
    "/profile",
    "/settings",
    "/api/update",
    "/api/delete",
];

const COMBINED_QUERY_SUFFIXES: &[&str] = &[
    "?q=test",
    "?user=demo",
    "?sort=desc",
    "?id=123",
    "?page=2",
    "?ref=google",
    "?cat=books",
    "?debug=true",
];

const COMBINED_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64)",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7)",
    "curl/7.68.0",
    "Mozilla/5.0 (X11; Linux x86_64)",
    "PostmanRuntime/7.28.4",
    "Googlebot/2.1 (+http://www.google.com/bot.html)",
];

const COMBINED_REFERRERS: &[&str] = &[
    "https://google.com",
    "https://bing.com",
    "https://github.com",
    "-",
    "https://facebook.com",
    "https://twitter.com",
];

const PROTOCOLS: &[HttpVersion] = &[HttpVersion::Http10, HttpVersion::Http11, HttpVersion::Http20];

/// Window length used by both access profiles unless overridden.
pub const DEFAULT_DAYS: u32 = 30;

static COMMON_METHODS: [(Method, u32); 4] = [
    (Method::Get, 80),
    (Method::Post, 7),
    (Method::Put, 7),
    (Method::Delete, 6),
];

/// 80% success, the rest spread evenly over the error codes.
static COMMON_STATUSES: [(u16, u32); 8] = [
    (200, 56),
    (400, 2),
    (401, 2),
    (403, 2),
    (404, 2),
    (500, 2),
    (501, 2),
    (503, 2),
];

static COMBINED_METHODS: [(Method, u32); 4] = [
    (Method::Get, 8),
    (Method::Post, 1),
    (Method::Put, 1),
    (Method::Delete, 1),
];

static COMBINED_STATUSES: [(u16, u32); 8] = [
    (200, 8),
    (400, 1),
    (401, 1),
    (403, 1),
    (404, 1),
    (500, 1),
    (501, 1),
    (503, 1),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessProfile {
    /// Common log format with an authenticated user column and trailing latency.
    Common,
    /// Combined log format with a varying protocol and trailing latency.
    Combined,
}

impl AccessProfile {
    pub fn dialect(self) -> Dialect {
        match self {
            AccessProfile::Common => Dialect::Common,
            AccessProfile::Combined => Dialect::Combined,
        }
    }

    /// A window of `days` starting at `start`, tagged with this profile's offsets.
    pub fn window(self, start: Date, days: u32) -> TimeWindow {
        let offsets = match self {
            AccessProfile::Common => COMMON_OFFSETS,
            AccessProfile::Combined => COMBINED_OFFSETS,
        };
        TimeWindow::days_from(start, days, offsets)
    }
}

fn random_public_address<R: Rng + ?Sized>(rng: &mut R) -> Ipv4Addr {
    let mut octets = [0u8; 4];
    for octet in &mut octets {
        *octet = rng.random_range(1..=254);
    }
    Ipv4Addr::from(octets)
}

pub struct AccessGenerator {
    profile: AccessProfile,
    window: TimeWindow,
    methods: Weighted<Method>,
    statuses: Weighted<u16>,
}

impl AccessGenerator {
    pub fn new(profile: AccessProfile, window: TimeWindow) -> Result<Self> {
        window.validate()?;
        let (methods, statuses) = match profile {
            AccessProfile::Common => (&COMMON_METHODS, &COMMON_STATUSES),
            AccessProfile::Combined => (&COMBINED_METHODS, &COMBINED_STATUSES),
        };
        Ok(Self {
            profile,
            window,
            methods: Weighted::new(methods)?,
            statuses: Weighted::new(statuses)?,
        })
    }

    pub fn generate<R: Rng + ?Sized>(&self, count: usize, rng: &mut R) -> Vec<LogRecord> {
        (0..count).map(|_| self.record(rng)).collect()
    }

    pub fn record<R: Rng + ?Sized>(&self, rng: &mut R) -> LogRecord {
        match self.profile {
            AccessProfile::Common => self.common(rng),
            AccessProfile::Combined => self.combined(rng),
        }
    }

    fn common<R: Rng + ?Sized>(&self, rng: &mut R) -> LogRecord {
        let address = random_public_address(rng);
        let user = COMMON_USERS.choose(rng).and_then(|u| dash_none(u));
        let timestamp = self.window.sample(rng);
        let method = self.methods.sample(rng);

        let mut path = COMMON_PATHS.choose(rng).copied().unwrap_or("/").to_string();
        if rng.random_bool(0.4) {
            let amount = rng.random_range(1..=3);
            let params: Vec<&str> = COMMON_QUERY_PARAMS
                .choose_multiple(rng, amount)
                .copied()
                .collect();
            path.push('?');
            path.push_str(&params.join("&"));
        }

        let status = self.statuses.sample(rng);
        let bytes = match method {
            Method::Get => rng.random_range(200..=5000),
            Method::Post | Method::Put => rng.random_range(500..=50_000),
            Method::Delete => rng.random_range(100..=10_000),
        };
        let latency = rng.random_range(10..=900);

        LogRecord {
            address,
            user,
            timestamp,
            method,
            path,
            protocol: HttpVersion::Http11,
            status,
            bytes,
            referrer: None,
            agent: None,
            latency_ms: Some(latency),
        }
    }

    fn combined<R: Rng + ?Sized>(&self, rng: &mut R) -> LogRecord {
        let address = random_public_address(rng);
        let user = if rng.random_bool(0.5) {
            None
        } else {
            Some(format!("user{}", rng.random_range(1..=100)))
        };
        let timestamp = self.window.sample(rng);
        let method = self.methods.sample(rng);

        let mut path = COMBINED_PATHS.choose(rng).copied().unwrap_or("/").to_string();
        if rng.random_bool(0.4) {
            path.push_str(COMBINED_QUERY_SUFFIXES.choose(rng).copied().unwrap_or(""));
        }

        let protocol = PROTOCOLS.choose(rng).copied().unwrap_or(HttpVersion::Http11);
        let status = self.statuses.sample(rng);
        let bytes = if rng.random_bool(0.7) {
            rng.random_range(10..=1000)
        } else {
            rng.random_range(2000..=3000)
        };
        let referrer = COMBINED_REFERRERS.choose(rng).and_then(|r| dash_none(r));
        let agent = COMBINED_AGENTS.choose(rng).map(|a| a.to_string());
        let latency = rng.random_range(100..=2000);

        LogRecord {
            address,
            user,
            timestamp,
            method,
            path,
            protocol,
            status,
            bytes,
            referrer,
            agent,
            latency_ms: Some(latency),
        }
    }
}
