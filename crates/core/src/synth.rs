//! Synthesizes the correlated web log: requests to one distinguished endpoint
//! whose latency depends on the client's datacenter, mixed with generic
//! traffic that carries no such signal.

use rand::{
    distr::{weighted::WeightedIndex, Distribution},
    seq::{index, IndexedRandom, SliceRandom},
    Rng,
};

use crate::{
    err::Result,
    pool::{Datacenter, IdentifierPool},
    record::{dash_none, HttpVersion, LogRecord, Method},
    rng::Weighted,
    window::TimeWindow,
};

pub const DISTINGUISHED_PATH: &str = "/api/foo";

/// Share of the log that targets [DISTINGUISHED_PATH] unless overridden.
pub const DEFAULT_FRACTION: f64 = 0.30;

/// Distinguished requests from the high-latency datacenter are slower than this.
pub const SLOW_FLOOR_MS: u32 = 2000;

/// Distinguished requests from every other datacenter are faster than this.
pub const FAST_CEILING_MS: u32 = 1000;

pub const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_5) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.5 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:128.0) Gecko/20100101 Firefox/128.0",
    "curl/8.7.1",
    "python-requests/2.31.0",
    "Go-http-client/2.0",
];

pub const REFERRERS: &[&str] = &[
    "-",
    "https://www.google.com/",
    "https://www.bing.com/search?q=example",
    "https://news.ycombinator.com/",
    "https://twitter.com/",
    "https://example.com/",
    "https://m.example.com/",
    "https://docs.example.com/guide",
];

pub const GENERIC_PATHS: &[&str] = &[
    "/",
    "/index.html",
    "/about",
    "/contact",
    "/api/bar",
    "/api/baz",
    "/api/v1/items",
    "/api/v1/items/123",
    "/login",
    "/logout",
    "/signup",
    "/products/123",
    "/products/456",
    "/search?q=widgets",
    "/static/app.js",
    "/static/style.css",
    "/static/logo.png",
];

static DISTINGUISHED_STATUSES: [(u16, u32); 5] =
    [(200, 70), (201, 5), (500, 10), (502, 7), (503, 8)];

static GENERIC_STATUSES: [(u16, u32); 13] = [
    (200, 5),
    (201, 1),
    (204, 1),
    (301, 1),
    (302, 1),
    (304, 1),
    (400, 1),
    (401, 1),
    (403, 1),
    (404, 1),
    (500, 1),
    (502, 1),
    (503, 1),
];

static GENERIC_METHODS: [(Method, u32); 4] = [
    (Method::Get, 75),
    (Method::Post, 20),
    (Method::Put, 3),
    (Method::Delete, 2),
];

/// Inclusive body-size ranges with their relative weights.
pub(crate) static SIZE_TIERS: [((u64, u64), u32); 4] = [
    ((200, 1500), 60),
    ((1501, 5000), 25),
    ((5001, 20000), 12),
    ((20001, 150000), 3),
];

/// Number of distinguished records in a log of `total` lines.
pub fn distinguished_count(total: usize, fraction: f64) -> usize {
    ((total as f64 * fraction).round() as usize).min(total)
}

/// Split `count` across datacenters in proportion to their pool sizes. The
/// first three shares are rounded; the last takes whatever is left, which is
/// zero if the rounded shares already exceed `count`.
pub fn allocate(count: usize, pool: &IdentifierPool) -> [usize; 4] {
    let total = pool.len();
    let mut allocation = [0; 4];
    let mut allocated = 0;
    for dc in &Datacenter::ALL[..3] {
        let share = if total == 0 {
            0
        } else {
            (count as f64 * (pool.members(*dc).len() as f64 / total as f64)).round() as usize
        };
        allocation[dc.index()] = share;
        allocated += share;
    }
    allocation[3] = count.saturating_sub(allocated);
    allocation
}

pub(crate) fn bytes_for<R: Rng + ?Sized>(
    status: u16,
    sizes: &Weighted<(u64, u64)>,
    rng: &mut R,
) -> u64 {
    if matches!(status, 204 | 304) {
        return 0;
    }
    let (lo, hi) = sizes.sample(rng);
    rng.random_range(lo..=hi)
}

fn pick<R: Rng + ?Sized>(items: &[&str], rng: &mut R) -> Option<String> {
    items.choose(rng).and_then(|s| dash_none(s))
}

/// Builds both record streams from one [IdentifierPool].
pub struct Synthesizer<'p> {
    pool: &'p IdentifierPool,
    window: TimeWindow,
    distinguished_statuses: Weighted<u16>,
    generic_statuses: Weighted<u16>,
    methods: Weighted<Method>,
    sizes: Weighted<(u64, u64)>,
}

impl<'p> Synthesizer<'p> {
    pub fn new(pool: &'p IdentifierPool, window: TimeWindow) -> Result<Self> {
        Ok(Self {
            pool,
            window,
            distinguished_statuses: Weighted::new(&DISTINGUISHED_STATUSES)?,
            generic_statuses: Weighted::new(&GENERIC_STATUSES)?,
            methods: Weighted::new(&GENERIC_METHODS)?,
            sizes: Weighted::new(&SIZE_TIERS)?,
        })
    }

    /// Produce exactly `total` records, `round(total * fraction)` of them for
    /// the distinguished endpoint, in random order.
    pub fn synthesize<R: Rng + ?Sized>(
        &self,
        total: usize,
        fraction: f64,
        rng: &mut R,
    ) -> Result<Vec<LogRecord>> {
        let distinguished = distinguished_count(total, fraction);
        let mut records = self.distinguished_records(distinguished, rng)?;
        records.extend(self.generic_records(total - distinguished, rng));
        records.shuffle(rng);
        Ok(records)
    }

    /// Exactly `count` requests to [DISTINGUISHED_PATH].
    pub fn distinguished_records<R: Rng + ?Sized>(
        &self,
        count: usize,
        rng: &mut R,
    ) -> Result<Vec<LogRecord>> {
        let allocation = allocate(count, self.pool);
        tracing::debug!(?allocation, count, "allocated distinguished records");

        let mut records = Vec::with_capacity(count);
        for dc in Datacenter::ALL {
            if self.pool.members(dc).is_empty() {
                continue;
            }
            for _ in 0..allocation[dc.index()] {
                records.extend(self.distinguished_record(dc, rng));
            }
        }

        if records.len() > count {
            tracing::debug!(surplus = records.len() - count, "trimming allocation");
            let keep = index::sample(rng, records.len(), count);
            let mut slots: Vec<Option<LogRecord>> = records.into_iter().map(Some).collect();
            records = keep.into_iter().filter_map(|i| slots[i].take()).collect();
        } else if records.len() < count {
            tracing::debug!(deficit = count - records.len(), "topping up allocation");
            // One draw per missing record, over non-empty datacenters in
            // fixed order, weighted by pool size.
            let buckets: Vec<Datacenter> = Datacenter::ALL
                .into_iter()
                .filter(|dc| !self.pool.members(*dc).is_empty())
                .collect();
            let weights = WeightedIndex::new(buckets.iter().map(|dc| self.pool.members(*dc).len()))?;
            while records.len() < count {
                let dc = buckets[weights.sample(rng)];
                records.extend(self.distinguished_record(dc, rng));
            }
        }
        Ok(records)
    }

    fn distinguished_record<R: Rng + ?Sized>(&self, dc: Datacenter, rng: &mut R) -> Option<LogRecord> {
        let address = *self.pool.members(dc).choose(rng)?;
        let timestamp = self.window.sample(rng);
        let status = self.distinguished_statuses.sample(rng);
        let bytes = bytes_for(status, &self.sizes, rng);
        let referrer = pick(REFERRERS, rng);
        let agent = pick(USER_AGENTS, rng);
        let latency = if dc == Datacenter::HIGH_LATENCY {
            rng.random_range(SLOW_FLOOR_MS + 1..=5000)
        } else {
            rng.random_range(50..FAST_CEILING_MS)
        };

        Some(LogRecord {
            address,
            user: None,
            timestamp,
            method: Method::Get,
            path: DISTINGUISHED_PATH.to_string(),
            protocol: HttpVersion::Http11,
            status,
            bytes,
            referrer,
            agent,
            latency_ms: Some(latency),
        })
    }

    /// `count` requests to everything but [DISTINGUISHED_PATH], from clients
    /// anywhere in the pool.
    pub fn generic_records<R: Rng + ?Sized>(&self, count: usize, rng: &mut R) -> Vec<LogRecord> {
        let mut records = Vec::with_capacity(count);
        for _ in 0..count {
            let Some(&address) = self.pool.addresses().choose(rng) else {
                break;
            };
            let timestamp = self.window.sample(rng);
            let method = self.methods.sample(rng);
            let path = GENERIC_PATHS.choose(rng).copied().unwrap_or("/");
            let status = self.generic_statuses.sample(rng);
            let bytes = bytes_for(status, &self.sizes, rng);
            let referrer = pick(REFERRERS, rng);
            let agent = pick(USER_AGENTS, rng);
            let latency = rng.random_range(30..=1500);

            records.push(LogRecord {
                address,
                user: None,
                timestamp,
                method,
                path: path.to_string(),
                protocol: HttpVersion::Http11,
                status,
                bytes,
                referrer,
                agent,
                latency_ms: Some(latency),
            });
        }
        records
    }
}

#[cfg(test)]
mod test {
    use std::net::Ipv4Addr;

    use super::*;
    use crate::rng::seeded;

    fn pool(n: usize, seed: u64) -> IdentifierPool {
        IdentifierPool::build(n, &mut seeded(seed)).unwrap()
    }

    #[test]
    fn counts_are_exact() {
        let pool = pool(100, 42);
        let synth = Synthesizer::new(&pool, TimeWindow::default()).unwrap();
        let records = synth.synthesize(1000, DEFAULT_FRACTION, &mut seeded(42)).unwrap();
        assert_eq!(records.len(), 1000);
        let foo = records.iter().filter(|r| r.path == DISTINGUISHED_PATH).count();
        assert_eq!(foo, 300);
    }

    #[test]
    fn distinguished_latency_follows_datacenter() {
        let pool = pool(300, 8);
        let synth = Synthesizer::new(&pool, TimeWindow::default()).unwrap();
        let records = synth.distinguished_records(2000, &mut seeded(8)).unwrap();
        assert_eq!(records.len(), 2000);

        let mut slow = 0;
        for record in &records {
            let latency = record.latency_ms.unwrap();
            match pool.datacenter_of(record.address).unwrap() {
                Datacenter::HIGH_LATENCY => {
                    slow += 1;
                    assert!(latency > SLOW_FLOOR_MS && latency <= 5000, "{latency}");
                }
                _ => assert!((50..FAST_CEILING_MS).contains(&latency), "{latency}"),
            }
            assert_eq!(record.method, Method::Get);
            assert!(DISTINGUISHED_STATUSES.iter().any(|(s, _)| *s == record.status));
        }
        assert_eq!(slow, 500);
    }

    #[test]
    fn generic_records_never_hit_the_distinguished_path() {
        let pool = pool(50, 2);
        let synth = Synthesizer::new(&pool, TimeWindow::default()).unwrap();
        for record in synth.generic_records(3000, &mut seeded(2)) {
            assert_ne!(record.path, DISTINGUISHED_PATH);
            assert!(pool.datacenter_of(record.address).is_some());
            assert!((30..=1500).contains(&record.latency_ms.unwrap()));
            if matches!(record.status, 204 | 304) {
                assert_eq!(record.bytes, 0);
            } else {
                assert!((200..=150_000).contains(&record.bytes));
            }
        }
    }

    #[test]
    fn allocation_is_proportional() {
        let pool = pool(100, 1);
        assert_eq!(allocate(300, &pool), [75, 75, 75, 75]);

        let pool = IdentifierPool::from_members([
            (1..=3).map(|i| Ipv4Addr::new(10, 0, 0, i)).collect(),
            (1..=2).map(|i| Ipv4Addr::new(10, 0, 1, i)).collect(),
            (1..=2).map(|i| Ipv4Addr::new(10, 0, 2, i)).collect(),
            (1..=3).map(|i| Ipv4Addr::new(10, 0, 3, i)).collect(),
        ]);
        assert_eq!(allocate(10, &pool), [3, 2, 2, 3]);
        assert_eq!(allocate(0, &pool), [0, 0, 0, 0]);
    }

    #[test]
    fn overshoot_is_trimmed_to_count() {
        // Each quarter rounds 0.5 up, so the first three shares already sum to 3.
        let pool = pool(100, 4);
        assert_eq!(allocate(2, &pool), [1, 1, 1, 0]);

        let synth = Synthesizer::new(&pool, TimeWindow::default()).unwrap();
        let records = synth.distinguished_records(2, &mut seeded(4)).unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn shortfall_is_topped_up_from_non_empty_datacenters() {
        let pool = IdentifierPool::from_members([
            vec![Ipv4Addr::new(10, 0, 0, 1)],
            vec![Ipv4Addr::new(10, 0, 0, 2)],
            vec![Ipv4Addr::new(10, 0, 0, 3)],
            Vec::new(),
        ]);
        // The empty last datacenter is allocated a share it cannot serve.
        assert_eq!(allocate(10, &pool), [3, 3, 3, 1]);

        let synth = Synthesizer::new(&pool, TimeWindow::default()).unwrap();
        let records = synth.distinguished_records(10, &mut seeded(6)).unwrap();
        assert_eq!(records.len(), 10);
        for record in &records {
            let dc = pool.datacenter_of(record.address).unwrap();
            assert_ne!(dc, Datacenter::Dc4);
            let latency = record.latency_ms.unwrap();
            if dc == Datacenter::HIGH_LATENCY {
                assert!(latency > SLOW_FLOOR_MS);
            } else {
                assert!(latency < FAST_CEILING_MS);
            }
        }
    }

    #[test]
    fn streams_are_interleaved() {
        let pool = pool(100, 42);
        let synth = Synthesizer::new(&pool, TimeWindow::default()).unwrap();
        let records = synth.synthesize(1000, DEFAULT_FRACTION, &mut seeded(42)).unwrap();
        let head = records[..300]
            .iter()
            .filter(|r| r.path == DISTINGUISHED_PATH)
            .count();
        assert!(head < 300);
    }

    #[test]
    fn fraction_edges() {
        assert_eq!(distinguished_count(10_000, 0.30), 3000);
        assert_eq!(distinguished_count(7, 0.5), 4);
        assert_eq!(distinguished_count(10, 0.0), 0);
        assert_eq!(distinguished_count(10, 1.0), 10);
    }
}
