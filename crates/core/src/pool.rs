//! Unique synthetic IPv4 addresses, partitioned into datacenters.

use std::{
    collections::{BTreeMap, HashSet},
    fmt,
    net::Ipv4Addr,
    str::FromStr,
};

use rand::{
    seq::{IndexedRandom, SliceRandom},
    Rng,
};

use crate::err::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Datacenter {
    Dc1,
    Dc2,
    Dc3,
    Dc4,
}

impl Datacenter {
    pub const ALL: [Datacenter; 4] = [
        Datacenter::Dc1,
        Datacenter::Dc2,
        Datacenter::Dc3,
        Datacenter::Dc4,
    ];

    /// Requests to the distinguished endpoint from this datacenter are slow.
    pub const HIGH_LATENCY: Datacenter = Datacenter::Dc1;

    pub fn label(self) -> &'static str {
        match self {
            Datacenter::Dc1 => "datacenter1",
            Datacenter::Dc2 => "datacenter2",
            Datacenter::Dc3 => "datacenter3",
            Datacenter::Dc4 => "datacenter4",
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Datacenter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Datacenter {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Datacenter::ALL
            .into_iter()
            .find(|dc| dc.label() == s)
            .ok_or(())
    }
}

/// First octets used for the public share of the pool.
const PUBLIC_FIRST_OCTETS: &[u8] = &[
    8, 20, 23, 52, 64, 96, 100, 104, 128, 129, 130, 131, 132, 151, 155, 172, 185, 203,
];

/// Requests above this can never be satisfied in reasonable time.
pub const MAX_UNIQUE: usize = 1 << 24;

/// Consecutive duplicate draws after which sampling gives up.
const STALL_LIMIT: usize = 1_000_000;

fn octet<R: Rng + ?Sized>(rng: &mut R) -> u8 {
    rng.random_range(1..=254)
}

/// Draw one address: 40% from 10/8, 30% from 172.16/12, 20% from
/// 192.168/16 and 10% from a handful of public blocks. No octet is 0 or 255.
pub fn random_address<R: Rng + ?Sized>(rng: &mut R) -> Ipv4Addr {
    let choice: f64 = rng.random();
    if choice < 0.4 {
        Ipv4Addr::new(10, octet(rng), octet(rng), octet(rng))
    } else if choice < 0.7 {
        Ipv4Addr::new(172, rng.random_range(16..=31), octet(rng), octet(rng))
    } else if choice < 0.9 {
        Ipv4Addr::new(192, 168, octet(rng), octet(rng))
    } else {
        let first = PUBLIC_FIRST_OCTETS.choose(rng).copied().unwrap_or(8);
        Ipv4Addr::new(first, octet(rng), octet(rng), octet(rng))
    }
}

/// Sizes of each datacenter for a pool of `n`: a quarter (rounded) for the
/// first, the rest split evenly with the remainder going to the last.
pub fn partition_sizes(n: usize) -> [usize; 4] {
    let first = (n as f64 * 0.25).round() as usize;
    let remaining = n - first;
    let per_other = remaining / 3;
    [first, per_other, per_other, remaining - 2 * per_other]
}

/// A set of distinct addresses, each assigned to exactly one [Datacenter].
#[derive(Debug, Clone)]
pub struct IdentifierPool {
    /// All addresses in shuffled order.
    addresses: Vec<Ipv4Addr>,
    members: [Vec<Ipv4Addr>; 4],
    assignment: BTreeMap<Ipv4Addr, Datacenter>,
}

impl IdentifierPool {
    /// Sample `n` distinct addresses and partition them.
    pub fn build<R: Rng + ?Sized>(n: usize, rng: &mut R) -> Result<Self> {
        Self::build_with(n, STALL_LIMIT, rng, random_address)
    }

    /// [IdentifierPool::build] with the duplicate budget and address source
    /// spelled out. Gives up after `stall_limit` consecutive duplicates.
    pub(crate) fn build_with<R, F>(
        n: usize,
        stall_limit: usize,
        rng: &mut R,
        mut draw: F,
    ) -> Result<Self>
    where
        R: Rng + ?Sized,
        F: FnMut(&mut R) -> Ipv4Addr,
    {
        if n == 0 {
            return Err(Error::InvalidArgument(
                "unique address count must be positive".to_string(),
            ));
        }
        if n > MAX_UNIQUE {
            return Err(Error::PoolExhausted {
                requested: n,
                collected: 0,
            });
        }

        let mut seen = HashSet::with_capacity(n);
        let mut addresses = Vec::with_capacity(n);
        let mut stalled = 0;
        let mut draws = 0usize;
        while addresses.len() < n {
            let address = draw(rng);
            draws += 1;
            if seen.insert(address) {
                addresses.push(address);
                stalled = 0;
            } else {
                stalled += 1;
                if stalled >= stall_limit {
                    return Err(Error::PoolExhausted {
                        requested: n,
                        collected: addresses.len(),
                    });
                }
            }
        }
        tracing::debug!(unique = n, draws, "sampled address pool");

        addresses.shuffle(rng);
        Ok(Self::partition(addresses))
    }

    /// Assign already-shuffled addresses to datacenters in order.
    fn partition(addresses: Vec<Ipv4Addr>) -> Self {
        let sizes = partition_sizes(addresses.len());
        let mut members: [Vec<Ipv4Addr>; 4] = Default::default();
        let mut assignment = BTreeMap::new();

        let mut rest = addresses.as_slice();
        for (dc, size) in Datacenter::ALL.into_iter().zip(sizes) {
            let (head, tail) = rest.split_at(size);
            for &address in head {
                assignment.insert(address, dc);
            }
            members[dc.index()] = head.to_vec();
            rest = tail;
        }

        Self {
            addresses,
            members,
            assignment,
        }
    }

    #[cfg(test)]
    pub(crate) fn from_members(members: [Vec<Ipv4Addr>; 4]) -> Self {
        let mut assignment = BTreeMap::new();
        for dc in Datacenter::ALL {
            for &address in &members[dc.index()] {
                assignment.insert(address, dc);
            }
        }
        Self {
            addresses: members.concat(),
            members,
            assignment,
        }
    }

    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }

    pub fn addresses(&self) -> &[Ipv4Addr] {
        &self.addresses
    }

    pub fn members(&self, dc: Datacenter) -> &[Ipv4Addr] {
        &self.members[dc.index()]
    }

    pub fn datacenter_of(&self, address: Ipv4Addr) -> Option<Datacenter> {
        self.assignment.get(&address).copied()
    }

    pub fn counts(&self) -> [usize; 4] {
        Datacenter::ALL.map(|dc| self.members(dc).len())
    }

    /// Every address with its datacenter, in ascending address order.
    pub fn rows(&self) -> impl Iterator<Item = (Ipv4Addr, Datacenter)> + '_ {
        self.assignment.iter().map(|(&address, &dc)| (address, dc))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::rng::seeded;

    #[test]
    fn addresses_avoid_edge_octets() {
        let mut rng = seeded(5);
        for _ in 0..10_000 {
            let octets = random_address(&mut rng).octets();
            assert!(octets.iter().all(|&o| o != 0 && o != 255), "{octets:?}");
        }
    }

    #[test]
    fn address_mix_follows_range_weights() {
        let mut rng = seeded(9);
        let mut ten = 0;
        let mut one_nine_two = 0;
        for _ in 0..20_000 {
            let address = random_address(&mut rng);
            match address.octets() {
                [10, ..] => ten += 1,
                [192, 168, ..] => one_nine_two += 1,
                _ => {}
            }
        }
        assert!((7_400..8_600).contains(&ten), "{ten}");
        assert!((3_500..4_500).contains(&one_nine_two), "{one_nine_two}");
    }

    #[test]
    fn partition_sizes_sum_to_n() {
        assert_eq!(partition_sizes(100), [25, 25, 25, 25]);
        assert_eq!(partition_sizes(1000), [250, 250, 250, 250]);
        assert_eq!(partition_sizes(10), [3, 2, 2, 3]);
        assert_eq!(partition_sizes(1), [0, 0, 0, 1]);
        for n in 1..500 {
            let sizes = partition_sizes(n);
            assert_eq!(sizes.iter().sum::<usize>(), n);
            assert_eq!(sizes[0], (n as f64 * 0.25).round() as usize);
            let others = &sizes[1..];
            let max = others.iter().max().unwrap();
            let min = others.iter().min().unwrap();
            assert!(max - min <= 1, "{n}: {sizes:?}");
        }
    }

    #[test]
    fn pool_is_unique_and_fully_assigned() {
        let mut rng = seeded(42);
        let pool = IdentifierPool::build(1000, &mut rng).unwrap();
        assert_eq!(pool.len(), 1000);

        let distinct: HashSet<_> = pool.addresses().iter().collect();
        assert_eq!(distinct.len(), 1000);
        assert_eq!(pool.rows().count(), 1000);
        assert_eq!(pool.counts(), [250, 250, 250, 250]);

        for dc in Datacenter::ALL {
            for &address in pool.members(dc) {
                assert_eq!(pool.datacenter_of(address), Some(dc));
            }
        }
    }

    #[test]
    fn rows_are_sorted_by_address() {
        let mut rng = seeded(3);
        let pool = IdentifierPool::build(200, &mut rng).unwrap();
        let rows: Vec<_> = pool.rows().map(|(address, _)| address).collect();
        assert!(rows.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn membership_does_not_follow_generation_order() {
        // Without a shuffle, datacenter1 would hold exactly the first draws.
        let mut rng = seeded(12);
        let mut unshuffled = Vec::new();
        while unshuffled.len() < 400 {
            let address = random_address(&mut rng);
            if !unshuffled.contains(&address) {
                unshuffled.push(address);
            }
        }

        let pool = IdentifierPool::build(400, &mut seeded(12)).unwrap();
        assert_ne!(pool.members(Datacenter::Dc1), &unshuffled[..100]);
    }

    #[test]
    fn zero_and_oversized_requests_fail() {
        let mut rng = seeded(1);
        assert!(matches!(
            IdentifierPool::build(0, &mut rng),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            IdentifierPool::build(MAX_UNIQUE + 1, &mut rng),
            Err(Error::PoolExhausted { collected: 0, .. })
        ));
    }

    #[test]
    fn endless_duplicates_exhaust_the_pool() {
        let known = [
            Ipv4Addr::new(10, 0, 0, 1),
            Ipv4Addr::new(10, 0, 0, 2),
            Ipv4Addr::new(10, 0, 0, 3),
        ];
        let mut next = known.iter().copied().cycle();
        let result = IdentifierPool::build_with(5, 8, &mut seeded(3), |_| {
            next.next().unwrap_or(Ipv4Addr::UNSPECIFIED)
        });
        match result {
            Err(Error::PoolExhausted {
                requested,
                collected,
            }) => {
                assert_eq!(requested, 5);
                assert_eq!(collected, 3);
            }
            other => panic!("expected exhaustion, got {other:?}"),
        }
    }

    #[test]
    fn duplicates_below_the_limit_are_tolerated() {
        let mut draws = [1u8, 1, 1, 2, 2, 3, 4].into_iter();
        let pool = IdentifierPool::build_with(4, 3, &mut seeded(3), |_| {
            Ipv4Addr::new(10, 0, 0, draws.next().unwrap_or(0))
        })
        .unwrap();
        assert_eq!(pool.len(), 4);
    }

    #[test]
    fn datacenter_labels_round_trip() {
        for dc in Datacenter::ALL {
            assert_eq!(dc.label().parse::<Datacenter>(), Ok(dc));
        }
        assert!("datacenter5".parse::<Datacenter>().is_err());
    }
}
