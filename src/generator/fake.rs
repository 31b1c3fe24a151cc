//! Plausible fake values for static output.
//!
//! These mirror the faker families the JS renderer emits so that baked
//! literals look like what the dynamic handlers would return.

use super::expr::TextKind;
use chrono::{DateTime, SecondsFormat, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use std::net::{Ipv4Addr, Ipv6Addr};

const LOREM: &[&str] = &[
    "lorem", "ipsum", "dolor", "sit", "amet", "consectetur", "adipiscing", "elit", "sed", "do",
    "eiusmod", "tempor", "incididunt", "labore", "dolore", "magna", "aliqua", "enim", "minim",
    "veniam", "quis", "nostrud", "exercitation", "ullamco", "laboris", "nisi", "aliquip", "commodo",
];

const FIRST_NAMES: &[&str] = &[
    "Ada", "Alan", "Grace", "Linus", "Margaret", "Dennis", "Barbara", "Ken", "Frances", "Edsger",
    "Radia", "Donald", "Hedy", "John", "Katherine", "Tim",
];

const LAST_NAMES: &[&str] = &[
    "Lovelace", "Turing", "Hopper", "Torvalds", "Hamilton", "Ritchie", "Liskov", "Thompson",
    "Allen", "Dijkstra", "Perlman", "Knuth", "Lamarr", "McCarthy", "Johnson", "Berners-Lee",
];

const STREET_NAMES: &[&str] = &[
    "Maple", "Oak", "Pine", "Cedar", "Elm", "Willow", "Birch", "Aspen", "Chestnut", "Spruce",
];

const STREET_SUFFIXES: &[&str] = &["Street", "Avenue", "Road", "Lane", "Drive", "Court", "Way"];

const CITIES: &[&str] = &[
    "Springfield", "Riverside", "Fairview", "Greenville", "Bristol", "Clinton", "Madison",
    "Georgetown", "Salem", "Franklin",
];

const STATES: &[&str] = &[
    "California", "Texas", "Oregon", "Vermont", "Ohio", "Maine", "Nevada", "Utah", "Iowa", "Idaho",
];

const TLDS: &[&str] = &["com", "net", "org", "io", "dev"];

/// Anchor for generated timestamps (2024-01-01T00:00:00Z); keeps seeded output reproducible
const TIMESTAMP_ANCHOR: i64 = 1_704_067_200;
const ONE_YEAR_SECS: i64 = 365 * 24 * 60 * 60;

fn pick<'a, R: Rng + ?Sized>(list: &[&'a str], rng: &mut R) -> &'a str {
    list.choose(rng).copied().unwrap_or_default()
}

/// One to three lorem words
pub fn words<R: Rng + ?Sized>(rng: &mut R) -> String {
    let count = rng.gen_range(1..=3);
    (0..count).map(|_| pick(LOREM, rng)).collect::<Vec<_>>().join(" ")
}

/// Random ASCII letters with a length in `min..=max`
pub fn alpha<R: Rng + ?Sized>(min: usize, max: usize, rng: &mut R) -> String {
    let len = rng.gen_range(min..=max.max(min));
    (0..len)
        .map(|_| {
            let offset = rng.gen_range(0..52u8);
            if offset < 26 {
                char::from(b'a' + offset)
            } else {
                char::from(b'A' + offset - 26)
            }
        })
        .collect()
}

/// Random lower-case letters and digits
pub fn alphanumeric<R: Rng + ?Sized>(len: usize, rng: &mut R) -> String {
    const CHARS: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
    (0..len)
        .map(|_| char::from(CHARS[rng.gen_range(0..CHARS.len())]))
        .collect()
}

fn domain<R: Rng + ?Sized>(rng: &mut R) -> String {
    format!("{}.{}", pick(LOREM, rng), pick(TLDS, rng))
}

fn timestamp<R: Rng + ?Sized>(rng: &mut R) -> String {
    let secs = TIMESTAMP_ANCHOR - rng.gen_range(0..ONE_YEAR_SECS);
    DateTime::<Utc>::from_timestamp(secs, 0)
        .map(|t| t.to_rfc3339_opts(SecondsFormat::Millis, true))
        .unwrap_or_default()
}

/// A value of the given family
pub fn text<R: Rng + ?Sized>(kind: TextKind, rng: &mut R) -> String {
    match kind {
        TextKind::Words => words(rng),
        TextKind::Uuid => uuid::Builder::from_random_bytes(rng.gen()).into_uuid().to_string(),
        TextKind::Timestamp => timestamp(rng),
        TextKind::Email => format!(
            "{}.{}@{}",
            pick(FIRST_NAMES, rng).to_lowercase(),
            pick(LAST_NAMES, rng).to_lowercase(),
            domain(rng)
        ),
        TextKind::Domain => domain(rng),
        TextKind::Ipv4 => Ipv4Addr::from(rng.gen::<[u8; 4]>()).to_string(),
        TextKind::Ipv6 => Ipv6Addr::from(rng.gen::<[u16; 8]>()).to_string(),
        TextKind::Url => format!("https://{}/", domain(rng)),
        TextKind::ImageUrl => format!(
            "https://picsum.photos/seed/{}/640/480",
            alphanumeric(8, rng)
        ),
        TextKind::FullName => format!("{} {}", pick(FIRST_NAMES, rng), pick(LAST_NAMES, rng)),
        TextKind::Street => format!(
            "{} {} {}",
            rng.gen_range(1..=9999),
            pick(STREET_NAMES, rng),
            pick(STREET_SUFFIXES, rng)
        ),
        TextKind::City => pick(CITIES, rng).to_string(),
        TextKind::State => pick(STATES, rng).to_string(),
        TextKind::ZipCode => format!("{:05}", rng.gen_range(0..100_000)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_alpha_respects_bounds() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..100 {
            let s = alpha(3, 6, &mut rng);
            assert!((3..=6).contains(&s.len()));
            assert!(s.chars().all(|c| c.is_ascii_alphabetic()));
        }
    }

    #[test]
    fn test_text_families_have_expected_shape() {
        let mut rng = StdRng::seed_from_u64(2);
        assert!(uuid::Uuid::parse_str(&text(TextKind::Uuid, &mut rng)).is_ok());
        assert!(text(TextKind::Email, &mut rng).contains('@'));
        assert!(text(TextKind::Ipv4, &mut rng).parse::<Ipv4Addr>().is_ok());
        assert!(text(TextKind::Ipv6, &mut rng).parse::<Ipv6Addr>().is_ok());
        assert!(DateTime::parse_from_rfc3339(&text(TextKind::Timestamp, &mut rng)).is_ok());
        assert!(url::Url::parse(&text(TextKind::Url, &mut rng)).is_ok());
        assert_eq!(text(TextKind::ZipCode, &mut rng).len(), 5);
    }

    #[test]
    fn test_same_seed_same_values() {
        let a: Vec<_> = {
            let mut rng = StdRng::seed_from_u64(9);
            (0..5).map(|_| text(TextKind::FullName, &mut rng)).collect()
        };
        let b: Vec<_> = {
            let mut rng = StdRng::seed_from_u64(9);
            (0..5).map(|_| text(TextKind::FullName, &mut rng)).collect()
        };
        assert_eq!(a, b);
    }
}
