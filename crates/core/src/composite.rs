//! Two-field sort key used for secondary sort.
//!
//! Keys order ascending by `primary` and, within one primary value,
//! descending by `secondary`. The engine sorts keys through `Ord`, so the
//! ordering lives on the type itself rather than in a separate comparator.

use std::cmp::Ordering;
use std::fmt;
use std::io::{Read, Write};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::CoreError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CompositeKey {
    pub primary: i32,
    pub secondary: i32,
}

impl CompositeKey {
    /// Width of the binary form: two big-endian `i32`s, no padding.
    pub const ENCODED_LEN: usize = 8;

    pub fn new(primary: i32, secondary: i32) -> Self {
        Self { primary, secondary }
    }

    pub fn encode(&self) -> [u8; Self::ENCODED_LEN] {
        let mut buf = [0u8; Self::ENCODED_LEN];
        buf[..4].copy_from_slice(&self.primary.to_be_bytes());
        buf[4..].copy_from_slice(&self.secondary.to_be_bytes());
        buf
    }

    /// Decodes the first eight bytes of `bytes`.
    pub fn decode(bytes: &[u8]) -> Result<Self, CoreError> {
        if bytes.len() < Self::ENCODED_LEN {
            return Err(CoreError::MalformedEncoding {
                expected: Self::ENCODED_LEN,
                actual: bytes.len(),
            });
        }
        let mut primary = [0u8; 4];
        let mut secondary = [0u8; 4];
        primary.copy_from_slice(&bytes[..4]);
        secondary.copy_from_slice(&bytes[4..Self::ENCODED_LEN]);
        Ok(Self {
            primary: i32::from_be_bytes(primary),
            secondary: i32::from_be_bytes(secondary),
        })
    }

    pub fn write_to<W: Write>(&self, out: &mut W) -> Result<(), CoreError> {
        out.write_all(&self.encode())?;
        Ok(())
    }

    /// Reads one key from `input`. Returns `Ok(None)` on a clean end of
    /// stream and `MalformedEncoding` when the stream ends mid-key.
    pub fn read_from<R: Read>(input: &mut R) -> Result<Option<Self>, CoreError> {
        let mut buf = [0u8; Self::ENCODED_LEN];
        let mut filled = 0;
        while filled < buf.len() {
            match input.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(err) if err.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(err.into()),
            }
        }
        match filled {
            0 => Ok(None),
            _ => Self::decode(&buf[..filled]).map(Some),
        }
    }
}

/// Orders two encoded keys the same way `Ord` orders the decoded keys.
///
/// Big-endian two's complement bytes do not sort like the logical order
/// (negative values and the descending secondary both break a plain byte
/// comparison), so both sides are decoded first.
pub fn compare_encoded(a: &[u8], b: &[u8]) -> Result<Ordering, CoreError> {
    Ok(CompositeKey::decode(a)?.cmp(&CompositeKey::decode(b)?))
}

impl Ord for CompositeKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.primary
            .cmp(&other.primary)
            .then_with(|| other.secondary.cmp(&self.secondary))
    }
}

impl PartialOrd for CompositeKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for CompositeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.primary, self.secondary)
    }
}

/// Parses `primary [secondary]`; a missing secondary is 0 and any further
/// tokens are ignored.
impl FromStr for CompositeKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut fields = s.split_whitespace();
        let primary = fields
            .next()
            .ok_or_else(|| "missing primary field".to_string())?
            .parse::<i32>()
            .map_err(|err| format!("primary field: {err}"))?;
        let secondary = match fields.next() {
            Some(field) => field
                .parse::<i32>()
                .map_err(|err| format!("secondary field: {err}"))?,
            None => 0,
        };
        Ok(Self { primary, secondary })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    fn hash_of(key: &CompositeKey) -> u64 {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn secondary_breaks_ties_descending() {
        let a = CompositeKey::new(1, 5);
        let b = CompositeKey::new(1, 3);
        assert_eq!(a.cmp(&b), Ordering::Greater);
        assert_eq!(b.cmp(&a), Ordering::Less);
    }

    #[test]
    fn primary_dominates() {
        assert_eq!(
            CompositeKey::new(1, 3).cmp(&CompositeKey::new(2, 1)),
            Ordering::Less
        );
        assert_eq!(
            CompositeKey::new(-1, i32::MIN).cmp(&CompositeKey::new(0, i32::MAX)),
            Ordering::Less
        );
    }

    #[test]
    fn equality_matches_ordering_and_hash() {
        let a = CompositeKey::new(7, -2);
        let b = CompositeKey::new(7, -2);
        let c = CompositeKey::new(7, 2);
        assert_eq!(a, b);
        assert_eq!(a.cmp(&b), Ordering::Equal);
        assert_eq!(hash_of(&a), hash_of(&b));
        assert_ne!(a, c);
        assert_ne!(a.cmp(&c), Ordering::Equal);
    }

    #[test]
    fn extremes_do_not_overflow() {
        let low = CompositeKey::new(i32::MIN, 0);
        let high = CompositeKey::new(i32::MAX, 0);
        assert!(low < high);
        assert!(CompositeKey::new(0, i32::MAX) < CompositeKey::new(0, i32::MIN));
    }

    #[test]
    fn sorts_the_sample_pairs() {
        let mut keys: Vec<CompositeKey> = ["3 3", "3 1", "3 2", "2 1", "2 2", "1 1"]
            .iter()
            .map(|line| line.parse().unwrap())
            .collect();
        keys.sort();
        let rendered: Vec<String> = keys.iter().map(|k| k.to_string()).collect();
        assert_eq!(rendered, ["1->1", "2->2", "2->1", "3->3", "3->2", "3->1"]);
    }

    #[test]
    fn encoding_is_big_endian_and_fixed_width() {
        let key = CompositeKey::new(1, -1);
        assert_eq!(key.encode(), [0, 0, 0, 1, 0xff, 0xff, 0xff, 0xff]);
        for key in [
            CompositeKey::new(0, 0),
            CompositeKey::new(i32::MIN, i32::MAX),
            CompositeKey::new(-42, 17),
        ] {
            assert_eq!(CompositeKey::decode(&key.encode()).unwrap(), key);
        }
    }

    #[test]
    fn short_input_is_malformed() {
        let err = CompositeKey::decode(&[0, 0, 0, 1, 0]).unwrap_err();
        assert!(matches!(
            err,
            CoreError::MalformedEncoding { expected: 8, actual: 5 }
        ));
    }

    #[test]
    fn encoded_comparison_agrees_with_ord() {
        let keys = [
            CompositeKey::new(-3, 4),
            CompositeKey::new(-3, -4),
            CompositeKey::new(0, 0),
            CompositeKey::new(2, 9),
            CompositeKey::new(2, -9),
        ];
        for a in &keys {
            for b in &keys {
                assert_eq!(compare_encoded(&a.encode(), &b.encode()).unwrap(), a.cmp(b));
            }
        }
    }

    #[test]
    fn stream_round_trip() {
        let keys = [CompositeKey::new(3, 1), CompositeKey::new(-5, 8)];
        let mut buf = Vec::new();
        for key in &keys {
            key.write_to(&mut buf).unwrap();
        }
        let mut cursor = std::io::Cursor::new(buf);
        assert_eq!(CompositeKey::read_from(&mut cursor).unwrap(), Some(keys[0]));
        assert_eq!(CompositeKey::read_from(&mut cursor).unwrap(), Some(keys[1]));
        assert_eq!(CompositeKey::read_from(&mut cursor).unwrap(), None);

        let mut truncated = std::io::Cursor::new(vec![0u8, 1, 2]);
        assert!(CompositeKey::read_from(&mut truncated).is_err());
    }

    #[test]
    fn parse_defaults_missing_secondary() {
        assert_eq!("4".parse::<CompositeKey>().unwrap(), CompositeKey::new(4, 0));
        assert_eq!(
            " 4   9 extra".parse::<CompositeKey>().unwrap(),
            CompositeKey::new(4, 9)
        );
        assert!("".parse::<CompositeKey>().is_err());
        assert!("x 1".parse::<CompositeKey>().is_err());
    }
}
