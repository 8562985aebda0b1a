// Copyright 2022 TiKV Project Authors. Licensed under Apache-2.0.

use byteorder::{BigEndian, ByteOrder, WriteBytesExt};

use super::error::{Error, Result};
use super::{Coder, LogicalKey, Round};

/// Width of the kind/epoch lead-in at the head of every raw key.
pub const PREFIX_LEN: usize = 4;
/// Width of the big-endian revision suffix.
pub const REVISION_LEN: usize = 8;
/// Reserved byte between the path and the revision suffix. Sorts below
/// `/`, so a path's revisions sort between its index key and any child
/// path. Must never appear inside a path.
pub const SEPARATOR: u8 = b'$';

const DEFAULT_PREFIX: [u8; PREFIX_LEN] = [0x57, 0xfb, 0x80, 0x8b];
const SENTINEL_SUFFIX: [u8; REVISION_LEN] = [0; REVISION_LEN];

/// The epoch-"normal" coder. A plain immutable value; safe to share
/// across workers without locking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalCoder {
    prefix: [u8; PREFIX_LEN],
}

impl NormalCoder {
    pub const fn new() -> NormalCoder {
        NormalCoder {
            prefix: DEFAULT_PREFIX,
        }
    }

    /// A coder with a caller-chosen lead-in, for stores that shard one
    /// engine into several keyspaces.
    pub const fn with_prefix(prefix: [u8; PREFIX_LEN]) -> NormalCoder {
        NormalCoder { prefix }
    }

    pub fn prefix(&self) -> &[u8] {
        &self.prefix
    }

    fn strip_prefix<'a>(&self, raw: &'a [u8]) -> Result<&'a [u8]> {
        if raw.len() < PREFIX_LEN {
            return Err(Error::KeyLength);
        }
        if raw[..PREFIX_LEN] != self.prefix {
            return Err(Error::KeyPrefix);
        }
        Ok(&raw[PREFIX_LEN..])
    }

    fn check_path(path: &[u8]) -> Result<()> {
        if path.is_empty() {
            return Err(Error::EmptyPath);
        }
        if let Some(i) = path.iter().position(|&b| b == SEPARATOR) {
            return Err(Error::AmbiguousPath(i));
        }
        Ok(())
    }
}

impl Default for NormalCoder {
    fn default() -> NormalCoder {
        NormalCoder::new()
    }
}

impl Coder for NormalCoder {
    fn encode(&self, key: &LogicalKey) -> Result<Vec<u8>> {
        NormalCoder::check_path(key.path())?;
        let path = key.path();
        let mut raw = Vec::with_capacity(PREFIX_LEN + path.len() + 1 + REVISION_LEN);
        raw.extend_from_slice(&self.prefix);
        raw.extend_from_slice(path);
        if let LogicalKey::Revisioned { revision, .. } = key {
            if *revision == 0 {
                return Err(Error::ReservedRevision);
            }
            raw.push(SEPARATOR);
            // Writes to a Vec cannot fail.
            raw.write_u64::<BigEndian>(*revision).unwrap();
        }
        Ok(raw)
    }

    fn decode(&self, raw: &[u8]) -> Result<LogicalKey> {
        let rest = self.strip_prefix(raw)?;
        let sep = match rest.iter().position(|&b| b == SEPARATOR) {
            None => {
                if rest.is_empty() {
                    return Err(Error::KeyLength);
                }
                return Ok(LogicalKey::index(rest));
            }
            Some(i) => i,
        };
        if sep == 0 {
            return Err(Error::EmptyPath);
        }
        if rest.len() < sep + 1 + REVISION_LEN {
            // Truncated revision suffix.
            return Err(Error::KeyLength);
        }
        if rest.len() > sep + 1 + REVISION_LEN {
            return Err(Error::KeySeparator);
        }
        let revision = BigEndian::read_u64(&rest[sep + 1..]);
        if revision == 0 {
            return Err(Error::Sentinel);
        }
        Ok(LogicalKey::revisioned(&rest[..sep], revision))
    }

    fn is_boundary_safe(&self, raw: &[u8]) -> bool {
        let rest = match self.strip_prefix(raw) {
            Ok(rest) => rest,
            Err(_) => return false,
        };
        if rest.is_empty() {
            return false;
        }
        !rest.contains(&SEPARATOR) || self.is_range_sentinel(raw)
    }

    fn is_range_sentinel(&self, raw: &[u8]) -> bool {
        let rest = match self.strip_prefix(raw) {
            Ok(rest) => rest,
            Err(_) => return false,
        };
        match rest.iter().position(|&b| b == SEPARATOR) {
            Some(sep) => {
                sep > 0
                    && rest.len() == sep + 1 + REVISION_LEN
                    && rest[sep + 1..] == SENTINEL_SUFFIX
            }
            None => false,
        }
    }

    fn next_prefix_sentinel(&self, prefix: &[u8]) -> Result<Vec<u8>> {
        let mut next = prefix.to_vec();
        while let Some(&last) = next.last() {
            if last == 0xff {
                next.pop();
            } else {
                *next.last_mut().unwrap() = last + 1;
                return Ok(next);
            }
        }
        Err(Error::PrefixOverflow)
    }

    fn adjust_to_safe_boundary(&self, raw: &[u8], round: Round) -> Result<Vec<u8>> {
        let rest = self.strip_prefix(raw)?;
        let sep = match rest.iter().position(|&b| b == SEPARATOR) {
            // A bare path is already a valid cut; the bare lead-in is the
            // keyspace floor.
            None => return Ok(raw.to_vec()),
            Some(i) => i,
        };
        if self.is_range_sentinel(raw) {
            return Ok(raw.to_vec());
        }
        // The cut falls inside the revision run of `rest[..sep]`. Round to
        // the group's floor, or just past the whole group. Rounding up
        // deliberately skips the group's own floor sentinel: a cut there
        // would still separate the index key from its revisions.
        let mut adjusted = Vec::with_capacity(PREFIX_LEN + sep + 1);
        adjusted.extend_from_slice(&self.prefix);
        adjusted.extend_from_slice(&rest[..sep]);
        if round == Round::Up {
            adjusted.push(SEPARATOR + 1);
        }
        Ok(adjusted)
    }

    fn encode_range_start(&self, path: &[u8]) -> Result<Vec<u8>> {
        NormalCoder::check_path(path)?;
        let mut raw = Vec::with_capacity(PREFIX_LEN + path.len() + 1 + REVISION_LEN);
        raw.extend_from_slice(&self.prefix);
        raw.extend_from_slice(path);
        raw.push(SEPARATOR);
        raw.extend_from_slice(&SENTINEL_SUFFIX);
        Ok(raw)
    }

    fn encode_range_end(&self, path: &[u8]) -> Result<Vec<u8>> {
        NormalCoder::check_path(path)?;
        let next = self.next_prefix_sentinel(path)?;
        let mut raw = Vec::with_capacity(PREFIX_LEN + next.len() + 1 + REVISION_LEN);
        raw.extend_from_slice(&self.prefix);
        raw.extend_from_slice(&next);
        raw.push(SEPARATOR);
        raw.extend_from_slice(&SENTINEL_SUFFIX);
        Ok(raw)
    }
}

#[cfg(test)]
mod tests {
    use rand::{Rng, SeedableRng};

    use super::*;

    fn coder() -> NormalCoder {
        NormalCoder::new()
    }

    fn raw(parts: &[&[u8]]) -> Vec<u8> {
        let mut out = DEFAULT_PREFIX.to_vec();
        for p in parts {
            out.extend_from_slice(p);
        }
        out
    }

    #[test]
    fn test_encode_decode() {
        let c = coder();
        let cases = vec![
            (LogicalKey::index(&b"/a"[..]), raw(&[b"/a"])),
            (
                LogicalKey::index(&b"/registry/test/pods/default/x"[..]),
                raw(&[b"/registry/test/pods/default/x"]),
            ),
            (
                LogicalKey::revisioned(&b"/a"[..], 1),
                raw(&[b"/a", &[SEPARATOR, 0, 0, 0, 0, 0, 0, 0, 1]]),
            ),
            (
                LogicalKey::revisioned(&b"/a"[..], 0x0102030405060708),
                raw(&[b"/a", &[SEPARATOR, 1, 2, 3, 4, 5, 6, 7, 8]]),
            ),
            (
                LogicalKey::revisioned(&b"/a"[..], u64::MAX),
                raw(&[b"/a", &[SEPARATOR], &[0xff; 8]]),
            ),
        ];
        for (key, expected) in cases {
            let encoded = c.encode(&key).unwrap();
            assert_eq!(encoded, expected);
            assert_eq!(c.decode(&encoded).unwrap(), key);
        }
    }

    #[test]
    fn test_encode_fail() {
        let c = coder();
        assert_eq!(c.encode(&LogicalKey::index(&b""[..])), Err(Error::EmptyPath));
        assert_eq!(
            c.encode(&LogicalKey::index(&b"/a$b"[..])),
            Err(Error::AmbiguousPath(2))
        );
        assert_eq!(
            c.encode(&LogicalKey::revisioned(&b"/a"[..], 0)),
            Err(Error::ReservedRevision)
        );
    }

    #[test]
    fn test_decode_fail() {
        let c = coder();
        let cases: Vec<(Vec<u8>, Error)> = vec![
            (vec![], Error::KeyLength),
            (vec![0x57, 0xfb], Error::KeyLength),
            (vec![1, 2, 3, 4, b'/', b'a'], Error::KeyPrefix),
            (DEFAULT_PREFIX.to_vec(), Error::KeyLength),
            (raw(&[&[SEPARATOR, 0, 0, 0, 0, 0, 0, 0, 1]]), Error::EmptyPath),
            // Truncated revision suffix.
            (raw(&[b"/a", &[SEPARATOR, 0, 0]]), Error::KeyLength),
            (raw(&[b"/a", &[SEPARATOR]]), Error::KeyLength),
            // Trailing bytes after the suffix.
            (
                raw(&[b"/a", &[SEPARATOR, 0, 0, 0, 0, 0, 0, 0, 1], b"x"]),
                Error::KeySeparator,
            ),
            // The floor sentinel is not a logical key.
            (
                raw(&[b"/a", &[SEPARATOR, 0, 0, 0, 0, 0, 0, 0, 0]]),
                Error::Sentinel,
            ),
        ];
        for (input, expected) in cases {
            assert_eq!(c.decode(&input), Err(expected), "input: {:?}", input);
        }
    }

    #[test]
    fn test_encoded_order() {
        let c = coder();
        // Index key, floor sentinel, revisions in numeric order, the
        // rounded-up group bound, children, then the next sibling.
        let ordered = vec![
            c.encode(&LogicalKey::index(&b"/r/a"[..])).unwrap(),
            c.encode_range_start(b"/r/a").unwrap(),
            c.encode(&LogicalKey::revisioned(&b"/r/a"[..], 1)).unwrap(),
            c.encode(&LogicalKey::revisioned(&b"/r/a"[..], 2)).unwrap(),
            c.encode(&LogicalKey::revisioned(&b"/r/a"[..], 256)).unwrap(),
            raw(&[b"/r/a", &[SEPARATOR + 1]]),
            c.encode(&LogicalKey::index(&b"/r/a/child"[..])).unwrap(),
            c.encode(&LogicalKey::index(&b"/r/b"[..])).unwrap(),
        ];
        for pair in ordered.windows(2) {
            assert!(pair[0] < pair[1], "{:?} !< {:?}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_next_prefix_sentinel() {
        let c = coder();
        let cases: Vec<(Vec<u8>, Result<Vec<u8>>)> = vec![
            (vec![1, 2, 3], Ok(vec![1, 2, 4])),
            (vec![1, 0xff], Ok(vec![2])),
            (vec![1, 2, 0xff, 0xff], Ok(vec![1, 3])),
            (vec![0xff], Err(Error::PrefixOverflow)),
            (vec![0xff, 0xff, 0xff], Err(Error::PrefixOverflow)),
            (vec![], Err(Error::PrefixOverflow)),
        ];
        for (input, expected) in cases {
            assert_eq!(c.next_prefix_sentinel(&input), expected);
        }
    }

    #[test]
    fn test_range_bounds() {
        let c = coder();
        let start = c.encode_range_start(b"/registry/test/").unwrap();
        let end = c.encode_range_end(b"/registry/test/").unwrap();
        assert_eq!(
            start,
            raw(&[b"/registry/test/", &[SEPARATOR], &[0; 8]])
        );
        assert_eq!(end, raw(&[b"/registry/test0", &[SEPARATOR], &[0; 8]]));
        assert!(c.is_range_sentinel(&start));
        assert!(c.is_range_sentinel(&end));

        // Every key under the path falls inside [start, end).
        for key in [
            c.encode(&LogicalKey::index(&b"/registry/test/pods"[..])).unwrap(),
            c.encode(&LogicalKey::revisioned(&b"/registry/test/pods"[..], 7)).unwrap(),
            c.encode(&LogicalKey::index(&b"/registry/test/zzz"[..])).unwrap(),
        ] {
            assert!(start < key && key < end, "key: {:?}", key);
        }
        assert!(c.encode(&LogicalKey::index(&b"/registry/tesu"[..])).unwrap() > end);
    }

    #[test]
    fn test_boundary_safety() {
        let c = coder();
        let index = c.encode(&LogicalKey::index(&b"/r/a"[..])).unwrap();
        let rev = c.encode(&LogicalKey::revisioned(&b"/r/a"[..], 5)).unwrap();
        let sentinel = c.encode_range_start(b"/r/a").unwrap();
        let truncated = raw(&[b"/r/a", &[SEPARATOR, 0, 0, 1]]);

        assert!(c.is_boundary_safe(&index));
        assert!(c.is_boundary_safe(&sentinel));
        assert!(!c.is_boundary_safe(&rev));
        assert!(!c.is_boundary_safe(&truncated));
        assert!(!c.is_boundary_safe(&DEFAULT_PREFIX));
        assert!(!c.is_boundary_safe(b"/r/a"));

        // Safe keys decode or are recognized sentinels.
        for key in [&index, &sentinel] {
            assert!(c.is_boundary_safe(key));
            assert!(c.decode(key).is_ok() || c.is_range_sentinel(key));
        }
    }

    #[test]
    fn test_adjust_to_safe_boundary() {
        let c = coder();
        let index = c.encode(&LogicalKey::index(&b"/r/a"[..])).unwrap();
        let rev = c.encode(&LogicalKey::revisioned(&b"/r/a"[..], 5)).unwrap();
        let sentinel = c.encode_range_start(b"/r/a").unwrap();
        let truncated = raw(&[b"/r/a", &[SEPARATOR, 0, 0, 1]]);
        let group_end = raw(&[b"/r/a", &[SEPARATOR + 1]]);

        // Safe inputs are fixed points.
        assert_eq!(c.adjust_to_safe_boundary(&index, Round::Down).unwrap(), index);
        assert_eq!(c.adjust_to_safe_boundary(&index, Round::Up).unwrap(), index);
        assert_eq!(
            c.adjust_to_safe_boundary(&sentinel, Round::Down).unwrap(),
            sentinel
        );

        // A cut inside a revision run rounds to the group floor or past
        // the whole group, never between the index key and a revision.
        assert_eq!(c.adjust_to_safe_boundary(&rev, Round::Down).unwrap(), index);
        assert_eq!(c.adjust_to_safe_boundary(&rev, Round::Up).unwrap(), group_end);
        assert_eq!(
            c.adjust_to_safe_boundary(&truncated, Round::Down).unwrap(),
            index
        );
        assert_eq!(
            c.adjust_to_safe_boundary(&truncated, Round::Up).unwrap(),
            group_end
        );

        assert_eq!(
            c.adjust_to_safe_boundary(b"no-prefix", Round::Down),
            Err(Error::KeyPrefix)
        );

        // Idempotence.
        for key in [&index, &rev, &sentinel, &truncated] {
            for round in [Round::Down, Round::Up] {
                let once = c.adjust_to_safe_boundary(key, round).unwrap();
                let twice = c.adjust_to_safe_boundary(&once, round).unwrap();
                assert_eq!(once, twice);
                assert!(c.is_boundary_safe(&once));
            }
        }
    }

    #[test]
    fn test_round_trip_random() {
        let c = coder();
        let mut rng = rand::rngs::StdRng::seed_from_u64(0x5eed);
        let alphabet = b"abcdefghijklmnopqrstuvwxyz0123456789-./";
        for _ in 0..512 {
            let len = rng.gen_range(1..64);
            let path: Vec<u8> = (0..len)
                .map(|_| alphabet[rng.gen_range(0..alphabet.len())])
                .collect();
            let key = if rng.gen_bool(0.5) {
                LogicalKey::index(path)
            } else {
                LogicalKey::revisioned(path, rng.gen_range(1..=u64::MAX))
            };
            let encoded = c.encode(&key).unwrap();
            assert_eq!(c.decode(&encoded).unwrap(), key);
        }

        // Same path: raw keys sort by revision.
        for _ in 0..128 {
            let (a, b) = (rng.gen_range(1..=u64::MAX), rng.gen_range(1..=u64::MAX));
            let ka = c.encode(&LogicalKey::revisioned(&b"/p"[..], a)).unwrap();
            let kb = c.encode(&LogicalKey::revisioned(&b"/p"[..], b)).unwrap();
            assert_eq!(a.cmp(&b), ka.cmp(&kb));
        }
    }
}
