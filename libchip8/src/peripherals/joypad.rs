use std::collections::BTreeMap;

use crate::error::InputError;

pub const KEY_COUNT: usize = 16;

/// One conventional layout of the hex keypad on a QWERTY keyboard:
///
/// ```text
/// 1 2 3 4      1 2 3 C
/// q w e r  ->  4 5 6 D
/// a s d f      7 8 9 E
/// z x c v      A 0 B F
/// ```
pub const KEY_MAP: [(char, u8); KEY_COUNT] = [
    ('1', 0x1),
    ('2', 0x2),
    ('3', 0x3),
    ('4', 0xc),
    ('q', 0x4),
    ('w', 0x5),
    ('e', 0x6),
    ('r', 0xd),
    ('a', 0x7),
    ('s', 0x8),
    ('d', 0x9),
    ('f', 0xe),
    ('z', 0xa),
    ('x', 0x0),
    ('c', 0xb),
    ('v', 0xf),
];

/// Advisory mapping from host key symbols to keypad indices. The VM never
/// consults it.
pub fn key_map() -> BTreeMap<char, u8> {
    KEY_MAP.into_iter().collect()
}

/// Latch of the 16 keys, replaced as a whole by the caller.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Keypad {
    keys: [bool; KEY_COUNT],
}

impl Keypad {
    pub fn set_keys(&mut self, keys: &[bool]) -> Result<(), InputError> {
        let keys: [bool; KEY_COUNT] = keys
            .try_into()
            .map_err(|_| InputError::WrongLength { len: keys.len() })?;

        self.keys = keys;
        Ok(())
    }

    /// Key indices outside 0..16 are never down.
    pub fn is_down(&self, key: u8) -> bool {
        self.keys.get(key as usize).copied().unwrap_or(false)
    }

    /// Lowest-numbered key currently held.
    pub fn first_down(&self) -> Option<u8> {
        self.keys.iter().position(|down| *down).map(|k| k as u8)
    }

    pub fn keys(&self) -> [bool; KEY_COUNT] {
        self.keys
    }

    /// Bit k set means key k is down.
    pub(crate) fn to_bits(self) -> u16 {
        self.keys
            .iter()
            .enumerate()
            .fold(0, |acc, (k, down)| acc | (*down as u16) << k)
    }

    pub(crate) fn from_bits(bits: u16) -> Self {
        Self {
            keys: std::array::from_fn(|k| bits & (1 << k) != 0),
        }
    }
}
