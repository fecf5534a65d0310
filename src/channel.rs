//! Chat channel categories and presentation modifiers.
//!
//! Both types are plain integer bitmasks with named compile-time constants.
//! On the wire they serialise as the raw integer so clients written against
//! the game's channel table decode them without a lookup.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign};
use std::str::FromStr;

// ---------------------------------------------------------------------------
// ChannelSet
// ---------------------------------------------------------------------------

/// A set of chat channels.
///
/// `NONE` is the zero value. A send never carries `NONE` combined with other
/// bits in any meaningful way; an empty intersection means "do not send".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelSet(u32);

impl ChannelSet {
    pub const NONE: Self = Self(0);
    pub const OOC: Self = Self(1 << 0);
    pub const GHOST: Self = Self(1 << 1);
    pub const BINARY: Self = Self(1 << 2);
    pub const SUPPLY: Self = Self(1 << 3);
    pub const CENT_COMM: Self = Self(1 << 4);
    pub const COMMAND: Self = Self(1 << 5);
    pub const COMMON: Self = Self(1 << 6);
    pub const ENGINEERING: Self = Self(1 << 7);
    pub const MEDICAL: Self = Self(1 << 8);
    pub const SCIENCE: Self = Self(1 << 9);
    pub const SECURITY: Self = Self(1 << 10);
    pub const SERVICE: Self = Self(1 << 11);
    pub const SYNDICATE: Self = Self(1 << 12);
    pub const LOCAL: Self = Self(1 << 13);
    pub const COMBAT: Self = Self(1 << 14);
    pub const WARNING: Self = Self(1 << 15);
    pub const SYSTEM: Self = Self(1 << 16);
    pub const EXAMINE: Self = Self(1 << 17);
    pub const ACTION: Self = Self(1 << 18);
    pub const ADMIN: Self = Self(1 << 19);

    /// Channels delivered to every reachable recipient regardless of their
    /// subscription mask.
    pub const ALWAYS_DELIVER: Self = Self(
        Self::LOCAL.0 | Self::COMBAT.0 | Self::ACTION.0 | Self::EXAMINE.0 | Self::SYSTEM.0,
    );

    /// Channels subject to range and line-of-sight filtering.
    pub const LOCALITY_SCOPED: Self = Self(Self::LOCAL.0 | Self::COMBAT.0 | Self::ACTION.0);

    /// Channels written to the audit log without a bracketed channel label.
    pub const UNLABELED: Self = Self(
        Self::EXAMINE.0 | Self::LOCAL.0 | Self::NONE.0 | Self::SYSTEM.0 | Self::COMBAT.0,
    );

    /// Every named bit, in ascending bit order, with its display name.
    pub const NAMED: [(Self, &'static str); 20] = [
        (Self::OOC, "OOC"),
        (Self::GHOST, "Ghost"),
        (Self::BINARY, "Binary"),
        (Self::SUPPLY, "Supply"),
        (Self::CENT_COMM, "CentComm"),
        (Self::COMMAND, "Command"),
        (Self::COMMON, "Common"),
        (Self::ENGINEERING, "Engineering"),
        (Self::MEDICAL, "Medical"),
        (Self::SCIENCE, "Science"),
        (Self::SECURITY, "Security"),
        (Self::SERVICE, "Service"),
        (Self::SYNDICATE, "Syndicate"),
        (Self::LOCAL, "Local"),
        (Self::COMBAT, "Combat"),
        (Self::WARNING, "Warning"),
        (Self::SYSTEM, "System"),
        (Self::EXAMINE, "Examine"),
        (Self::ACTION, "Action"),
        (Self::ADMIN, "Admin"),
    ];

    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// `true` if every bit of `other` is set in `self`.
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// `true` if `self` and `other` share at least one bit.
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    /// `true` if every bit of `self` is set in `other`.
    pub const fn is_subset_of(self, other: Self) -> bool {
        self.0 & other.0 == self.0
    }

    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    pub const fn intersection(self, other: Self) -> Self {
        Self(self.0 & other.0)
    }

    pub const fn difference(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }

    /// Iterate the named channels present in this set.
    pub fn iter(self) -> impl Iterator<Item = (ChannelSet, &'static str)> {
        Self::NAMED
            .into_iter()
            .filter(move |(flag, _)| self.contains(*flag))
    }
}

impl BitOr for ChannelSet {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

impl BitOrAssign for ChannelSet {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for ChannelSet {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        self.intersection(rhs)
    }
}

impl BitAndAssign for ChannelSet {
    fn bitand_assign(&mut self, rhs: Self) {
        self.0 &= rhs.0;
    }
}

/// Renders as comma-separated channel names (`"Local, OOC"`), or `"None"`
/// for the empty set. Bits without a name render as their hex value.
impl fmt::Display for ChannelSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("None");
        }

        let mut first = true;
        for (_, name) in self.iter() {
            if !first {
                f.write_str(", ")?;
            }
            f.write_str(name)?;
            first = false;
        }

        let unnamed = Self::NAMED
            .iter()
            .fold(*self, |rest, (flag, _)| rest.difference(*flag));
        if !unnamed.is_empty() {
            if !first {
                f.write_str(", ")?;
            }
            write!(f, "{:#x}", unnamed.0)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown chat channel '{0}'")]
pub struct UnknownChannel(pub String);

/// Parses the [`Display`](fmt::Display) rendering back into a set.
/// Names are matched case-insensitively and may be separated by `,` or `|`.
impl FromStr for ChannelSet {
    type Err = UnknownChannel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut set = Self::NONE;
        for token in s.split([',', '|']).map(str::trim).filter(|t| !t.is_empty()) {
            if token.eq_ignore_ascii_case("none") {
                continue;
            }
            let (flag, _) = Self::NAMED
                .iter()
                .find(|(_, name)| name.eq_ignore_ascii_case(token))
                .ok_or_else(|| UnknownChannel(token.to_string()))?;
            set |= *flag;
        }
        Ok(set)
    }
}

// ---------------------------------------------------------------------------
// ChatModifiers
// ---------------------------------------------------------------------------

/// Presentation flags attached to a message (whispering, yelling, …).
///
/// The relay never inspects these; they are forwarded to clients verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatModifiers(u32);

impl ChatModifiers {
    pub const NONE: Self = Self(0);
    pub const WHISPER: Self = Self(1 << 0);
    pub const YELL: Self = Self(1 << 1);
    pub const QUESTION: Self = Self(1 << 2);
    pub const EXCLAIM: Self = Self(1 << 3);
    pub const EMOTE: Self = Self(1 << 4);
    pub const SING: Self = Self(1 << 5);
    pub const DRUNK: Self = Self(1 << 6);
    pub const STUTTER: Self = Self(1 << 7);
    pub const HISS: Self = Self(1 << 8);
    pub const CLOWN: Self = Self(1 << 9);

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for ChatModifiers {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}
