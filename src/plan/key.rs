//! Premium activation keys (`PINPIN-XXXX-XXXX-XXXX`).

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use thiserror::Error;

/// Fixed first group of every key.
pub const KEY_PREFIX: &str = "PINPIN";

const GROUP_COUNT: usize = 3;
const GROUP_LEN: usize = 4;
const KEY_CHARS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Input did not match `PINPIN-XXXX-XXXX-XXXX`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid key format. Expected: PINPIN-XXXX-XXXX-XXXX")]
pub struct KeyFormatError;

/// A syntactically valid activation key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ActivationKey(String);

impl ActivationKey {
    /// Parse a key. Matching is exact: uppercase only, no surrounding spaces.
    ///
    /// ```
    /// use pinpin::plan::ActivationKey;
    ///
    /// assert!(ActivationKey::parse("PINPIN-AB12-CD34-EF56").is_ok());
    /// assert!(ActivationKey::parse("pinpin-ab12-cd34-ef56").is_err());
    /// ```
    pub fn parse(input: &str) -> Result<Self, KeyFormatError> {
        let mut parts = input.split('-');
        if parts.next() != Some(KEY_PREFIX) {
            return Err(KeyFormatError);
        }

        let groups: Vec<&str> = parts.collect();
        let valid = groups.len() == GROUP_COUNT
            && groups.iter().all(|g| {
                g.len() == GROUP_LEN
                    && g.bytes()
                        .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
            });
        if !valid {
            return Err(KeyFormatError);
        }

        Ok(Self(input.to_string()))
    }

    /// Generate a fresh random key.
    pub fn generate() -> Self {
        let mut rng = rand::rng();
        let groups: Vec<String> = (0..GROUP_COUNT)
            .map(|_| {
                (0..GROUP_LEN)
                    .map(|_| KEY_CHARS[rng.random_range(0..KEY_CHARS.len())] as char)
                    .collect()
            })
            .collect();
        Self(format!("{KEY_PREFIX}-{}", groups.join("-")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActivationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ActivationKey {
    type Err = KeyFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
