//! Device identifier normalisation

use std::fmt;
use std::str::FromStr;

use crate::error::IdentifierError;

/// Minimum digit count of a usable device identifier
pub const MIN_DEVICE_ID_DIGITS: usize = 12;

/// Digits-only device identifier (IMEI)
///
/// Only constructed through [`DeviceId::normalize`], so every value holds at
/// least [`MIN_DEVICE_ID_DIGITS`] ASCII digits.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "String", into = "String"))]
pub struct DeviceId(String);

impl DeviceId {
    /// Strip everything but ASCII digits and check the length
    pub fn normalize(raw: &str) -> Result<Self, IdentifierError> {
        let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
        if digits.len() < MIN_DEVICE_ID_DIGITS {
            return Err(IdentifierError::TooShort {
                raw: raw.to_string(),
                digits: digits.len(),
                min: MIN_DEVICE_ID_DIGITS,
            });
        }
        Ok(Self(digits))
    }

    /// Get the digits
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for DeviceId {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::normalize(s)
    }
}

impl TryFrom<String> for DeviceId {
    type Error = IdentifierError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::normalize(&value)
    }
}

impl From<DeviceId> for String {
    fn from(id: DeviceId) -> Self {
        id.0
    }
}
