use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Role carried by a tenant membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    PlatformAdmin,
    NgoAdmin,
    NgoStaff,
    Vendor,
    Donor,
}

impl Role {
    pub const ALL: [Self; 5] = [
        Self::PlatformAdmin,
        Self::NgoAdmin,
        Self::NgoStaff,
        Self::Vendor,
        Self::Donor,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PlatformAdmin => "PLATFORM_ADMIN",
            Self::NgoAdmin => "NGO_ADMIN",
            Self::NgoStaff => "NGO_STAFF",
            Self::Vendor => "VENDOR",
            Self::Donor => "DONOR",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| UnknownRole(s.to_owned()))
    }
}
