//! Product flavors
//!
//! The small-footprint runtime (`srt`) collapses most instance groups into
//! `control`; the full runtime (`cf`) keeps them separate.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which runtime product is under test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductFlavor {
    /// Full runtime, product name `cf`
    Ert,
    /// Small footprint runtime, product name `srt`
    Srt,
}

impl ProductFlavor {
    /// Both flavors
    pub const ALL: [Self; 2] = [Self::Ert, Self::Srt];

    /// Product name passed to `om stage-product`
    #[inline]
    #[must_use]
    pub const fn product_name(self) -> &'static str {
        match self {
            Self::Ert => "cf",
            Self::Srt => "srt",
        }
    }

    /// Flavor for a product name; anything other than `srt` is the full runtime
    #[must_use]
    pub fn from_product_name(name: &str) -> Self {
        if name.trim() == "srt" {
            Self::Srt
        } else {
            Self::Ert
        }
    }
}

impl fmt::Display for ProductFlavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.product_name())
    }
}

impl FromStr for ProductFlavor {
    type Err = FlavorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "cf" | "ert" => Ok(Self::Ert),
            "srt" => Ok(Self::Srt),
            other => Err(FlavorError(other.to_string())),
        }
    }
}

/// Unrecognised flavor name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown product flavor: '{0}' (expected cf, ert or srt)")]
pub struct FlavorError(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn product_name_maps_to_flavor() {
        assert_eq!(ProductFlavor::from_product_name("srt"), ProductFlavor::Srt);
        assert_eq!(ProductFlavor::from_product_name("cf"), ProductFlavor::Ert);
        assert_eq!(ProductFlavor::from_product_name("anything"), ProductFlavor::Ert);
    }

    #[test]
    fn parse_is_strict() {
        assert_eq!("ert".parse::<ProductFlavor>(), Ok(ProductFlavor::Ert));
        assert_eq!("srt".parse::<ProductFlavor>(), Ok(ProductFlavor::Srt));
        assert!("pas".parse::<ProductFlavor>().is_err());
    }

    #[test]
    fn display_is_product_name() {
        assert_eq!(ProductFlavor::Srt.to_string(), "srt");
        assert_eq!(ProductFlavor::Ert.to_string(), "cf");
    }
}
