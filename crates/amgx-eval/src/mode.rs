//! AMGX mode tags.
//!
//! A mode selects the memory space (host or device) and the precision of
//! the matrix and vectors. The tag reads `<space><matrix><vector><index>`,
//! e.g. `dDDI` is device memory, double matrix, double vectors, int indices.

use std::ffi::c_int;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::AmgxError;

/// Precision/storage mode passed to solver, matrix and vector creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum Mode {
    #[serde(rename = "hDDI")]
    HostDDI,
    #[serde(rename = "hDFI")]
    HostDFI,
    #[serde(rename = "hFFI")]
    HostFFI,
    #[default]
    #[serde(rename = "dDDI")]
    DeviceDDI,
    #[serde(rename = "dDFI")]
    DeviceDFI,
    #[serde(rename = "dFFI")]
    DeviceFFI,
}

impl Mode {
    pub const ALL: [Mode; 6] = [
        Mode::HostDDI,
        Mode::HostDFI,
        Mode::HostFFI,
        Mode::DeviceDDI,
        Mode::DeviceDFI,
        Mode::DeviceFFI,
    ];

    /// The `AMGX_Mode` enumerator value.
    pub fn as_raw(self) -> c_int {
        match self {
            Mode::HostDDI => 8192,
            Mode::HostDFI => 8448,
            Mode::HostFFI => 8464,
            Mode::DeviceDDI => 8193,
            Mode::DeviceDFI => 8449,
            Mode::DeviceFFI => 8465,
        }
    }

    /// Short tag as used in AMGX's enumerator names (`AMGX_mode_<tag>`).
    pub fn tag(self) -> &'static str {
        match self {
            Mode::HostDDI => "hDDI",
            Mode::HostDFI => "hDFI",
            Mode::HostFFI => "hFFI",
            Mode::DeviceDDI => "dDDI",
            Mode::DeviceDFI => "dDFI",
            Mode::DeviceFFI => "dFFI",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Mode {
    type Err = AmgxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.strip_prefix("AMGX_mode_").unwrap_or(s);
        Mode::ALL
            .into_iter()
            .find(|mode| mode.tag() == tag)
            .ok_or_else(|| AmgxError::UnknownMode(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_device_double() {
        assert_eq!(Mode::default(), Mode::DeviceDDI);
        assert_eq!(Mode::default().as_raw(), 8193);
    }

    #[test]
    fn test_parse_tags() {
        assert_eq!("hDDI".parse::<Mode>().unwrap(), Mode::HostDDI);
        assert_eq!("dFFI".parse::<Mode>().unwrap(), Mode::DeviceFFI);
        assert_eq!("AMGX_mode_dDFI".parse::<Mode>().unwrap(), Mode::DeviceDFI);
    }

    #[test]
    fn test_parse_is_case_sensitive() {
        // hddi is not a valid AMGX tag
        assert!(matches!(
            "hddi".parse::<Mode>(),
            Err(AmgxError::UnknownMode(tag)) if tag == "hddi"
        ));
    }

    #[test]
    fn test_tag_round_trip_and_values() {
        for mode in Mode::ALL {
            assert_eq!(mode.to_string().parse::<Mode>().unwrap(), mode);
        }
        // Host modes differ from their device twin only in the lowest bit.
        assert_eq!(Mode::HostDFI.as_raw() | 1, Mode::DeviceDFI.as_raw());
        assert_eq!(Mode::HostFFI.as_raw() | 1, Mode::DeviceFFI.as_raw());
    }
}
