//! Best-effort GPU environment probing.
//!
//! Everything here shells out to vendor tools (`rocm-smi`, `nvidia-smi`) or
//! reads install metadata. Every probe is optional: a missing tool, a
//! non-zero exit, unparsable output or a timeout all collapse to `None`, so
//! callers never fail because telemetry was unavailable.

pub mod command;
pub mod device;
pub mod telemetry;

pub use command::{run_with_timeout, ProbeError};
pub use device::{
    device_name_from_smi, parse_rocm_product_name, parse_rocm_smi_version, rocm_version,
    rocm_version_from_install,
};
pub use telemetry::{
    parse_celsius, temperature_probe, NoTemperature, SmiTemperatureProbe, TemperatureProbe,
};
