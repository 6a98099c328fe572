//! adcman-rest: management API client for ADC appliances
//!
//! Implements the adcman-state device traits against the appliance's
//! iControl-style HTTPS management interface.

pub mod client;
pub mod dns;
pub mod partition;
pub mod ucs;

pub use client::{DeviceClient, DeviceConfig};
