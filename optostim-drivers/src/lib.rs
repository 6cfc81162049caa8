//! Hardware driver implementations
//!
//! Concrete implementations of the optostim-core collaborator traits on
//! top of `embedded-hal` pins:
//!
//! - Single LED gate (active-low or active-high)
//! - LED bank mapping channel indices to gates

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod led;
