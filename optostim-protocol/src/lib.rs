//! Serial protocol for the optostim LED array
//!
//! Text, line-based, in both directions.
//!
//! # Host to device
//!
//! One command per line, either a single letter or `<letter>:<integer>`:
//!
//! ```text
//! S        start the experiment from block 0
//! X        stop everything
//! M        manual mode
//! O / F    all LEDs on / off
//! N        next block
//! B:<n>    start block n
//! ```
//!
//! # Device to host
//!
//! ```text
//! data\t<ms>\t<label>\t<value>
//! [TIME]: <ms> [LOG|DEBUG|ERROR]: <text>
//! ```

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod command;
pub mod line;
pub mod record;

pub use command::{Command, CommandError};
pub use line::{Line, LineBuffer, MAX_LINE_LEN};
pub use record::{format_message, format_record, OutputLine, MAX_OUTPUT_LEN};
