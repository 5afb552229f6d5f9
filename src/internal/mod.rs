//! Internal Implementation Details
//!
//! This module contains implementation details that are not part of the public API.
//! Types in this module may change without notice between minor versions.
//!
//! # Contents
//!
//! - [`constants`]: Default limits and magic numbers
//! - [`descriptor_bits`]: Descriptor control word bit field constants
//! - [`ring`]: Fixed-capacity circular queue used by the completion reporter
//!
//! # Stability
//!
//! **WARNING:** This module is `pub(crate)` only. Do not depend on any types
//! or functions in this module from external code. They are subject to change
//! without notice.

pub(crate) mod constants;
pub(crate) mod descriptor_bits;
pub(crate) mod ring;
