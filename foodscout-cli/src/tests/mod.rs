//! Shared test harness modules for the foodscout CLI.
#![expect(
    clippy::panic,
    reason = "Tests assert panic branches to surface unexpected CLI outcomes"
)]

use super::*;

mod find_unit;
mod helpers;
mod inspect_unit;
