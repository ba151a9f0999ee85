// SPDX-License-Identifier: AGPL-3.0-or-later
//! FGSheet CLI - converts Fantasy Grounds exports on disk
//!
//! The host side of the conversion: extension and size checks, output file
//! naming, configuration loading. The core crate does the rest.

pub mod commands;
pub mod config;

pub use commands::{
    convert_file, dump_json, output_filename, print_sheet, write_sheet, CliError,
};
pub use config::{Arguments, Configuration};
