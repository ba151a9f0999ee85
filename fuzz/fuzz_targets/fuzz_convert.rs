// SPDX-License-Identifier: AGPL-3.0-or-later
#![no_main]

use fgsheet_core::{convert, ExtractConfig, RenderConfig};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let _ = convert(data, &ExtractConfig::default(), &RenderConfig::default());
});
