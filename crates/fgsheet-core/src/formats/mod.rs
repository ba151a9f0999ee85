// SPDX-License-Identifier: AGPL-3.0-or-later
//! Source extractors and output renderers

pub mod fgu;
pub mod html;

pub use fgu::FguExtractor;
pub use html::HtmlRenderer;
