// SPDX-License-Identifier: AGPL-3.0-or-later
//! FGSheet Core - Fantasy Grounds character exports to printable HTML
//!
//! This crate provides:
//! - A normalized character model independent of the export's tree shape
//! - Extractor and renderer traits with a Fantasy Grounds Unity extractor
//! - An HTML renderer built on a typed document tree that escapes by construction
//!
//! Both stages are pure functions of their input; hosts bound input size and
//! handle file or network I/O.

pub mod dom;
pub mod formats;
pub mod markup;
pub mod model;
pub mod rules;
pub mod traits;
pub mod tree;

pub use formats::{FguExtractor, HtmlRenderer};
pub use markup::Markup;
pub use model::{AbilityKey, Character, Coin, ResourcePool, Spell};
pub use traits::{
    ExtractConfig, Extractor, ExtractorExt, RenderConfig, Renderer, RendererExt, Result,
    SheetError,
};

/// A rendered sheet together with the name it was rendered for
#[derive(Debug, Clone)]
pub struct Rendered {
    /// Trimmed character name, if the export has one
    pub character_name: Option<String>,
    pub html: String,
}

/// Convert raw export bytes into an HTML sheet
pub fn convert(
    input: &[u8],
    extract_config: &ExtractConfig,
    render_config: &RenderConfig,
) -> Result<Rendered> {
    let character = FguExtractor::new().extract(input, extract_config)?;
    let html = HtmlRenderer::new().render(&character, render_config)?;
    Ok(Rendered {
        character_name: character.display_name().map(str::to_string),
        html,
    })
}
