// SPDX-License-Identifier: AGPL-3.0-or-later
//! Extractor and Renderer traits, their configuration and errors

use crate::model::Character;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

/// Error type for extraction and rendering
#[derive(Debug, thiserror::Error)]
pub enum SheetError {
    /// The export has no character record under its root
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// The bytes are not a well-formed tree; carries the parser's diagnostic
    #[error("{0}")]
    Parse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<roxmltree::Error> for SheetError {
    fn from(err: roxmltree::Error) -> Self {
        SheetError::Parse(err.to_string())
    }
}

impl From<std::str::Utf8Error> for SheetError {
    fn from(err: std::str::Utf8Error) -> Self {
        SheetError::Parse(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SheetError>;

/// Configuration for extraction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    /// Text whose presence in a power's group label marks it as a spell
    pub spell_group_marker: String,
    /// Name of the power entry that tracks sorcery points
    pub sorcery_resource: String,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            spell_group_marker: "Spells".to_string(),
            sorcery_resource: "Sorcery Points".to_string(),
        }
    }
}

/// Configuration for rendering
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Prefix for the page title ("Character Sheet - Vex")
    pub title_prefix: String,
    /// Render spell level groups open instead of collapsed
    pub expand_spell_levels: bool,
    /// Embed the built-in stylesheet
    pub include_stylesheet: bool,
    /// Additional CSS appended after the built-in stylesheet
    pub extra_css: Option<String>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            title_prefix: "Character Sheet".to_string(),
            expand_spell_levels: false,
            include_stylesheet: true,
            extra_css: None,
        }
    }
}

/// Extractor trait: convert an export into the character model
pub trait Extractor: Send + Sync {
    /// Short name of the source format
    fn source_name(&self) -> &'static str;

    /// Build a Character from raw export bytes
    fn extract(&self, input: &[u8], config: &ExtractConfig) -> Result<Character>;
}

/// Renderer trait: convert the character model to a document
pub trait Renderer: Send + Sync {
    /// Media type of the produced document
    fn media_type(&self) -> &'static str;

    /// Render a Character to a string
    fn render(&self, character: &Character, config: &RenderConfig) -> Result<String>;
}

/// Extension trait for streaming operations (not dyn-compatible)
pub trait ExtractorExt: Extractor {
    /// Extract from a reader
    fn extract_reader<R: Read>(&self, reader: R, config: &ExtractConfig) -> Result<Character> {
        let mut input = Vec::new();
        let mut reader = reader;
        reader.read_to_end(&mut input)?;
        self.extract(&input, config)
    }
}

/// Extension trait for streaming operations (not dyn-compatible)
pub trait RendererExt: Renderer {
    /// Render to a writer
    fn render_writer<W: Write>(
        &self,
        character: &Character,
        writer: &mut W,
        config: &RenderConfig,
    ) -> Result<()> {
        let output = self.render(character, config)?;
        writer.write_all(output.as_bytes())?;
        Ok(())
    }
}

// Blanket implementations
impl<T: Extractor> ExtractorExt for T {}
impl<T: Renderer> RendererExt for T {}
