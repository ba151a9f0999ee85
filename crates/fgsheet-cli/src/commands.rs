// SPDX-License-Identifier: AGPL-3.0-or-later
//! File-level commands around the core conversion

use crate::config::Configuration;
use fgsheet_core::{
    Extractor, ExtractorExt, FguExtractor, HtmlRenderer, RendererExt, SheetError,
};
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Upload limit used when none is configured (16 MiB)
pub const DEFAULT_MAX_SIZE: u64 = 16 * 1024 * 1024;

/// Output name used when the character has no usable name
pub const FALLBACK_FILENAME: &str = "character_sheet.html";

#[derive(Debug, Error)]
pub enum CliError {
    #[error("File must be XML format: {0}")]
    NotXml(PathBuf),

    #[error("File too large: {path} exceeds the {limit} byte limit")]
    TooLarge { path: PathBuf, limit: u64 },

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid configuration file {path}: {source}")]
    Config {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Core errors are forwarded with their message unchanged
    #[error(transparent)]
    Sheet(#[from] SheetError),
}

pub type Result<T> = std::result::Result<T, CliError>;

/// Reject anything without a `.xml` extension (case-insensitive)
pub fn ensure_xml_extension(path: &Path) -> Result<()> {
    let is_xml = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("xml"));
    if is_xml {
        Ok(())
    } else {
        Err(CliError::NotXml(path.to_path_buf()))
    }
}

/// Read an export, enforcing the extension check and the size limit
pub fn load_export(path: &Path, max_size: u64) -> Result<Vec<u8>> {
    ensure_xml_extension(path)?;

    let read_err = |source| CliError::Read {
        path: path.to_path_buf(),
        source,
    };
    let file = File::open(path).map_err(read_err)?;
    let declared = file.metadata().map_err(read_err)?.len();
    if declared > max_size {
        return Err(CliError::TooLarge {
            path: path.to_path_buf(),
            limit: max_size,
        });
    }

    // The file may grow between the metadata call and the read
    let mut bytes = Vec::new();
    file.take(max_size.saturating_add(1))
        .read_to_end(&mut bytes)
        .map_err(read_err)?;
    if bytes.len() as u64 > max_size {
        return Err(CliError::TooLarge {
            path: path.to_path_buf(),
            limit: max_size,
        });
    }

    debug!(path = %path.display(), bytes = bytes.len(), "loaded export");
    Ok(bytes)
}

/// Safe file name for a character's sheet
///
/// Keeps alphanumerics, spaces, underscores and hyphens. Falls back to
/// `character_sheet.html` when nothing usable remains.
pub fn output_filename(character_name: Option<&str>) -> String {
    let cleaned: String = character_name
        .unwrap_or_default()
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '_' | '-'))
        .collect();
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        FALLBACK_FILENAME.to_string()
    } else {
        format!("{cleaned}.html")
    }
}

/// Where to write the sheet
///
/// No output means the current directory; an existing directory gets the
/// derived file name; anything else is used as the file path.
pub fn resolve_output(output: Option<&Path>, filename: &str) -> PathBuf {
    match output {
        None => PathBuf::from(filename),
        Some(dir) if dir.is_dir() => dir.join(filename),
        Some(file) => file.to_path_buf(),
    }
}

/// Result of converting one export
#[derive(Debug, Clone)]
pub struct Conversion {
    pub character_name: Option<String>,
    pub filename: String,
    pub html: String,
}

/// Load and convert one export file
pub fn convert_file(input: &Path, max_size: u64, config: &Configuration) -> Result<Conversion> {
    let bytes = load_export(input, max_size)?;
    let rendered = fgsheet_core::convert(&bytes, &config.extract, &config.render)?;
    let filename = output_filename(rendered.character_name.as_deref());
    info!(
        input = %input.display(),
        source = FguExtractor::new().source_name(),
        character = rendered.character_name.as_deref().unwrap_or("<unnamed>"),
        "converted export"
    );
    Ok(Conversion {
        character_name: rendered.character_name,
        filename,
        html: rendered.html,
    })
}

/// Write a converted sheet and return the path written
pub fn write_sheet(conversion: &Conversion, output: Option<&Path>) -> Result<PathBuf> {
    let path = resolve_output(output, &conversion.filename);
    std::fs::write(&path, conversion.html.as_bytes()).map_err(|source| CliError::Write {
        path: path.clone(),
        source,
    })?;
    info!(path = %path.display(), "wrote character sheet");
    Ok(path)
}

/// Convert one export and stream the sheet into `writer`
///
/// Returns the character's display name.
pub fn print_sheet<W: Write>(
    input: &Path,
    max_size: u64,
    config: &Configuration,
    writer: &mut W,
) -> Result<Option<String>> {
    let bytes = load_export(input, max_size)?;
    let extractor = FguExtractor::new();
    let character = extractor.extract(&bytes, &config.extract)?;
    HtmlRenderer::new().render_writer(&character, writer, &config.render)?;
    debug!(source = extractor.source_name(), "streamed character sheet");
    Ok(character.display_name().map(str::to_string))
}

/// Extract an export and serialise the character model as pretty JSON
pub fn dump_json(input: &Path, max_size: u64, config: &Configuration) -> Result<String> {
    let bytes = load_export(input, max_size)?;
    let character = FguExtractor::new().extract_reader(bytes.as_slice(), &config.extract)?;
    Ok(serde_json::to_string_pretty(&character)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    const EXPORT: &str = r#"<root><character><name>Vex'ahlia / the Bold</name><skilllist/></character></root>"#;

    fn write_file(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_output_filename() {
        assert_eq!(output_filename(Some("Vex'ahlia / the Bold")), "Vexahlia  the Bold.html");
        assert_eq!(output_filename(Some("Sir_Reginald-III")), "Sir_Reginald-III.html");
        assert_eq!(output_filename(Some("../../")), FALLBACK_FILENAME);
        assert_eq!(output_filename(Some("   ")), FALLBACK_FILENAME);
        assert_eq!(output_filename(None), FALLBACK_FILENAME);
    }

    #[test]
    fn test_extension_check() {
        assert!(ensure_xml_extension(Path::new("hero.XML")).is_ok());
        assert!(matches!(
            ensure_xml_extension(Path::new("hero.json")),
            Err(CliError::NotXml(_))
        ));
        assert!(ensure_xml_extension(Path::new("hero")).is_err());
    }

    #[test]
    fn test_size_limit() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "big.xml", EXPORT);
        assert!(matches!(
            load_export(&path, 10),
            Err(CliError::TooLarge { limit: 10, .. })
        ));
        assert_eq!(load_export(&path, DEFAULT_MAX_SIZE).unwrap().len(), EXPORT.len());
    }

    #[test]
    fn test_convert_and_write() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "vex.xml", EXPORT);
        let conversion = convert_file(&path, DEFAULT_MAX_SIZE, &Configuration::default()).unwrap();
        assert_eq!(conversion.filename, "Vexahlia  the Bold.html");

        let written = write_sheet(&conversion, Some(dir.path())).unwrap();
        assert_eq!(written, dir.path().join("Vexahlia  the Bold.html"));
        let html = std::fs::read_to_string(written).unwrap();
        assert!(html.starts_with("<!DOCTYPE html>"));
    }

    #[test]
    fn test_core_error_forwarded_verbatim() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "npc.xml", "<root><npc/></root>");
        let err = convert_file(&path, DEFAULT_MAX_SIZE, &Configuration::default()).unwrap_err();
        assert_eq!(err.to_string(), "Malformed input: No character data found in XML");
    }

    #[test]
    fn test_print_sheet_matches_written_sheet() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "vex.xml", EXPORT);
        let config = Configuration::default();
        let mut out = Vec::new();
        let name = print_sheet(&path, DEFAULT_MAX_SIZE, &config, &mut out).unwrap();
        assert_eq!(name.as_deref(), Some("Vex'ahlia / the Bold"));

        let conversion = convert_file(&path, DEFAULT_MAX_SIZE, &config).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), conversion.html);
    }

    #[test]
    fn test_dump_json() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "vex.xml", EXPORT);
        let json = dump_json(&path, DEFAULT_MAX_SIZE, &Configuration::default()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["name"], "Vex'ahlia / the Bold");
    }

    #[test]
    fn test_resolve_output_to_file() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("custom.html");
        assert_eq!(resolve_output(Some(&target), "ignored.html"), target);
        assert_eq!(resolve_output(None, "a.html"), PathBuf::from("a.html"));
    }
}
