use crate::formats::{FormatParser, RonFormatParser};
use crate::sample_set::SampleSet;
use crate::LoadError;
use log::info;
use std::fs;
use std::path::Path;

/// Loads a sample set from a file, choosing the parser by extension.
///
/// Only `.ron` files are currently understood.
pub fn load_from_file(path: &Path) -> Result<SampleSet, LoadError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    let parser: &dyn FormatParser = match extension.as_deref() {
        Some("ron") => &RonFormatParser,
        other => {
            return Err(LoadError::InvalidData(format!(
                "Unsupported sample file extension: {}",
                other.unwrap_or("<none>")
            )))
        }
    };
    let content = fs::read_to_string(path)?;
    let set = parser.parse(&content)?;
    info!(
        "Loaded {} sample set from {}",
        parser.format_name(),
        path.display()
    );
    Ok(set)
}
