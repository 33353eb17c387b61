use crate::sample_set::SampleSet;
use crate::LoadError;

/// Trait defining the interface for format-specific sample-set parsers.
///
/// Implementors parse the description of a tiling problem (samples,
/// symmetries, adjacencies) from some text format.
pub trait FormatParser {
    /// Parses file content into a [`SampleSet`].
    fn parse(&self, content: &str) -> Result<SampleSet, LoadError>;

    /// Returns a descriptive name for this parser format, used in logs and
    /// error messages.
    fn format_name(&self) -> &'static str;
}
