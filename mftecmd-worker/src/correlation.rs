//! Pairing change-journal inputs with the master file table.
//!
//! MFTECmd resolves parent paths in `$J` records when given the `$MFT` of
//! the same volume via `-m`.

use crate::core::InputFile;
use std::path::Path;

/// Display names under which the change journal arrives.
pub const JOURNAL_ALIASES: &[&str] = &["$UsnJrnl%3A$J", "$J", "UsnJrnl-J"];

/// Display name of the master file table.
pub const MFT_NAME: &str = "$MFT";

/// Returns true if `display_name` is a change-journal alias.
#[must_use]
pub fn is_journal(display_name: &str) -> bool {
    JOURNAL_ALIASES.contains(&display_name)
}

/// Returns the first `$MFT` input in the batch.
#[must_use]
pub fn find_mft(inputs: &[InputFile]) -> Option<&InputFile> {
    inputs.iter().find(|f| f.is_named(MFT_NAME))
}

/// Returns the `$MFT` path to enrich `file` with, if any.
///
/// `batch` must be the full original input set, not only the eligible
/// files. Non-journal inputs never correlate.
#[must_use]
pub fn correlate<'a>(file: &InputFile, batch: &'a [InputFile]) -> Option<&'a Path> {
    if !is_journal(&file.display_name) {
        return None;
    }
    find_mft(batch).map(InputFile::path)
}
