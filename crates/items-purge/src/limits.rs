//! Limits and well-known constants.

/// Maximum block nesting depth accepted by the parser.
///
/// The serializer walks blocks recursively, so this also bounds its stack use.
pub const MAX_NESTING_DEPTH: usize = 256;

/// Maximum size of a save file read into memory (256 MiB).
pub const MAX_INPUT_SIZE: usize = 256 * 1024 * 1024;

/// Default number of rotated backups kept beside the target file.
pub const DEFAULT_MAX_BACKUPS: usize = 10;

/// Reserved pile identifier the game uses for permanently deleted items.
pub const DELETED_PILE: &str = "PermanentlyDeletedItems";

/// Suffix of the temporary file written beside the target before it is
/// renamed into place.
pub const TEMP_SUFFIX: &str = ".tmp";
