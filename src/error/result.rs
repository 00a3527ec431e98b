//! Result type alias.

use super::uistream_error::UiStreamError;

/// Type alias for Results using [`UiStreamError`].
pub type UiStreamResult<T> = Result<T, UiStreamError>;
