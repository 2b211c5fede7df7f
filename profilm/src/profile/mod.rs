//! Profile record boundary: the immutable input the renderer consumes.

/// The deserialized profile record and its validation.
pub mod record;
