/// Crate-wide error type.
///
/// Failures are grouped by where they originate: bad caller input, the video
/// encode path, the audio path, or internal contract violations. Audio errors
/// are the only recoverable class; the session downgrades them to a silent
/// output instead of failing the render.
#[derive(Debug, thiserror::Error)]
pub enum ProfilmError {
    /// Malformed or unusable caller input (profile record, paths, config).
    #[error("input error: {message}")]
    Input {
        /// Human-readable description.
        message: String,
    },

    /// Video encoding failed (spawn, pipe, exit status, stalled consumer).
    #[error("encode error: {message}")]
    Encode {
        /// Human-readable description.
        message: String,
    },

    /// Audio synthesis or muxing failed. Recoverable: callers fall back to
    /// the silent video track.
    #[error("audio error: {message}")]
    Audio {
        /// Human-readable description.
        message: String,
    },

    /// Internal invariant or configuration contract violated.
    #[error("validation error: {message}")]
    Validation {
        /// Human-readable description.
        message: String,
    },

    /// Wrapped I/O failure with context.
    #[error("io error: {message}: {source}")]
    Io {
        /// What was being attempted.
        message: String,
        /// Underlying OS error.
        #[source]
        source: std::io::Error,
    },

    /// Any other failure.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ProfilmError {
    /// Build a [`ProfilmError::Input`] from any displayable message.
    pub fn input(message: impl Into<String>) -> Self {
        Self::Input { message: message.into() }
    }

    /// Build a [`ProfilmError::Encode`] from any displayable message.
    pub fn encode(message: impl Into<String>) -> Self {
        Self::Encode { message: message.into() }
    }

    /// Build a [`ProfilmError::Audio`] from any displayable message.
    pub fn audio(message: impl Into<String>) -> Self {
        Self::Audio { message: message.into() }
    }

    /// Build a [`ProfilmError::Validation`] from any displayable message.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation { message: message.into() }
    }

    /// Build a [`ProfilmError::Io`] wrapping an OS error.
    pub fn io(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io { message: message.into(), source }
    }

    /// Return `true` for the recoverable audio class.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Audio { .. })
    }
}

/// Convenience alias used across the crate.
pub type ProfilmResult<T> = Result<T, ProfilmError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn audio_is_the_only_recoverable_class() {
        assert!(ProfilmError::audio("x").is_recoverable());
        assert!(!ProfilmError::input("x").is_recoverable());
        assert!(!ProfilmError::encode("x").is_recoverable());
        assert!(!ProfilmError::validation("x").is_recoverable());
    }

    #[test]
    fn display_includes_class_prefix() {
        let e = ProfilmError::encode("ffmpeg exited with status 1");
        assert!(e.to_string().starts_with("encode error:"));
    }
}
