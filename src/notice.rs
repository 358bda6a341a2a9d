use std::time::Duration;

/// Transient user-facing message, auto-dismissed by the shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Success(String),
    Error(String),
}

const SUCCESS_TIMEOUT: Duration = Duration::from_secs(3);
const ERROR_TIMEOUT: Duration = Duration::from_secs(5);

impl Notice {
    pub fn text(&self) -> &str {
        match self {
            Notice::Success(s) | Notice::Error(s) => s,
        }
    }

    /// How long the shell should keep this notice on screen.
    pub fn timeout(&self) -> Duration {
        match self {
            Notice::Success(_) => SUCCESS_TIMEOUT,
            Notice::Error(_) => ERROR_TIMEOUT,
        }
    }
}

/// Invalid user input: reported, state left unchanged, operation aborted.
///
/// Preconditions that are simply not met yet (no image loaded) are not
/// rejections — those operations silently no-op instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    TooManyStops,
    TooFewStops,
    InvalidColor,
    UnsupportedImage,
}

impl Rejection {
    pub fn message(self) -> &'static str {
        match self {
            Rejection::TooManyStops => "Maximum 10 gradient stops allowed",
            Rejection::TooFewStops => "Minimum 2 gradient stops required",
            Rejection::InvalidColor => "Not a valid color",
            Rejection::UnsupportedImage => "File is not a supported image",
        }
    }
}

impl From<Rejection> for Notice {
    fn from(r: Rejection) -> Self {
        Notice::Error(r.message().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::{Notice, Rejection};

    #[test]
    fn errors_stay_on_screen_longer_than_successes() {
        let ok = Notice::Success("done".into());
        let err = Notice::from(Rejection::TooManyStops);
        assert!(err.timeout() > ok.timeout());
    }

    #[test]
    fn rejection_converts_to_error_notice() {
        let n = Notice::from(Rejection::TooFewStops);
        assert!(matches!(n, Notice::Error(_)));
        assert_eq!(n.text(), "Minimum 2 gradient stops required");
    }
}
