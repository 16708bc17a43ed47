//! Configuration validation.

use accessledger_smtp::types::Address;

use super::Config;

/// Longest accepted idle window (one week).
pub const MAX_IDLE_WINDOW_SECS: u64 = 7 * 24 * 60 * 60;

/// Validation error for service configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// API path is empty, relative or ends with `/`.
    InvalidApiPath,
    /// User path is empty, relative or ends with `/`.
    InvalidUserPath,
    /// System root is empty.
    EmptyRoot,
    /// System root ends with `/`.
    RootTrailingSlash,
    /// Server address is empty.
    EmptyServerAddress,
    /// SMTP relay is not `host:port`.
    InvalidSmtpServer,
    /// SMTP identity is empty.
    EmptySmtpIdentity,
    /// SMTP identity contains whitespace or control characters.
    InvalidSmtpIdentity,
    /// SMTP sender address is invalid.
    InvalidSmtpFrom,
    /// SMTP recipient address is invalid.
    InvalidSmtpTo,
    /// Idle window is zero.
    ZeroIdleWindow,
    /// Idle window is longer than [`MAX_IDLE_WINDOW_SECS`].
    IdleWindowTooLarge,
    /// Queue capacity is zero.
    ZeroQueueCapacity,
}

impl ValidationError {
    /// Get human-readable error message.
    #[must_use]
    pub const fn message(&self) -> &'static str {
        match self {
            Self::InvalidApiPath | Self::InvalidUserPath => {
                "url paths must start with '/' and may not end in '/'"
            }
            Self::EmptyRoot => "system root is required",
            Self::RootTrailingSlash => "system paths may not end in '/'",
            Self::EmptyServerAddress => "listen address is required",
            Self::InvalidSmtpServer => "SMTP server must be host:port",
            Self::EmptySmtpIdentity => "SMTP identity is required",
            Self::InvalidSmtpIdentity => {
                "SMTP identity may not contain spaces or control characters"
            }
            Self::InvalidSmtpFrom => "invalid sender address",
            Self::InvalidSmtpTo => "invalid recipient address",
            Self::ZeroIdleWindow => "idle window must be at least one second",
            Self::IdleWindowTooLarge => "idle window may not exceed one week",
            Self::ZeroQueueCapacity => "queue capacity must be at least 1",
        }
    }

    /// Get the field name this error relates to.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::InvalidApiPath => "paths.api",
            Self::InvalidUserPath => "paths.user",
            Self::EmptyRoot | Self::RootTrailingSlash => "system.root",
            Self::EmptyServerAddress => "server.address",
            Self::InvalidSmtpServer => "smtp.server",
            Self::EmptySmtpIdentity | Self::InvalidSmtpIdentity => "smtp.identity",
            Self::InvalidSmtpFrom => "smtp.from",
            Self::InvalidSmtpTo => "smtp.to",
            Self::ZeroIdleWindow | Self::IdleWindowTooLarge => "audit.idleWindowSecs",
            Self::ZeroQueueCapacity => "audit.queueCapacity",
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field(), self.message())
    }
}

impl std::error::Error for ValidationError {}

/// Result of validating a configuration.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// Validate a configuration.
///
/// Returns `Ok(())` if valid, or `Err(Vec<ValidationError>)` with all errors.
/// Nothing is corrected.
///
/// # Errors
///
/// Returns a vector of `ValidationError` if any fields are invalid.
pub fn validate_config(config: &Config) -> ValidationResult {
    let mut errors = Vec::new();

    if !is_valid_url_path(&config.paths.api) {
        errors.push(ValidationError::InvalidApiPath);
    }
    if !is_valid_url_path(&config.paths.user) {
        errors.push(ValidationError::InvalidUserPath);
    }

    if config.system.root.is_empty() {
        errors.push(ValidationError::EmptyRoot);
    } else if config.system.root.ends_with('/') {
        errors.push(ValidationError::RootTrailingSlash);
    }

    if config.server.address.trim().is_empty() {
        errors.push(ValidationError::EmptyServerAddress);
    }

    if !is_host_port(&config.smtp.server) {
        errors.push(ValidationError::InvalidSmtpServer);
    }
    if config.smtp.identity.trim().is_empty() {
        errors.push(ValidationError::EmptySmtpIdentity);
    } else if config
        .smtp
        .identity
        .chars()
        .any(|c| c.is_control() || c.is_whitespace())
    {
        errors.push(ValidationError::InvalidSmtpIdentity);
    }
    if Address::new(config.smtp.from.as_str()).is_err() {
        errors.push(ValidationError::InvalidSmtpFrom);
    }
    if Address::new(config.smtp.to.as_str()).is_err() {
        errors.push(ValidationError::InvalidSmtpTo);
    }

    if config.audit.idle_window_secs == 0 {
        errors.push(ValidationError::ZeroIdleWindow);
    } else if config.audit.idle_window_secs > MAX_IDLE_WINDOW_SECS {
        errors.push(ValidationError::IdleWindowTooLarge);
    }
    if config.audit.queue_capacity == 0 {
        errors.push(ValidationError::ZeroQueueCapacity);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn is_valid_url_path(path: &str) -> bool {
    path.starts_with('/') && !path.ends_with('/')
}

fn is_host_port(server: &str) -> bool {
    server
        .rsplit_once(':')
        .is_some_and(|(host, port)| !host.is_empty() && port.parse::<u16>().is_ok_and(|p| p > 0))
}

/// Basic email validation.
pub(crate) fn is_valid_email(email: &str) -> bool {
    let email = email.trim();

    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };

    // Exactly one @
    if domain.contains('@') {
        return false;
    }

    if local.is_empty() {
        return false;
    }

    // Domain must contain at least one dot and no empty labels
    if domain.is_empty() || !domain.contains('.') {
        return false;
    }

    !domain.split('.').any(str::is_empty)
}
