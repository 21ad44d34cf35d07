//! Identity backend error types

use std::fmt;

/// Errors that can occur when calling the identity backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityError {
    /// 401 - bad credentials or expired token
    Unauthorized { provider: String },
    /// The backend refused the request (duplicate account, weak password, ...)
    Rejected { provider: String, message: String },
    /// 429 Rate Limited
    RateLimited {
        provider: String,
        retry_after_secs: Option<u64>,
    },
    /// Connection failure
    NetworkError { provider: String, message: String },
    /// The call did not finish within the configured bound
    Timeout { provider: String, after_secs: u64 },
    /// Other HTTP errors
    HttpError {
        provider: String,
        status: u16,
        message: String,
    },
    /// Provider not configured (missing URL or API key)
    NotConfigured { provider: String },
}

impl IdentityError {
    /// Check if this is an authentication error
    pub fn is_auth_error(&self) -> bool {
        matches!(self, IdentityError::Unauthorized { .. })
    }

    /// Whether retrying the same request later might succeed
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            IdentityError::RateLimited { .. }
                | IdentityError::NetworkError { .. }
                | IdentityError::Timeout { .. }
        ) || matches!(self, IdentityError::HttpError { status, .. } if *status >= 500)
    }

    /// Get the provider name for this error
    pub fn provider_name(&self) -> &str {
        match self {
            IdentityError::Unauthorized { provider } => provider,
            IdentityError::Rejected { provider, .. } => provider,
            IdentityError::RateLimited { provider, .. } => provider,
            IdentityError::NetworkError { provider, .. } => provider,
            IdentityError::Timeout { provider, .. } => provider,
            IdentityError::HttpError { provider, .. } => provider,
            IdentityError::NotConfigured { provider } => provider,
        }
    }

    pub fn unauthorized(provider: impl Into<String>) -> Self {
        IdentityError::Unauthorized {
            provider: provider.into(),
        }
    }

    pub fn rejected(provider: impl Into<String>, message: impl Into<String>) -> Self {
        IdentityError::Rejected {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn rate_limited(provider: impl Into<String>, retry_after: Option<u64>) -> Self {
        IdentityError::RateLimited {
            provider: provider.into(),
            retry_after_secs: retry_after,
        }
    }

    pub fn network(provider: impl Into<String>, message: impl Into<String>) -> Self {
        IdentityError::NetworkError {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn timeout(provider: impl Into<String>, after_secs: u64) -> Self {
        IdentityError::Timeout {
            provider: provider.into(),
            after_secs,
        }
    }

    pub fn http(provider: impl Into<String>, status: u16, message: impl Into<String>) -> Self {
        IdentityError::HttpError {
            provider: provider.into(),
            status,
            message: message.into(),
        }
    }

    pub fn not_configured(provider: impl Into<String>) -> Self {
        IdentityError::NotConfigured {
            provider: provider.into(),
        }
    }
}

impl fmt::Display for IdentityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentityError::Unauthorized { provider } => {
                write!(f, "{}: invalid credentials or expired session", provider)
            }
            IdentityError::Rejected { provider, message } => {
                write!(f, "{}: {}", provider, message)
            }
            IdentityError::RateLimited {
                provider,
                retry_after_secs,
            } => {
                if let Some(secs) = retry_after_secs {
                    write!(f, "{}: rate limited, retry after {}s", provider, secs)
                } else {
                    write!(f, "{}: rate limited", provider)
                }
            }
            IdentityError::NetworkError { provider, message } => {
                write!(f, "{}: network error - {}", provider, message)
            }
            IdentityError::Timeout {
                provider,
                after_secs,
            } => {
                write!(f, "{}: no response after {}s", provider, after_secs)
            }
            IdentityError::HttpError {
                provider,
                status,
                message,
            } => {
                write!(f, "{}: HTTP {} - {}", provider, status, message)
            }
            IdentityError::NotConfigured { provider } => {
                write!(f, "{}: not configured", provider)
            }
        }
    }
}

impl std::error::Error for IdentityError {}
