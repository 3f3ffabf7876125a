//! Error types for hook execution

use thiserror::Error;

/// Errors raised while running interceptors and initializers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum HookError {
    /// An interceptor failed; the remaining interceptors were not run
    #[error("interceptor '{name}' failed: {message}")]
    Interceptor {
        /// Name of the failing interceptor
        name: String,
        /// What went wrong
        message: String,
    },

    /// A component initializer failed
    #[error("initializer '{name}' failed on component '{component}': {message}")]
    Initializer {
        /// Name of the failing initializer
        name: String,
        /// Client ID of the component being configured
        component: String,
        /// What went wrong
        message: String,
    },
}

impl HookError {
    /// Create an interceptor failure.
    pub fn interceptor(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Interceptor {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Create an initializer failure.
    pub fn initializer(
        name: impl Into<String>,
        component: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Initializer {
            name: name.into(),
            component: component.into(),
            message: message.into(),
        }
    }
}

/// Result type for hook execution.
pub type HookResult<T> = Result<T, HookError>;
