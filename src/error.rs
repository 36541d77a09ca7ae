//! # Configuration Error Types
//!
//! Startup-time failures raised while validating extension and translator
//! declarations. Every variant names the offending implementation and the rule
//! it violated. None of them are retryable: a registry or chain that fails
//! validation is never constructed.

use crate::taxonomy::{TypeCategory, TypeKey, TypeRef};
use thiserror::Error;

/// Declaration validation failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error(
        "Illegal {extension_point} type \"{implementation}\": it does not specify the type argument of \"{extension_point}\""
    )]
    MissingTypeParameter {
        implementation: String,
        extension_point: String,
    },

    #[error(
        "Illegal {extension_point} type \"{implementation}\": its declared type \"{declared}\" {reason}"
    )]
    InvalidTargetType {
        implementation: String,
        extension_point: String,
        declared: String,
        reason: String,
    },

    #[error(
        "Illegal failure translator type \"{implementation}\": its declared type \"{declared}\" {reason}"
    )]
    InvalidTranslatorType {
        implementation: String,
        declared: String,
        reason: String,
    },

    #[error(
        "Illegal failure translator type \"{implementation}\": its declared type \"{declared}\" is too general, please specify a more specific failure type"
    )]
    TooGeneralType {
        implementation: String,
        declared: TypeKey,
    },
}

impl ConfigurationError {
    /// Create a missing type parameter error
    pub fn missing_type_parameter(
        implementation: impl Into<String>,
        extension_point: impl Into<String>,
    ) -> Self {
        Self::MissingTypeParameter {
            implementation: implementation.into(),
            extension_point: extension_point.into(),
        }
    }

    /// Target type is parameterized or a type variable
    pub fn non_class_target(
        implementation: impl Into<String>,
        extension_point: impl Into<String>,
        declared: &TypeRef,
    ) -> Self {
        Self::InvalidTargetType {
            implementation: implementation.into(),
            extension_point: extension_point.into(),
            declared: declared.to_string(),
            reason: "is not a non-generic named type".to_string(),
        }
    }

    /// Target type resolves outside the entity / mapped superclass families
    pub fn target_outside_taxonomy(
        implementation: impl Into<String>,
        extension_point: impl Into<String>,
        declared: &TypeKey,
        category: TypeCategory,
    ) -> Self {
        Self::InvalidTargetType {
            implementation: implementation.into(),
            extension_point: extension_point.into(),
            declared: declared.to_string(),
            reason: format!(
                "is classified as {category:?}, expected an entity or mapped superclass"
            ),
        }
    }

    /// Translator type is parameterized or a type variable
    pub fn non_class_translator(implementation: impl Into<String>, declared: &TypeRef) -> Self {
        Self::InvalidTranslatorType {
            implementation: implementation.into(),
            declared: declared.to_string(),
            reason: "is not a non-generic named type".to_string(),
        }
    }

    /// Translator type is not a failure type
    pub fn not_a_failure(
        implementation: impl Into<String>,
        declared: &TypeKey,
        category: TypeCategory,
    ) -> Self {
        Self::InvalidTranslatorType {
            implementation: implementation.into(),
            declared: declared.to_string(),
            reason: format!("is classified as {category:?}, expected a failure type"),
        }
    }

    /// Translator type is one of the failure roots
    pub fn too_general(implementation: impl Into<String>, declared: TypeKey) -> Self {
        Self::TooGeneralType {
            implementation: implementation.into(),
            declared,
        }
    }

    /// Name of the implementation whose declaration was rejected
    pub fn implementation(&self) -> &str {
        match self {
            Self::MissingTypeParameter { implementation, .. }
            | Self::InvalidTargetType { implementation, .. }
            | Self::InvalidTranslatorType { implementation, .. }
            | Self::TooGeneralType { implementation, .. } => implementation,
        }
    }
}

pub type ConfigurationResult<T> = std::result::Result<T, ConfigurationError>;
