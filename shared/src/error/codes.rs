//! Unified error codes for the SACCO back-office
//!
//! This module defines all error codes used across sacco-server and clients.
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 2xxx: Permission / role errors
//! - 3xxx: Member / contact-group errors
//! - 4xxx: Campaign errors
//! - 5xxx: Message / transport errors
//! - 8xxx: User errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values for efficient serialization
/// and cross-language compatibility (Rust, TypeScript, etc.)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Invalid request
    InvalidRequest = 5,
    /// Invalid format
    InvalidFormat = 6,
    /// Required field missing
    RequiredField = 7,

    // ==================== 1xxx: Auth ====================
    /// User is not authenticated
    NotAuthenticated = 1001,
    /// Invalid credentials (username/password)
    InvalidCredentials = 1002,
    /// Token has expired
    TokenExpired = 1003,
    /// Token is invalid
    TokenInvalid = 1004,
    /// Account is disabled
    AccountDisabled = 1005,

    // ==================== 2xxx: Permission ====================
    /// Permission denied
    PermissionDenied = 2001,
    /// Specific role required
    RoleRequired = 2002,
    /// Admin role required
    AdminRequired = 2003,

    /// Role not found
    RoleNotFound = 2101,
    /// Role name already exists
    RoleNameExists = 2102,
    /// Role is in use
    RoleInUse = 2103,
    /// Cannot modify/delete system role
    RoleIsSystem = 2104,

    /// Permission definition not found
    PermissionNotFound = 2201,
    /// Permission name already exists
    PermissionNameExists = 2202,
    /// Permission is referenced by one or more roles
    PermissionInUse = 2203,
    /// Cannot delete system permission
    PermissionIsSystem = 2204,

    /// Role assignment not found
    AssignmentNotFound = 2301,
    /// Role already assigned to user
    AssignmentExists = 2302,

    // ==================== 3xxx: Member / Group ====================
    /// Member not found
    MemberNotFound = 3001,
    /// Member number already exists
    MemberNumberExists = 3002,
    /// Member is inactive
    MemberInactive = 3003,

    /// Contact group not found
    GroupNotFound = 3101,
    /// Contact group name already exists
    GroupNameExists = 3102,
    /// Member already belongs to the group
    GroupMemberExists = 3103,

    // ==================== 4xxx: Campaign ====================
    /// Campaign not found
    CampaignNotFound = 4001,
    /// Campaign is in the wrong lifecycle state for the operation
    CampaignInvalidState = 4002,
    /// Campaign audience resolved to zero recipients
    CampaignNoRecipients = 4003,
    /// Campaign target specification is invalid
    CampaignTargetInvalid = 4004,

    // ==================== 5xxx: Message ====================
    /// Message not found
    MessageNotFound = 5001,
    /// Message transport failure
    TransportFailure = 5002,
    /// Phone number cannot be normalized
    InvalidPhoneNumber = 5003,

    // ==================== 8xxx: User ====================
    /// User not found
    UserNotFound = 8001,
    /// Username already exists
    UsernameExists = 8002,
    /// Cannot delete self
    UserCannotDeleteSelf = 8003,
    /// Cannot modify/delete system user
    UserIsSystem = 8004,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
    /// Operation timeout
    TimeoutError = 9004,
    /// Configuration error
    ConfigError = 9005,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Check if this is a success code
    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::Unknown => "An unknown error occurred",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::InvalidFormat => "Invalid format",
            ErrorCode::RequiredField => "Required field is missing",

            // Auth
            ErrorCode::NotAuthenticated => "User is not authenticated",
            ErrorCode::InvalidCredentials => "Invalid username or password",
            ErrorCode::TokenExpired => "Authentication token has expired",
            ErrorCode::TokenInvalid => "Authentication token is invalid",
            ErrorCode::AccountDisabled => "Account is disabled",

            // Permission
            ErrorCode::PermissionDenied => "Permission denied",
            ErrorCode::RoleRequired => "Specific role is required",
            ErrorCode::AdminRequired => "Administrator role is required",
            ErrorCode::RoleNotFound => "Role not found",
            ErrorCode::RoleNameExists => "Role name already exists",
            ErrorCode::RoleInUse => "Role is in use",
            ErrorCode::RoleIsSystem => "Cannot modify system role",
            ErrorCode::PermissionNotFound => "Permission not found",
            ErrorCode::PermissionNameExists => "Permission name already exists",
            ErrorCode::PermissionInUse => "Permission is referenced by one or more roles",
            ErrorCode::PermissionIsSystem => "Cannot delete system permission",
            ErrorCode::AssignmentNotFound => "Role assignment not found",
            ErrorCode::AssignmentExists => "Role is already assigned to the user",

            // Member / Group
            ErrorCode::MemberNotFound => "Member not found",
            ErrorCode::MemberNumberExists => "Member number already exists",
            ErrorCode::MemberInactive => "Member is inactive",
            ErrorCode::GroupNotFound => "Contact group not found",
            ErrorCode::GroupNameExists => "Contact group name already exists",
            ErrorCode::GroupMemberExists => "Member already belongs to the group",

            // Campaign
            ErrorCode::CampaignNotFound => "Campaign not found",
            ErrorCode::CampaignInvalidState => "Campaign is not in a dispatchable state",
            ErrorCode::CampaignNoRecipients => "Campaign audience resolved to zero recipients",
            ErrorCode::CampaignTargetInvalid => "Campaign target specification is invalid",

            // Message
            ErrorCode::MessageNotFound => "Message not found",
            ErrorCode::TransportFailure => "Message transport failure",
            ErrorCode::InvalidPhoneNumber => "Phone number cannot be normalized",

            // User
            ErrorCode::UserNotFound => "User not found",
            ErrorCode::UsernameExists => "Username already exists",
            ErrorCode::UserCannotDeleteSelf => "Cannot delete your own account",
            ErrorCode::UserIsSystem => "Cannot modify system user",

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::TimeoutError => "Operation timed out",
            ErrorCode::ConfigError => "Configuration error",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            0 => Ok(ErrorCode::Success),
            1 => Ok(ErrorCode::Unknown),
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            4 => Ok(ErrorCode::AlreadyExists),
            5 => Ok(ErrorCode::InvalidRequest),
            6 => Ok(ErrorCode::InvalidFormat),
            7 => Ok(ErrorCode::RequiredField),

            // Auth
            1001 => Ok(ErrorCode::NotAuthenticated),
            1002 => Ok(ErrorCode::InvalidCredentials),
            1003 => Ok(ErrorCode::TokenExpired),
            1004 => Ok(ErrorCode::TokenInvalid),
            1005 => Ok(ErrorCode::AccountDisabled),

            // Permission
            2001 => Ok(ErrorCode::PermissionDenied),
            2002 => Ok(ErrorCode::RoleRequired),
            2003 => Ok(ErrorCode::AdminRequired),
            2101 => Ok(ErrorCode::RoleNotFound),
            2102 => Ok(ErrorCode::RoleNameExists),
            2103 => Ok(ErrorCode::RoleInUse),
            2104 => Ok(ErrorCode::RoleIsSystem),
            2201 => Ok(ErrorCode::PermissionNotFound),
            2202 => Ok(ErrorCode::PermissionNameExists),
            2203 => Ok(ErrorCode::PermissionInUse),
            2204 => Ok(ErrorCode::PermissionIsSystem),
            2301 => Ok(ErrorCode::AssignmentNotFound),
            2302 => Ok(ErrorCode::AssignmentExists),

            // Member / Group
            3001 => Ok(ErrorCode::MemberNotFound),
            3002 => Ok(ErrorCode::MemberNumberExists),
            3003 => Ok(ErrorCode::MemberInactive),
            3101 => Ok(ErrorCode::GroupNotFound),
            3102 => Ok(ErrorCode::GroupNameExists),
            3103 => Ok(ErrorCode::GroupMemberExists),

            // Campaign
            4001 => Ok(ErrorCode::CampaignNotFound),
            4002 => Ok(ErrorCode::CampaignInvalidState),
            4003 => Ok(ErrorCode::CampaignNoRecipients),
            4004 => Ok(ErrorCode::CampaignTargetInvalid),

            // Message
            5001 => Ok(ErrorCode::MessageNotFound),
            5002 => Ok(ErrorCode::TransportFailure),
            5003 => Ok(ErrorCode::InvalidPhoneNumber),

            // User
            8001 => Ok(ErrorCode::UserNotFound),
            8002 => Ok(ErrorCode::UsernameExists),
            8003 => Ok(ErrorCode::UserCannotDeleteSelf),
            8004 => Ok(ErrorCode::UserIsSystem),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::DatabaseError),
            9004 => Ok(ErrorCode::TimeoutError),
            9005 => Ok(ErrorCode::ConfigError),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_values() {
        assert_eq!(ErrorCode::Success.code(), 0);
        assert_eq!(ErrorCode::NotFound.code(), 3);
        assert_eq!(ErrorCode::PermissionDenied.code(), 2001);
        assert_eq!(ErrorCode::CampaignNoRecipients.code(), 4003);
        assert_eq!(ErrorCode::TransportFailure.code(), 5002);
        assert_eq!(ErrorCode::InternalError.code(), 9001);
    }

    #[test]
    fn test_roundtrip_u16() {
        for code in [
            ErrorCode::Success,
            ErrorCode::ValidationFailed,
            ErrorCode::NotAuthenticated,
            ErrorCode::PermissionDenied,
            ErrorCode::AssignmentExists,
            ErrorCode::MemberNotFound,
            ErrorCode::CampaignInvalidState,
            ErrorCode::InvalidPhoneNumber,
            ErrorCode::UserNotFound,
            ErrorCode::DatabaseError,
        ] {
            let raw: u16 = code.into();
            assert_eq!(ErrorCode::try_from(raw), Ok(code));
        }
    }

    #[test]
    fn test_invalid_code_rejected() {
        assert_eq!(ErrorCode::try_from(777), Err(InvalidErrorCode(777)));
    }

    #[test]
    fn test_is_success() {
        assert!(ErrorCode::Success.is_success());
        assert!(!ErrorCode::Unknown.is_success());
    }

    #[test]
    fn test_serde_as_u16() {
        let json = serde_json::to_string(&ErrorCode::PermissionDenied).unwrap();
        assert_eq!(json, "2001");
        let code: ErrorCode = serde_json::from_str("4002").unwrap();
        assert_eq!(code, ErrorCode::CampaignInvalidState);
    }
}
