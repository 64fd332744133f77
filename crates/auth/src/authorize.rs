use thiserror::Error;

use crate::session::CurrentUser;

/// Back-office actions reserved to administrators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrivilegedAction {
    DeleteOrder,
}

impl PrivilegedAction {
    /// Warning shown to a non-administrator attempting the action.
    pub fn denial_message(&self) -> &'static str {
        match self {
            PrivilegedAction::DeleteOrder => "Solo un admin. puede eliminar órdenes",
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("no user is signed in")]
    NotSignedIn,

    #[error("forbidden: {action:?} requires the ADMINISTRADOR privilege")]
    Forbidden { action: PrivilegedAction },
}

impl AuthzError {
    /// User-facing warning for this denial.
    pub fn user_message(&self) -> &'static str {
        match self {
            AuthzError::NotSignedIn => "Debes iniciar sesión",
            AuthzError::Forbidden { action } => action.denial_message(),
        }
    }
}

/// Check that `user` may perform `action`.
///
/// - No IO
/// - No panics
pub fn authorize(user: Option<&CurrentUser>, action: PrivilegedAction) -> Result<(), AuthzError> {
    let user = user.ok_or(AuthzError::NotSignedIn)?;
    if user.is_admin() {
        Ok(())
    } else {
        Err(AuthzError::Forbidden { action })
    }
}
