use serde::{Deserialize, Serialize};

/// Back-office privilege level carried in the session token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Privilege {
    #[serde(rename = "ADMINISTRADOR")]
    Administrator,
    #[serde(rename = "USUARIO")]
    User,
}

impl Privilege {
    pub fn as_str(&self) -> &'static str {
        match self {
            Privilege::Administrator => "ADMINISTRADOR",
            Privilege::User => "USUARIO",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Privilege::Administrator)
    }
}

impl core::fmt::Display for Privilege {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
