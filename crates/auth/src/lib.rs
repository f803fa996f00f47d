//! Authentication against the device's user-level model.
//!
//! Two flows satisfy the same contract: the legacy flow hashes the
//! password into a 32-bit token, the secure flow runs a salted SHA-256
//! challenge/response. Devices accept one or the other depending on
//! firmware generation.

pub mod legacy;
pub mod secure;

pub use legacy::AuthenticationLegacy;
pub use secure::AuthenticationSecure;

use async_trait::async_trait;
use cola::ControlSession;
use num_enum::{IntoPrimitive, TryFromPrimitive};

/// CoLa user levels with their fixed wire codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[repr(i8)]
pub enum UserLevel {
    Run = 0,
    Operator = 1,
    Maintenance = 2,
    AuthorizedClient = 3,
    Service = 4,
}

impl UserLevel {
    /// Fixed prefix string mixed into the secure password hash.
    pub fn prefix(self) -> &'static str {
        match self {
            UserLevel::Run => "Run",
            UserLevel::Operator => "Operator",
            UserLevel::Maintenance => "Maintenance",
            UserLevel::AuthorizedClient => "AuthorizedClient",
            UserLevel::Service => "Service",
        }
    }
}

/// Outcome byte of the challenge/response methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[repr(u8)]
pub enum ChallengeResponseResult {
    Success = 0,
    InvalidClient = 1,
    NotAccepted = 2,
    UnknownChallenge = 3,
    PwdNotChangeable = 4,
    TimelockActive = 5,
}

/// Challenge and salt received from the device.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChallengeRequest {
    pub challenge: [u8; 16],
    pub salt: [u8; 16],
}

/// Common contract of both flows. Failures of any kind, including an
/// unreachable device, surface as `false`.
#[async_trait]
pub trait Authentication: Send {
    async fn login(
        &mut self,
        session: &mut ControlSession,
        level: UserLevel,
        password: &str,
    ) -> bool;

    async fn logout(&mut self, session: &mut ControlSession) -> bool;
}

/// The two flows as a tagged value, held by the control object.
pub enum Authenticator {
    Legacy(AuthenticationLegacy),
    Secure(AuthenticationSecure),
}

#[async_trait]
impl Authentication for Authenticator {
    async fn login(
        &mut self,
        session: &mut ControlSession,
        level: UserLevel,
        password: &str,
    ) -> bool {
        match self {
            Authenticator::Legacy(auth) => auth.login(session, level, password).await,
            Authenticator::Secure(auth) => auth.login(session, level, password).await,
        }
    }

    async fn logout(&mut self, session: &mut ControlSession) -> bool {
        match self {
            Authenticator::Legacy(auth) => auth.logout(session).await,
            Authenticator::Secure(auth) => auth.logout(session).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_codes_and_prefixes() {
        assert_eq!(i8::from(UserLevel::Run), 0);
        assert_eq!(i8::from(UserLevel::Service), 4);
        assert_eq!(UserLevel::try_from(3).unwrap(), UserLevel::AuthorizedClient);
        assert!(UserLevel::try_from(5).is_err());
        assert_eq!(UserLevel::AuthorizedClient.prefix(), "AuthorizedClient");
        assert_eq!(UserLevel::Maintenance.prefix(), "Maintenance");
    }
}
