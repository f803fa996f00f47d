//! Secure login: salted SHA-256 challenge/response.
//!
//! `GetChallenge` yields 16 challenge bytes and 16 salt bytes. The client
//! derives `SHA256(prefix ":SICK Sensor:" password ":" salt)` and answers
//! `SetUserLevel` with `SHA256(password_hash || challenge)` plus the
//! requested level.

use crate::{Authentication, ChallengeRequest, ChallengeResponseResult, UserLevel};
use async_trait::async_trait;
use cola::{CoLaParameterReader, CoLaParameterWriter, ColaError, CommandKind, ControlSession};
use sha2::{Digest, Sha256};

pub type PasswordHash = [u8; 32];
pub type ChallengeResponse = [u8; 32];

#[derive(Default)]
pub struct AuthenticationSecure;

impl AuthenticationSecure {
    pub fn new() -> Self {
        AuthenticationSecure
    }

    /// `SHA256(prefix || ":SICK Sensor:" || password || ":" || salt)`.
    pub fn create_password_hash(
        level: UserLevel,
        password: &str,
        challenge: &ChallengeRequest,
    ) -> PasswordHash {
        let mut hasher = Sha256::new();
        hasher.update(level.prefix().as_bytes());
        hasher.update(b":SICK Sensor:");
        hasher.update(password.as_bytes());
        hasher.update(b":");
        hasher.update(challenge.salt);
        hasher.finalize().into()
    }

    /// `SHA256(password_hash || challenge)`.
    pub fn create_challenge_response(
        level: UserLevel,
        password: &str,
        challenge: &ChallengeRequest,
    ) -> ChallengeResponse {
        let password_hash = Self::create_password_hash(level, password, challenge);
        let mut hasher = Sha256::new();
        hasher.update(password_hash);
        hasher.update(challenge.challenge);
        hasher.finalize().into()
    }

    fn result_is_success(byte: u8) -> bool {
        matches!(
            ChallengeResponseResult::try_from(byte),
            Ok(ChallengeResponseResult::Success)
        )
    }
}

#[async_trait]
impl Authentication for AuthenticationSecure {
    async fn login(
        &mut self,
        session: &mut ControlSession,
        level: UserLevel,
        password: &str,
    ) -> bool {
        let get_challenge = CoLaParameterWriter::new(CommandKind::MethodInvocation, "GetChallenge")
            .parameter_u8(i8::from(level) as u8)
            .build();
        let response = session.send(&get_challenge).await;
        if response.error() != ColaError::Ok {
            tracing::debug!(error = ?response.error(), "GetChallenge rejected");
            return false;
        }

        let mut reader = CoLaParameterReader::new(&response);
        let Ok(result) = reader.read_u8() else {
            return false;
        };
        if !Self::result_is_success(result) {
            tracing::debug!(result, "GetChallenge reported failure");
            return false;
        }

        let mut challenge = ChallengeRequest::default();
        for byte in challenge.challenge.iter_mut() {
            match reader.read_u8() {
                Ok(value) => *byte = value,
                Err(_) => return false,
            }
        }
        for byte in challenge.salt.iter_mut() {
            match reader.read_u8() {
                Ok(value) => *byte = value,
                Err(_) => return false,
            }
        }

        let challenge_response = Self::create_challenge_response(level, password, &challenge);

        let mut writer = CoLaParameterWriter::new(CommandKind::MethodInvocation, "SetUserLevel");
        for byte in challenge_response {
            writer = writer.parameter_u8(byte);
        }
        let set_user_level = writer.parameter_u8(i8::from(level) as u8).build();

        let response = session.send(&set_user_level).await;
        if response.error() != ColaError::Ok {
            tracing::debug!(error = ?response.error(), "SetUserLevel rejected");
            return false;
        }
        CoLaParameterReader::new(&response)
            .read_u8()
            .map(Self::result_is_success)
            .unwrap_or(false)
    }

    async fn logout(&mut self, session: &mut ControlSession) -> bool {
        let command = CoLaParameterWriter::new(CommandKind::MethodInvocation, "Run").build();
        let response = session.send(&command).await;

        if response.error() != ColaError::Ok {
            return false;
        }
        // Run returns a plain success flag, as on the legacy path.
        CoLaParameterReader::new(&response)
            .read_bool()
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_nist_vectors() {
        let empty: [u8; 32] = Sha256::digest(b"").into();
        assert_eq!(
            hex::encode(empty),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        let abc: [u8; 32] = Sha256::digest(b"abc").into();
        assert_eq!(
            hex::encode(abc),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn password_hash_concatenation_order() {
        // AuthorizedClient, zero salt and challenge, password "x": the hash
        // input is the exact byte string "AuthorizedClient:SICK Sensor:x:"
        // followed by sixteen zero bytes.
        let challenge = ChallengeRequest::default();
        let hash = AuthenticationSecure::create_password_hash(
            UserLevel::AuthorizedClient,
            "x",
            &challenge,
        );

        let mut reference = Sha256::new();
        reference.update(b"AuthorizedClient:SICK Sensor:x:");
        reference.update([0u8; 16]);
        let reference: [u8; 32] = reference.finalize().into();
        assert_eq!(hash, reference);
    }

    #[test]
    fn challenge_response_chains_hash_and_challenge() {
        let challenge = ChallengeRequest::default();
        let password_hash = AuthenticationSecure::create_password_hash(
            UserLevel::AuthorizedClient,
            "x",
            &challenge,
        );
        let response = AuthenticationSecure::create_challenge_response(
            UserLevel::AuthorizedClient,
            "x",
            &challenge,
        );

        let mut reference = Sha256::new();
        reference.update(password_hash);
        reference.update([0u8; 16]);
        let reference: [u8; 32] = reference.finalize().into();
        assert_eq!(response, reference);
    }

    #[test]
    fn salt_changes_the_password_hash() {
        let zero = ChallengeRequest::default();
        let mut salted = ChallengeRequest::default();
        salted.salt[0] = 1;
        let a = AuthenticationSecure::create_password_hash(UserLevel::Service, "pw", &zero);
        let b = AuthenticationSecure::create_password_hash(UserLevel::Service, "pw", &salted);
        assert_ne!(a, b);
    }
}
