//! Legacy login: `SetAccessMode` with the MD5-folded password token.

use crate::{Authentication, UserLevel};
use async_trait::async_trait;
use cola::{CoLaParameterReader, CoLaParameterWriter, ColaError, CommandKind, ControlSession};

#[derive(Default)]
pub struct AuthenticationLegacy;

impl AuthenticationLegacy {
    pub fn new() -> Self {
        AuthenticationLegacy
    }
}

#[async_trait]
impl Authentication for AuthenticationLegacy {
    async fn login(
        &mut self,
        session: &mut ControlSession,
        level: UserLevel,
        password: &str,
    ) -> bool {
        let command = CoLaParameterWriter::new(CommandKind::MethodInvocation, "SetAccessMode")
            .parameter_i8(i8::from(level))
            .parameter_password_md5(password)
            .build();
        let response = session.send(&command).await;

        if response.error() != ColaError::Ok {
            tracing::debug!(error = ?response.error(), "SetAccessMode rejected");
            return false;
        }
        CoLaParameterReader::new(&response)
            .read_bool()
            .unwrap_or(false)
    }

    async fn logout(&mut self, session: &mut ControlSession) -> bool {
        let command = CoLaParameterWriter::new(CommandKind::MethodInvocation, "Run").build();
        let response = session.send(&command).await;

        if response.error() != ColaError::Ok {
            return false;
        }
        CoLaParameterReader::new(&response)
            .read_bool()
            .unwrap_or(false)
    }
}
