//! The control object: one transport, one framing handler, one
//! authenticator, composed per the configured control port.

use auth::{Authentication, AuthenticationLegacy, AuthenticationSecure, Authenticator, UserLevel};
use cola::{
    CoLaCommand, CoLaParameterReader, Cola2Handler, ColaBHandler, ColaError, ControlSession,
    ProtocolVariant, Result, PORT_COLA_B,
};
use transport::TcpTransport;
use visconfig::DeviceConfig;

pub struct SafeVisionaryControl {
    session: ControlSession,
    authenticator: Authenticator,
}

impl SafeVisionaryControl {
    /// Assemble a control object from an already-opened session, e.g. for
    /// tests against a scripted peer.
    pub fn from_parts(session: ControlSession, authenticator: Authenticator) -> Self {
        SafeVisionaryControl {
            session,
            authenticator,
        }
    }

    /// Connect to the device on the CoLa 2 port with the secure
    /// authenticator, the safeVisionary2 default.
    pub async fn open(host: &str, session_timeout_s: u8) -> Result<Self> {
        let config = DeviceConfig {
            control_host: host.to_owned(),
            session_timeout_s,
            ..DeviceConfig::default()
        };
        Self::open_with(&config).await
    }

    /// Connect using the configured control port: 2112 selects CoLa B
    /// framing with the legacy authenticator, 2122 CoLa 2 with the
    /// secure one. A failed session open leaves the transport shut down.
    pub async fn open_with(config: &DeviceConfig) -> Result<Self> {
        let transport = TcpTransport::connect(&config.control_host, config.control_port)
            .await
            .map_err(cola::ProtocolError::Transport)?;

        let (handler, authenticator) = if config.control_port == PORT_COLA_B {
            (
                ProtocolVariant::ColaB(ColaBHandler::new(Box::new(transport))),
                Authenticator::Legacy(AuthenticationLegacy::new()),
            )
        } else {
            (
                ProtocolVariant::Cola2(Cola2Handler::new(
                    Box::new(transport),
                    &config.client_id,
                )),
                Authenticator::Secure(AuthenticationSecure::new()),
            )
        };

        let mut session = ControlSession::new(handler);
        session.open_session(config.session_timeout_s).await?;

        Ok(SafeVisionaryControl {
            session,
            authenticator,
        })
    }

    pub async fn login(&mut self, level: UserLevel, password: &str) -> bool {
        self.authenticator
            .login(&mut self.session, level, password)
            .await
    }

    pub async fn logout(&mut self) -> bool {
        self.authenticator.logout(&mut self.session).await
    }

    /// Exchange an arbitrary prepared command.
    pub async fn send_command(&mut self, command: &CoLaCommand) -> CoLaCommand {
        self.session.send(command).await
    }

    /// Read a variable with no parameters.
    pub async fn read_variable(&mut self, name: &str) -> CoLaCommand {
        let command = ControlSession::prepare_read(name);
        self.session.send(&command).await
    }

    /// Invoke a method with no parameters.
    pub async fn invoke_method(&mut self, name: &str) -> CoLaCommand {
        let command = ControlSession::prepare_call(name);
        self.session.send(&command).await
    }

    /// The device identity string, empty if the read fails.
    pub async fn get_device_ident(&mut self) -> String {
        let response = self.read_variable("DeviceIdent").await;
        if response.error() != ColaError::Ok {
            return String::new();
        }
        CoLaParameterReader::new(&response)
            .read_flex_string()
            .unwrap_or_default()
    }

    /// Log out, close the session, and shut the transport down.
    pub async fn close(&mut self) -> Result<()> {
        if !self.authenticator.logout(&mut self.session).await {
            tracing::debug!("logout on close was not acknowledged");
        }
        self.session.close_session().await?;
        self.session.shutdown().await
    }
}
