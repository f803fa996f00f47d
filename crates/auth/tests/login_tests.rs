//! End-to-end login flows against a scripted loopback device.

use auth::{
    Authentication, AuthenticationLegacy, AuthenticationSecure, Authenticator, ChallengeRequest,
    UserLevel,
};
use cola::{ColaBHandler, ControlSession, ProtocolVariant};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use transport::TcpTransport;

const MAGIC: [u8; 4] = [0x02; 4];

fn xor(body: &[u8]) -> u8 {
    body.iter().fold(0, |acc, b| acc ^ b)
}

fn frame(body: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&MAGIC);
    out.extend_from_slice(&(body.len() as u32).to_be_bytes());
    out.extend_from_slice(body);
    out.push(xor(body));
    out
}

async fn read_request(peer: &mut TcpStream) -> Vec<u8> {
    let mut header = [0u8; 8];
    peer.read_exact(&mut header).await.unwrap();
    let len = u32::from_be_bytes([header[4], header[5], header[6], header[7]]) as usize;
    let mut rest = vec![0u8; len + 1];
    peer.read_exact(&mut rest).await.unwrap();
    rest.pop();
    rest
}

async fn session_pair() -> (ControlSession, TcpStream) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let client = TcpTransport::connect("127.0.0.1", port).await.unwrap();
    let (peer, _) = listener.accept().await.unwrap();
    let session = ControlSession::new(ProtocolVariant::ColaB(ColaBHandler::new(Box::new(client))));
    (session, peer)
}

#[tokio::test]
async fn secure_login_round_trip() {
    let (mut session, mut peer) = session_pair().await;

    let challenge_bytes: [u8; 16] = [7; 16];
    let salt_bytes: [u8; 16] = [3; 16];
    let expected_request = ChallengeRequest {
        challenge: challenge_bytes,
        salt: salt_bytes,
    };
    let expected_response = AuthenticationSecure::create_challenge_response(
        UserLevel::AuthorizedClient,
        "secret",
        &expected_request,
    );

    let server = tokio::spawn(async move {
        // GetChallenge with the level byte.
        let body = read_request(&mut peer).await;
        assert_eq!(&body[..17], b"sMN GetChallenge ");
        assert_eq!(body[17], 3);

        let mut reply = b"sAN GetChallenge ".to_vec();
        reply.push(0); // success
        reply.extend_from_slice(&challenge_bytes);
        reply.extend_from_slice(&salt_bytes);
        peer.write_all(&frame(&reply)).await.unwrap();

        // SetUserLevel carries the 32 digest bytes and the level.
        let body = read_request(&mut peer).await;
        assert_eq!(&body[..17], b"sMN SetUserLevel ");
        assert_eq!(&body[17..49], &expected_response);
        assert_eq!(body[49], 3);

        let mut reply = b"sAN SetUserLevel ".to_vec();
        reply.push(0);
        peer.write_all(&frame(&reply)).await.unwrap();
        peer
    });

    let mut authenticator = Authenticator::Secure(AuthenticationSecure::new());
    assert!(
        authenticator
            .login(&mut session, UserLevel::AuthorizedClient, "secret")
            .await
    );
    server.await.unwrap();
}

#[tokio::test]
async fn secure_login_fails_on_challenge_rejection() {
    let (mut session, mut peer) = session_pair().await;

    tokio::spawn(async move {
        let _ = read_request(&mut peer).await;
        let mut reply = b"sAN GetChallenge ".to_vec();
        reply.push(2); // NOT_ACCEPTED
        peer.write_all(&frame(&reply)).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    });

    let mut authenticator = AuthenticationSecure::new();
    assert!(
        !authenticator
            .login(&mut session, UserLevel::Service, "secret")
            .await
    );
}

#[tokio::test]
async fn legacy_login_sends_folded_token() {
    let (mut session, mut peer) = session_pair().await;

    let server = tokio::spawn(async move {
        let body = read_request(&mut peer).await;
        assert_eq!(&body[..18], b"sMN SetAccessMode ");
        assert_eq!(body[18] as i8, 4); // Service level
        assert_eq!(body.len(), 18 + 1 + 4); // level byte + 32-bit token

        let mut reply = b"sAN SetAccessMode ".to_vec();
        reply.push(1);
        peer.write_all(&frame(&reply)).await.unwrap();
        peer
    });

    let mut authenticator = AuthenticationLegacy::new();
    assert!(
        authenticator
            .login(&mut session, UserLevel::Service, "test")
            .await
    );
    server.await.unwrap();
}

#[tokio::test]
async fn logout_invokes_run() {
    let (mut session, mut peer) = session_pair().await;

    let server = tokio::spawn(async move {
        let body = read_request(&mut peer).await;
        assert_eq!(body, b"sMN Run ");
        let mut reply = b"sAN Run ".to_vec();
        reply.push(1);
        peer.write_all(&frame(&reply)).await.unwrap();
        peer
    });

    let mut authenticator = Authenticator::Secure(AuthenticationSecure::new());
    assert!(authenticator.logout(&mut session).await);
    server.await.unwrap();
}

#[tokio::test]
async fn login_fails_cleanly_when_device_is_unreachable() {
    let (mut session, peer) = session_pair().await;
    drop(peer);

    let mut authenticator = Authenticator::Legacy(AuthenticationLegacy::new());
    assert!(
        !authenticator
            .login(&mut session, UserLevel::Operator, "pw")
            .await
    );
}
