//! Framing handler tests against an in-process loopback peer.

use cola::protocol::{ProtocolHandler, MAGIC};
use cola::{Cola2Handler, ColaBHandler, CommandKind, ControlSession, ProtocolVariant};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use transport::TcpTransport;

async fn connect_pair() -> (TcpTransport, TcpStream) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let client = TcpTransport::connect("127.0.0.1", port).await.unwrap();
    let (peer, _) = listener.accept().await.unwrap();
    (client, peer)
}

fn xor(body: &[u8]) -> u8 {
    body.iter().fold(0, |acc, b| acc ^ b)
}

fn cola_b_frame(body: &[u8]) -> Vec<u8> {
    let mut frame = Vec::new();
    frame.extend_from_slice(&MAGIC);
    frame.extend_from_slice(&(body.len() as u32).to_be_bytes());
    frame.extend_from_slice(body);
    frame.push(xor(body));
    frame
}

async fn read_cola_b_request(peer: &mut TcpStream) -> Vec<u8> {
    let mut header = [0u8; 8];
    peer.read_exact(&mut header).await.unwrap();
    assert_eq!(&header[..4], &MAGIC);
    let len = u32::from_be_bytes([header[4], header[5], header[6], header[7]]) as usize;
    let mut rest = vec![0u8; len + 1];
    peer.read_exact(&mut rest).await.unwrap();
    let checksum = rest.pop().unwrap();
    assert_eq!(checksum, xor(&rest));
    rest
}

#[tokio::test]
async fn cola_b_exchange_round_trip() {
    let (client, mut peer) = connect_pair().await;

    let server = tokio::spawn(async move {
        let body = read_cola_b_request(&mut peer).await;
        assert_eq!(body, b"sMN Run ");
        let mut response = b"sAN Run ".to_vec();
        response.push(1);
        peer.write_all(&cola_b_frame(&response)).await.unwrap();
        peer
    });

    let mut handler = ColaBHandler::new(Box::new(client));
    assert!(handler.open_session(5).await.is_ok());

    let cmd = ControlSession::prepare_call("Run");
    let response = handler.send(&cmd).await.unwrap();
    assert_eq!(response.kind(), CommandKind::MethodReturn);
    assert_eq!(response.name(), "Run");
    assert_eq!(
        cola::CoLaParameterReader::new(&response).read_bool().unwrap(),
        true
    );

    server.await.unwrap();
}

#[tokio::test]
async fn cola_b_detects_corrupted_checksum() {
    let (client, mut peer) = connect_pair().await;

    tokio::spawn(async move {
        let _ = read_cola_b_request(&mut peer).await;
        let mut frame = cola_b_frame(b"sAN Run ");
        let last = frame.len() - 1;
        frame[last] ^= 0xFF;
        peer.write_all(&frame).await.unwrap();
        // keep the socket open while the client reads
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    });

    let mut handler = ColaBHandler::new(Box::new(client));
    let cmd = ControlSession::prepare_call("Run");
    let err = handler.send(&cmd).await.unwrap_err();
    assert!(matches!(err, cola::ProtocolError::ChecksumMismatch { .. }));
}

#[tokio::test]
async fn cola_b_resynchronizes_on_leading_garbage() {
    let (client, mut peer) = connect_pair().await;

    tokio::spawn(async move {
        let _ = read_cola_b_request(&mut peer).await;
        // Noise with embedded partial magic runs before the real frame.
        let mut bytes = vec![0x00, 0x02, 0x02, 0xFF];
        bytes.extend_from_slice(&cola_b_frame(b"sAN Run "));
        peer.write_all(&bytes).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    });

    let mut handler = ColaBHandler::new(Box::new(client));
    let cmd = ControlSession::prepare_call("Run");
    let response = handler.send(&cmd).await.unwrap();
    assert_eq!(response.kind(), CommandKind::MethodReturn);
}

#[tokio::test]
async fn control_session_maps_failures_to_network_error() {
    let (client, peer) = connect_pair().await;
    drop(peer);

    let mut session = ControlSession::new(ProtocolVariant::ColaB(ColaBHandler::new(Box::new(
        client,
    ))));
    let cmd = ControlSession::prepare_call("Run");
    let response = session.send(&cmd).await;
    assert_eq!(response.kind(), CommandKind::NetworkError);
    assert_eq!(response.error(), cola::ColaError::NetworkError);
}

const SESSION_ID: u32 = 0x00C0_FFEE;

/// Read one CoLa 2 packet and return (session_id, request_id, payload).
async fn read_cola2_packet(peer: &mut TcpStream) -> (u32, u16, Vec<u8>) {
    let mut header = [0u8; 8];
    peer.read_exact(&mut header).await.unwrap();
    assert_eq!(&header[..4], &MAGIC);
    let len = u32::from_be_bytes([header[4], header[5], header[6], header[7]]) as usize;
    let mut rest = vec![0u8; len];
    peer.read_exact(&mut rest).await.unwrap();
    assert_eq!(rest[0], 0, "hop count");
    assert_eq!(rest[1], 0, "NoC");
    let session = u32::from_be_bytes([rest[2], rest[3], rest[4], rest[5]]);
    let request = u16::from_be_bytes([rest[6], rest[7]]);
    (session, request, rest[8..].to_vec())
}

async fn write_cola2_packet(peer: &mut TcpStream, session: u32, request: u16, payload: &[u8]) {
    let mut packet = Vec::new();
    packet.extend_from_slice(&MAGIC);
    packet.extend_from_slice(&((payload.len() as u32 + 8).to_be_bytes()));
    packet.push(0);
    packet.push(0);
    packet.extend_from_slice(&session.to_be_bytes());
    packet.extend_from_slice(&request.to_be_bytes());
    packet.extend_from_slice(payload);
    peer.write_all(&packet).await.unwrap();
}

#[tokio::test]
async fn cola2_session_open_and_request_id_monotonicity() {
    let (client, mut peer) = connect_pair().await;

    let server = tokio::spawn(async move {
        // Session open: zero session ID, Ox command, client identifier.
        let (session, request, payload) = read_cola2_packet(&mut peer).await;
        assert_eq!(session, 0);
        assert_eq!(request, 1);
        assert_eq!(&payload[..2], b"Ox");
        assert_eq!(payload[2], 5, "session timeout");
        let id_len = u16::from_be_bytes([payload[3], payload[4]]) as usize;
        assert_eq!(&payload[5..5 + id_len], b"itest");
        write_cola2_packet(&mut peer, SESSION_ID, request, b"OA").await;

        // Three exchanges with strictly increasing request IDs.
        for expected_request in 2u16..=4 {
            let (session, request, payload) = read_cola2_packet(&mut peer).await;
            assert_eq!(session, SESSION_ID);
            assert_eq!(request, expected_request);
            // The leading 's' is stripped on the wire.
            assert_eq!(&payload[..2], b"RN");
            write_cola2_packet(&mut peer, session, request, b"RA DeviceIdent \x00\x00").await;
        }
        peer
    });

    let mut handler = Cola2Handler::new(Box::new(client), "itest");
    handler.open_session(5).await.unwrap();
    assert_eq!(handler.session_id(), SESSION_ID);

    for _ in 0..3 {
        let cmd = ControlSession::prepare_read("DeviceIdent");
        let response = handler.send(&cmd).await.unwrap();
        assert_eq!(response.kind(), CommandKind::ReadVariableResponse);
        assert_eq!(response.name(), "DeviceIdent");
    }

    server.await.unwrap();
}

#[tokio::test]
async fn cola2_rejects_foreign_session_id() {
    let (client, mut peer) = connect_pair().await;

    tokio::spawn(async move {
        let (_, request, _) = read_cola2_packet(&mut peer).await;
        write_cola2_packet(&mut peer, SESSION_ID, request, b"OA").await;

        let (_, request, _) = read_cola2_packet(&mut peer).await;
        write_cola2_packet(&mut peer, SESSION_ID + 1, request, b"RA X \x00\x00").await;
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    });

    let mut handler = Cola2Handler::new(Box::new(client), "itest");
    handler.open_session(5).await.unwrap();

    let cmd = ControlSession::prepare_read("X");
    let err = handler.send(&cmd).await.unwrap_err();
    assert!(matches!(
        err,
        cola::ProtocolError::UnexpectedSessionId { .. }
    ));
}

#[tokio::test]
async fn cola2_failed_open_shuts_the_transport_down() {
    let (client, mut peer) = connect_pair().await;

    tokio::spawn(async move {
        let _ = read_cola2_packet(&mut peer).await;
        // Garbage instead of the expected magic.
        peer.write_all(&[0xDE, 0xAD, 0xBE, 0xEF, 0, 0, 0, 0]).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    });

    let mut handler = Cola2Handler::new(Box::new(client), "itest");
    let err = handler.open_session(5).await.unwrap_err();
    assert!(matches!(err, cola::ProtocolError::InvalidMagic));
}

