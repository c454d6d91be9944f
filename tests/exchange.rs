//! End-to-end exchanges over loopback sockets.

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use rup_protocol::core::constants::{FRAME_SIZE, OFF_PAYLOAD};
use rup_protocol::core::DeliveryLogConfig;
use rup_protocol::exchange::{ExchangeError, Phase};
use rup_protocol::prelude::*;

fn fast() -> ProtocolConfig {
    ProtocolConfig::new()
        .with_reply_timeout(Duration::from_millis(50))
        .with_handshake_limit(RetryLimit::Attempts(40))
}

async fn endpoint(config: ProtocolConfig) -> RupEndpoint {
    RupEndpoint::bind_with_config("127.0.0.1:0".parse().unwrap(), config)
        .await
        .unwrap()
}

async fn raw_socket() -> RupSocket {
    RupSocket::bind("127.0.0.1:0".parse().unwrap()).await.unwrap()
}

async fn recv_frame(port: &RupSocket) -> (Frame, SocketAddr) {
    let mut buf = vec![0u8; FRAME_SIZE + 1];
    let (len, from) = port
        .recv_from(&mut buf, Some(Duration::from_secs(2)))
        .await
        .unwrap()
        .unwrap();
    (Frame::decode(&buf[..len]).unwrap(), from)
}

#[tokio::test]
async fn hello_scenario_delivers_exactly_once() {
    let mut server = endpoint(fast()).await;
    let client = endpoint(fast()).await;
    let server_addr = server.local_addr().unwrap();

    let (sent, received) = tokio::join!(
        client.send_message(42, b"HELLO", server_addr),
        server.receive()
    );

    let outcome = sent.unwrap();
    let delivery = received.unwrap();

    assert_eq!(delivery.frame.sequence_id(), 42);
    assert_eq!(delivery.frame.payload().as_bytes(), b"HELLO");
    assert_eq!(delivery.frame.payload().to_text(), "HELLO");
    assert_eq!(delivery.peer, client.local_addr().unwrap());
    assert!(delivery.stop_confirmed);
    assert!(outcome.stop_confirmed);
    assert_eq!(outcome.attempts.data, 1);

    // Trailing FINAL_ACKs are control frames; nothing is delivered twice.
    let again = tokio::time::timeout(Duration::from_millis(300), server.receive()).await;
    assert!(again.is_err());
}

#[tokio::test]
async fn identity_fields_pass_through() {
    let mut server = endpoint(fast()).await;
    let client = endpoint(fast()).await;
    let server_addr = server.local_addr().unwrap();

    let frame = Frame::builder(7)
        .command("LOGIN")
        .origin(client.origin().unwrap())
        .client_name("ann")
        .client_credential("secret")
        .payload(&b"hi there"[..])
        .build()
        .unwrap();

    let (sent, received) = tokio::join!(client.send(&frame, server_addr), server.receive());
    sent.unwrap();
    assert_eq!(received.unwrap().frame, frame);
}

#[tokio::test]
async fn full_payload_round_trip() {
    let mut server = endpoint(fast()).await;
    let client = endpoint(fast()).await;
    let server_addr = server.local_addr().unwrap();

    let payload: Vec<u8> = (0..1024u32).map(|i| (i % 251) as u8 | 1).collect();
    let (sent, received) = tokio::join!(
        client.send_message(1, &payload, server_addr),
        server.receive()
    );
    sent.unwrap();
    assert_eq!(received.unwrap().frame.payload().as_bytes(), payload.as_slice());
}

#[tokio::test]
async fn consecutive_messages_on_one_socket() {
    let mut server = endpoint(fast()).await;
    let client = endpoint(fast()).await;
    let server_addr = server.local_addr().unwrap();

    let sending = async {
        for id in 1..=3u32 {
            let body = format!("message {id}");
            client
                .send_message(id, body.as_bytes(), server_addr)
                .await
                .unwrap();
        }
    };
    let receiving = async {
        let mut got = Vec::new();
        for _ in 0..3 {
            let delivery = server.receive().await.unwrap();
            got.push((delivery.frame.sequence_id(), delivery.frame.payload().to_text().into_owned()));
        }
        got
    };

    let ((), got) = tokio::join!(sending, receiving);
    assert_eq!(
        got,
        vec![
            (1, "message 1".to_string()),
            (2, "message 2".to_string()),
            (3, "message 3".to_string()),
        ]
    );
}

#[tokio::test]
async fn silent_peer_fails_after_configured_attempts() {
    let config = fast()
        .with_reply_timeout(Duration::from_millis(20))
        .with_handshake_limit(RetryLimit::Attempts(3));
    let client = endpoint(config).await;
    let silent = raw_socket().await;

    let started = Instant::now();
    let result = client
        .send_message(9, b"anyone", silent.local_addr().unwrap())
        .await;

    assert!(matches!(
        result,
        Err(RupError::Exchange(ExchangeError::Unacknowledged {
            phase: Phase::Data,
            attempts: 3
        }))
    ));
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn corrupt_ack_is_never_accepted() {
    let config = fast()
        .with_reply_timeout(Duration::from_millis(20))
        .with_handshake_limit(RetryLimit::Attempts(3));
    let client = endpoint(config).await;
    let peer = raw_socket().await;
    let client_addr = client.local_addr().unwrap();

    let corrupt_acker = async {
        for _ in 0..3 {
            let (data, from) = recv_frame(&peer).await;
            assert_eq!(from, client_addr);
            let mut ack = Frame::control(AckMarker::Ack, &data).encode();
            ack[OFF_PAYLOAD] ^= 0x04;
            peer.send_to(&ack, from).await.unwrap();
        }
    };

    let (result, ()) = tokio::join!(
        client.send_message(21, b"check me", peer.local_addr().unwrap()),
        corrupt_acker
    );
    assert!(matches!(
        result,
        Err(RupError::Exchange(ExchangeError::Unacknowledged { phase: Phase::Data, .. }))
    ));
}

#[tokio::test]
async fn foreign_acks_do_not_complete_an_exchange() {
    let config = fast()
        .with_reply_timeout(Duration::from_millis(20))
        .with_handshake_limit(RetryLimit::Attempts(4));
    let client = endpoint(config).await;
    let silent = raw_socket().await;
    let impostor = raw_socket().await;
    let client_addr = client.local_addr().unwrap();

    // Right sequence id, wrong source address.
    let template = Frame::builder(33).build().unwrap();
    let forged = Frame::control(AckMarker::Ack, &template).encode();
    let spam = async {
        for _ in 0..20 {
            impostor.send_to(&forged, client_addr).await.unwrap();
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    };

    let (result, ()) = tokio::join!(
        client.send_message(33, b"x", silent.local_addr().unwrap()),
        spam
    );
    assert!(matches!(
        result,
        Err(RupError::Exchange(ExchangeError::Unacknowledged { phase: Phase::Data, .. }))
    ));
}

#[tokio::test]
async fn exchange_survives_foreign_traffic() {
    let mut server = endpoint(fast()).await;
    let client = endpoint(fast()).await;
    let noise = raw_socket().await;
    let server_addr = server.local_addr().unwrap();
    let client_addr = client.local_addr().unwrap();

    let template = Frame::builder(42).build().unwrap();
    let stray_ack = Frame::control(AckMarker::Ack, &template).encode();
    let stray_stop = Frame::control(AckMarker::FinalAck, &template).encode();

    let spam = async {
        for _ in 0..10 {
            noise.send_to(&stray_ack, client_addr).await.unwrap();
            noise.send_to(&stray_stop, server_addr).await.unwrap();
            noise.send_to(b"junk", server_addr).await.unwrap();
            tokio::time::sleep(Duration::from_millis(3)).await;
        }
    };

    let (sent, received, ()) = tokio::join!(
        client.send_message(42, b"HELLO", server_addr),
        server.receive(),
        spam
    );
    sent.unwrap();
    let delivery = received.unwrap();
    assert_eq!(delivery.peer, client_addr);
    assert_eq!(delivery.frame.payload().as_bytes(), b"HELLO");
}

#[tokio::test]
async fn mismatch_limit_abandons_exchange_and_receiver_recovers() {
    let mut server = endpoint(fast()).await;
    let client = endpoint(fast()).await;
    let rogue = raw_socket().await;
    let server_addr = server.local_addr().unwrap();

    let peers = async {
        let data = Frame::builder(7).payload(&b"rogue"[..]).build().unwrap();
        rogue.send_to(&data.encode(), server_addr).await.unwrap();

        // Answer each ACK with garbage until the receiver gives up.
        for _ in 0..3 {
            let (ack, _) = recv_frame(&rogue).await;
            assert_eq!(ack.marker(), AckMarker::Ack);
            assert_eq!(ack.sequence_id(), 7);
            rogue.send_to(&[0xEE; 64], server_addr).await.unwrap();
        }

        client.send_message(8, b"legit", server_addr).await.unwrap()
    };

    let (outcome, received) = tokio::join!(peers, server.receive());
    let delivery = received.unwrap();
    assert_eq!(delivery.frame.sequence_id(), 8);
    assert_eq!(delivery.frame.payload().as_bytes(), b"legit");
    assert!(outcome.attempts.data >= 1);
}

#[tokio::test]
async fn wrong_sequence_acks_abandon_exchange_without_timeout_ceiling() {
    let server_config = ProtocolConfig::reference().with_reply_timeout(Duration::from_millis(50));
    let mut server = endpoint(server_config).await;
    let client = endpoint(fast()).await;
    let confused = raw_socket().await;
    let server_addr = server.local_addr().unwrap();

    let peers = async {
        let data = Frame::builder(42).payload(&b"HELLO"[..]).build().unwrap();
        confused.send_to(&data.encode(), server_addr).await.unwrap();

        // Every ACK is answered with an ACK for the next sequence id.
        let other = Frame::builder(43).build().unwrap();
        for _ in 0..3 {
            let (ack, _) = recv_frame(&confused).await;
            assert_eq!(ack.sequence_id(), 42);
            let wrong = Frame::control(AckMarker::Ack, &other).encode();
            confused.send_to(&wrong, server_addr).await.unwrap();
        }

        client.send_message(44, b"after", server_addr).await.unwrap()
    };

    let (outcome, received) = tokio::join!(
        peers,
        tokio::time::timeout(Duration::from_secs(5), server.receive())
    );
    let delivery = received.expect("receiver stuck in delivery-ack phase").unwrap();
    assert_eq!(delivery.frame.sequence_id(), 44);
    assert_eq!(delivery.frame.payload().as_bytes(), b"after");
    assert!(outcome.stop_confirmed);
}

#[tokio::test]
async fn delivery_log_suppresses_replay() {
    let server_config = fast().with_delivery_log(DeliveryLogConfig::default());
    let mut server = endpoint(server_config).await;
    let client = endpoint(fast()).await;
    let server_addr = server.local_addr().unwrap();

    let sending = async {
        client.send_message(5, b"one", server_addr).await.unwrap();
        // Replay of a delivered exchange is still acknowledged.
        client.send_message(5, b"one", server_addr).await.unwrap();
        client.send_message(6, b"two", server_addr).await.unwrap();
    };
    let receiving = async {
        let first = server.receive().await.unwrap();
        let second = server.receive().await.unwrap();
        (first, second)
    };

    let ((), (first, second)) = tokio::join!(sending, receiving);
    assert_eq!(first.frame.sequence_id(), 5);
    assert_eq!(second.frame.sequence_id(), 6);
    assert_eq!(second.frame.payload().as_bytes(), b"two");
    assert_eq!(server.delivery_log().map(|log| log.len()), Some(2));
}

#[tokio::test]
async fn without_delivery_log_reused_id_is_delivered_again() {
    let mut server = endpoint(fast()).await;
    let client = endpoint(fast()).await;
    let server_addr = server.local_addr().unwrap();

    let sending = async {
        client.send_message(5, b"one", server_addr).await.unwrap();
        client.send_message(5, b"one again", server_addr).await.unwrap();
    };
    let receiving = async {
        let first = server.receive().await.unwrap();
        let second = server.receive().await.unwrap();
        (first, second)
    };

    let ((), (first, second)) = tokio::join!(sending, receiving);
    assert_eq!(first.frame.sequence_id(), 5);
    assert_eq!(second.frame.sequence_id(), 5);
    assert_eq!(second.frame.payload().as_bytes(), b"one again");
}
