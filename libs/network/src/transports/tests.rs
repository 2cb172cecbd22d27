//! Transport Layer Tests
//!
//! Real loopback sockets, no mocks.

use super::*;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream, UdpSocket};
use tokio::time::timeout;

const WAIT: Duration = Duration::from_secs(5);
const LIMIT: usize = 64 * 1024;

async fn next(manager: &mut TransportManager) -> TransportEvent {
    timeout(WAIT, manager.next_event())
        .await
        .expect("transport event")
}

/// Start a connect and accept it on the listener side
async fn connect_pair(manager: &mut TransportManager, listener: &TcpListener) -> TcpStream {
    manager.start_connect(listener.local_addr().unwrap());
    let (accepted, event) = tokio::join!(listener.accept(), next(manager));
    assert!(matches!(event, TransportEvent::TcpConnected(_)));
    accepted.unwrap().0
}

mod tcp_lifecycle {
    use super::*;

    #[tokio::test]
    async fn test_connect_then_frame_packets() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            // Two packets, the second split across writes
            stream.write_all(&[0x02, 0x00, 0x00, 0x06, 0x02]).await.unwrap();
            stream.flush().await.unwrap();
            tokio::time::sleep(Duration::from_millis(20)).await;
            stream.write_all(&[0x00, 0xAA, 0xBB]).await.unwrap();
            let mut rest = Vec::new();
            let _ = stream.read_to_end(&mut rest).await;
        });

        let mut manager = TransportManager::new(WAIT, LIMIT);
        manager.start_connect(addr);

        match next(&mut manager).await {
            TransportEvent::TcpConnected(peer) => assert_eq!(peer, addr),
            other => panic!("Expected TcpConnected, got {:?}", other),
        }

        let mut packets = Vec::new();
        while packets.len() < 2 {
            match next(&mut manager).await {
                TransportEvent::TcpPackets(batch) => packets.extend(batch),
                other => panic!("Expected TcpPackets, got {:?}", other),
            }
        }
        assert_eq!(packets[0].packet_type, 2);
        assert!(packets[0].payload.is_empty());
        assert_eq!(packets[1].packet_type, 6);
        assert_eq!(&packets[1].payload[..], &[0xAA, 0xBB]);

        assert_eq!(manager.close_tcp(), TcpPhase::Connected);
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_connect_refused() {
        // Bind then drop to get a port nothing listens on
        let addr = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap()
        };

        let mut manager = TransportManager::new(WAIT, LIMIT);
        manager.start_connect(addr);
        match next(&mut manager).await {
            TransportEvent::TcpConnectFailed(err) => assert!(err.is_retryable()),
            other => panic!("Expected TcpConnectFailed, got {:?}", other),
        }
        assert_eq!(manager.close_tcp(), TcpPhase::Idle);
    }

    #[tokio::test]
    async fn test_peer_close_is_reported() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let mut manager = TransportManager::new(WAIT, LIMIT);
        let stream = connect_pair(&mut manager, &listener).await;

        drop(stream);
        assert!(matches!(
            next(&mut manager).await,
            TransportEvent::TcpClosed(None)
        ));
        assert_eq!(manager.close_tcp(), TcpPhase::Idle);
    }

    #[tokio::test]
    async fn test_queued_frame_reaches_peer() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let mut manager = TransportManager::new(WAIT, LIMIT);
        assert!(manager.queue_frame(&[1]).is_err());

        let mut stream = connect_pair(&mut manager, &listener).await;

        manager.queue_frame(&[0x00, 0x02, 0x00]).unwrap();
        manager.queue_frame(&[0x08, 0x02]).unwrap();

        // Queued bytes drain while the manager is polled
        let mut received = [0u8; 5];
        tokio::select! {
            event = manager.next_event() => panic!("Unexpected event {:?}", event),
            read = timeout(WAIT, stream.read_exact(&mut received)) => {
                read.unwrap().unwrap();
            }
        }
        assert_eq!(received, [0x00, 0x02, 0x00, 0x08, 0x02]);
    }

    #[tokio::test]
    async fn test_backlog_over_limit_drops_link() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let mut manager = TransportManager::new(WAIT, 4096);
        // Peer stays open but never reads
        let _stream = connect_pair(&mut manager, &listener).await;

        let frame = [0u8; 1000];
        for _ in 0..4 {
            manager.queue_frame(&frame).unwrap();
        }
        let err = manager.queue_frame(&frame).unwrap_err();
        assert_eq!(err.category(), "connection");
        assert!(err.to_string().contains("not reading"));

        // The link is gone, not just the frame
        assert_eq!(manager.close_tcp(), TcpPhase::Idle);
        assert!(manager.queue_frame(&[1]).is_err());
    }

    #[tokio::test]
    async fn test_abortive_close_resets_peer() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let mut manager = TransportManager::new(WAIT, LIMIT);
        let mut stream = connect_pair(&mut manager, &listener).await;

        assert_eq!(manager.close_tcp(), TcpPhase::Connected);
        assert_eq!(manager.close_tcp(), TcpPhase::Idle);

        let mut buf = [0u8; 8];
        let result = timeout(WAIT, stream.read(&mut buf)).await.unwrap();
        match result {
            Err(e) => assert_eq!(e.kind(), std::io::ErrorKind::ConnectionReset),
            Ok(n) => assert_eq!(n, 0),
        }
    }

    #[tokio::test]
    async fn test_start_connect_replaces_previous_link() {
        let first = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let second = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let second_addr = second.local_addr().unwrap();

        let mut manager = TransportManager::new(WAIT, LIMIT);
        let mut old_stream = connect_pair(&mut manager, &first).await;

        manager.start_connect(second_addr);
        match next(&mut manager).await {
            TransportEvent::TcpConnected(peer) => assert_eq!(peer, second_addr),
            other => panic!("Expected TcpConnected, got {:?}", other),
        }

        // The superseded stream was closed
        let mut buf = [0u8; 1];
        let read = timeout(WAIT, old_stream.read(&mut buf)).await.unwrap();
        assert!(matches!(read, Ok(0) | Err(_)));
    }
}

mod udp_path {
    use super::*;

    #[tokio::test]
    async fn test_datagram_delivered_whole() {
        let mut manager = TransportManager::new(WAIT, LIMIT);
        let local = manager.bind_udp(0).await.unwrap();
        assert_eq!(manager.bind_udp(0).await.unwrap(), local);

        let sender = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let target = SocketAddr::from(([127, 0, 0, 1], local.port()));
        sender.send_to(b"\x0a\x03abc", target).await.unwrap();

        match next(&mut manager).await {
            TransportEvent::UdpDatagram(bytes, from) => {
                assert_eq!(&bytes[..], b"\x0a\x03abc");
                assert_eq!(from, sender.local_addr().unwrap());
            }
            other => panic!("Expected UdpDatagram, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_udp_is_independent_of_tcp() {
        let mut manager = TransportManager::new(WAIT, LIMIT);
        let local = manager.bind_udp(0).await.unwrap();
        assert_eq!(manager.udp_local_addr(), Some(local));

        assert_eq!(manager.close_tcp(), TcpPhase::Idle);
        assert_eq!(manager.udp_local_addr(), Some(local));

        manager.close_udp();
        assert_eq!(manager.udp_local_addr(), None);
    }

    #[tokio::test]
    async fn test_idle_manager_has_no_events() {
        let mut manager = TransportManager::new(WAIT, LIMIT);
        let result = timeout(Duration::from_millis(50), manager.next_event()).await;
        assert!(result.is_err());
    }
}
