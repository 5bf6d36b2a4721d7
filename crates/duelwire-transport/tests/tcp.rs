//! Integration tests for the TCP transport.
//!
//! Each test binds a loopback listener, connects a `TcpConnection` to
//! it, and plays the server side by hand with raw socket writes.

#[cfg(feature = "tcp")]
mod tcp {
    use std::time::Duration;

    use duelwire_transport::{Connection, TcpConnection, TransportError, encode_frame};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    /// Helper: a listener on an OS-assigned port, a connected client,
    /// and the accepted server-side stream.
    async fn pair() -> (TcpConnection, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("should bind");
        let addr = listener.local_addr().expect("should have addr");
        let accept = tokio::spawn(async move { listener.accept().await.expect("should accept").0 });
        let client = TcpConnection::connect(addr).await.expect("should connect");
        let server = accept.await.expect("task should complete");
        (client, server)
    }

    async fn recv_within(conn: &TcpConnection) -> Option<Vec<u8>> {
        tokio::time::timeout(Duration::from_secs(2), conn.recv())
            .await
            .expect("recv should not hang")
            .expect("recv should not fail")
    }

    #[tokio::test]
    async fn test_tcp_receive_split_frames_in_order() {
        let (client, mut server) = pair().await;
        assert!(client.id().into_inner() > 0);

        let mut stream = encode_frame(&[0x01, 0xaa]).unwrap();
        stream.extend(encode_frame(&[0x02, 0xbb, 0xcc]).unwrap());
        // Dribble the bytes in two uneven writes.
        server.write_all(&stream[..3]).await.unwrap();
        server.flush().await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        server.write_all(&stream[3..]).await.unwrap();

        assert_eq!(recv_within(&client).await, Some(vec![0x01, 0xaa]));
        assert_eq!(recv_within(&client).await, Some(vec![0x02, 0xbb, 0xcc]));
        assert_eq!(client.last_exchange().await.last_received, vec![0x02, 0xbb, 0xcc]);
    }

    #[tokio::test]
    async fn test_tcp_send_prefixes_length_after_drain() {
        let (client, mut server) = pair().await;

        client.send(&[0x10, 1, 2, 3]).await.expect("send should succeed");
        client.drain().await.expect("drain should succeed");

        let mut buf = [0u8; 6];
        server.read_exact(&mut buf).await.unwrap();
        assert_eq!(buf, [4, 0, 0x10, 1, 2, 3]);
        assert_eq!(client.last_exchange().await.last_sent, vec![0x10, 1, 2, 3]);
    }

    #[tokio::test]
    async fn test_tcp_zero_length_frame_closes() {
        let (client, mut server) = pair().await;

        let mut stream = encode_frame(&[0x05]).unwrap();
        stream.extend([0, 0]);
        server.write_all(&stream).await.unwrap();

        assert_eq!(recv_within(&client).await, Some(vec![0x05]));
        assert_eq!(recv_within(&client).await, None);
        assert!(!client.is_alive());
    }

    #[tokio::test]
    async fn test_tcp_peer_disconnect_ends_queue() {
        let (client, server) = pair().await;
        drop(server);
        assert_eq!(recv_within(&client).await, None);
        assert!(!client.is_alive());
        assert!(matches!(
            client.send(&[1]).await,
            Err(TransportError::ConnectionClosed(_))
        ));
    }

    #[tokio::test]
    async fn test_tcp_local_close_unblocks_recv() {
        let (client, _server) = pair().await;
        let client = std::sync::Arc::new(client);

        let waiter = {
            let client = std::sync::Arc::clone(&client);
            tokio::spawn(async move { client.recv().await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        client.close().await.expect("close should succeed");

        let result = tokio::time::timeout(Duration::from_secs(2), waiter)
            .await
            .expect("recv should wake up")
            .expect("task should complete");
        assert!(matches!(result, Ok(None)));
        assert!(!client.is_alive());
    }

    #[tokio::test]
    async fn test_tcp_send_rejects_oversized_frame() {
        let (client, _server) = pair().await;
        let body = vec![0u8; 70_000];
        assert!(matches!(
            client.send(&body).await,
            Err(TransportError::FrameTooLarge(70_000))
        ));
        assert!(client.is_alive());
    }
}
