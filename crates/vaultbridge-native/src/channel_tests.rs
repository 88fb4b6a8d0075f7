use super::*;

use tokio::io::AsyncWriteExt;
use tokio::sync::oneshot;
use vaultbridge_protocols::RequestType;

use crate::connector::DuplexConnector;

fn channel() -> (
    NativeChannel,
    Arc<DuplexConnector>,
    tokio::sync::mpsc::UnboundedReceiver<tokio::io::DuplexStream>,
) {
    let (connector, hosts) = DuplexConnector::new();
    let connector = Arc::new(connector);
    (NativeChannel::new(connector.clone(), 1024), connector, hosts)
}

#[tokio::test]
async fn test_connect_is_idempotent() {
    let (channel, connector, _hosts) = channel();
    let mut events = channel.subscribe();

    channel.connect().await.unwrap();
    channel.connect().await.unwrap();

    assert_eq!(connector.connect_count(), 1);
    assert_eq!(channel.generation(), Some(1));
    assert_eq!(
        events.recv().await.unwrap(),
        ChannelEvent::Connected { generation: 1 }
    );
}

#[tokio::test]
async fn test_send_without_channel() {
    let (channel, _connector, _hosts) = channel();
    let err = channel
        .send(&NativeRequest::new(1, RequestType::Ping, None))
        .await
        .unwrap_err();
    assert!(matches!(err, BridgeError::ChannelUnavailable));
}

#[tokio::test]
async fn test_connect_failure_leaves_no_channel() {
    let (channel, connector, _hosts) = channel();
    connector.set_refuse(true);
    assert!(channel.connect().await.is_err());
    assert!(!channel.is_connected());
}

#[tokio::test]
async fn test_host_exit_publishes_disconnect() {
    let (channel, _connector, mut hosts) = channel();
    let mut events = channel.subscribe();

    channel.connect().await.unwrap();
    let host = hosts.recv().await.unwrap();
    drop(host);

    assert_eq!(
        events.recv().await.unwrap(),
        ChannelEvent::Connected { generation: 1 }
    );
    assert_eq!(
        events.recv().await.unwrap(),
        ChannelEvent::Disconnected { generation: 1 }
    );
    assert!(!channel.is_connected());

    channel.connect().await.unwrap();
    assert_eq!(channel.generation(), Some(2));
}

#[tokio::test]
async fn test_oversized_frame_drops_channel() {
    let (channel, _connector, mut hosts) = channel();
    let mut events = channel.subscribe();
    channel.connect().await.unwrap();

    let (tx, rx) = oneshot::channel();
    channel.pending().insert(5, 1, tx);

    let mut host = hosts.recv().await.unwrap();
    host.write_all(&(4096u32).to_le_bytes()).await.unwrap();

    let _ = events.recv().await.unwrap();
    assert_eq!(
        events.recv().await.unwrap(),
        ChannelEvent::Disconnected { generation: 1 }
    );
    assert!(matches!(rx.await.unwrap(), Err(BridgeError::HostDisconnected)));
}

#[tokio::test]
async fn test_disconnect_scoped_to_generation() {
    let (channel, _connector, mut hosts) = channel();
    channel.connect().await.unwrap();
    let _first = hosts.recv().await.unwrap();

    let (old_tx, old_rx) = oneshot::channel();
    channel.pending().insert(1, 1, old_tx);
    channel.disconnect();
    assert!(matches!(
        old_rx.await.unwrap(),
        Err(BridgeError::HostDisconnected)
    ));

    channel.connect().await.unwrap();
    let _second = hosts.recv().await.unwrap();
    let (new_tx, _new_rx) = oneshot::channel();
    channel.pending().insert(2, 2, new_tx);

    // A late teardown of generation 1 must not touch generation 2.
    assert_eq!(channel.pending().reject_generation(1), 0);
    assert!(channel.pending().contains(2));
    assert!(channel.is_connected());
}
