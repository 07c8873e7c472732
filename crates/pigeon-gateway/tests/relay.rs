//! End-to-end relay tests over real WebSocket connections

use std::net::SocketAddr;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use pigeon_gateway::{Gateway, GatewayConfig, CONNECT_ACK};
use serde_json::{json, Value};
use tokio::net::TcpStream;
use tokio::time::{sleep, timeout};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn start_gateway() -> (Gateway, SocketAddr) {
    let gateway = Gateway::new(GatewayConfig {
        bind: "127.0.0.1:0".to_string(),
        max_connections: 16,
    });
    let listener = gateway.bind().await.unwrap();
    let addr = listener.local_addr().unwrap();
    let serving = gateway.clone();
    tokio::spawn(async move {
        let _ = serving.serve(listener).await;
    });
    (gateway, addr)
}

async fn connect(addr: SocketAddr, user_id: &str) -> Client {
    let url = format!("ws://{}/api/pushMessage/{}", addr, user_id);
    let (client, _) = timeout(Duration::from_secs(5), connect_async(url))
        .await
        .expect("connect timed out")
        .expect("connect failed");
    client
}

async fn expect_text(client: &mut Client) -> String {
    loop {
        let frame = timeout(Duration::from_secs(5), client.next())
            .await
            .expect("recv timed out")
            .expect("connection ended")
            .expect("transport error");
        match frame {
            Message::Text(text) => return text,
            Message::Ping(_) | Message::Pong(_) => continue,
            other => panic!("unexpected frame: {:?}", other),
        }
    }
}

async fn wait_for_count(gateway: &Gateway, expected: usize) {
    for _ in 0..100 {
        if gateway.router().online_count() == expected {
            return;
        }
        sleep(Duration::from_millis(20)).await;
    }
    panic!(
        "online count never reached {}, still {}",
        expected,
        gateway.router().online_count()
    );
}

#[tokio::test]
async fn connect_is_acknowledged_and_counted() {
    let (gateway, addr) = start_gateway().await;
    let mut client = connect(addr, "10").await;
    assert_eq!(expect_text(&mut client).await, CONNECT_ACK);
    assert_eq!(gateway.router().online_count(), 1);
}

#[tokio::test]
async fn malformed_connect_path_is_rejected() {
    let (_gateway, addr) = start_gateway().await;
    let url = format!("ws://{}/api/otherThing/10", addr);
    assert!(connect_async(url).await.is_err());
}

#[tokio::test]
async fn relays_between_two_clients() {
    let (gateway, addr) = start_gateway().await;
    let mut a = connect(addr, "10").await;
    let mut b = connect(addr, "20").await;
    assert_eq!(expect_text(&mut a).await, CONNECT_ACK);
    assert_eq!(expect_text(&mut b).await, CONNECT_ACK);
    assert_eq!(gateway.router().online_count(), 2);

    a.send(Message::Text(
        r#"{"toUserId":"20","fromUserId":"99","msg":"hi"}"#.to_string(),
    ))
    .await
    .unwrap();

    let delivered: Value = serde_json::from_str(&expect_text(&mut b).await).unwrap();
    assert_eq!(
        delivered,
        json!({"toUserId": "20", "fromUserId": "10", "msg": "hi"})
    );

    // closing the sender drops it from the registry and kills pushes to it
    a.close(None).await.unwrap();
    wait_for_count(&gateway, 1).await;
    assert!(!gateway.router().push_to_user("10", "anyone home?"));
}

#[tokio::test]
async fn server_push_reaches_the_addressed_client() {
    let (gateway, addr) = start_gateway().await;
    let mut client = connect(addr, "10").await;
    assert_eq!(expect_text(&mut client).await, CONNECT_ACK);

    assert!(gateway.router().push_to_user("10", "14:05:00"));
    assert_eq!(expect_text(&mut client).await, "14:05:00");
}

#[tokio::test]
async fn reconnect_steals_the_registration() {
    let (gateway, addr) = start_gateway().await;
    let mut first = connect(addr, "10").await;
    assert_eq!(expect_text(&mut first).await, CONNECT_ACK);
    let mut second = connect(addr, "10").await;
    assert_eq!(expect_text(&mut second).await, CONNECT_ACK);
    assert_eq!(gateway.router().online_count(), 1);

    // pushes land on the newest connection only
    assert!(gateway.router().push_to_user("10", "hello"));
    assert_eq!(expect_text(&mut second).await, "hello");
}
