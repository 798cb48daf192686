//! Run websocket server
//!
//! ```not_rust
//! git clone https://github.com/tokio-rs/axum && cd axum
//! cargo run -p example-websockets-http2
//! ```

use futures_util::{SinkExt, StreamExt, TryStreamExt};
use http::header;
use std::time::Duration;
use wreq::{Client, Message, RequestBuilder};

#[tokio::main]
async fn main() -> Result<(), wreq::Error> {
    env_logger::init();

    let client = Client::builder().cert_verification(false).build()?;

    // Use the API you're already familiar with
    let websocket = client
        .websocket("wss://127.0.0.1:3000/ws")
        .configure_request(configure_request)
        .send()
        .await?;

    assert_eq!(websocket.version(), http::Version::HTTP_11);

    let (mut tx, mut rx) = websocket.into_websocket().await?.split();

    tokio::spawn(async move {
        for i in 1..11 {
            tx.send(Message::Text(format!("Hello, World! #{i}").into()))
                .await
                .unwrap();
        }
    });

    while let Some(message) = rx.try_next().await? {
        if let Message::Text(text) = message {
            println!("received: {text}");
        }
    }

    Ok(())
}

/// We can also set HTTP options here
fn configure_request(builder: RequestBuilder) -> RequestBuilder {
    builder
        .header(header::USER_AGENT, env!("CARGO_PKG_NAME"))
        .timeout(Duration::from_secs(10))
}
