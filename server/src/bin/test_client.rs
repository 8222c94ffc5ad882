//! Scripted client for poking a running relay by hand.

use clap::Parser;
use shared::codec::encode_frame;
use shared::{TAG_DISCONNECT, TAG_PING, TAG_PLAYER_DATA, TAG_PLAYER_POSITION};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::sleep;

#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Relay address
    #[clap(short, long, default_value = "127.0.0.1:2525")]
    server: String,
    #[clap(short, long, default_value = "tester")]
    name: String,
    #[clap(short, long, default_value = "red")]
    color: String,
    #[clap(short, long, default_value = "blue")]
    team: String,
    /// Number of position updates to send
    #[clap(short, long, default_value = "5")]
    moves: u32,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let stream = TcpStream::connect(&args.server).await?;
    println!("Connected to {} from {}", args.server, stream.local_addr()?);
    let (mut reader, mut writer) = stream.into_split();

    // Print everything the relay sends back
    let printer = tokio::spawn(async move {
        let mut buf = [0u8; 1024];
        loop {
            match reader.read(&mut buf).await {
                Ok(0) => {
                    println!("Server closed the connection");
                    break;
                }
                Ok(len) => println!("Received: {:?}", String::from_utf8_lossy(&buf[..len])),
                Err(e) => {
                    println!("Error receiving data: {}", e);
                    break;
                }
            }
        }
    });

    let data = encode_frame(TAG_PLAYER_DATA, &[&args.name, &args.color, &args.team]);
    println!("Sending player data");
    writer.write_all(data.as_bytes()).await?;

    for step in 0..args.moves {
        let angle = step as f64 / 5.0;
        let position = encode_frame(
            TAG_PLAYER_POSITION,
            &[
                format!("{:.2}", angle.sin() * 10.0),
                "0".to_string(),
                format!("{:.2}", angle.cos() * 10.0),
            ],
        );
        println!("Sending position {}", step + 1);
        writer.write_all(position.as_bytes()).await?;
        sleep(Duration::from_millis(250)).await;
    }

    println!("Sending ping");
    writer.write_all(encode_frame::<&str>(TAG_PING, &[]).as_bytes()).await?;
    sleep(Duration::from_millis(250)).await;

    println!("Sending disconnect");
    writer
        .write_all(encode_frame::<&str>(TAG_DISCONNECT, &[]).as_bytes())
        .await?;

    if tokio::time::timeout(Duration::from_secs(2), printer).await.is_err() {
        println!("Server did not close the connection in time");
    }

    println!("Test client finished");
    Ok(())
}
