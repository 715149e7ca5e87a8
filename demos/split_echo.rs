use clap::Parser;
use clap_derive::Parser;
use packetsplit::config::SplitConfig;
use packetsplit::end_point::EndPoint;
use std::net::SocketAddr;
use std::time::{Duration, Instant};
use anyhow::anyhow;
use tokio::time::timeout;
use tracing::{info, warn, Level};

/// Sends messages from one end point to another on localhost, which echoes them back
#[derive(Parser)]
struct Args {
    #[clap(long, default_value_t = 100_000)]
    message_size: usize,

    #[clap(long, default_value_t = 1472)]
    packet_size: usize,

    #[clap(long, default_value_t = 10)]
    num_messages: usize,

    #[clap(short, long, default_value_t = false)]
    verbose: bool,

    #[clap(long, default_value_t = false)]
    very_verbose: bool,
}

#[tokio::main]
pub async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let level = match (args.verbose, args.very_verbose) {
        (_, true) => Level::TRACE,
        (true, _) => Level::DEBUG,
        (false, false) => Level::INFO,
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .try_init()
        .ok();

    let localhost: SocketAddr = "127.0.0.1:0".parse()?;
    let mut config = SplitConfig::new(localhost);
    config.send_packet_size = args.packet_size;
    config.recv_packet_size = args.packet_size;

    let mut client = EndPoint::bind(&config).await?;
    let mut server = EndPoint::bind(&config).await?;
    let server_addr = server.self_addr();
    info!("client at {:?}, server at {:?}", client.self_addr(), server_addr);

    let echo = tokio::spawn(async move {
        while let Some(received) = server.recv().await {
            let msg = match received {
                Ok(msg) => msg,
                Err(e) => {
                    warn!("server socket error: {}", e);
                    continue;
                }
            };
            if let Err(e) = server.send(&msg.payload, msg.from).await {
                warn!("echo failed: {}", e);
            }
        }
    });

    let mut num_lost = 0;
    for i in 0..args.num_messages {
        let message = (0..args.message_size).map(|n| (n + i) as u8).collect::<Vec<_>>();

        let start = Instant::now();
        let written = client.send(&message, server_addr).await?;

        match timeout(Duration::from_secs(1), client.recv()).await {
            Ok(Some(Ok(response))) if response.payload == message => {
                info!("message {}: {} bytes written, echo after {:?}", i, written, start.elapsed());
            }
            Ok(Some(Ok(_))) => {
                warn!("message {}: received a late echo of an earlier message", i);
                num_lost += 1;
            }
            Ok(Some(Err(e))) => return Err(e.into()),
            Ok(None) => return Err(anyhow!("client was shut down")),
            Err(_) => {
                info!("message {}: no echo - fragments were lost", i);
                num_lost += 1;
            }
        }
    }

    info!("{} of {} messages lost", num_lost, args.num_messages);
    echo.abort();
    Ok(())
}
