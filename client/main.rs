// sockio-get: fetch a resource over a driven sockio transport and print what comes back
use chrono::Local;
use clap::Parser;
use sockio_client::{format_chunk, SockioClient};
use std::process;
use std::thread;
use std::time::{Duration, Instant};

#[derive(Parser)]
#[command(name = "sockio-get")]
#[command(about = "Send an HTTP/1.0 GET through a sockio transport", long_about = None)]
#[command(version = "0.1.0")]
struct Cli {
    /// Host to connect to
    host: String,

    /// Port to connect to
    #[arg(short, long, default_value_t = 80)]
    port: u16,

    /// Request path
    #[arg(long, default_value = "/")]
    path: String,

    /// Stop after this many milliseconds without data
    #[arg(long, value_name = "MS", default_value_t = 5000)]
    idle_ms: u64,
}

fn main() {
    sockio::init_logging();
    let cli = Cli::parse();

    println!("Connecting to {}:{}", cli.host, cli.port);

    let mut client = match SockioClient::connect(&cli.host, cli.port) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to connect: {}", e);
            process::exit(1);
        }
    };

    let request = format!(
        "GET {} HTTP/1.0\r\nHost: {}\r\nConnection: close\r\n\r\n",
        cli.path, cli.host
    );
    if let Err(e) = client.send(request.as_bytes()) {
        eprintln!("Failed to send request: {}", e);
        process::exit(1);
    }

    let idle = Duration::from_millis(cli.idle_ms);
    let mut last_activity = Instant::now();
    let mut total = 0usize;

    while !client.is_closed() {
        let chunk = client.poll();
        if chunk.is_empty() {
            if last_activity.elapsed() >= idle {
                eprintln!("No data for {} ms, giving up", cli.idle_ms);
                break;
            }
            thread::sleep(Duration::from_millis(5));
            continue;
        }
        total += chunk.len();
        last_activity = Instant::now();
        println!("{}", format_chunk(&chunk, Local::now()));
    }

    println!(
        "Received {} bytes, {} request write(s) completed",
        total,
        client.completed_sends()
    );
    client.close();
}
