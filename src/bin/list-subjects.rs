use clap::Parser;
use soc_crawler::soc::{HttpSession, SEARCH_URL};
use soc_crawler::subjects;
use std::time::Duration;

/// Print the subjects offered on the search form, one per line.
#[derive(Debug, Parser)]
#[command(version)]
struct Args {
    #[arg(long, env = "SOC_URL", default_value = SEARCH_URL)]
    search_url: String,

    /// Seconds allowed for loading the search form
    #[arg(long, default_value_t = 10)]
    timeout: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("LOG_LEVEL")
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let timeout = Duration::from_secs(args.timeout);
    let mut session = HttpSession::new(&args.search_url, None, timeout, Duration::ZERO)?;

    for subject in subjects::enumerate(&mut session, &args.search_url, timeout, timeout).await? {
        println!("{}\t{}", subject.code, subject.label);
    }
    Ok(())
}
