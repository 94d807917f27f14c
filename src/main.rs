use clap::Parser;
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "ring-reconnector")]
#[command(about = "Automatically clicks the Ring live view reconnect button")]
#[command(version)]
struct Cli {
    /// Config file (built-in defaults when omitted)
    config: Option<PathBuf>,

    /// Page to open (overrides config)
    #[arg(long)]
    url: Option<String>,

    /// Run in headless mode (overrides config)
    #[arg(long)]
    headless: bool,

    /// Verbose output (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Validate config without running
    #[arg(long)]
    check: bool,

    /// Quiet mode (only errors)
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> ring_reconnector::Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let level = if cli.quiet {
        Level::ERROR
    } else {
        match cli.verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            _ => Level::DEBUG,
        }
    };

    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();

    let mut config = match cli.config {
        Some(ref path) => ring_reconnector::Config::load(path)?,
        None => ring_reconnector::Config::default(),
    };
    if let Some(url) = cli.url {
        config.target.url = url;
    }
    if cli.headless {
        config.browser.headless = true;
    }
    config.validate()?;

    if cli.check {
        println!("Config valid");
        println!("  Target: {}", config.target.url);
        println!("  Selectors: {}", config.detection.selectors.len());
        for selector in &config.detection.selectors {
            println!("    - {}", selector);
        }
        println!("  Reconnect texts: {}", config.detection.reconnect_texts().len());
        println!("  Poll interval: {}ms", config.schedule.poll_interval_ms);
        println!("  Debounce: {}ms", config.schedule.debounce_ms);
        return Ok(());
    }

    println!("Watching: {}", config.target.url);
    println!("Press Ctrl-C to stop.");

    let mut watcher = ring_reconnector::Watcher::new(&config).await?;
    let stats = watcher
        .run(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await;

    println!();
    println!("  Reconnects: {}", stats.activations);
    println!("  Detection passes: {}", stats.passes);
    println!("  Duration: {}ms", stats.duration_ms);

    watcher.close().await?;
    Ok(())
}
