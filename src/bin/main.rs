use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "cinetrack-server")]
#[command(about = "Movie watched-list and sharing server", long_about = None)]
struct Args {
    #[arg(short, long, default_value = "cinetrack.yaml")]
    config: String,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let mut config = match cinetrack::config::Config::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    config.debug_logs = args.debug;

    if let Err(e) = cinetrack::logging::init_logging(&config.logfile, args.debug) {
        eprintln!("Error: failed to open log file {}: {}", config.logfile, e);
        std::process::exit(1);
    }

    tracing::info!("Using config file: {}", args.config);

    if let Err(e) = cinetrack::run(config).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
