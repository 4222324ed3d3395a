use segdrill_cli::{commands, Cli};
use tracing::Level;

fn max_level(verbose: u8) -> Level {
    match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

fn main() {
    let cli = Cli::parse_args();

    tracing_subscriber::fmt()
        .with_max_level(max_level(cli.verbose))
        .with_writer(std::io::stderr)
        .init();

    match commands::run(&cli) {
        Ok(report) => print!("{}", report),
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(1);
        }
    }
}
