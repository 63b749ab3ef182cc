//! revet CLI entry point

use clap::Parser;
use revet_cli::args::Args;

type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync + 'static>>;

fn init_logger() {
    use std::io::Write;

    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Warn)
        .format(|buf, record| {
            let level_style = match record.level() {
                log::Level::Error => "\x1b[31m",
                log::Level::Warn => "\x1b[33m",
                log::Level::Info => "\x1b[32m",
                log::Level::Debug => "\x1b[36m",
                log::Level::Trace => "\x1b[90m",
            };

            writeln!(
                buf,
                "{}{} [{}]\x1b[0m {}",
                level_style,
                chrono::Local::now().format("%H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logger();

    let args = Args::parse();
    let mut app = revet_cli::CliApp::new(args);

    app.initialize()?;
    let exit_code = app.run().await?;
    std::process::exit(exit_code);
}
