mod app;
mod channel;
mod config;
mod error;
mod generation;
mod logging;
mod runtime;
mod ui;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    runtime::run()
}
