//! Entry point for the `mapflow` command-line interface.
#![forbid(unsafe_code)]

fn main() {
    if let Err(err) = run() {
        eprintln!("mapflow: {err:?}");
        std::process::exit(1);
    }
}

fn run() -> eyre::Result<()> {
    mapflow_cli::run()?;
    Ok(())
}
