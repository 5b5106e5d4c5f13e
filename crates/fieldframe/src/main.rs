mod assets;
mod cli;
mod paths;
mod run;
mod sink;

use anyhow::Result;

fn main() -> Result<()> {
    let cli = cli::parse();
    run::initialise_tracing();
    run::run(cli)
}
