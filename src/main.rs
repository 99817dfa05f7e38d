use clap::Parser;
use hydro_blocks::cli::{run, Cli};
use hydro_blocks::error::Result;

fn main() -> Result<()> {
    let cli = Cli::parse();
    run(cli)
}
