use anyhow::Result;
use clap::Parser;
use wavebench::cli::setup::init_logging;
use wavebench::cli::{Cli, Commands};
use wavebench::observability::install_panic_hook;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let debug = matches!(&cli.command, Commands::Run(args) if args.debug);
    init_logging(debug);
    install_panic_hook();

    match cli.command {
        Commands::Run(args) => {
            let report = wavebench::commands::run_pipeline(&args)?;
            if report.cancelled {
                std::process::exit(130);
            }
            Ok(())
        }
        Commands::Count { root } => {
            wavebench::commands::print_counts(&root)?;
            Ok(())
        }
        Commands::Init { force } => wavebench::commands::init_config(force),
    }
}
