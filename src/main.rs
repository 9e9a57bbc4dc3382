use clap::Parser;
use dualroute::cli::{
    handle_completions, handle_config_init, handle_config_validate, load_config, paths, route, Cli,
    Commands, ConfigCommands,
};
use dualroute::config::DualrouteConfig;
use dualroute::logging::init_tracing;
use dualroute::registry::PathRegistry;

fn main() {
    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = match cli.command {
        Commands::Route(args) => load_config(&args.config)
            .and_then(with_tracing)
            .and_then(|config| route::handle_route(&args, &config))
            .map(|output| println!("{}", output)),
        Commands::Paths(args) => load_config(&args.config)
            .and_then(with_tracing)
            .and_then(|config| Ok(PathRegistry::from_config(&config.paths)?))
            .and_then(|registry| paths::handle_paths(&args, &registry))
            .map(|output| println!("{}", output)),
        Commands::Config(config_cmd) => match config_cmd {
            ConfigCommands::Init(args) => handle_config_init(&args),
            ConfigCommands::Validate(args) => {
                handle_config_validate(&args).map(|output| println!("{}", output))
            }
        },
        Commands::Completions(args) => {
            handle_completions(&args);
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Install the subscriber described by the loaded configuration.
fn with_tracing(config: DualrouteConfig) -> Result<DualrouteConfig, Box<dyn std::error::Error>> {
    init_tracing(&config.logging)?;
    Ok(config)
}
