//! Plume - a static site build engine.

use anyhow::{Result, bail};
use clap::Parser;
use plume::{
    cli::{Cli, Commands},
    config::{Provider, SiteConfig},
    configured::ConfiguredSite,
    init::new_site,
    log,
    site::RunMode,
};
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log!("error"; "{err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let config = load_config(cli)?;

    match &cli.command {
        Commands::New { name } => new_site(&config, name.is_some()),
        Commands::Generate => generate(config),
        Commands::Run { port } => {
            let output = config.root.join(&config.build.output);
            generate(config)?;
            log!("serve"; "http://localhost:{port} (ctrl-c to stop)");
            plume::utils::exec::serve(&output, *port)
        }
        Commands::Deploy => {
            if config.deploy.provider == Provider::None {
                bail!("[deploy.provider] is not set in the config file");
            }
            ConfiguredSite::new(config).publish_configured(RunMode::Deployment)?;
            Ok(())
        }
    }
}

fn generate(config: SiteConfig) -> Result<()> {
    ConfiguredSite::new(config).publish_configured(RunMode::Generation)?;
    Ok(())
}

/// Load and validate configuration from CLI arguments
fn load_config(cli: &Cli) -> Result<SiteConfig> {
    let root = cli.root.clone().unwrap_or_else(|| "./".into());
    let config_path = root.join(&cli.config);

    let mut config = if config_path.exists() && !cli.is_new() {
        SiteConfig::from_path(&config_path)?
    } else {
        SiteConfig::default()
    };
    config.update_with_cli(cli);

    let config_exists = config.config_path.exists();
    match (cli.is_new(), config_exists) {
        (true, true) => {
            bail!("Config file already exists. Remove it manually or create the site in a different path.")
        }
        (false, false) => bail!("Config file not found. Run `plume new` to create a site."),
        _ => {}
    }

    if !cli.is_new() {
        config.validate()?;
    }

    Ok(config)
}
