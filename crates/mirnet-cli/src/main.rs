//! `mirnet` - command-line client for the image enhancement service

use anyhow::Context;
use clap::{value_parser, Arg, ArgMatches, Command};
use mirnet_api::{ClientConfig, Credentials};
use std::path::PathBuf;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

mod commands;

fn cli() -> Command {
    let user = Arg::new("user")
        .long("user")
        .short('u')
        .help("Account login");
    let password = Arg::new("password")
        .long("password")
        .short('p')
        .env("MIRNET_PASSWORD")
        .hide_env_values(true)
        .help("Account password");

    Command::new("mirnet")
        .version(mirnet_core::VERSION)
        .about("Client for the mirnet image enhancement service")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("TOML configuration file"),
        )
        .arg(
            Arg::new("api-base")
                .long("api-base")
                .global(true)
                .env("MIRNET_API_BASE")
                .help("Base URL of the service API"),
        )
        .subcommand(Command::new("status").about("Print the current session status"))
        .subcommand(
            Command::new("login")
                .about("Log in with an existing account")
                .arg(user.clone().required(true))
                .arg(password.clone()),
        )
        .subcommand(
            Command::new("register")
                .about("Create an account and log in")
                .arg(user.clone().required(true))
                .arg(password.clone()),
        )
        .subcommand(
            Command::new("enhance")
                .about("Upload an image and save the enhanced result")
                .arg(
                    Arg::new("input")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("PNG or JPEG image to enhance"),
                )
                .arg(
                    Arg::new("output")
                        .long("output")
                        .short('o')
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Where to write the result"),
                )
                .arg(user)
                .arg(password),
        )
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Defaults, then `--config`, then `--api-base` / `MIRNET_API_BASE`
fn load_config(matches: &ArgMatches) -> anyhow::Result<ClientConfig> {
    let mut config = match matches.get_one::<PathBuf>("config") {
        Some(path) => ClientConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => ClientConfig::default(),
    };
    if let Some(base) = matches.get_one::<String>("api-base") {
        config = config.with_api_base(base.clone());
    }
    Ok(config)
}

fn credentials(args: &ArgMatches) -> anyhow::Result<Option<Credentials>> {
    let Some(user) = args.get_one::<String>("user") else {
        return Ok(None);
    };
    let password = args
        .get_one::<String>("password")
        .context("a password is required (--password or MIRNET_PASSWORD)")?;
    Ok(Some(Credentials::new(user.clone(), password.clone())))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let matches = cli().get_matches();
    let config = load_config(&matches)?;
    tracing::debug!(api_base = %config.api_base, "configuration loaded");
    let client = commands::Client::connect(&config)?;

    match matches.subcommand() {
        Some(("status", _)) => client.status().await,
        Some(("login", args)) => {
            let credentials = credentials(args)?.context("--user is required")?;
            client.login(credentials).await
        }
        Some(("register", args)) => {
            let credentials = credentials(args)?.context("--user is required")?;
            client.register(credentials).await
        }
        Some(("enhance", args)) => {
            let input = args
                .get_one::<PathBuf>("input")
                .context("missing input path")?;
            let output = args
                .get_one::<PathBuf>("output")
                .context("missing output path")?;
            client.enhance(input, output, credentials(args)?).await
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_is_well_formed() {
        cli().debug_assert();
    }

    #[test]
    fn enhance_args_parse() {
        let matches = cli()
            .try_get_matches_from([
                "mirnet", "enhance", "photo.png", "-o", "out.png", "--user", "alice",
                "--password", "secret",
            ])
            .unwrap();
        let (name, args) = matches.subcommand().unwrap();
        assert_eq!(name, "enhance");
        assert_eq!(
            args.get_one::<PathBuf>("input"),
            Some(&PathBuf::from("photo.png"))
        );
        let creds = credentials(args).unwrap().unwrap();
        assert_eq!(creds.login(), "alice");
        assert_eq!(creds.password(), "secret");
    }

    #[test]
    fn login_requires_user() {
        assert!(cli().try_get_matches_from(["mirnet", "login"]).is_err());
    }

    #[test]
    fn api_base_overrides_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mirnet.toml");
        std::fs::write(&path, "api_base = \"http://file.example/api\"\ntimeout_secs = 5\n").unwrap();

        let file_only = cli()
            .try_get_matches_from(["mirnet", "--config", path.to_str().unwrap(), "status"])
            .unwrap();
        let config = load_config(&file_only).unwrap();
        assert_eq!(config.api_base, "http://file.example/api");
        assert_eq!(config.timeout_secs, 5);

        let overridden = cli()
            .try_get_matches_from([
                "mirnet",
                "status",
                "--config",
                path.to_str().unwrap(),
                "--api-base",
                "http://flag.example/api",
            ])
            .unwrap();
        let config = load_config(&overridden).unwrap();
        assert_eq!(config.api_base, "http://flag.example/api");
        assert_eq!(config.timeout_secs, 5);
    }
}
