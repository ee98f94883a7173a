//! Command line interface
//!
//! Each subcommand carries its own argument struct; nothing is global.
//! The structs convert into [`ApiTarget`] and [`DeploymentConfig`] before
//! anything talks to the API server.

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::info;

use crate::config::Config;
use crate::error::Result;
use crate::k8s::{build_deployment, build_patch, DeploymentManager, K8sClient};
use crate::models::{ApiTarget, Credentials, DeploymentConfig, Operation};

#[derive(Debug, Parser)]
#[command(
    name = "deployctl",
    author,
    version,
    about = "Manage Kubernetes Deployments over the REST API",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Create new Deployment.
    Create(ManifestArgs),
    /// Replace a current Deployment.
    Replace(ManifestArgs),
    /// Patch a current Deployment.
    Patch(ManifestArgs),
    /// Delete a current Deployment.
    Delete(TargetArgs),
}

impl Commands {
    pub fn operation(&self) -> Operation {
        match self {
            Commands::Create(_) => Operation::Create,
            Commands::Replace(_) => Operation::Replace,
            Commands::Patch(_) => Operation::Patch,
            Commands::Delete(_) => Operation::Delete,
        }
    }
}

/// Flags every subcommand takes
#[derive(Debug, Clone, Args)]
pub struct TargetArgs {
    /// User Id for Kubernetes
    #[arg(long, default_value = "admin")]
    pub user: String,

    /// Password for Kubernetes
    #[arg(long, env = "DEPLOYCTL_PASSWORD", hide_env_values = true)]
    pub password: String,

    /// API Url
    #[arg(long, env = "DEPLOYCTL_URL")]
    pub url: String,

    /// Namespace
    #[arg(long = "ns", default_value = "default")]
    pub namespace: String,

    /// Deployment Name
    #[arg(long)]
    pub name: String,
}

/// Flags for the subcommands that send a manifest
#[derive(Debug, Clone, Args)]
pub struct ManifestArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Image Pull Policy
    #[arg(long = "imagepullpolicy", default_value = "Always")]
    pub image_pull_policy: String,

    /// No. of replicas
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(i32).range(0..))]
    pub replicas: i32,

    /// Docker Image
    #[arg(long)]
    pub image: String,

    /// Container port
    #[arg(long, value_parser = clap::value_parser!(i32).range(1..=65535))]
    pub port: i32,

    /// Image Pull Secret
    #[arg(long = "imagepullsecret")]
    pub image_pull_secret: String,

    /// Set secret name and mountpath
    #[arg(long = "secret", value_name = "NAME=MOUNTPATH", value_parser = parse_key_value)]
    pub secrets: Vec<(String, String)>,

    /// Add env variable and its value
    #[arg(long = "env", value_name = "NAME=VALUE", value_parser = parse_key_value)]
    pub env: Vec<(String, String)>,

    /// Add memory limit
    #[arg(long)]
    pub limit: Option<String>,

    /// Add memory request
    #[arg(long)]
    pub request: Option<String>,

    /// Print the request body instead of sending it
    #[arg(long)]
    pub dry_run: bool,

    /// Output format for --dry-run
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    pub output: OutputFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Yaml,
}

/// Parse a `KEY=VALUE` pair; the value may itself contain `=`
pub fn parse_key_value(s: &str) -> std::result::Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("invalid KEY=VALUE: no `=` found in `{s}`"))?;
    if key.is_empty() {
        return Err(format!("invalid KEY=VALUE: empty key in `{s}`"));
    }
    Ok((key.to_string(), value.to_string()))
}

impl From<&TargetArgs> for ApiTarget {
    fn from(args: &TargetArgs) -> Self {
        ApiTarget {
            url: args.url.clone(),
            namespace: args.namespace.clone(),
            credentials: Credentials {
                user: args.user.clone(),
                password: args.password.clone(),
            },
        }
    }
}

impl From<&ManifestArgs> for DeploymentConfig {
    fn from(args: &ManifestArgs) -> Self {
        let non_empty = |v: &Option<String>| v.clone().filter(|s| !s.is_empty());

        DeploymentConfig {
            name: args.target.name.clone(),
            namespace: args.target.namespace.clone(),
            image: args.image.clone(),
            image_pull_policy: args.image_pull_policy.clone(),
            replicas: args.replicas,
            port: args.port,
            image_pull_secret: args.image_pull_secret.clone(),
            // Repeated keys: last one wins
            secrets: args.secrets.iter().cloned().collect(),
            env: args.env.iter().cloned().collect(),
            memory_limit: non_empty(&args.limit),
            memory_request: non_empty(&args.request),
        }
    }
}

/// Render a request document for `--dry-run`
pub fn render<T: Serialize>(document: &T, format: OutputFormat) -> Result<String> {
    Ok(match format {
        OutputFormat::Json => serde_json::to_string_pretty(document)?,
        OutputFormat::Yaml => serde_yaml::to_string(document)?,
    })
}

/// Run one parsed command to completion
pub async fn run(cli: Cli, config: &Config) -> Result<()> {
    let operation = cli.command.operation();

    match cli.command {
        Commands::Delete(args) => {
            let manager = manager_for(&args, config)?;
            let replicaset = manager.delete(&args.name).await?;
            info!(%operation, name = %args.name, replicaset = %replicaset, "done");
        }
        Commands::Create(args) | Commands::Replace(args) | Commands::Patch(args) => {
            let deployment = DeploymentConfig::from(&args);

            if args.dry_run {
                let rendered = match operation {
                    Operation::Patch => render(&build_patch(&deployment), args.output)?,
                    _ => render(&build_deployment(&deployment), args.output)?,
                };
                println!("{}", rendered.trim_end());
                return Ok(());
            }

            let manager = manager_for(&args.target, config)?;
            match operation {
                Operation::Create => manager.create(&deployment).await?,
                Operation::Replace => manager.replace(&deployment).await?,
                _ => manager.patch(&deployment).await?,
            }
            info!(%operation, name = %deployment.name, "done");
        }
    }

    Ok(())
}

fn manager_for(args: &TargetArgs, config: &Config) -> Result<DeploymentManager> {
    let client = K8sClient::new(&ApiTarget::from(args), config)?;
    Ok(DeploymentManager::new(client))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    const BASE: &[&str] = &[
        "deployctl",
        "create",
        "--password",
        "secret",
        "--url",
        "https://k8s.local",
        "--name",
        "web",
        "--image",
        "nginx",
        "--port",
        "80",
        "--imagepullsecret",
        "regcred",
    ];

    #[test]
    fn test_parse_key_value() {
        assert_eq!(
            parse_key_value("tls=/etc/tls").unwrap(),
            ("tls".to_string(), "/etc/tls".to_string())
        );
        assert_eq!(
            parse_key_value("OPTS=a=b").unwrap(),
            ("OPTS".to_string(), "a=b".to_string())
        );
        assert_eq!(
            parse_key_value("EMPTY=").unwrap(),
            ("EMPTY".to_string(), String::new())
        );
        assert!(parse_key_value("novalue").is_err());
        assert!(parse_key_value("=value").is_err());
    }

    #[test]
    fn test_defaults() {
        let cli = parse(BASE);
        let Commands::Create(args) = cli.command else {
            panic!("expected create");
        };

        assert_eq!(args.target.user, "admin");
        assert_eq!(args.target.namespace, "default");
        assert_eq!(args.image_pull_policy, "Always");
        assert_eq!(args.replicas, 1);
        assert!(args.secrets.is_empty());
        assert!(args.env.is_empty());
        assert!(!args.dry_run);
        assert_eq!(args.output, OutputFormat::Json);
    }

    #[test]
    fn test_repeatable_flags_build_config() {
        let mut argv = BASE.to_vec();
        argv.extend([
            "--secret",
            "tls=/etc/tls",
            "--secret",
            "db=/etc/db",
            "--env",
            "MODE=prod",
            "--env",
            "MODE=staging",
            "--limit",
            "512Mi",
            "--request",
            "",
            "--ns",
            "apps",
        ]);
        let Commands::Create(args) = parse(&argv).command else {
            panic!("expected create");
        };
        let config = DeploymentConfig::from(&args);

        assert_eq!(config.namespace, "apps");
        assert_eq!(config.secrets.len(), 2);
        assert_eq!(config.secrets["db"], "/etc/db");
        assert_eq!(config.env.len(), 1);
        assert_eq!(config.env["MODE"], "staging");
        assert_eq!(config.memory_limit, Some("512Mi".to_string()));
        assert_eq!(config.memory_request, None);
    }

    #[test]
    fn test_missing_required_flag() {
        let argv: Vec<&str> = BASE
            .iter()
            .copied()
            .filter(|a| *a != "--image" && *a != "nginx")
            .collect();
        assert!(Cli::try_parse_from(argv).is_err());
    }

    #[test]
    fn test_port_out_of_range() {
        let argv: Vec<&str> = BASE
            .iter()
            .map(|a| if *a == "80" { "70000" } else { *a })
            .collect();
        assert!(Cli::try_parse_from(argv).is_err());
    }

    #[test]
    fn test_delete_takes_only_target_flags() {
        let cli = parse(&[
            "deployctl",
            "delete",
            "--password",
            "secret",
            "--url",
            "https://k8s.local",
            "--name",
            "web",
        ]);
        assert_eq!(cli.command.operation(), Operation::Delete);

        let result = Cli::try_parse_from([
            "deployctl",
            "delete",
            "--password",
            "secret",
            "--url",
            "https://k8s.local",
            "--name",
            "web",
            "--image",
            "nginx",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_render_yaml() {
        let Commands::Create(args) = parse(BASE).command else {
            panic!("expected create");
        };
        let deployment = build_deployment(&DeploymentConfig::from(&args));
        let out = render(&deployment, OutputFormat::Yaml).unwrap();

        assert!(out.contains("apiVersion: apps/v1"));
        assert!(out.contains("kind: Deployment"));
    }
}
