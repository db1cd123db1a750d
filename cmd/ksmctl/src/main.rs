use anyhow::bail;
use clap::{Args, Parser, Subcommand, ValueEnum};
use pkg_constants::paths::DEFAULT_CONFIG;
use pkg_manifest::render::{render_json, render_yaml, write_manifests};
use pkg_types::config::{WorkloadConfig, WorkloadConfigFile, load_config_file};
use pkg_types::descriptor::ResourceKind;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(
    name = "ksmctl",
    about = "Generate the manifests that deploy kube-state-metrics"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the bundle and print it (or write one file per resource)
    Render {
        #[command(flatten)]
        workload: WorkloadArgs,

        /// Output format for stdout
        #[arg(long, value_enum, default_value_t = Format::Yaml)]
        format: Format,

        /// Write one YAML file per resource into this directory
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Check the configuration and list the resources it would produce
    Validate {
        #[command(flatten)]
        workload: WorkloadArgs,
    },
    /// Print the default configuration as YAML
    Defaults,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    Yaml,
    Json,
}

#[derive(Args, Debug)]
struct WorkloadArgs {
    /// Path to YAML config file
    #[arg(long, short, default_value = DEFAULT_CONFIG)]
    config: String,

    /// Workload name
    #[arg(long)]
    name: Option<String>,

    /// Namespace for every resource
    #[arg(long)]
    namespace: Option<String>,

    /// Container image reference
    #[arg(long)]
    image: Option<String>,

    /// Number of pod replicas
    #[arg(long, allow_negative_numbers = true)]
    replicas: Option<i32>,
}

impl WorkloadArgs {
    /// Merge: CLI args > config file > defaults
    fn merge(&self, mut file_cfg: WorkloadConfigFile) -> WorkloadConfig {
        file_cfg.name = self.name.clone().or(file_cfg.name);
        file_cfg.namespace = self.namespace.clone().or(file_cfg.namespace);
        file_cfg.image = self.image.clone().or(file_cfg.image);
        file_cfg.replicas = self.replicas.or(file_cfg.replicas);
        file_cfg.into_config()
    }

    fn load(&self) -> anyhow::Result<WorkloadConfig> {
        let file_cfg: WorkloadConfigFile = load_config_file(&self.config)?;
        info!("Config file: {}", self.config);
        Ok(self.merge(file_cfg))
    }
}

fn scope(kind: ResourceKind) -> &'static str {
    if kind.is_cluster_scoped() {
        "Cluster"
    } else {
        "Namespaced"
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Render {
            workload,
            format,
            output,
        } => {
            let config = workload.load()?;
            let descriptors = pkg_manifest::build(&config)?;

            match (output, format) {
                (Some(dir), Format::Yaml) => {
                    for path in write_manifests(&dir, &descriptors)? {
                        println!("{}", path.display());
                    }
                }
                (Some(_), Format::Json) => {
                    bail!("--output writes one YAML file per resource; drop --format json");
                }
                (None, Format::Yaml) => print!("{}", render_yaml(&descriptors)?),
                (None, Format::Json) => print!("{}", render_json(&descriptors)?),
            }
        }
        Commands::Validate { workload } => {
            let config = workload.load()?;
            let descriptors = pkg_manifest::build(&config)?;

            println!(
                "{:<20} {:<12} {:<20} {}",
                "KIND", "SCOPE", "NAMESPACE", "NAME"
            );
            for d in &descriptors {
                let namespace = if d.kind().is_cluster_scoped() {
                    "-"
                } else {
                    d.namespace()
                };
                println!(
                    "{:<20} {:<12} {:<20} {}",
                    d.kind().to_string(),
                    scope(d.kind()),
                    namespace,
                    d.name()
                );
            }
            println!("Configuration is valid ({} resources)", descriptors.len());
        }
        Commands::Defaults => {
            let file_cfg = WorkloadConfigFile::from(WorkloadConfig::default());
            print!("{}", serde_yaml::to_string(&file_cfg)?);
        }
    }
    Ok(())
}

fn main() {
    // Logs go to stderr so stdout stays a clean manifest stream.
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn workload_args(argv: &[&str]) -> WorkloadArgs {
        let mut full = vec!["ksmctl", "validate"];
        full.extend_from_slice(argv);
        match Cli::try_parse_from(full).unwrap().command {
            Commands::Validate { workload } => workload,
            _ => panic!("expected validate"),
        }
    }

    #[test]
    fn cli_overrides_file_values() {
        let args = workload_args(&["--namespace", "monitoring", "--replicas", "3"]);
        let file_cfg = WorkloadConfigFile {
            namespace: Some("ops".to_string()),
            replicas: Some(2),
            image: Some("quay.io/ksm/ksm:v2".to_string()),
            ..Default::default()
        };
        let config = args.merge(file_cfg);
        assert_eq!(config.namespace, "monitoring");
        assert_eq!(config.replicas, 3);
        assert_eq!(config.image, "quay.io/ksm/ksm:v2");
        assert_eq!(config.name, "kube-state-metrics");
    }

    #[test]
    fn cli_name_relabels() {
        let args = workload_args(&["--name", "ksm"]);
        let config = args.merge(WorkloadConfigFile::default());
        assert_eq!(config.labels["app"], "ksm");
    }

    #[test]
    fn negative_replicas_reach_the_builder() {
        let args = workload_args(&["--replicas", "-1"]);
        let config = args.merge(WorkloadConfigFile::default());
        let err = pkg_manifest::build(&config).unwrap_err();
        assert_eq!(err.field, "replicas");
    }

    #[test]
    fn default_config_path() {
        let args = workload_args(&[]);
        assert_eq!(args.config, DEFAULT_CONFIG);
    }

    #[test]
    fn scope_column_follows_kind() {
        let config = WorkloadConfig::default();
        let descriptors = pkg_manifest::build(&config).unwrap();
        let scopes: Vec<&str> = descriptors.iter().map(|d| scope(d.kind())).collect();
        assert_eq!(
            scopes,
            vec!["Cluster", "Cluster", "Namespaced", "Namespaced", "Namespaced"]
        );
        assert_eq!(scope(ResourceKind::Role), "Namespaced");
        assert_eq!(scope(ResourceKind::RoleBinding), "Namespaced");
    }

    #[test]
    fn render_flags_parse() {
        let cli = Cli::try_parse_from(["ksmctl", "render", "--format", "json", "-o", "out"]).unwrap();
        match cli.command {
            Commands::Render { format, output, .. } => {
                assert_eq!(format, Format::Json);
                assert_eq!(output, Some(PathBuf::from("out")));
            }
            _ => panic!("expected render"),
        }
    }

    #[test]
    fn json_directory_output_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let cli = Cli::try_parse_from([
            "ksmctl",
            "render",
            "--config",
            dir.path().join("absent.yaml").to_str().unwrap(),
            "--format",
            "json",
            "--output",
            out.to_str().unwrap(),
        ])
        .unwrap();
        assert!(run(cli).is_err());
        assert!(!out.exists());
    }
}
