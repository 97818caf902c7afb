use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use okdeploy::{Answers, ClientOptions, HttpClient, Kubeconfig, Session};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
struct Args {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Parser)]
enum Command {
    /// Apply manifests to the cluster.
    Deploy(SessionArgs),
    /// Delete the objects the manifests describe.
    Undeploy(SessionArgs),
}

#[derive(clap::Args)]
struct SessionArgs {
    /// Manifest files, applied in the given order.
    #[clap(required = true)]
    manifests: Vec<PathBuf>,
    /// Cluster API endpoint, e.g. https://127.0.0.1:8443
    #[clap(long)]
    endpoint: Option<String>,
    #[clap(long)]
    access_token: Option<String>,
    #[clap(long)]
    namespace: Option<String>,
    /// Cluster config file to resolve endpoint/token/namespace from.
    #[clap(long)]
    config: Option<PathBuf>,
    /// Resolve URLs but make no apply/delete requests.
    #[clap(long)]
    dry_run: bool,
    #[clap(long)]
    insecure_skip_tls_verify: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    match args.command {
        Command::Deploy(args) => run(args, false).await,
        Command::Undeploy(args) => run(args, true).await,
    }
}

async fn run(args: SessionArgs, undeploy: bool) -> anyhow::Result<()> {
    let kubeconfig = args
        .config
        .as_deref()
        .map(Kubeconfig::load)
        .transpose()
        .context("loading cluster config")?;

    let answers = Answers {
        endpoint: args.endpoint,
        access_token: args.access_token,
        namespace: args.namespace,
    };

    let client = HttpClient::new(&ClientOptions {
        ssl_verify: !args.insecure_skip_tls_verify,
        ..Default::default()
    })?;

    let session = Session::init(client, &answers, kubeconfig.as_ref()).await?;

    let manifests = args
        .manifests
        .iter()
        .map(|path| {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading manifest {}", path.display()))?;
            Ok((path.display().to_string(), text))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    let registry = session.process(manifests).await?;

    let outcome = if undeploy {
        session.undeploy(&registry, args.dry_run).await?
    } else {
        session.deploy(&registry, args.dry_run).await?
    };

    for object in outcome {
        let name = object.name.as_deref().unwrap_or("<unnamed>");
        if object.applied {
            println!("{} {name}", object.kind);
        } else {
            println!("would apply {} {name} at {}", object.kind, object.url);
        }
    }

    Ok(())
}
