use clap::Parser;
use color_eyre::eyre::eyre;
use serde_json::{Value, json};

use nsdeck::cli::{Cli, Command};
use nsdeck::config::AppConfig;
use nsdeck::dashboard::Dashboard;
use nsdeck::grafana::GrafanaLinks;
use nsdeck::tracing::init_tracing;

use nsdeck_k8s_backend::KubeContext;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let _guard = init_tracing()?;

    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref())?;

    let output = match cli.command {
        Command::Config => serde_json::to_value(&config)?,
        command => query_cluster(command, &config).await?,
    };

    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}

async fn query_cluster(command: Command, config: &AppConfig) -> color_eyre::Result<Value> {
    let mut kube_context = KubeContext::default();
    let client = kube_context.cluster_client().await.map_err(|e| {
        tracing::error!("Failed to initialize Kubernetes context: {}", e);
        eyre!("K8s context init failed: {}", e)
    })?;
    tracing::info!("Kubernetes context initialized.");

    let dashboard = Dashboard::new(client, config);
    let grafana = GrafanaLinks::from_config(config);

    let output = match command {
        Command::List { full: true } => {
            serde_json::to_value(dashboard.namespaces_with_ingress().await)?
        }
        Command::List { full: false } => {
            let rows: Vec<_> = dashboard
                .namespaces_with_ingress()
                .await
                .iter()
                .map(|info| {
                    let dashboard_url = grafana
                        .as_ref()
                        .zip(info.name())
                        .map(|(g, name)| g.namespace_dashboard_url(name));
                    json!({
                        "name": info.name(),
                        "ingress_urls": info.ingress_url_strings(),
                        "is_special": info.is_special,
                        "grafana": dashboard_url,
                    })
                })
                .collect();
            Value::Array(rows)
        }
        Command::Show { namespace } => {
            let info = dashboard
                .namespace_info(&namespace)
                .await
                .ok_or_else(|| eyre!("namespace {} not found", namespace))?;

            let links = grafana.as_ref().map(|g| {
                g.namespace_links(
                    &namespace,
                    info.deployments
                        .iter()
                        .filter_map(|d| d.metadata.name.as_deref()),
                )
            });

            json!({
                "namespace": info,
                "grafana": links,
            })
        }
        Command::Config => serde_json::to_value(config)?,
    };

    Ok(output)
}
