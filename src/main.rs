use clap::Parser;
use homeval::cli::{self, Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "homeval=info,tower_http=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Train {
            data,
            output,
            seed,
            test_size,
            no_simulate,
        } => cli::cmd_train(&data, &output, seed, test_size, no_simulate),
        Commands::Predict {
            model,
            data,
            output,
        } => cli::cmd_predict(&model, &data, output.as_deref()),
        Commands::Info { data } => cli::cmd_info(&data),
        Commands::Serve {
            port,
            host,
            data,
            model,
        } => cli::cmd_serve(&host, port, data.as_deref(), model.as_deref()).await,
    }
}
