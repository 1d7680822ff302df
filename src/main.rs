use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let subscriber = weather::tracing::get_tracing_subscriber("info");
    weather::tracing::init_subscriber(subscriber)?;

    let options = parse_options();
    let settings = load_settings(&options)?;

    let server = weather::Server::build(&settings).await?;
    server.run_until_stopped().await.map_err(|err| err.into())
}

fn parse_options() -> weather::CliOptions {
    let options = weather::CliOptions::parse();
    if options.secrets.is_none() {
        tracing::warn!("No secrets configuration provided. The weather provider API key should be confined in a secret configuration or the OPENWEATHER_API_KEY environment variable.");
    }

    options
}

fn load_settings(options: &weather::CliOptions) -> anyhow::Result<weather::Settings> {
    if options.environment.is_none() {
        tracing::info!(
            "No environment configuration override provided via {}.",
            weather::CliOptions::env_app_environment()
        );
    }

    Ok(weather::Settings::load(options)?)
}
