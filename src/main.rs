//! council-server binary: load config, wire the pipeline, serve HTTP.

use anyhow::Context;
use council::{
    AppState, CategoryRegistry, CouncilConfig, Dispatcher, OpenAIClient, OpenAIEmbedder,
    PassageStore,
    api::routes::create_router,
    cli::{Cli, Commands, output::Output},
    store::KnowledgeStore,
};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse_args();
    let out = if cli.no_color {
        Output::no_color()
    } else {
        Output::new()
    };

    if let Some(Commands::Config { validate }) = &cli.command {
        return show_config(&cli, *validate, &out);
    }

    let mut config = CouncilConfig::load(&cli.config).with_context(|| {
        format!(
            "Failed to load configuration from '{}'",
            cli.config.display()
        )
    })?;
    if let Some(host) = &cli.host {
        config.server.host = host.clone();
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    init_tracing(&config, cli.verbose);

    out.banner();

    let warnings = config
        .validate_with_warnings()
        .context("Configuration validation failed")?;
    for warning in &warnings {
        out.warning(&warning.to_string());
    }

    let state = build_state(config).await?;

    out.success(&format!(
        "Loaded configuration from {}",
        cli.config.display()
    ));
    out.info(&format!(
        "Knowledge store: {} passages",
        state.store.passage_count()
    ));
    out.info(&format!(
        "Perspectives: {}",
        state
            .dispatcher
            .registry()
            .specs()
            .iter()
            .map(|spec| spec.display_name)
            .collect::<Vec<_>>()
            .join(", ")
    ));

    let addr = format!("{}:{}", state.config.server.host, state.config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    out.info(&format!("Listening on http://{addr}"));
    out.newline();
    tracing::info!("council-server listening on {addr}");

    let app = create_router(state);
    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            result.context("Server error")?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown requested (ctrl-c), stopping");
        }
    }

    Ok(())
}

/// Construct the shared application state from a validated config.
async fn build_state(config: CouncilConfig) -> anyhow::Result<AppState> {
    let api_key = config.api_key().context("Generation API key missing")?;

    let embedder = Arc::new(OpenAIEmbedder::from_config(
        &config.generation,
        api_key.clone(),
    ));
    let store: Arc<dyn KnowledgeStore> = Arc::new(
        PassageStore::load_or_empty(&config.store.snapshot_path, embedder)
            .await
            .context("Failed to load passage snapshot")?,
    );
    let client = Arc::new(OpenAIClient::from_config(&config.generation, api_key));

    let registry = CategoryRegistry::from_config(&config.dispatch);
    let dispatcher = Arc::new(Dispatcher::new(
        registry,
        store.clone(),
        client,
        config.dispatch.clone(),
    ));

    Ok(AppState {
        config: Arc::new(config),
        dispatcher,
        store,
    })
}

/// Handle `council-server config [--validate]`.
fn show_config(cli: &Cli, validate: bool, out: &Output) -> anyhow::Result<()> {
    let config = CouncilConfig::load(&cli.config).with_context(|| {
        format!(
            "Failed to load configuration from '{}'",
            cli.config.display()
        )
    })?;

    out.header("Configuration");
    out.kv("file", &cli.config.display().to_string());
    out.kv(
        "server",
        &format!("{}:{}", config.server.host, config.server.port),
    );
    out.kv("log level", &config.server.log_level);
    out.kv("generation model", &config.generation.model);
    out.kv("embedding model", &config.generation.embedding_model);
    out.kv(
        "snapshot",
        &config.store.snapshot_path.display().to_string(),
    );
    out.kv("top_k", &config.dispatch.top_k.to_string());
    out.kv("citation cap", &config.dispatch.citation_cap.to_string());
    out.kv(
        "timeouts",
        &format!(
            "agent {}s, session {}s",
            config.dispatch.agent_timeout_secs, config.dispatch.session_timeout_secs
        ),
    );

    out.header("Perspectives");
    for spec in CategoryRegistry::from_config(&config.dispatch).specs() {
        out.list_item(&format!("{} ({})", spec.display_name, spec.focus));
    }

    if validate {
        out.newline();
        match config.validate_with_warnings() {
            Ok(warnings) => {
                for warning in &warnings {
                    out.warning(&warning.to_string());
                }
                out.success("Configuration is valid");
                out.hint("Start the server with: council-server");
            }
            Err(e) => {
                out.error(&format!("Configuration invalid: {e}"));
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

/// Install the tracing subscriber. RUST_LOG wins over the configured level;
/// --verbose forces debug for this crate.
fn init_tracing(config: &CouncilConfig, verbose: bool) {
    let default_directive = if verbose {
        "council=debug,tower_http=debug".to_string()
    } else {
        format!("council={0},tower_http={0}", config.server.log_level)
    };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
