use ciband::cli::load_settings;
use ciband::{
    AppConfig, Args, ConfigManager, Diagnostic, Diagnostics, RenderOutput, RenderRequest,
    Transformer, APP_NAME,
};
use clap::Parser;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// What the driver prints on stdout.
#[derive(Serialize)]
struct CliOutput<'a> {
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    output: Option<RenderOutput>,
    diagnostics: Vec<&'a Diagnostic>,
}

/// Apply command-line overrides on top of the loaded configuration.
fn apply_overrides(config: &mut AppConfig, args: &Args) {
    if let Some(generation) = args.generation {
        config.validation.generation = generation.into();
    }
    if let Some(policy) = args.requested_field_policy() {
        config.fields.policy = policy.into();
    }
}

fn init_logging(args: &Args, config: &AppConfig) {
    let level = if args.debug {
        "debug"
    } else {
        config.logging.level.as_str()
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn handle_early_exit_flags(args: &Args) -> Result<Option<()>> {
    if args.generate_config {
        let manager = ConfigManager::new(APP_NAME)?;
        let path = manager.write_default_config(args.force)?;
        println!("Configuration written to {}", path.display());
        return Ok(Some(()));
    }
    Ok(None)
}

fn read_request(args: &Args) -> Result<RenderRequest> {
    let path = args
        .request
        .as_ref()
        .ok_or_else(|| eyre!("A render request file is required"))?;
    let content = std::fs::read_to_string(path)
        .map_err(|e| eyre!("Failed to read request at {}: {}", path.display(), e))?;
    let mut request: RenderRequest = serde_json::from_str(&content)
        .map_err(|e| eyre!("Failed to parse request at {}: {}", path.display(), e))?;

    if let Some(settings_path) = &args.config {
        request.config.merge(load_settings(settings_path)?);
    }
    Ok(request)
}

fn main() -> Result<()> {
    let args = Args::parse();
    color_eyre::install()?;

    if let Some(()) = handle_early_exit_flags(&args)? {
        return Ok(());
    }

    let mut config = AppConfig::load(APP_NAME)?;
    apply_overrides(&mut config, &args);
    init_logging(&args, &config);

    let request = read_request(&args)?;
    let transformer = Transformer::from_config(&config);
    let mut diagnostics = Diagnostics::new();
    let result = transformer.render(
        &request.fields,
        &request.data,
        &request.config,
        &mut diagnostics,
    );

    let ok = result.is_ok();
    let out = CliOutput {
        ok,
        output: result.ok(),
        diagnostics: diagnostics.iter().collect(),
    };
    let json = if args.pretty {
        serde_json::to_string_pretty(&out)?
    } else {
        serde_json::to_string(&out)?
    };
    println!("{}", json);

    if !ok {
        std::process::exit(1);
    }
    Ok(())
}
