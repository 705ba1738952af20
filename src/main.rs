use anyhow::{Context, Result};
use forge_deploy::cli::output::{format_plan, format_sequence_event, style, CROSS};
use forge_deploy::cli::{Cli, Command};
use forge_deploy::core::{Channels, ConfigSource, LayeredSource, MapSource, ProcessEnv, ResolvedConfig};
use forge_deploy::execution::{build_plan, CommandRunner, Platform, Sequencer, SystemRunner};
use std::path::Path;
use std::process::ExitCode;
use tracing::warn;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::from_args();

    if let Err(e) = init_logging(cli.verbose) {
        eprintln!("{} {:#}", CROSS, e);
        return ExitCode::FAILURE;
    }

    let result = match cli.command() {
        Command::Run => run(&cli).await,
        Command::Plan(cmd) => show_plan(&cli, cmd.json),
    };

    if let Err(e) = &result {
        eprintln!("{} {}", CROSS, style(format!("{:#}", e)).red());
    }
    ExitCode::from(exit_status(&result))
}

/// 0 on success, 1 for any failure
fn exit_status(result: &Result<()>) -> u8 {
    match result {
        Ok(()) => 0,
        Err(_) => 1,
    }
}

fn init_logging(verbose: bool) -> Result<()> {
    let log_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set logging subscriber")
}

/// Inputs file (when given) layered over `env`
fn input_source<E>(inputs_file: Option<&Path>, env: E) -> Result<LayeredSource>
where
    E: ConfigSource + 'static,
{
    let mut source = LayeredSource::new();
    if let Some(path) = inputs_file {
        source = source.with_layer(MapSource::from_inputs_file(path)?);
    }
    Ok(source.with_layer(env))
}

async fn run(cli: &Cli) -> Result<()> {
    let env = ProcessEnv;
    let mut channels = Channels::from_env(&env);

    let mut sequencer = Sequencer::new(SystemRunner);
    sequencer.add_event_handler(|event| println!("{}", format_sequence_event(event)));

    run_with(&sequencer, cli.inputs.as_deref(), env, &mut channels).await
}

/// Load inputs and run the sequencer; every failure reaches the step summary
async fn run_with<R, E>(
    sequencer: &Sequencer<R>,
    inputs_file: Option<&Path>,
    env: E,
    channels: &mut Channels,
) -> Result<()>
where
    R: CommandRunner,
    E: ConfigSource + Clone + 'static,
{
    let inputs = match input_source(inputs_file, env.clone()) {
        Ok(inputs) => inputs,
        Err(e) => {
            if let Err(summary_err) = channels.summarize_failure(&format!("{:#}", e)) {
                warn!("Could not write failure summary: {}", summary_err);
            }
            return Err(e);
        }
    };

    sequencer.run(&inputs, &env, channels).await?;
    Ok(())
}

fn show_plan(cli: &Cli, json: bool) -> Result<()> {
    let source = input_source(cli.inputs.as_deref(), ProcessEnv)?;
    let config = ResolvedConfig::resolve(&source)?;
    let plan = build_plan(&config, Platform::current())?;

    if json {
        let data = serde_json::json!({ "config": config, "plan": plan });
        println!("{}", serde_json::to_string_pretty(&data)?);
    } else {
        println!("{}", format_plan(&plan));
    }

    Ok(())
}
