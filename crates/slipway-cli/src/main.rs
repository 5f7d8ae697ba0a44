use std::path::PathBuf;

use atty::Stream;
use clap::{value_parser, ArgAction, Parser, Subcommand};
use color_eyre::{eyre::eyre, Result};
use serde_json::{json, Value};
use slipway_core::{
    asset_status, resolve_cache_root, schema_status, sync_assets, sync_schema, BuildContext,
    BuildUserError, CommandStatus, EnvSnapshot, ExecutionOutcome, SchemaSyncRequest,
};

mod style;

use style::Style;

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = SlipwayCli::parse();
    init_tracing(cli.verbose);

    let app_root = match &cli.app_root {
        Some(path) => path.clone(),
        None => std::env::current_dir()?,
    };
    let env = EnvSnapshot::capture();
    let cache = resolve_cache_root(&env, cli.cache_dir.clone(), &app_root);
    tracing::debug!(cache = %cache.path.display(), source = cache.source, "resolved cache root");

    let stages = match run(&cli, app_root, &cache.path, env) {
        Ok(stages) => stages,
        Err(err) => match err.downcast::<BuildUserError>() {
            Ok(user) => vec![StageOutcome {
                stage: "config",
                outcome: ExecutionOutcome::from(user),
            }],
            Err(other) => return Err(eyre!("{other:?}")),
        },
    };

    let code = emit_output(&cli, &stages)?;
    if code == 0 {
        Ok(())
    } else {
        std::process::exit(code);
    }
}

struct StageOutcome {
    stage: &'static str,
    outcome: ExecutionOutcome,
}

fn run(
    cli: &SlipwayCli,
    app_root: PathBuf,
    cache_root: &std::path::Path,
    env: EnvSnapshot,
) -> anyhow::Result<Vec<StageOutcome>> {
    let ctx = BuildContext::with_env(app_root, cache_root, env)?;

    let stages = match &cli.command {
        BuildCommand::Assets => vec![StageOutcome {
            stage: "assets",
            outcome: sync_assets(&ctx)?,
        }],
        BuildCommand::Migrate { rollback } => vec![StageOutcome {
            stage: "schema",
            outcome: sync_schema(
                &ctx,
                &SchemaSyncRequest {
                    rollback: *rollback,
                },
            )?,
        }],
        BuildCommand::Build => {
            let assets = sync_assets(&ctx)?;
            if assets.status != CommandStatus::Ok {
                // Assets aborted the build; do not touch the database.
                vec![StageOutcome {
                    stage: "assets",
                    outcome: assets,
                }]
            } else {
                let schema = sync_schema(&ctx, &SchemaSyncRequest::default())?;
                vec![
                    StageOutcome {
                        stage: "assets",
                        outcome: assets,
                    },
                    StageOutcome {
                        stage: "schema",
                        outcome: schema,
                    },
                ]
            }
        }
        BuildCommand::Status => vec![
            StageOutcome {
                stage: "assets",
                outcome: asset_status(&ctx)?,
            },
            StageOutcome {
                stage: "schema",
                outcome: schema_status(&ctx)?,
            },
        ],
    };

    Ok(stages)
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let filter = format!("slipway={level},slipway_core={level},slipway_domain={level}");
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true)
        .with_writer(std::io::stderr)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}

fn emit_output(cli: &SlipwayCli, stages: &[StageOutcome]) -> Result<i32> {
    let mut code = 0;
    for stage in stages {
        code = code.max(stage.outcome.status.exit_code());
    }

    let style = Style::new(cli.no_color, atty::is(Stream::Stdout));

    if cli.json {
        let payload = json!({
            "stages": stages
                .iter()
                .map(|stage| {
                    json!({
                        "stage": stage.stage,
                        "status": stage.outcome.status,
                        "message": stage.outcome.message,
                        "details": stage.outcome.details,
                    })
                })
                .collect::<Vec<Value>>(),
            "code": code,
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else if !cli.quiet {
        for stage in stages {
            let line = format!("{}: {}", stage.stage, stage.outcome.message);
            println!("{}", style.status(&stage.outcome.status, &line));
            if let Some(hint) = detail_str(&stage.outcome.details, "hint") {
                println!("{}", style.info(&format!("Hint: {hint}")));
            }
            if let Some(warning) = detail_str(&stage.outcome.details, "warning") {
                println!("{}", style.warning(&format!("Warning: {warning}")));
            }
        }
    }

    Ok(code)
}

fn detail_str<'a>(details: &'a Value, key: &str) -> Option<&'a str> {
    details
        .as_object()
        .and_then(|map| map.get(key))
        .and_then(Value::as_str)
}

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Incremental asset and schema sync for app deploys",
    long_about = "Skips or restores asset compilation by content fingerprint and keeps the \
                  database schema aligned with the deployed revision.",
    after_help = "Examples:\n  slipway build\n  slipway migrate --rollback\n  slipway --json status"
)]
struct SlipwayCli {
    #[arg(
        short,
        long,
        help = "Suppress human output (errors still print to stderr)"
    )]
    quiet: bool,
    #[arg(short, long, action = ArgAction::Count, help = "Increase logging (-vv reaches trace)")]
    verbose: u8,
    #[arg(long, help = "Emit a {stages,code} JSON envelope")]
    json: bool,
    #[arg(long, help = "Disable colored human output")]
    no_color: bool,
    #[arg(
        long,
        value_parser = value_parser!(PathBuf),
        help = "Application root (defaults to the current directory)"
    )]
    app_root: Option<PathBuf>,
    #[arg(
        long,
        value_parser = value_parser!(PathBuf),
        help = "Artifact cache directory (overrides SLIPWAY_CACHE_PATH)"
    )]
    cache_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: BuildCommand,
}

#[derive(Subcommand, Debug)]
enum BuildCommand {
    #[command(
        about = "Restore cached assets or recompile them when sources changed.",
        after_help = "Examples:\n  slipway assets\n  SLIPWAY_FORCE_ASSETS=1 slipway assets\n"
    )]
    Assets,
    #[command(
        about = "Run forward migrations, or roll the schema back when requested.",
        after_help = "Examples:\n  slipway migrate\n  slipway migrate --rollback\n"
    )]
    Migrate {
        #[arg(long, help = "Force a rollback even if the recorded version is not ahead")]
        rollback: bool,
    },
    #[command(
        about = "Run the full deploy sync: assets first, then migrations.",
        after_help = "Example:\n  slipway build\n"
    )]
    Build,
    #[command(
        about = "Report what the next build would do without running tasks.",
        after_help = "Examples:\n  slipway status\n  slipway --json status\n"
    )]
    Status,
}
