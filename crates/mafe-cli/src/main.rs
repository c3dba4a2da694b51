//! `mafe` command-line entry point

use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use mafe_cli::{
    build_coordinator, init_tracing, load_dir, render_report, render_resolution, write_back,
    CliConfig,
};
use mafe_core::{
    FileId, FileRecord, Instruction, IntentResolver, LanguageCapability, TargetDisambiguator,
};
use mafe_llm::GeminiCapability;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

fn common_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("dir")
                .long("dir")
                .required(true)
                .value_parser(value_parser!(PathBuf))
                .help("Directory holding the files to edit"),
        )
        .arg(
            Arg::new("instruction")
                .long("instruction")
                .short('i')
                .required(true)
                .help("Natural-language instruction"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .value_parser(value_parser!(PathBuf))
                .help("TOML configuration file"),
        )
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON"),
        )
}

fn cli() -> Command {
    Command::new("mafe")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Multi-agent file editor")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            common_args(Command::new("run").about("Apply an instruction to a directory of files"))
                .arg(
                    Arg::new("write")
                        .long("write")
                        .action(ArgAction::SetTrue)
                        .help("Write edited files back to the directory"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Print the report as JSON"),
                ),
        )
        .subcommand(common_args(
            Command::new("resolve").about("Show which files an instruction targets"),
        ))
}

fn required<'a>(args: &'a ArgMatches, name: &str) -> Result<&'a String> {
    args.get_one::<String>(name)
        .with_context(|| format!("missing --{name}"))
}

fn dir_arg(args: &ArgMatches) -> Result<&PathBuf> {
    args.get_one::<PathBuf>("dir").context("missing --dir")
}

async fn run(args: &ArgMatches) -> Result<ExitCode> {
    let dir = dir_arg(args)?;
    let text = required(args, "instruction")?;
    let config = CliConfig::load(args.get_one::<PathBuf>("config").map(PathBuf::as_path))?;
    let files = load_dir(dir, config.engine.max_files)?;

    let gemini = Arc::new(
        GeminiCapability::new(config.llm.clone().with_env_fallback())
            .context("configuring language model")?,
    );
    let capability: Arc<dyn LanguageCapability> = Arc::clone(&gemini) as _;
    let disambiguator: Arc<dyn TargetDisambiguator> = gemini;
    let coordinator = build_coordinator(&config.engine, &files, capability, Some(disambiguator))?;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupted; cancelling unfinished files");
            on_interrupt.cancel();
        }
    });

    let report = coordinator
        .process_with_cancel(Instruction::new(text.as_str()), cancel)
        .await;

    if args.get_flag("json") {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", render_report(&report));
    }

    if args.get_flag("write") {
        let written = write_back(dir, &report)?;
        tracing::info!(files = written, dir = %dir.display(), "write-back complete");
    }

    Ok(if report.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

async fn resolve(args: &ArgMatches) -> Result<ExitCode> {
    let dir = dir_arg(args)?;
    let text = required(args, "instruction")?;
    let config = CliConfig::load(args.get_one::<PathBuf>("config").map(PathBuf::as_path))?;
    let records: Vec<FileRecord> = load_dir(dir, config.engine.max_files)?
        .into_iter()
        .map(|f| FileRecord::new(FileId::from(f.name.as_str()), f.name, f.content))
        .collect();

    let mut resolver =
        IntentResolver::new().with_disambiguation_timeout(config.engine.agent_timeout());
    match GeminiCapability::new(config.llm.with_env_fallback()) {
        Ok(gemini) => resolver = resolver.with_disambiguator(Arc::new(gemini)),
        Err(e) => tracing::info!(reason = %e, "resolving without a disambiguator"),
    }

    match resolver.resolve(&Instruction::new(text.as_str()), &records).await {
        Ok(resolved) => {
            print!("{}", render_resolution(&resolved));
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            println!("{e}");
            Ok(ExitCode::FAILURE)
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let matches = cli().get_matches();
    let Some((name, args)) = matches.subcommand() else {
        return ExitCode::FAILURE;
    };
    init_tracing(args.get_flag("log-json"));

    let result = match name {
        "run" => run(args).await,
        "resolve" => resolve(args).await,
        _ => Ok(ExitCode::FAILURE),
    };

    result.unwrap_or_else(|e| {
        eprintln!("error: {e:#}");
        ExitCode::from(2)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_definition_is_consistent() {
        cli().debug_assert();
    }

    #[test]
    fn run_accepts_all_flags() {
        let matches = cli()
            .try_get_matches_from([
                "mafe", "run", "--dir", "docs", "-i", "fix file_1", "--write", "--json",
                "--log-json",
            ])
            .unwrap();
        let (name, args) = matches.subcommand().unwrap();
        assert_eq!(name, "run");
        assert!(args.get_flag("write"));
        assert_eq!(required(args, "instruction").unwrap(), "fix file_1");
    }

    #[test]
    fn resolve_rejects_write() {
        assert!(cli()
            .try_get_matches_from(["mafe", "resolve", "--dir", "d", "-i", "x", "--write"])
            .is_err());
    }
}
