use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use std::path::PathBuf;
use std::process::ExitCode;
use toolforge_cli::{report, ForgeConfig};
use toolforge_manifest::{Tier, SECTION_FIELD, TIER_FIELD};
use toolforge_scaffold::Preset;
use toolforge_store::{GitHubStore, MemoryStore, VersionedStore};
use toolforge_upsert::{ConflictRetry, ManifestUpserter, ToolBuilder, ToolRequest, UpsertError};
use tracing_subscriber::{fmt as tracing_fmt, prelude::*, EnvFilter};

fn cli() -> Command {
    Command::new("toolforge")
        .version(toolforge_cli::VERSION)
        .about("Register tools in a shared tools.yaml without losing concurrent edits")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Config file (default: ./toolforge.toml if present)"),
        )
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON lines"),
        )
        .arg(Arg::new("owner").long("owner").global(true).help("Repository owner"))
        .arg(Arg::new("repo").long("repo").global(true).help("Repository name"))
        .arg(Arg::new("branch").long("branch").global(true).help("Branch to read and write"))
        .arg(
            Arg::new("manifest")
                .long("manifest")
                .global(true)
                .help("Manifest path in the repository"),
        )
        .arg(
            Arg::new("retry")
                .long("retry")
                .global(true)
                .value_parser(["create-race-only", "never", "any-conflict"])
                .help("When to retry a conflicting write"),
        )
        .subcommand(
            Command::new("upsert")
                .about("Add or update one tool record")
                .arg(Arg::new("key").long("key").required(true).help("Tool key"))
                .arg(Arg::new("label").long("label").required(true).help("Display label"))
                .arg(
                    Arg::new("target")
                        .long("target")
                        .help("Module path (default: tools.<key>)"),
                )
                .arg(tier_arg())
                .arg(section_arg()),
        )
        .subcommand(
            Command::new("scaffold")
                .about("Generate a tool module and register it")
                .arg(Arg::new("key").long("key").required(true).help("Tool key"))
                .arg(Arg::new("label").long("label").required(true).help("Display label"))
                .arg(
                    Arg::new("description")
                        .long("description")
                        .help("Short description shown by the generic preset"),
                )
                .arg(
                    Arg::new("preset")
                        .long("preset")
                        .value_parser(value_parser!(Preset))
                        .help("invoice, resume, notes, bar_menu or generic (default: detect)"),
                )
                .arg(tier_arg())
                .arg(section_arg())
                .arg(
                    Arg::new("dry-run")
                        .long("dry-run")
                        .action(ArgAction::SetTrue)
                        .help("Print the generated module without writing anything"),
                ),
        )
        .subcommand(
            Command::new("check")
                .about("Lint the manifest")
                .arg(
                    Arg::new("file")
                        .long("file")
                        .value_parser(value_parser!(PathBuf))
                        .help("Local file to lint instead of the remote manifest"),
                ),
        )
        .subcommand(Command::new("show").about("List registered tools"))
}

fn tier_arg() -> Arg {
    Arg::new("tier")
        .long("tier")
        .value_parser(["free", "paid"])
        .help("Access tier")
}

fn section_arg() -> Arg {
    Arg::new("section").long("section").help("Sidebar section")
}

fn init_tracing(json: bool) -> Result<()> {
    let filter = if std::env::var_os("RUST_LOG").is_some() {
        EnvFilter::try_from_default_env().context("invalid RUST_LOG")?
    } else {
        EnvFilter::new("info")
    };

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_fmt::layer().with_writer(std::io::stderr))
            .init();
    }
    Ok(())
}

fn load_config(matches: &ArgMatches) -> Result<ForgeConfig> {
    let mut config = ForgeConfig::load(matches.get_one::<PathBuf>("config").map(PathBuf::as_path))?
        .with_process_env();

    if let Some(owner) = matches.get_one::<String>("owner") {
        config.store.owner.clone_from(owner);
    }
    if let Some(repo) = matches.get_one::<String>("repo") {
        config.store.repo.clone_from(repo);
    }
    if let Some(branch) = matches.get_one::<String>("branch") {
        config.store.branch.clone_from(branch);
    }
    if let Some(path) = matches.get_one::<String>("manifest") {
        config.manifest.manifest_path.clone_from(path);
    }
    if let Some(retry) = matches.get_one::<String>("retry") {
        config.manifest.conflict_retry = match retry.as_str() {
            "never" => ConflictRetry::Never,
            "any-conflict" => ConflictRetry::AnyConflict,
            _ => ConflictRetry::CreateRaceOnly,
        };
    }
    Ok(config)
}

fn remote_upserter(config: &ForgeConfig) -> Result<ManifestUpserter<GitHubStore>> {
    let store = GitHubStore::new(config.github()?)?;
    Ok(ManifestUpserter::new(store, config.manifest.clone()))
}

async fn upsert(config: &ForgeConfig, args: &ArgMatches) -> Result<()> {
    let key = arg(args, "key");
    let label = arg(args, "label");
    let target = arg(args, "target");

    // validate before touching the network
    let mut record = ManifestUpserter::<GitHubStore>::prepare(key, label, target)?;
    if let Some(tier) = args.get_one::<String>("tier") {
        record = record.with_extra(TIER_FIELD, Tier::parse(tier).as_str());
    }
    if let Some(section) = args.get_one::<String>("section").filter(|s| !s.trim().is_empty()) {
        record = record.with_extra(SECTION_FIELD, section.trim());
    }

    let outcome = remote_upserter(config)?.upsert_record(record).await?;
    println!("{}", outcome.message());
    Ok(())
}

async fn scaffold(config: &ForgeConfig, args: &ArgMatches) -> Result<()> {
    let mut request = ToolRequest::new(arg(args, "key"), arg(args, "label"))
        .with_description(arg(args, "description"));
    if let Some(preset) = args.get_one::<Preset>("preset") {
        request = request.with_preset(*preset);
    }
    if let Some(tier) = args.get_one::<String>("tier") {
        request = request.with_tier(Tier::parse(tier));
    }
    if let Some(section) = args.get_one::<String>("section") {
        request = request.with_section(section.clone());
    }

    if args.get_flag("dry-run") {
        let upserter = ManifestUpserter::new(MemoryStore::new(), config.manifest.clone());
        let outcome = ToolBuilder::new(upserter)
            .with_dry_run(true)
            .build(&request)
            .await?;
        eprintln!("{}", outcome.message());
        print!("{}", outcome.scaffold.source);
        return Ok(());
    }

    let outcome = ToolBuilder::new(remote_upserter(config)?)
        .build(&request)
        .await?;
    println!("{}", outcome.message());
    Ok(())
}

async fn check(config: &ForgeConfig, args: &ArgMatches) -> Result<bool> {
    let (source, text) = match args.get_one::<PathBuf>("file") {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            (path.display().to_string(), text)
        }
        None => {
            let store = GitHubStore::new(config.github()?)?;
            let path = config.manifest.manifest_path.as_str();
            let Some(file) = store.get_file(path).await? else {
                println!("{path}: not found");
                return Ok(true);
            };
            let text = String::from_utf8(file.content)
                .with_context(|| format!("{path} is not valid UTF-8"))?;
            (path.to_string(), text)
        }
    };

    let issues = toolforge_manifest::lint(&text);
    let (report, fatal) = report::lint_report(&source, &issues);
    print!("{report}");
    Ok(!fatal)
}

async fn show(config: &ForgeConfig) -> Result<()> {
    let fetched = remote_upserter(config)?.fetch().await?;
    if fetched.version.is_none() {
        eprintln!("{} does not exist yet", config.manifest.manifest_path);
    }
    print!("{}", report::manifest_table(&fetched.manifest));
    Ok(())
}

fn arg<'a>(args: &'a ArgMatches, name: &str) -> &'a str {
    args.get_one::<String>(name).map_or("", String::as_str)
}

async fn run(matches: &ArgMatches) -> Result<bool> {
    let config = load_config(matches)?;
    tracing::debug!(?config, "configuration resolved");

    match matches.subcommand() {
        Some(("upsert", args)) => upsert(&config, args).await.map(|()| true),
        Some(("scaffold", args)) => scaffold(&config, args).await.map(|()| true),
        Some(("check", args)) => check(&config, args).await,
        Some(("show", _)) => show(&config).await.map(|()| true),
        _ => Ok(false),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let matches = cli().get_matches();
    if let Err(err) = init_tracing(matches.get_flag("log-json")) {
        eprintln!("error: {err:#}");
        return ExitCode::FAILURE;
    }

    match run(&matches).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            match err.downcast_ref::<UpsertError>() {
                Some(upsert_err) => eprintln!("error: {}", upsert_err.user_message()),
                None => eprintln!("error: {err:#}"),
            }
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        cli().debug_assert();
    }

    #[test]
    fn parses_upsert() {
        let matches = cli()
            .try_get_matches_from([
                "toolforge", "--owner", "acme", "upsert", "--key", "notes", "--label", "Notes",
            ])
            .unwrap();
        let (name, args) = matches.subcommand().unwrap();
        assert_eq!(name, "upsert");
        assert_eq!(arg(args, "key"), "notes");
        assert_eq!(arg(args, "target"), "");
        assert_eq!(matches.get_one::<String>("owner").map(String::as_str), Some("acme"));
    }

    #[test]
    fn parses_scaffold_preset() {
        let matches = cli()
            .try_get_matches_from([
                "toolforge", "scaffold", "--key", "x", "--label", "X", "--preset", "bar_menu",
                "--dry-run",
            ])
            .unwrap();
        let (_, args) = matches.subcommand().unwrap();
        assert_eq!(args.get_one::<Preset>("preset"), Some(&Preset::BarMenu));
        assert!(args.get_flag("dry-run"));
    }

    #[test]
    fn rejects_unknown_tier() {
        assert!(cli()
            .try_get_matches_from(["toolforge", "upsert", "--key", "x", "--label", "X", "--tier", "gold"])
            .is_err());
    }
}
