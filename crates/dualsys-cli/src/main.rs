use anyhow::Context;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use dualsys_cli::{diff_files, load_config, render_diff, run_simulator, FlagReport, SimulatorConfig};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

fn cli() -> Command {
    Command::new("dualsys")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Dual-system migration router: simulation, structural diff, flag inspection")
        .subcommand_required(true)
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON lines"),
        )
        .subcommand(
            Command::new("simulate")
                .about("Replay a seeded mix of reads and writes through one router")
                .arg(
                    Arg::new("config")
                        .long("config")
                        .value_parser(value_parser!(PathBuf))
                        .help("Migration config (.toml, .yaml, .yml)"),
                )
                .arg(
                    Arg::new("calls")
                        .long("calls")
                        .default_value("1000")
                        .value_parser(value_parser!(u64))
                        .help("Number of routed calls to replay"),
                )
                .arg(
                    Arg::new("seed")
                        .long("seed")
                        .default_value("42")
                        .value_parser(value_parser!(u64))
                        .help("Random seed for reproducibility"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output as JSON"),
                ),
        )
        .subcommand(
            Command::new("diff")
                .about("Structural diff of two JSON documents; exits 1 on mismatch")
                .arg(
                    Arg::new("legacy")
                        .required(true)
                        .value_parser(value_parser!(PathBuf)),
                )
                .arg(
                    Arg::new("new")
                        .required(true)
                        .value_parser(value_parser!(PathBuf)),
                )
                .arg(
                    Arg::new("ignore")
                        .long("ignore")
                        .action(ArgAction::Append)
                        .help("Field name to exclude (repeatable)"),
                )
                .arg(
                    Arg::new("no-timestamps")
                        .long("no-timestamps")
                        .action(ArgAction::SetTrue)
                        .help("Skip createdAt/updatedAt and similar fields"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output discrepancies as JSON"),
                ),
        )
        .subcommand(
            Command::new("flags")
                .about("Print resolved flags and the dispatch mode per operation class")
                .arg(
                    Arg::new("config")
                        .long("config")
                        .value_parser(value_parser!(PathBuf))
                        .help("Migration config (.toml, .yaml, .yml)"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output as JSON"),
                ),
        )
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn simulate(args: &ArgMatches) -> anyhow::Result<i32> {
    let migration = load_config(args.get_one::<PathBuf>("config").map(PathBuf::as_path))?;
    let config = SimulatorConfig {
        seed: args.get_one::<u64>("seed").copied().unwrap_or(42),
        calls: args.get_one::<u64>("calls").copied().unwrap_or(1000),
        ..SimulatorConfig::default()
    };

    let report = run_simulator(config, &migration).await?;
    if args.get_flag("json") {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", report.generate_text());
    }
    Ok(if report.passed() { 0 } else { 1 })
}

fn diff(args: &ArgMatches) -> anyhow::Result<i32> {
    let legacy = args
        .get_one::<PathBuf>("legacy")
        .context("missing legacy document path")?;
    let new = args
        .get_one::<PathBuf>("new")
        .context("missing new document path")?;
    let ignore: Vec<String> = args
        .get_many::<String>("ignore")
        .map(|values| values.cloned().collect())
        .unwrap_or_default();

    let report = diff_files(legacy, new, &ignore, !args.get_flag("no-timestamps"))?;
    if args.get_flag("json") {
        println!("{}", serde_json::to_string_pretty(&report.discrepancies)?);
    } else {
        print!("{}", render_diff(&report));
    }
    Ok(if report.is_match() { 0 } else { 1 })
}

fn flags(args: &ArgMatches) -> anyhow::Result<i32> {
    let config = load_config(args.get_one::<PathBuf>("config").map(PathBuf::as_path))?;
    let report = FlagReport::from_config(&config);
    if args.get_flag("json") {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", report.generate_text());
    }
    Ok(0)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let matches = cli().get_matches();
    init_tracing(matches.get_flag("log-json"));

    let code = match matches.subcommand() {
        Some(("simulate", args)) => simulate(args).await?,
        Some(("diff", args)) => diff(args)?,
        Some(("flags", args)) => flags(args)?,
        _ => 2,
    };
    std::process::exit(code);
}
