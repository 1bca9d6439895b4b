use anyhow::{anyhow, Context};
use clap::{Args, Parser, Subcommand};
use deckwright_core::{write_json, write_text, ActionDef, GameStateForRecs, Recommender};
use deckwright_data::{
    builtin_catalog, demo_state, load_catalog, load_recs_config, load_state,
    DEMO_COMPOSITION_IDS, DEMO_NOW_MS,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "deckwright")]
#[command(about = "Print deterministic action and target hands for a game state")]
#[command(version)]
struct Cli {
    /// Engine config (JSON); defaults apply when the file is absent
    #[arg(long, global = true, env = "DECKWRIGHT_CONFIG")]
    config: Option<PathBuf>,

    /// Emit JSON instead of the text report
    #[arg(long, global = true)]
    json: bool,

    /// Write the report to this file instead of stdout
    #[arg(long, global = true)]
    out: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Recommend actions for the current state
    Actions(StateArgs),

    /// Recommend targets for a chosen action
    Targets {
        #[command(flatten)]
        input: StateArgs,

        /// Id of the chosen action
        #[arg(long)]
        action: String,

        /// Milestone composition collectible ids, comma separated
        #[arg(long, value_delimiter = ',')]
        milestone_ids: Vec<String>,
    },

    /// Run the built-in demo: action hand, then targets for its first pick
    Demo,
}

#[derive(Debug, Args)]
struct StateArgs {
    /// Action catalog (JSON array); the built-in catalog when omitted
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Game state snapshot (JSON)
    #[arg(long)]
    state: PathBuf,

    /// Clock in epoch milliseconds; the system clock when omitted
    #[arg(long, env = "DECKWRIGHT_NOW_MS")]
    now: Option<u64>,
}

struct Inputs {
    actions: Vec<ActionDef>,
    state: GameStateForRecs,
    now_ms: u64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DemoReport {
    action_hand: deckwright_core::ActionHand,
    targets_hand: deckwright_core::TargetsHand,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn,deckwright=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match cli.config.as_deref() {
        Some(path) => load_recs_config(path)?,
        None => Default::default(),
    };
    let recommender = Recommender::new(config);
    let out = cli.out.as_deref();

    match cli.command {
        Command::Actions(args) => {
            let inputs = read_inputs(&args)?;
            let hand = recommender.action_hand(&inputs.state, &inputs.actions, inputs.now_ms);
            info!(mode = hand.mode.label(), size = hand.actions.len(), "action hand");
            emit(&hand, hand.to_text_report(), cli.json, out)
        }
        Command::Targets {
            input,
            action,
            milestone_ids,
        } => {
            let inputs = read_inputs(&input)?;
            let selected = inputs
                .actions
                .iter()
                .find(|candidate| candidate.id == action)
                .ok_or_else(|| anyhow!("unknown action {action}"))?;
            let hand = recommender.targets_hand(
                &inputs.state,
                selected,
                &milestone_ids,
                inputs.now_ms,
            );
            info!(action = %selected.id, size = hand.targets.len(), "targets hand");
            emit(&hand, hand.to_text_report(), cli.json, out)
        }
        Command::Demo => run_demo(&recommender, cli.json, out),
    }
}

fn read_inputs(args: &StateArgs) -> anyhow::Result<Inputs> {
    let actions = match args.catalog.as_deref() {
        Some(path) => load_catalog(path)?,
        None => builtin_catalog()?,
    };
    let state = load_state(&args.state)?;
    let now_ms = match args.now {
        Some(now) => now,
        None => system_now_ms()?,
    };
    debug!(now_ms, actions = actions.len(), "inputs ready");
    Ok(Inputs {
        actions,
        state,
        now_ms,
    })
}

fn system_now_ms() -> anyhow::Result<u64> {
    let elapsed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .context("system clock before unix epoch")?;
    u64::try_from(elapsed.as_millis()).context("system clock out of range")
}

fn run_demo(recommender: &Recommender, json: bool, out: Option<&Path>) -> anyhow::Result<()> {
    let actions = builtin_catalog()?;
    let state = demo_state()?;
    let action_hand = recommender.action_hand(&state, &actions, DEMO_NOW_MS);
    let picked = action_hand
        .actions
        .first()
        .map(|entry| entry.item.clone())
        .or_else(|| actions.iter().find(|action| action.id == "FI-01").cloned())
        .ok_or_else(|| anyhow!("demo catalog has no action to pick"))?;
    let composition: Vec<String> = DEMO_COMPOSITION_IDS.iter().map(|id| id.to_string()).collect();
    let targets_hand = recommender.targets_hand(&state, &picked, &composition, DEMO_NOW_MS);
    info!(picked = %picked.id, "demo pick");

    let text = format!(
        "{}\n\npicked: {}\n\n{}",
        action_hand.to_text_report(),
        picked.id,
        targets_hand.to_text_report()
    );
    let report = DemoReport {
        action_hand,
        targets_hand,
    };
    emit(&report, text, json, out)
}

fn emit<T: Serialize>(
    value: &T,
    text: String,
    json: bool,
    out: Option<&Path>,
) -> anyhow::Result<()> {
    match (out, json) {
        (Some(path), true) => {
            write_json(path, value).with_context(|| format!("write {}", path.display()))?
        }
        (Some(path), false) => {
            write_text(path, &text).with_context(|| format!("write {}", path.display()))?
        }
        (None, true) => println!("{}", serde_json::to_string_pretty(value)?),
        (None, false) => println!("{text}"),
    }
    Ok(())
}
