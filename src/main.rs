use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use supply_chain_game::io::reporting::{self, ConsoleSink, JsonLinesLedger, ScoreRecord, ScoreSink};
use supply_chain_game::strategy::implementations::{
    BaseStockPolicy, NaivePolicy, RandomPolicy, SmoothingPolicy, StermanHeuristic,
};
use supply_chain_game::{
    EnvType, Environment, Game, NodeRole, OrderPolicy, SimulationConfig, CHAIN_LENGTH,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "beer-game")]
#[command(about = "Play the four-echelon beer distribution game")]
struct Cli {
    /// Demand ruleset: classical, uniform_0_2 or normal_10_4
    #[arg(long, default_value = "classical")]
    env_type: EnvType,

    /// TOML file with a full game configuration (overrides --env-type)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Demand RNG seed
    #[arg(long)]
    seed: Option<u64>,

    /// Number of turns
    #[arg(long)]
    horizon: Option<usize>,

    /// Ordering strategy used by all four nodes
    #[arg(short, long, value_enum, default_value = "random")]
    strategy: Strategy,

    /// Write the per-turn history to this CSV file
    #[arg(long)]
    history: Option<PathBuf>,

    /// Append the final score to this JSON-lines ledger
    #[arg(long)]
    ledger: Option<PathBuf>,

    /// Name recorded with the score
    #[arg(long, default_value = "anonymous")]
    player: String,

    /// Print the chain after every turn
    #[arg(long)]
    render: bool,

    /// Debug logging (takes precedence over RUST_LOG)
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Strategy {
    Random,
    Naive,
    BaseStock,
    Sterman,
    Smoothing,
}

impl Strategy {
    fn policies(self, config: &SimulationConfig) -> [Box<dyn OrderPolicy>; CHAIN_LENGTH] {
        // Demand statistics the optimised strategies plan for.
        let (mean, std_dev) = config.demand.moments();
        NodeRole::ALL.map(|role| -> Box<dyn OrderPolicy> {
            match self {
                Strategy::Random => Box::new(RandomPolicy::dummy_bot(config.seed.wrapping_add(role.index() as u64))),
                Strategy::Naive => Box::new(NaivePolicy::new()),
                Strategy::BaseStock => Box::new(BaseStockPolicy::with_optimal_target(config, role, mean, std_dev)),
                Strategy::Sterman => Box::new(StermanHeuristic::with_optimal_target(config, role, mean, std_dev)),
                Strategy::Smoothing => {
                    Box::new(SmoothingPolicy::with_optimal_target(config, role, 0.3, mean, std_dev))
                }
            }
        })
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        tracing_subscriber::EnvFilter::new("debug")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into())
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    // 1. SETUP CONFIGURATION
    let mut config = match &cli.config {
        Some(path) => SimulationConfig::from_path(path)?,
        None => SimulationConfig::for_env_type(cli.env_type),
    };
    if let Some(seed) = cli.seed {
        config.seed = seed;
    }
    if let Some(horizon) = cli.horizon {
        config.horizon = horizon;
    }

    // 2. DEFINE STRATEGIES
    let policies = cli.strategy.policies(&config);

    // 3. PLAY
    let env = Environment::new(config.clone()).context("invalid game configuration")?;
    let mut game = Game::new(env, policies).with_render(cli.render);
    let summary = game.play().context("simulation aborted")?;

    // 4. EXPORT RESULTS
    if let Some(path) = &cli.history {
        reporting::write_history_csv(path, &game.history)
            .with_context(|| format!("writing history to {}", path.display()))?;
    }

    // 5. COST ANALYSIS
    println!("\n=== Cost Analysis ===");
    for (role, cost) in summary.cost_breakdown() {
        println!("{}: {:.2}", role, cost);
    }
    println!("Total Supply Chain Cost: {:.2}", summary.total_cost);

    // 6. SUBMIT SCORE
    let record = ScoreRecord::new(&cli.player, &summary, &config);
    let mut sink: Box<dyn ScoreSink> = match &cli.ledger {
        Some(path) => Box::new(JsonLinesLedger::new(path)),
        None => Box::new(ConsoleSink),
    };
    sink.submit(&record).context("submitting score")?;

    Ok(())
}
