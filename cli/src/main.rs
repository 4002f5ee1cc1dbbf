use clap::{Parser, Subcommand};
use pcb_common::db::core::BoardDB;
use pcb_common::util::config::Config;
use pcb_common::util::generator::{self, BoardSpec};
use pcb_common::util::logger;
use pcb_router::{GridBasedRouter, check};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Route every net of a board and write the routed board.
    Route {
        /// Board file; defaults to `input.board_file` from the config.
        #[arg(long)]
        board: Option<PathBuf>,
        /// Output file; defaults to `input.output_file` from the config.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Write a random board for benchmarking.
    Generate {
        #[arg(long, default_value_t = 20.0)]
        width: f64,
        #[arg(long, default_value_t = 20.0)]
        height: f64,
        #[arg(long, default_value_t = 2)]
        layers: usize,
        #[arg(long, default_value_t = 8)]
        nets: usize,
        #[arg(long, default_value_t = 2)]
        pins_per_net: usize,
        #[arg(long, default_value_t = 0.25)]
        through_hole_ratio: f64,
        #[arg(long, default_value_t = 1)]
        seed: u64,
        #[arg(long, default_value = "inputs/random.toml")]
        output: String,
    },
}

fn main() -> anyhow::Result<()> {
    logger::init();
    let args = Args::parse();

    let config: Config = if args.config.exists() {
        log::info!("Loading configuration from {:?}", args.config);
        let config_str = std::fs::read_to_string(&args.config)
            .map_err(|e| anyhow::anyhow!("Failed to read config file: {}", e))?;
        toml::from_str(&config_str)
            .map_err(|e| anyhow::anyhow!("Failed to parse config TOML: {}", e))?
    } else {
        log::warn!(
            "Configuration file {:?} not found. Using internal defaults.",
            args.config
        );
        Config::default()
    };

    let command = args.command.unwrap_or(Commands::Route {
        board: None,
        output: None,
    });

    match command {
        Commands::Generate {
            width,
            height,
            layers,
            nets,
            pins_per_net,
            through_hole_ratio,
            seed,
            output,
        } => {
            let ratio = through_hole_ratio.clamp(0.0, 1.0);
            if (ratio - through_hole_ratio).abs() > f64::EPSILON {
                log::warn!(
                    "Through-hole ratio {:.2} out of range. Clamped to {:.2}",
                    through_hole_ratio,
                    ratio
                );
            }
            prepare_output_dir(Path::new(&output))?;
            let spec = BoardSpec {
                width,
                height,
                layers,
                nets,
                pins_per_net,
                through_hole_ratio: ratio,
            };
            let db = generator::generate_random_board(&spec, seed);
            db.save(&output)?;
            log::info!("Generated: {}", output);
        }
        Commands::Route { board, output } => {
            let board = board.unwrap_or_else(|| PathBuf::from(&config.input.board_file));
            let output = output.unwrap_or_else(|| PathBuf::from(&config.input.output_file));
            if !board.exists() {
                return Err(anyhow::anyhow!(
                    "Board file missing: {:?}. Did you run 'generate'?",
                    board
                ));
            }
            prepare_output_dir(&output)?;

            if let Err(e) = run_routing(&config, &board, &output) {
                log::error!("Routing failed: {:#}", e);
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

fn prepare_output_dir(path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.exists()
        && !parent.as_os_str().is_empty()
    {
        log::info!("Creating output directory: {:?}", parent);
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

fn run_routing(config: &Config, board: &Path, output: &Path) -> anyhow::Result<()> {
    log::info!("Loading board: {:?}", board);
    let mut db = BoardDB::load(board)?;
    log::info!(
        "Board has {} layers, {} pads, {} nets, {} keepouts",
        db.layers.len(),
        db.num_pads(),
        db.num_nets(),
        db.keepouts.len()
    );
    if db.layers.is_empty() {
        return Err(anyhow::anyhow!("No layers defined! Cannot route."));
    }

    log::info!("Starting Routing...");
    let mut router = GridBasedRouter::new(&db, config.routing.clone()).map_err(|e| {
        log::error!("Router setup failed: {}", e);
        e
    })?;
    let summary = router.route_all_net_with_ripup_and_reroute()?;

    let report = check::run(router.best_solution());
    router.write_solution_back(&mut db);

    let factor = router.converter().grid_factor();
    log::info!(
        "Routed {}/{} nets, wirelength {:.3}, vias {}, cost {:.2}",
        summary.routed_nets,
        summary.routed_nets + summary.unrouted_nets,
        summary.total_wirelength as f64 * factor,
        summary.total_vias,
        summary.total_cost
    );

    log::info!("Writing routed board to {:?}", output);
    db.save(output)?;

    if report.shorts() > 0 {
        return Err(anyhow::anyhow!("Verification failed: {} short(s)", report.shorts()));
    }
    Ok(())
}
