use clap::Parser;
use pegnetd::config::Config;
use pegnetd::factom::FactomClient;
use pegnetd::node::{DBlockSynchronizer, FileCursorRepository, Shutdown};
use pegnetd::pegnet::{DifficultyGrader, FileStore};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "pegnetd", version, about = "Syncs pegnet state from a factomd node")]
struct Args {
	/// Path to the TOML config file
	#[arg(long, short, env = "PEGNETD_CONFIG", default_value = "pegnetd.toml")]
	config: PathBuf,

	/// Log filter, overrides the configured level
	#[arg(long)]
	log_level: Option<String>,
}

#[tokio::main]
async fn main() {
	let args = Args::parse();

	let config = match Config::load_or_default(&args.config) {
		Ok(config) => config,
		Err(e) => {
			eprintln!("Failed to load config {:?}: {}", args.config, e);
			std::process::exit(1);
		}
	};

	let level = args.log_level.as_deref().unwrap_or(&config.logging.level);
	let filter = EnvFilter::try_from_default_env()
		.or_else(|_| EnvFilter::try_new(level))
		.unwrap_or_else(|_| EnvFilter::new("info"));
	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_target(false)
		.with_thread_ids(false)
		.with_thread_names(false)
		.with_file(false)
		.with_line_number(false)
		.init();

	info!("Starting pegnetd");

	if let Err(e) = tokio::fs::create_dir_all(&config.sync.data_dir).await {
		error!("Failed to create data dir {:?}: {}", config.sync.data_dir, e);
		return;
	}

	let factom_client = match FactomClient::new(
		config.factomd.url.clone(),
		config.request_timeout(),
		config.max_retry_elapsed(),
	) {
		Ok(client) => client,
		Err(e) => {
			error!("Failed to create factomd client: {}", e);
			return;
		}
	};

	info!("Using factomd at {}", config.factomd.url);

	let tracking = config.chain_tracking();
	for (name, chain_id) in tracking.iter() {
		info!(chain = name, "Tracking chain {}", chain_id);
	}

	let mut synchronizer = DBlockSynchronizer::new(
		Arc::new(factom_client),
		tracking,
		Arc::new(DifficultyGrader::new(
			config.grading.winners,
			config.grading.opr_version,
		)),
		Arc::new(FileStore::new(config.sync.data_dir.clone())),
		Arc::new(FileCursorRepository::new(config.sync.data_dir.clone())),
		config.retry_period(),
	);

	let cursor = match synchronizer.load_cursor().await {
		Ok(cursor) => cursor,
		Err(e) => {
			error!("Failed to load sync state: {}", e);
			return;
		}
	};

	let (trigger, shutdown) = Shutdown::new();
	tokio::spawn(async move {
		match tokio::signal::ctrl_c().await {
			Ok(()) => info!("Received interrupt, stopping after the current height"),
			Err(e) => {
				error!("Failed to listen for interrupt: {}", e);
				return;
			}
		}
		trigger.cancel();
	});

	let cursor = synchronizer.run(cursor, &shutdown).await;
	info!(
		synced = cursor.synced,
		"pegnetd stopped: {}",
		synchronizer.progress().summary()
	);
}
