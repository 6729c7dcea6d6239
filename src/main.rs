//! Entry point for the equipment-side SECS/GEM stack (§1, §2, SPEC_FULL.md §3): parses the CLI,
//! loads the TOML bootstrap configuration, and spawns one device actor per `[[device]]` table.

mod adapters;
mod config;
mod device;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use argh::FromArgs;
use log::{error, info};

use adapters::{FileMappingStore, MappingStore, NullMappingStore, NullPlcLink, PlcLink, PlcValue};
use config::Config;

/// Equipment-side SEMI E30/E37 communications stack.
#[derive(FromArgs)]
struct Args {
    /// path to the TOML configuration file describing the devices to run
    #[argh(option, short = 'c')]
    config: PathBuf,

    /// log level passed straight to `env_logger` (error, warn, info, debug, trace)
    #[argh(option, short = 'l', default = "String::from(\"info\")")]
    log_level: String,
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<()> {
    let args: Args = argh::from_env();
    env_logger::Builder::new().parse_filters(&args.log_level).init();

    let config = Config::load(&args.config)?;
    if config.devices.is_empty() {
        anyhow::bail!("configuration at {} declares no [[device]] tables", args.config.display());
    }

    let mut handles = Vec::with_capacity(config.devices.len());
    for device_cfg in config.devices {
        let device_id = device_cfg.device_id;
        let store = build_mapping_store(&device_cfg)?;
        let plc: Arc<dyn PlcLink> = Arc::new(NullPlcLink::new(PlcValue::Bool(false)));
        handles.push(tokio::spawn(async move {
            if let Err(e) = device::run_device(device_cfg, store, plc).await {
                error!("device {device_id}: fatal error: {e:#}");
            }
        }));
    }

    info!("{} device(s) started", handles.len());
    for handle in handles {
        handle.await.context("device task panicked")?;
    }
    Ok(())
}

fn build_mapping_store(cfg: &config::DeviceConfig) -> Result<Arc<dyn MappingStore>> {
    if !cfg.persist_ecids {
        return Ok(Arc::new(NullMappingStore));
    }
    let path = cfg
        .mapping_store_path
        .as_deref()
        .unwrap_or("./state")
        .to_owned();
    Ok(Arc::new(FileMappingStore::new(path)))
}
