use log::{error, info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use time::OffsetDateTime;
use tokio::time::{sleep, Duration};

use weather_reader::config::ReaderConfig;
use weather_reader::utils::format_datetime;
use weather_reader::{Reader, Registry, SysfsBoard};

async fn main_loop(
    config: ReaderConfig,
    sampling: Arc<AtomicBool>,
) -> Result<(), Box<dyn std::error::Error>> {
    info!("Starting weather station reader");

    let board = Arc::new(SysfsBoard::new(&config.sysfs_root));
    let mut reader = Reader::new(Registry::standard(board))?;
    for (sensor, args) in &config.sensor_args {
        if let Err(e) = reader.set_init_args(sensor, *args) {
            warn!("Ignoring arguments for {}: {}", sensor, e);
        }
    }

    loop {
        let start_time = OffsetDateTime::now_utc();
        info!("Starting burst at: {}", format_datetime(&start_time));

        // Sampling sleeps between reads, keep it off the async workers
        let (repetitions, delay) = (config.repetitions, config.delay_secs);
        let flag = sampling.clone();
        flag.store(true, Ordering::SeqCst);
        let (returned, result) = tokio::task::spawn_blocking(move || {
            let result = reader.run_burst(repetitions, delay);
            flag.store(false, Ordering::SeqCst);
            (reader, result)
        })
        .await?;
        reader = returned;

        match result {
            Ok(data) => {
                let end_time = OffsetDateTime::now_utc();
                info!("Burst complete at: {}", format_datetime(&end_time));

                // Print summary
                let mut channels: Vec<_> = data.iter().collect();
                channels.sort_by(|a, b| a.0.cmp(b.0));
                for (channel, value) in channels {
                    info!("  Average {}: {:.2}", channel, value);
                }
                info!("  Based on {} samples per sensor", repetitions);

                // Warning if no data collected
                if data.is_empty() {
                    warn!("No data collected during this burst!");
                }
            }
            Err(e) => error!("Burst failed: {}", e),
        }

        info!(
            "Waiting {} seconds until next burst",
            config.interval_secs
        );
        sleep(Duration::from_secs(config.interval_secs)).await;
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .format_timestamp_secs()
        .init();

    // Load configuration
    let config = match ReaderConfig::new() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    // Handle Ctrl+C gracefully
    let (tx, mut rx) = tokio::sync::oneshot::channel();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                let _ = tx.send(());
            }
            Err(e) => error!("Failed to listen for Ctrl+C: {}", e),
        }
    });

    // Run main loop or wait for shutdown signal
    let sampling = Arc::new(AtomicBool::new(false));
    tokio::select! {
        result = main_loop(config, sampling.clone()) => {
            match result {
                Ok(_) => info!("Program completed successfully"),
                Err(e) => error!("Fatal error: {}", e),
            }
        }
        _ = &mut rx => {
            // the runtime waits for the blocking burst before the process exits
            if sampling.load(Ordering::SeqCst) {
                info!("Waiting for the running burst to finish");
            }
            info!("Program terminated by user. Exiting gracefully.");
        }
    }

    Ok(())
}
