mod input;
mod presenter;

use std::io::Write;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio::sync::mpsc;

use shootr::config::{DEFAULT_CONNECT_TIMEOUT, DEFAULT_RENDER_RATE};
use shootr::snapshot::{DEFAULT_ADAPTIVE_BUFFER_MS, DEFAULT_LERP_RATIO, DEFAULT_UPDATE_RATE};
use shootr::{ClientConfig, ConfigError, InterpolationDelay, SyncClient, Transport};

use presenter::ConsolePresenter;

#[derive(Parser)]
#[command(name = "shootr")]
#[command(about = "shootr state-synchronization client")]
struct Args {
    #[arg(
        short,
        long,
        env = "SHOOTR_SERVER",
        help = "WebSocket endpoint to connect to (e.g., ws://127.0.0.1:8080)"
    )]
    server: Option<String>,

    #[arg(long, default_value_t = DEFAULT_UPDATE_RATE, help = "Server update rate in Hz")]
    update_rate: u32,

    #[arg(long, default_value_t = DEFAULT_LERP_RATIO, help = "Update intervals to render behind")]
    lerp_ratio: f64,

    #[arg(long, help = "Derive the render delay from measured RTT")]
    adaptive: bool,

    #[arg(long, default_value_t = DEFAULT_ADAPTIVE_BUFFER_MS, help = "Cushion added to RTT in adaptive mode")]
    adaptive_buffer_ms: f64,

    #[arg(long, default_value_t = DEFAULT_RENDER_RATE, help = "Render ticks per second")]
    render_hz: u32,

    #[arg(long, default_value_t = DEFAULT_CONNECT_TIMEOUT.as_millis() as u64, help = "Give up on a connection attempt after this many ms")]
    connect_timeout_ms: u64,
}

impl Args {
    fn into_config(self) -> Result<ClientConfig, ConfigError> {
        let mut config = ClientConfig::from_optional(self.server)?;

        if self.render_hz == 0 {
            return Err(ConfigError::NotPositive {
                name: "render rate",
            });
        }
        config.render_interval = Duration::from_secs_f64(1.0 / self.render_hz as f64);
        config.connect_timeout = Duration::from_millis(self.connect_timeout_ms);

        let fixed = InterpolationDelay::Fixed {
            lerp_ratio: self.lerp_ratio,
            update_rate: self.update_rate,
        };
        config.interpolation.delay = fixed;
        config.validate()?;

        if self.adaptive {
            config.interpolation.delay = InterpolationDelay::Adaptive {
                buffer_ms: self.adaptive_buffer_ms,
                fallback_ms: fixed.delay_ms(None),
            };
            config.validate()?;
        }

        Ok(config)
    }
}

fn init_logging() {
    // Raw mode leaves line feeds without a carriage return.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}\r",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}

fn main() -> anyhow::Result<()> {
    init_logging();

    let config = Args::parse()
        .into_config()
        .context("Invalid client configuration")?;
    log::info!(
        "Connecting to {} (render delay {:?})",
        config.server_url,
        config.interpolation.delay
    );

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    let (controls, receiver) = mpsc::unbounded_channel();
    let keyboard = input::spawn_keyboard(controls)?;

    let client = SyncClient::new(config, ConsolePresenter::default());
    let client = runtime.block_on(Transport::new(client, receiver).run());

    if keyboard.join().is_err() {
        log::warn!("Keyboard thread panicked");
    }

    let stats = client.stats();
    log::info!(
        "Shutting down after {} connection attempt(s): {} snapshot(s) buffered, {} command(s) unconfirmed, srtt {:?} ms",
        stats.connection_attempts,
        stats.buffered_snapshots,
        stats.unconfirmed_commands,
        stats.srtt_ms
    );

    Ok(())
}
