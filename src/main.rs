//! nanoKONTROL Bridge
//!
//! Publishes the sliders, knobs and buttons of a Korg nanoKONTROL as
//! normalized joy messages on stdout or an MQTT topic.

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use nanokontrol_bridge::config::{self, BridgeConfig, SinkKind, SliderRange};
use nanokontrol_bridge::device::{discovery, FrameSource, MidiFrameSource};
use nanokontrol_bridge::poll::{PollCycle, DEFAULT_RATE_HZ};
use nanokontrol_bridge::profile::SlotTable;
use nanokontrol_bridge::sink::mqtt::MqttSettings;
use nanokontrol_bridge::sink::{ConsoleSink, MqttSink, SnapshotSink};

/// nanoKONTROL Bridge - Korg control surface to joy messages
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// MIDI input port index (skips auto-detection)
    #[arg(short, long, env = "NANOKONTROL_PORT")]
    port: Option<usize>,

    /// Slider and knob output range
    #[arg(long, env = "NANOKONTROL_SLIDER_RANGE", value_enum, default_value_t = SliderRange::Centered)]
    slider_range: SliderRange,

    /// Poll rate in Hz
    #[arg(long, env = "NANOKONTROL_RATE_HZ", default_value_t = DEFAULT_RATE_HZ)]
    rate_hz: u32,

    /// Where to publish messages
    #[arg(long, env = "NANOKONTROL_SINK", value_enum, default_value_t = SinkKind::Console)]
    sink: SinkKind,

    /// MQTT broker host
    #[arg(long, env = "MQTT_HOST", default_value_t = config::default_mqtt_host())]
    mqtt_host: String,

    /// MQTT broker port
    #[arg(long, env = "MQTT_PORT", default_value_t = config::default_mqtt_port())]
    mqtt_port: u16,

    /// MQTT client id
    #[arg(long, env = "MQTT_CLIENT_ID", default_value_t = config::default_client_id())]
    mqtt_client_id: String,

    /// Topic messages are published on
    #[arg(short, long, env = "NANOKONTROL_TOPIC", default_value_t = config::default_topic())]
    topic: String,

    /// Log level (error, warn, info, debug, trace)
    #[arg(short, long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// List available MIDI input ports
    #[arg(long)]
    list_ports: bool,
}

impl Args {
    fn into_config(self) -> BridgeConfig {
        BridgeConfig {
            port_override: self.port,
            slider_range: self.slider_range,
            rate_hz: self.rate_hz,
            sink: self.sink,
            mqtt: MqttSettings {
                client_id: self.mqtt_client_id,
                host: self.mqtt_host,
                port: self.mqtt_port,
                topic: self.topic,
            },
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let args = Args::parse();

    init_logging(&args.log_level)?;

    let ports = discovery::enumerate_input_ports()?;

    if args.list_ports {
        discovery::print_ports(&ports);
        return Ok(());
    }

    let config = args.into_config();
    config.validate().context("Invalid configuration")?;

    info!("Starting nanoKONTROL Bridge v{}...", env!("CARGO_PKG_VERSION"));
    discovery::log_ports(&ports);

    let (port_index, variant) = discovery::select(&ports, config.port_override)
        .context("Cannot select a MIDI input port")?;
    info!("Detected {} on port {}", variant, port_index);

    let slots = SlotTable::bind(variant.mapping())
        .with_context(|| format!("Invalid control profile for {}", variant))?;
    let source = MidiFrameSource::open(port_index, variant)?;
    info!("Listening on '{}' as {}", source.port_name(), source.variant());

    match config.sink {
        SinkKind::Console => run_bridge(source, ConsoleSink::new("console"), slots, &config).await?,
        SinkKind::Mqtt => run_bridge(source, MqttSink::connect(&config.mqtt), slots, &config).await?,
    }

    info!("nanoKONTROL Bridge shutdown complete");
    Ok(())
}

async fn run_bridge<S, K>(source: S, sink: K, slots: SlotTable, config: &BridgeConfig) -> Result<()>
where
    S: FrameSource,
    K: SnapshotSink,
{
    let mut cycle = PollCycle::new(source, sink, slots, config.scaling_policy());
    cycle.run(config.rate_hz, shutdown_signal()).await
}

fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    // Messages go to stdout; logs stay on stderr
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_thread_ids(false)
                .with_thread_names(false),
        )
        .try_init()
        .context("Failed to initialize logging")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to install CTRL+C signal handler: {}", e);
        std::future::pending::<()>().await;
    }
}
