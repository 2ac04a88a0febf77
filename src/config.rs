//! Startup configuration
//!
//! Everything is resolved once from command-line flags and environment
//! variables before the poll loop starts; nothing here changes at runtime.

use anyhow::Result;
use clap::ValueEnum;

use crate::normalize::ScalingPolicy;
use crate::poll::DEFAULT_RATE_HZ;
use crate::sink::mqtt::MqttSettings;

/// Slider and knob output range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum SliderRange {
    /// [-1, 1]
    #[default]
    Centered,
    /// [0, 1]
    Unipolar,
}

impl From<SliderRange> for ScalingPolicy {
    fn from(range: SliderRange) -> Self {
        match range {
            SliderRange::Centered => ScalingPolicy::Centered,
            SliderRange::Unipolar => ScalingPolicy::Unipolar,
        }
    }
}

/// Where emitted messages go
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum SinkKind {
    /// JSON lines on stdout
    #[default]
    Console,
    /// JSON payloads on an MQTT topic
    Mqtt,
}

/// Resolved bridge settings
#[derive(Debug, Clone, PartialEq)]
pub struct BridgeConfig {
    pub port_override: Option<usize>,
    pub slider_range: SliderRange,
    pub rate_hz: u32,
    pub sink: SinkKind,
    pub mqtt: MqttSettings,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            port_override: None,
            slider_range: SliderRange::default(),
            rate_hz: DEFAULT_RATE_HZ,
            sink: SinkKind::default(),
            mqtt: MqttSettings {
                client_id: default_client_id(),
                host: default_mqtt_host(),
                port: default_mqtt_port(),
                topic: default_topic(),
            },
        }
    }
}

impl BridgeConfig {
    pub fn scaling_policy(&self) -> ScalingPolicy {
        self.slider_range.into()
    }

    /// Validate configuration for correctness and consistency
    pub fn validate(&self) -> Result<()> {
        if self.rate_hz == 0 {
            anyhow::bail!("Poll rate must be at least 1 Hz");
        }
        if self.rate_hz > 1000 {
            anyhow::bail!("Poll rate {} Hz is above the 1000 Hz limit", self.rate_hz);
        }

        if self.sink == SinkKind::Mqtt {
            if self.mqtt.host.is_empty() {
                anyhow::bail!("MQTT host cannot be empty");
            }
            if self.mqtt.topic.is_empty() {
                anyhow::bail!("MQTT topic cannot be empty");
            }
            if self.mqtt.topic.contains(&['#', '+'][..]) {
                anyhow::bail!(
                    "MQTT topic '{}' cannot contain wildcards",
                    self.mqtt.topic
                );
            }
            if self.mqtt.client_id.is_empty() {
                anyhow::bail!("MQTT client id cannot be empty");
            }
        }

        Ok(())
    }
}

// Default value functions
pub fn default_client_id() -> String { "nanokontrol-bridge".to_string() }
pub fn default_mqtt_host() -> String { "localhost".to_string() }
pub fn default_mqtt_port() -> u16 { 1883 }
pub fn default_topic() -> String { "nanokontrol".to_string() }
