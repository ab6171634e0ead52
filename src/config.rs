use anyhow::Result;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub audio: AudioConfig,
    pub live: LiveConfig,
    pub viz: VizConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub endpoint: EndpointConfig,
}

#[derive(Debug, Deserialize)]
pub struct EndpointConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize)]
pub struct AudioConfig {
    pub sample_rate: u32,
    pub channels: u16,
    pub buffer_duration_ms: u64,
}

#[derive(Debug, Deserialize)]
pub struct LiveConfig {
    pub debounce_ms: u64,
}

#[derive(Debug, Deserialize)]
pub struct VizConfig {
    pub fft_size: usize,
    pub bars: usize,
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service: ServiceConfig {
                name: "spamscan".to_string(),
                endpoint: EndpointConfig {
                    base_url: "http://127.0.0.1:5000".to_string(),
                    timeout_secs: 60,
                },
            },
            audio: AudioConfig {
                sample_rate: 16000,
                channels: 1,
                buffer_duration_ms: 100,
            },
            live: LiveConfig { debounce_ms: 800 },
            viz: VizConfig {
                fft_size: 512,
                bars: 32,
            },
        }
    }
}
