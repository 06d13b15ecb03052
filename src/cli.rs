use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;

use crate::dao::DbPaths;

const DEFAULT_CITY_URL: &str =
    "https://github.com/xjasonlyu/maxmind-geoip/releases/latest/download/City.mmdb";
const DEFAULT_ASN_URL: &str =
    "https://github.com/xjasonlyu/maxmind-geoip/releases/latest/download/ASN.mmdb";

#[derive(Parser, Debug)]
#[command(name = "geoip-api")]
#[command(version = "0.1.0")]
#[command(about = "Self-updating GeoIP lookup service", long_about = None)]
pub struct Args {
    /// Directory holding the City/ASN database files
    #[arg(short = 'd', long, env = "GEOIP_DATA_DIR", default_value = "./db")]
    pub data_dir: PathBuf,

    /// Download URL for the City database
    #[arg(long, env = "GEOIP_CITY_URL", default_value = DEFAULT_CITY_URL)]
    pub city_url: String,

    /// Download URL for the ASN database
    #[arg(long, env = "GEOIP_ASN_URL", default_value = DEFAULT_ASN_URL)]
    pub asn_url: String,

    /// Bind address
    #[arg(short = 'H', long, env = "GEOIP_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Listen port
    #[arg(short = 'p', long, env = "GEOIP_PORT", default_value = "8080")]
    pub port: u16,

    /// Per-download transfer timeout in seconds
    #[arg(long, env = "GEOIP_FETCH_TIMEOUT", default_value = "300")]
    pub fetch_timeout: u64,

    /// Download attempts before a refresh cycle is abandoned
    #[arg(long, env = "GEOIP_FETCH_RETRIES", default_value = "3")]
    pub fetch_retries: u32,

    /// Verbose output
    #[arg(short = 'v', long, env = "GEOIP_VERBOSE")]
    pub verbose: bool,

    /// Optional TOML config file; keys set there override flags and env
    #[arg(short = 'c', long, env = "GEOIP_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Subset of `Args` settable from the TOML config file; every key optional.
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    data_dir: Option<PathBuf>,
    city_url: Option<String>,
    asn_url: Option<String>,
    host: Option<String>,
    port: Option<u16>,
    fetch_timeout: Option<u64>,
    fetch_retries: Option<u32>,
    verbose: Option<bool>,
}

impl Args {
    /// Overlay the optional TOML config file onto the parsed arguments.
    pub fn merge_with_config(mut self) -> Result<Self> {
        let Some(path) = self.config.clone() else {
            return Ok(self);
        };
        let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let file: ConfigFile = toml::from_str(&raw)
            .with_context(|| format!("parsing config file {}", path.display()))?;

        if let Some(v) = file.data_dir {
            self.data_dir = v;
        }
        if let Some(v) = file.city_url {
            self.city_url = v;
        }
        if let Some(v) = file.asn_url {
            self.asn_url = v;
        }
        if let Some(v) = file.host {
            self.host = v;
        }
        if let Some(v) = file.port {
            self.port = v;
        }
        if let Some(v) = file.fetch_timeout {
            self.fetch_timeout = v;
        }
        if let Some(v) = file.fetch_retries {
            self.fetch_retries = v;
        }
        if let Some(v) = file.verbose {
            self.verbose = v;
        }
        Ok(self)
    }

    pub fn db_paths(&self) -> DbPaths {
        DbPaths::new(&self.data_dir)
    }
}
