//! Typed detector configuration, loaded field-by-field from a
//! `serde_json::Value` with documented defaults, so unknown or missing
//! keys degrade gracefully instead of failing the load.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;

use crate::error::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Venue {
    PumpSwap,
    RaydiumV4,
    RaydiumClmm,
    MeteoraDlmm,
}

impl Venue {
    fn from_str(s: &str) -> Option<Self> {
        match s {
            "pumpswap" => Some(Venue::PumpSwap),
            "raydium_v4" => Some(Venue::RaydiumV4),
            "raydium_clmm" => Some(Venue::RaydiumClmm),
            "meteora_dlmm" => Some(Venue::MeteoraDlmm),
            _ => None,
        }
    }

    fn all() -> [Venue; 4] {
        [Venue::PumpSwap, Venue::RaydiumV4, Venue::RaydiumClmm, Venue::MeteoraDlmm]
    }
}

/// Every detector/cache tunable, with sane defaults.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub min_profit_lamports: i64,
    pub min_profit_bps: i64,
    pub max_slippage_pct: f64,
    pub gas_budget_lamports: u64,
    pub tip_budget_lamports: u64,
    pub max_position_lamports: u64,
    pub enabled_venues: HashSet<Venue>,
    pub min_spread_bps: u32,
    pub max_pending_age_ms: u64,
    pub max_pending_size: usize,
    pub expiry_slot_buffer: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_profit_lamports: 0,
            min_profit_bps: 0,
            max_slippage_pct: 1.0,
            gas_budget_lamports: 5_000,
            tip_budget_lamports: 0,
            max_position_lamports: u64::MAX,
            enabled_venues: Venue::all().into_iter().collect(),
            min_spread_bps: 10,
            max_pending_age_ms: 5_000,
            max_pending_size: 10_000,
            expiry_slot_buffer: 5,
        }
    }
}

impl EngineConfig {
    pub fn is_enabled(&self, venue: Venue) -> bool {
        self.enabled_venues.contains(&venue)
    }

    pub fn require_enabled(&self, venue: Venue, name: &'static str) -> Result<(), ConfigError> {
        if self.is_enabled(venue) {
            Ok(())
        } else {
            Err(ConfigError::VenueDisabled(name))
        }
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("reading engine config {:?}", path.as_ref()))?;
        let json: Value = serde_json::from_str(&raw).context("parsing engine config")?;
        Ok(Self::from_json(&json))
    }

    pub fn from_json(json: &Value) -> Self {
        let defaults = Self::default();

        let min_profit_lamports = json["min_profit_lamports"].as_i64().unwrap_or(defaults.min_profit_lamports);
        let min_profit_bps = json["min_profit_bps"]
            .as_i64()
            .or_else(|| json["min_profit_pct"].as_f64().map(|p| (p * 100.0) as i64))
            .unwrap_or(defaults.min_profit_bps);
        let max_slippage_pct = json["max_slippage_pct"].as_f64().unwrap_or(defaults.max_slippage_pct);
        let gas_budget_lamports = json["gas_budget_lamports"].as_u64().unwrap_or(defaults.gas_budget_lamports);
        let tip_budget_lamports = json["tip_budget_lamports"].as_u64().unwrap_or(defaults.tip_budget_lamports);
        let max_position_lamports = json["max_position_lamports"].as_u64().unwrap_or(defaults.max_position_lamports);
        let min_spread_bps = json["min_spread_bps"].as_u64().unwrap_or(defaults.min_spread_bps as u64) as u32;
        let max_pending_age_ms = json["max_pending_age_ms"].as_u64().unwrap_or(defaults.max_pending_age_ms);
        let max_pending_size = json["max_pending_size"].as_u64().unwrap_or(defaults.max_pending_size as u64) as usize;
        let expiry_slot_buffer = json["expiry_slot_buffer"].as_u64().unwrap_or(defaults.expiry_slot_buffer);

        let enabled_venues = match json["enabled_venues"].as_array() {
            Some(arr) => arr
                .iter()
                .filter_map(|v| v.as_str())
                .filter_map(Venue::from_str)
                .collect(),
            None => defaults.enabled_venues,
        };

        Self {
            min_profit_lamports,
            min_profit_bps,
            max_slippage_pct,
            gas_budget_lamports,
            tip_budget_lamports,
            max_position_lamports,
            enabled_venues,
            min_spread_bps,
            max_pending_age_ms,
            max_pending_size,
            expiry_slot_buffer,
        }
    }
}
