use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{Offset, Utc};
use chrono_tz::Tz;

use crate::error::{GeoError, Result};

/// Memoized IANA zone-name resolution. The map only grows for the process
/// lifetime; failed resolutions are not cached. A race to populate the same
/// key is harmless since both writers insert the same value.
pub struct TimezoneResolver {
    cache: RwLock<HashMap<String, Tz>>,
}

impl TimezoneResolver {
    pub fn new() -> Self {
        TimezoneResolver {
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn resolve(&self, name: &str) -> Result<Tz> {
        if let Some(tz) = self.cache.read().unwrap().get(name) {
            return Ok(*tz);
        }
        let tz: Tz = name
            .parse()
            .map_err(|_| GeoError::ZoneResolution(name.to_string()))?;
        self.cache.write().unwrap().insert(name.to_string(), tz);
        Ok(tz)
    }

    /// Current UTC offset in seconds for the named zone, computed at call
    /// time so daylight-saving transitions are reflected. `None` when the
    /// zone name is unknown.
    pub fn utc_offset_seconds(&self, name: &str) -> Option<i32> {
        let tz = self.resolve(name).ok()?;
        Some(Utc::now().with_timezone(&tz).offset().fix().local_minus_utc())
    }
}

impl Default for TimezoneResolver {
    fn default() -> Self {
        Self::new()
    }
}
