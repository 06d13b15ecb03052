use std::net::IpAddr;
use std::sync::Arc;

use crate::dao::{DbManager, DbSnapshot};
use crate::error::{GeoError, Result};
use crate::model::{normalize_lang, pick_name, GeoRecord};
use crate::service::TimezoneResolver;

/// Per-request lookup logic. Stateless: each call clones the current
/// snapshot handle, composes a flattened record from the City and ASN
/// readers, and drops the handle.
#[derive(Clone)]
pub struct GeoService {
    db: Arc<DbManager>,
    tz: Arc<TimezoneResolver>,
}

impl GeoService {
    pub fn new(db: Arc<DbManager>, tz: Arc<TimezoneResolver>) -> Self {
        Self { db, tz }
    }

    /// Look up `ip` and localize name fields to `lang`. A syntactically
    /// invalid address is the only error; an address the databases know
    /// nothing about yields a minimal record.
    pub fn lookup(&self, ip: &str, lang: &str) -> Result<GeoRecord> {
        let addr: IpAddr = ip.parse().map_err(|_| GeoError::InvalidAddress)?;
        let lang = normalize_lang(lang);
        let snapshot = self.db.current();
        Ok(self.compose(&snapshot, addr, &lang))
    }

    fn compose(&self, snapshot: &DbSnapshot, addr: IpAddr, lang: &str) -> GeoRecord {
        let mut record = GeoRecord::new(addr.to_string());

        if let Some(asn) = snapshot.lookup_asn(addr) {
            // an ASN of zero means "no ASN data", same as coordinates below
            if let Some(number) = asn.autonomous_system_number.filter(|n| *n != 0) {
                record.asn = Some(number);
                record.org = asn
                    .autonomous_system_organization
                    .filter(|org| !org.is_empty())
                    .map(|org| org.to_string());
            }
        }

        let city = match snapshot.lookup_city(addr) {
            Some(city) => city,
            None => return record,
        };

        if let Some(continent) = city.continent {
            if let Some(code) = continent.code.filter(|code| !code.is_empty()) {
                record.continent_code = Some(code.to_string());
                record.continent = continent.names.as_ref().and_then(|n| pick_name(n, lang));
            }
        }
        if let Some(country) = city.country {
            if let Some(code) = country.iso_code.filter(|code| !code.is_empty()) {
                record.country_code = Some(code.to_string());
                record.country = country.names.as_ref().and_then(|n| pick_name(n, lang));
            }
        }
        if let Some(registered) = city.registered_country {
            if let Some(code) = registered.iso_code.filter(|code| !code.is_empty()) {
                record.registered_country_code = Some(code.to_string());
                record.registered_country =
                    registered.names.as_ref().and_then(|n| pick_name(n, lang));
            }
        }
        if let Some(subdivisions) = city.subdivisions {
            if let Some(region) = subdivisions.first() {
                record.region_code = region
                    .iso_code
                    .filter(|code| !code.is_empty())
                    .map(|code| code.to_string());
                record.region = region.names.as_ref().and_then(|n| pick_name(n, lang));
            }
        }
        if let Some(names) = city.city.and_then(|c| c.names) {
            record.city = pick_name(&names, lang);
        }
        if let Some(code) = city.postal.and_then(|p| p.code).filter(|code| !code.is_empty()) {
            record.postal_code = Some(code.to_string());
        }

        if let Some(location) = city.location {
            let latitude = location.latitude.unwrap_or_default();
            let longitude = location.longitude.unwrap_or_default();
            // a record at exactly 0,0 is indistinguishable from missing data
            // and stays omitted
            if latitude != 0.0 || longitude != 0.0 {
                record.latitude = Some(latitude);
                record.longitude = Some(longitude);
            }
            if let Some(radius) = location.accuracy_radius.filter(|r| *r != 0) {
                record.accuracy_radius = Some(radius);
            }
            if let Some(zone) = location.time_zone.filter(|zone| !zone.is_empty()) {
                record.time_zone = Some(zone.to_string());
                record.offset = self.tz.utc_offset_seconds(zone);
            }
        }

        record
    }
}
