use std::fmt;
use std::net::IpAddr;
use std::path::{Path, PathBuf};

use maxminddb::{geoip2, MaxMindDBError, Reader};
use tracing::debug;

use crate::error::{GeoError, Result};

/// One consistent generation of geo data: a City reader and an ASN reader
/// opened together and retired together. Clones of the owning `Arc` keep the
/// generation alive for in-flight lookups across a swap.
pub struct DbSnapshot {
    city: Reader<Vec<u8>>,
    asn: Reader<Vec<u8>>,
    city_path: PathBuf,
    asn_path: PathBuf,
}

// the readers carry no Debug impl; the paths identify the generation
impl fmt::Debug for DbSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbSnapshot")
            .field("city_path", &self.city_path)
            .field("asn_path", &self.asn_path)
            .finish()
    }
}

impl DbSnapshot {
    /// Open both database files. Fails if either file is missing or does not
    /// parse as an MMDB; a half-opened pair is dropped, never returned.
    pub fn open(city_path: &Path, asn_path: &Path) -> Result<Self> {
        let city = Reader::open_readfile(city_path)
            .map_err(|e| GeoError::Open(format!("{}: {}", city_path.display(), e)))?;
        let asn = Reader::open_readfile(asn_path)
            .map_err(|e| GeoError::Open(format!("{}: {}", asn_path.display(), e)))?;
        Ok(DbSnapshot {
            city,
            asn,
            city_path: city_path.to_path_buf(),
            asn_path: asn_path.to_path_buf(),
        })
    }

    /// Reject an obviously crossed pair (ASN data offered in the city slot or
    /// the other way around), the realistic misconfiguration behind a swapped
    /// pair of download URLs.
    pub fn validate(&self) -> Result<()> {
        let city_type = &self.city.metadata.database_type;
        let asn_type = &self.asn.metadata.database_type;
        if city_type.contains("ASN") {
            return Err(GeoError::SwapRejected(format!(
                "city slot holds {} ({})",
                city_type,
                self.city_path.display()
            )));
        }
        if asn_type.contains("City") {
            return Err(GeoError::SwapRejected(format!(
                "ASN slot holds {} ({})",
                asn_type,
                self.asn_path.display()
            )));
        }
        Ok(())
    }

    /// City lookup. A miss is a normal outcome and yields `None`; decode
    /// failures are logged and degrade to `None` rather than failing the
    /// request.
    pub fn lookup_city(&self, addr: IpAddr) -> Option<geoip2::City<'_>> {
        match self.city.lookup::<geoip2::City>(addr) {
            Ok(record) => Some(record),
            Err(MaxMindDBError::AddressNotFoundError(_)) => None,
            Err(e) => {
                debug!("City lookup for {} failed: {}", addr, e);
                None
            }
        }
    }

    /// ASN lookup, same miss semantics as `lookup_city`.
    pub fn lookup_asn(&self, addr: IpAddr) -> Option<geoip2::Asn<'_>> {
        match self.asn.lookup::<geoip2::Asn>(addr) {
            Ok(record) => Some(record),
            Err(MaxMindDBError::AddressNotFoundError(_)) => None,
            Err(e) => {
                debug!("ASN lookup for {} failed: {}", addr, e);
                None
            }
        }
    }

    /// One-line description for swap/startup logging.
    pub fn describe(&self) -> String {
        format!(
            "{} (epoch {}) + {} (epoch {})",
            self.city.metadata.database_type,
            self.city.metadata.build_epoch,
            self.asn.metadata.database_type,
            self.asn.metadata.build_epoch
        )
    }

    pub fn city_path(&self) -> &Path {
        &self.city_path
    }

    pub fn asn_path(&self) -> &Path {
        &self.asn_path
    }
}
