mod manager;
mod snapshot;

pub use manager::DbManager;
pub use snapshot::DbSnapshot;

use std::path::{Path, PathBuf};

/// Canonical on-disk layout: the two database files under the data directory
/// plus the sibling `.tmp` paths a refresh stages into.
#[derive(Debug, Clone)]
pub struct DbPaths {
    pub city: PathBuf,
    pub asn: PathBuf,
}

impl DbPaths {
    pub fn new(data_dir: &Path) -> Self {
        DbPaths {
            city: data_dir.join("City.mmdb"),
            asn: data_dir.join("ASN.mmdb"),
        }
    }

    pub fn city_tmp(&self) -> PathBuf {
        self.city.with_extension("mmdb.tmp")
    }

    pub fn asn_tmp(&self) -> PathBuf {
        self.asn.with_extension("mmdb.tmp")
    }
}
