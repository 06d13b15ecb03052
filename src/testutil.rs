//! Test fixtures: a minimal MMDB writer and a one-shot HTTP byte server.
//!
//! The writer emits just enough of the MaxMind DB format (24-bit records,
//! IPv6 search tree, inline data section) for `maxminddb::Reader` to open
//! and query the result, so snapshot/lookup/swap tests run against the real
//! decode path instead of mocks. IPv4 networks are inserted under the ::/96
//! spine, matching how production City/ASN databases carry them.

use std::net::IpAddr;
use std::path::{Path, PathBuf};

const METADATA_MARKER: &[u8] = b"\xab\xcd\xefMaxMind.com";

#[derive(Debug, Clone)]
pub enum Value {
    Str(String),
    F64(f64),
    U16(u16),
    U32(u32),
    U64(u64),
    Map(Vec<(String, Value)>),
    Array(Vec<Value>),
}

pub fn s(v: &str) -> Value {
    Value::Str(v.to_string())
}

pub fn map(entries: Vec<(&str, Value)>) -> Value {
    Value::Map(entries.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
}

pub fn names(pairs: &[(&str, &str)]) -> Value {
    map(pairs.iter().map(|(tag, name)| (*tag, s(name))).collect())
}

// type codes from the MMDB spec; codes >= 8 are written as extended types
const TYPE_STRING: u8 = 2;
const TYPE_DOUBLE: u8 = 3;
const TYPE_UINT16: u8 = 5;
const TYPE_UINT32: u8 = 6;
const TYPE_MAP: u8 = 7;
const TYPE_UINT64: u8 = 9;
const TYPE_ARRAY: u8 = 11;

fn write_control(out: &mut Vec<u8>, type_num: u8, size: usize) {
    assert!(size < 285, "fixture payloads stay small");
    let (ctrl_type, ext) = if type_num < 8 {
        (type_num, None)
    } else {
        (0, Some(type_num - 7))
    };
    if size < 29 {
        out.push((ctrl_type << 5) | size as u8);
        if let Some(ext) = ext {
            out.push(ext);
        }
    } else {
        out.push((ctrl_type << 5) | 29);
        if let Some(ext) = ext {
            out.push(ext);
        }
        out.push((size - 29) as u8);
    }
}

fn significant_bytes(bytes: &[u8]) -> &[u8] {
    let first = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
    &bytes[first..]
}

fn encode_value(value: &Value, out: &mut Vec<u8>) {
    match value {
        Value::Str(v) => {
            write_control(out, TYPE_STRING, v.len());
            out.extend_from_slice(v.as_bytes());
        }
        Value::F64(v) => {
            write_control(out, TYPE_DOUBLE, 8);
            out.extend_from_slice(&v.to_be_bytes());
        }
        Value::U16(v) => {
            let bytes = v.to_be_bytes();
            let trimmed = significant_bytes(&bytes);
            write_control(out, TYPE_UINT16, trimmed.len());
            out.extend_from_slice(trimmed);
        }
        Value::U32(v) => {
            let bytes = v.to_be_bytes();
            let trimmed = significant_bytes(&bytes);
            write_control(out, TYPE_UINT32, trimmed.len());
            out.extend_from_slice(trimmed);
        }
        Value::U64(v) => {
            let bytes = v.to_be_bytes();
            let trimmed = significant_bytes(&bytes);
            write_control(out, TYPE_UINT64, trimmed.len());
            out.extend_from_slice(trimmed);
        }
        Value::Map(entries) => {
            write_control(out, TYPE_MAP, entries.len());
            for (key, val) in entries {
                write_control(out, TYPE_STRING, key.len());
                out.extend_from_slice(key.as_bytes());
                encode_value(val, out);
            }
        }
        Value::Array(items) => {
            write_control(out, TYPE_ARRAY, items.len());
            for item in items {
                encode_value(item, out);
            }
        }
    }
}

#[derive(Clone, Copy, PartialEq)]
enum Record {
    Empty,
    Node(usize),
    Data(usize),
}

struct Node {
    left: Record,
    right: Record,
}

impl Node {
    fn empty() -> Self {
        Node {
            left: Record::Empty,
            right: Record::Empty,
        }
    }
}

/// Builds an ip_version=6, record_size=24 MMDB image from (CIDR, record)
/// pairs. Networks must not nest.
pub struct MmdbWriter {
    database_type: String,
    networks: Vec<(String, Value)>,
}

impl MmdbWriter {
    pub fn new(database_type: &str) -> Self {
        MmdbWriter {
            database_type: database_type.to_string(),
            networks: Vec::new(),
        }
    }

    pub fn insert(&mut self, cidr: &str, record: Value) -> &mut Self {
        self.networks.push((cidr.to_string(), record));
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut data = Vec::new();
        let mut offsets = Vec::new();
        for (_, record) in &self.networks {
            offsets.push(data.len());
            encode_value(record, &mut data);
        }

        let mut nodes = vec![Node::empty()];
        for ((cidr, _), offset) in self.networks.iter().zip(&offsets) {
            let (bits, prefix_len) = cidr_bits(cidr);
            link_path(&mut nodes, &bits, prefix_len, *offset);
        }

        let node_count = nodes.len() as u32;
        let record_value = |record: Record| -> u32 {
            match record {
                Record::Empty => node_count,
                Record::Node(index) => index as u32,
                Record::Data(offset) => node_count + 16 + offset as u32,
            }
        };

        let mut out = Vec::new();
        for node in &nodes {
            for record in [node.left, node.right] {
                out.extend_from_slice(&record_value(record).to_be_bytes()[1..]);
            }
        }
        out.extend_from_slice(&[0u8; 16]);
        out.extend_from_slice(&data);
        out.extend_from_slice(METADATA_MARKER);
        encode_value(&self.metadata(node_count), &mut out);
        out
    }

    pub fn write_to(&self, path: &Path) {
        std::fs::write(path, self.build()).expect("write mmdb fixture");
    }

    fn metadata(&self, node_count: u32) -> Value {
        map(vec![
            ("binary_format_major_version", Value::U16(2)),
            ("binary_format_minor_version", Value::U16(0)),
            ("build_epoch", Value::U64(1_700_000_000)),
            ("database_type", s(&self.database_type)),
            ("description", names(&[("en", "Test fixture")])),
            ("ip_version", Value::U16(6)),
            (
                "languages",
                Value::Array(vec![s("en"), s("zh-CN"), s("pt-BR"), s("ja")]),
            ),
            ("node_count", Value::U32(node_count)),
            ("record_size", Value::U16(24)),
        ])
    }
}

fn cidr_bits(cidr: &str) -> ([u8; 16], usize) {
    let (addr, len) = cidr.split_once('/').expect("CIDR requires a prefix length");
    let prefix_len: usize = len.parse().expect("numeric prefix length");
    match addr.parse::<IpAddr>().expect("valid network address") {
        IpAddr::V4(v4) => {
            let mut bits = [0u8; 16];
            bits[12..].copy_from_slice(&v4.octets());
            (bits, prefix_len + 96)
        }
        IpAddr::V6(v6) => (v6.octets(), prefix_len),
    }
}

fn link_path(nodes: &mut Vec<Node>, bits: &[u8; 16], prefix_len: usize, data_offset: usize) {
    let mut node = 0usize;
    for depth in 0..prefix_len {
        let bit = (bits[depth / 8] >> (7 - depth % 8)) & 1;
        if depth == prefix_len - 1 {
            let record = Record::Data(data_offset);
            if bit == 0 {
                nodes[node].left = record;
            } else {
                nodes[node].right = record;
            }
            return;
        }
        let child = if bit == 0 { nodes[node].left } else { nodes[node].right };
        node = match child {
            Record::Node(index) => index,
            Record::Empty => {
                let index = nodes.len();
                nodes.push(Node::empty());
                if bit == 0 {
                    nodes[node].left = Record::Node(index);
                } else {
                    nodes[node].right = Record::Node(index);
                }
                index
            }
            Record::Data(_) => panic!("fixture networks must not nest"),
        };
    }
}

/// City fixture. Known networks:
///   8.8.8.0/24    full US/California/Mountain View record, localized names
///   81.2.69.0/24  GB record with English-only names and no postal code
///   10.99.0.0/16  zeroed coordinates/radius and an unresolvable zone name
///   2001:db8::/32 JP record (IPv6 coverage)
pub fn city_fixture() -> MmdbWriter {
    let mut writer = MmdbWriter::new("GeoLite2-City");
    writer.insert(
        "8.8.8.0/24",
        map(vec![
            (
                "city",
                map(vec![(
                    "names",
                    names(&[("en", "Mountain View"), ("zh-CN", "山景城")]),
                )]),
            ),
            (
                "continent",
                map(vec![
                    ("code", s("NA")),
                    ("names", names(&[("en", "North America"), ("zh-CN", "北美洲")])),
                ]),
            ),
            (
                "country",
                map(vec![
                    ("iso_code", s("US")),
                    (
                        "names",
                        names(&[
                            ("en", "United States"),
                            ("zh-CN", "美国"),
                            ("pt-BR", "Estados Unidos"),
                        ]),
                    ),
                ]),
            ),
            (
                "location",
                map(vec![
                    ("accuracy_radius", Value::U16(1000)),
                    ("latitude", Value::F64(37.386)),
                    ("longitude", Value::F64(-122.0838)),
                    ("time_zone", s("America/Los_Angeles")),
                ]),
            ),
            ("postal", map(vec![("code", s("94043"))])),
            (
                "registered_country",
                map(vec![
                    ("iso_code", s("US")),
                    ("names", names(&[("en", "United States")])),
                ]),
            ),
            (
                "subdivisions",
                Value::Array(vec![map(vec![
                    ("iso_code", s("CA")),
                    (
                        "names",
                        names(&[("en", "California"), ("zh-CN", "加利福尼亚州")]),
                    ),
                ])]),
            ),
        ]),
    );
    writer.insert(
        "81.2.69.0/24",
        map(vec![
            ("city", map(vec![("names", names(&[("en", "London")]))])),
            (
                "continent",
                map(vec![("code", s("EU")), ("names", names(&[("en", "Europe")]))]),
            ),
            (
                "country",
                map(vec![
                    ("iso_code", s("GB")),
                    ("names", names(&[("en", "United Kingdom")])),
                ]),
            ),
            (
                "location",
                map(vec![
                    ("latitude", Value::F64(51.5142)),
                    ("longitude", Value::F64(-0.0931)),
                    ("time_zone", s("Europe/London")),
                ]),
            ),
            (
                "subdivisions",
                Value::Array(vec![map(vec![
                    ("iso_code", s("ENG")),
                    ("names", names(&[("en", "England")])),
                ])]),
            ),
        ]),
    );
    writer.insert(
        "10.99.0.0/16",
        map(vec![
            ("city", map(vec![("names", names(&[]))])),
            (
                "location",
                map(vec![
                    ("accuracy_radius", Value::U16(0)),
                    ("latitude", Value::F64(0.0)),
                    ("longitude", Value::F64(0.0)),
                    ("time_zone", s("Not/AZone")),
                ]),
            ),
        ]),
    );
    writer.insert(
        "2001:db8::/32",
        map(vec![
            (
                "country",
                map(vec![
                    ("iso_code", s("JP")),
                    ("names", names(&[("en", "Japan"), ("ja", "日本")])),
                ]),
            ),
            (
                "location",
                map(vec![
                    ("latitude", Value::F64(35.6895)),
                    ("longitude", Value::F64(139.6917)),
                    ("time_zone", s("Asia/Tokyo")),
                ]),
            ),
        ]),
    );
    writer
}

/// ASN fixture. 8.8.8.0/24 carries a real ASN; 81.2.69.0/24 a zero ASN that
/// must be suppressed; 2001:db8::/32 an ASN with an empty organization.
pub fn asn_fixture() -> MmdbWriter {
    let mut writer = MmdbWriter::new("GeoLite2-ASN");
    writer.insert(
        "8.8.8.0/24",
        map(vec![
            ("autonomous_system_number", Value::U32(15169)),
            ("autonomous_system_organization", s("Google LLC")),
        ]),
    );
    writer.insert(
        "81.2.69.0/24",
        map(vec![
            ("autonomous_system_number", Value::U32(0)),
            ("autonomous_system_organization", s("Zero AS")),
        ]),
    );
    writer.insert(
        "2001:db8::/32",
        map(vec![
            ("autonomous_system_number", Value::U32(64512)),
            ("autonomous_system_organization", s("")),
        ]),
    );
    writer
}

/// Second-generation city fixture: 8.8.8.0/24 moves to Canada so swap tests
/// can tell the generations apart.
pub fn city_fixture_gen2() -> MmdbWriter {
    let mut writer = MmdbWriter::new("GeoLite2-City");
    writer.insert(
        "8.8.8.0/24",
        map(vec![(
            "country",
            map(vec![
                ("iso_code", s("CA")),
                ("names", names(&[("en", "Canada")])),
            ]),
        )]),
    );
    writer
}

/// Write the standard fixture pair into `dir` and return the two paths.
pub fn write_fixture_pair(dir: &Path) -> (PathBuf, PathBuf) {
    let city_path = dir.join("City.mmdb");
    let asn_path = dir.join("ASN.mmdb");
    city_fixture().write_to(&city_path);
    asn_fixture().write_to(&asn_path);
    (city_path, asn_path)
}

/// Serve `body` to the first HTTP request on an ephemeral loopback port and
/// return the base URL. Used to exercise real downloads without the network.
pub async fn serve_bytes_once(body: Vec<u8>) -> String {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind loopback listener");
    let addr = listener.local_addr().expect("listener address");
    tokio::spawn(async move {
        if let Ok((mut stream, _)) = listener.accept().await {
            let mut head = [0u8; 1024];
            let _ = stream.read(&mut head).await;
            let header = format!(
                "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                body.len()
            );
            let _ = stream.write_all(header.as_bytes()).await;
            let _ = stream.write_all(&body).await;
            let _ = stream.shutdown().await;
        }
    });
    format!("http://{}", addr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::IpAddr;

    #[test]
    fn test_fixture_opens_and_resolves_known_networks() {
        let image = city_fixture().build();
        let reader = maxminddb::Reader::from_source(image).unwrap();
        assert_eq!(reader.metadata.database_type, "GeoLite2-City");
        assert_eq!(reader.metadata.ip_version, 6);

        let addr: IpAddr = "8.8.8.8".parse().unwrap();
        let city: maxminddb::geoip2::City = reader.lookup(addr).unwrap();
        let country = city.country.unwrap();
        assert_eq!(country.iso_code, Some("US"));
        assert_eq!(country.names.unwrap().get("en"), Some(&"United States"));

        let v6: IpAddr = "2001:db8::1".parse().unwrap();
        let city: maxminddb::geoip2::City = reader.lookup(v6).unwrap();
        assert_eq!(city.country.unwrap().iso_code, Some("JP"));
    }

    #[test]
    fn test_fixture_misses_unknown_address() {
        let image = city_fixture().build();
        let reader = maxminddb::Reader::from_source(image).unwrap();
        let addr: IpAddr = "1.2.3.4".parse().unwrap();
        let result = reader.lookup::<maxminddb::geoip2::City>(addr);
        assert!(matches!(
            result,
            Err(maxminddb::MaxMindDBError::AddressNotFoundError(_))
        ));
    }

    #[test]
    fn test_asn_fixture_decodes_asn_struct() {
        let image = asn_fixture().build();
        let reader = maxminddb::Reader::from_source(image).unwrap();
        let addr: IpAddr = "8.8.8.8".parse().unwrap();
        let asn: maxminddb::geoip2::Asn = reader.lookup(addr).unwrap();
        assert_eq!(asn.autonomous_system_number, Some(15169));
        assert_eq!(asn.autonomous_system_organization, Some("Google LLC"));
    }
}
