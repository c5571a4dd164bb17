//! Connection profiles: one named environment per record.

use crate::record::BoxRecord;
use berth_codec::{CodecResult, FieldRecord, FieldSpec, Schema, TypeId, Value, ValueKind};

/// Connection block for one remote service.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Whether the service is enabled in this profile.
    pub enabled: bool,
    /// Base URL of the service.
    pub host: String,
    /// API key or credential.
    pub api_key: String,
    /// Extra header name/value pairs sent with every request.
    pub headers: Vec<(String, String)>,
}

impl ServiceConfig {
    /// A disabled service block with empty connection details.
    #[must_use]
    pub fn disabled() -> Self {
        Self::default()
    }
}

/// A named environment bundling per-service connection settings.
///
/// Which profile is active is not a flag on the profile record; it lives
/// in the `active_profile` setting, so activation is a single-record
/// update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    /// Display name; also the profile's box key.
    pub name: String,
    /// Radarr connection block.
    pub radarr: ServiceConfig,
    /// Sonarr connection block.
    pub sonarr: ServiceConfig,
    /// Lidarr connection block.
    pub lidarr: ServiceConfig,
    /// SABnzbd connection block.
    pub sabnzbd: ServiceConfig,
    /// NZBGet connection block.
    pub nzbget: ServiceConfig,
}

/// Tag of the profile name field.
const TAG_NAME: u16 = 0;

// Each service block owns a tag decade: +0 enabled, +1 host, +2 api_key,
// +3 headers. Decades 60+ are unallocated.
const RADARR_BASE: u16 = 10;
const SONARR_BASE: u16 = 20;
const LIDARR_BASE: u16 = 30;
const SABNZBD_BASE: u16 = 40;
const NZBGET_BASE: u16 = 50;

const SERVICES: [(&str, u16); 5] = [
    ("radarr", RADARR_BASE),
    ("sonarr", SONARR_BASE),
    ("lidarr", LIDARR_BASE),
    ("sabnzbd", SABNZBD_BASE),
    ("nzbget", NZBGET_BASE),
];

const SERVICE_FIELD_NAMES: [[&str; 4]; 5] = [
    [
        "radarr_enabled",
        "radarr_host",
        "radarr_api_key",
        "radarr_headers",
    ],
    [
        "sonarr_enabled",
        "sonarr_host",
        "sonarr_api_key",
        "sonarr_headers",
    ],
    [
        "lidarr_enabled",
        "lidarr_host",
        "lidarr_api_key",
        "lidarr_headers",
    ],
    [
        "sabnzbd_enabled",
        "sabnzbd_host",
        "sabnzbd_api_key",
        "sabnzbd_headers",
    ],
    [
        "nzbget_enabled",
        "nzbget_host",
        "nzbget_api_key",
        "nzbget_headers",
    ],
];

impl Profile {
    /// Creates a profile with every service disabled.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            radarr: ServiceConfig::disabled(),
            sonarr: ServiceConfig::disabled(),
            lidarr: ServiceConfig::disabled(),
            sabnzbd: ServiceConfig::disabled(),
            nzbget: ServiceConfig::disabled(),
        }
    }

    fn services(&self) -> [(&ServiceConfig, u16); 5] {
        [
            (&self.radarr, RADARR_BASE),
            (&self.sonarr, SONARR_BASE),
            (&self.lidarr, LIDARR_BASE),
            (&self.sabnzbd, SABNZBD_BASE),
            (&self.nzbget, NZBGET_BASE),
        ]
    }
}

fn service_from_fields(record: &FieldRecord, base: u16) -> ServiceConfig {
    ServiceConfig {
        enabled: record.bool_at(base).unwrap_or(false),
        host: record.text_at(base + 1).unwrap_or_default().to_string(),
        api_key: record.text_at(base + 2).unwrap_or_default().to_string(),
        headers: record.map_at(base + 3).unwrap_or_default().to_vec(),
    }
}

impl BoxRecord for Profile {
    const TYPE_ID: TypeId = TypeId::new(1);

    fn schema() -> CodecResult<Schema> {
        let mut fields = vec![FieldSpec::new(
            TAG_NAME,
            "name",
            ValueKind::Text,
            Value::Text(String::new()),
        )];
        for (i, (_, base)) in SERVICES.iter().enumerate() {
            let names = SERVICE_FIELD_NAMES[i];
            fields.push(FieldSpec::new(
                *base,
                names[0],
                ValueKind::Bool,
                Value::Bool(false),
            ));
            fields.push(FieldSpec::new(
                base + 1,
                names[1],
                ValueKind::Text,
                Value::Text(String::new()),
            ));
            fields.push(FieldSpec::new(
                base + 2,
                names[2],
                ValueKind::Text,
                Value::Text(String::new()),
            ));
            fields.push(FieldSpec::new(
                base + 3,
                names[3],
                ValueKind::Map,
                Value::Map(Vec::new()),
            ));
        }
        Schema::new(Self::TYPE_ID, "profile", fields)
    }

    fn to_fields(&self) -> FieldRecord {
        let mut record = FieldRecord::default();
        record.set(TAG_NAME, Value::Text(self.name.clone()));
        for (config, base) in self.services() {
            record.set(base, Value::Bool(config.enabled));
            record.set(base + 1, Value::Text(config.host.clone()));
            record.set(base + 2, Value::Text(config.api_key.clone()));
            record.set(base + 3, Value::map(config.headers.clone()));
        }
        record
    }

    fn from_fields(record: &FieldRecord) -> Self {
        Self {
            name: record.text_at(TAG_NAME).unwrap_or_default().to_string(),
            radarr: service_from_fields(record, RADARR_BASE),
            sonarr: service_from_fields(record, SONARR_BASE),
            lidarr: service_from_fields(record, LIDARR_BASE),
            sabnzbd: service_from_fields(record, SABNZBD_BASE),
            nzbget: service_from_fields(record, NZBGET_BASE),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Profile {
        let mut profile = Profile::new("prod");
        profile.radarr = ServiceConfig {
            enabled: true,
            host: "http://r:7878".to_string(),
            api_key: "abc".to_string(),
            headers: vec![("X-Api-Key".to_string(), "abc".to_string())],
        };
        profile.sabnzbd.host = "http://s:8080".to_string();
        profile
    }

    #[test]
    fn fields_round_trip() {
        let profile = sample();
        let schema = Profile::schema().unwrap();

        let bytes = schema.encode(&profile.to_fields());
        let decoded = Profile::from_fields(&schema.decode(&bytes).unwrap());

        assert_eq!(decoded, profile);
    }

    #[test]
    fn new_profile_has_all_services_disabled() {
        let profile = Profile::new("fresh");
        assert!(!profile.radarr.enabled);
        assert!(!profile.sonarr.enabled);
        assert!(!profile.lidarr.enabled);
        assert!(!profile.sabnzbd.enabled);
        assert!(!profile.nzbget.enabled);
    }

    #[test]
    fn name_only_record_decodes_with_defaults() {
        let schema = Profile::schema().unwrap();

        // A record written before any service field existed.
        let bytes = berth_codec::encode_fields(&[(0, Value::Text("old".into()))]);
        let profile = Profile::from_fields(&schema.decode(&bytes).unwrap());

        assert_eq!(profile.name, "old");
        assert_eq!(profile.radarr, ServiceConfig::disabled());
    }

    #[test]
    fn schema_field_names_are_unique() {
        let schema = Profile::schema().unwrap();
        let mut names: Vec<_> = schema.fields().iter().map(|f| f.name).collect();
        let total = names.len();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), total);
    }
}
