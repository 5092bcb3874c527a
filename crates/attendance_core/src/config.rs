//! Deployment configuration for attendance verification.
//!
//! # Responsibility
//! - Hold office sites, the accuracy cap, the work window and the local offset.
//! - Load and validate configuration from JSON.
//!
//! # Invariants
//! - A validated config has at least one site, positive finite radii and cap,
//!   ordered thresholds and an offset within +/- 18 hours.
//! - Configuration is passed explicitly; there is no process-global instance.

use crate::geo::distance_meters;
use crate::model::geo::{Coordinate, OfficeSite};
use crate::verify::status::WorkWindow;
use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

const MAX_UTC_OFFSET_MINUTES: i32 = 18 * 60;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config `{path}`: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Attendance settings for one deployment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceConfig {
    pub sites: Vec<OfficeSite>,
    /// Largest device accuracy radius still trusted for check-in.
    pub max_accuracy_meters: f64,
    pub work_window: WorkWindow,
    /// Offset used to derive the calendar day and local check-in time.
    pub utc_offset_minutes: i32,
}

impl Default for AttendanceConfig {
    fn default() -> Self {
        Self {
            sites: vec![OfficeSite {
                name: "Head Office".to_string(),
                address: "Tashkent".to_string(),
                coordinate: Coordinate::new(41.2995, 69.2401),
                allowed_radius_meters: 100.0,
            }],
            max_accuracy_meters: 100.0,
            work_window: WorkWindow::default(),
            utc_offset_minutes: 5 * 60,
        }
    }
}

impl AttendanceConfig {
    /// Reads and validates a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sites.is_empty() {
            return Err(ConfigError::Invalid(
                "at least one office site is required".to_string(),
            ));
        }
        for site in &self.sites {
            if site.name.trim().is_empty() {
                return Err(ConfigError::Invalid("site name must not be empty".to_string()));
            }
            if !site.coordinate.is_valid() {
                return Err(ConfigError::Invalid(format!(
                    "site `{}` has an out-of-range coordinate",
                    site.name
                )));
            }
            if !(site.allowed_radius_meters.is_finite() && site.allowed_radius_meters > 0.0) {
                return Err(ConfigError::Invalid(format!(
                    "site `{}` radius must be a positive number, got {}",
                    site.name, site.allowed_radius_meters
                )));
            }
        }
        if !(self.max_accuracy_meters.is_finite() && self.max_accuracy_meters > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "max_accuracy_meters must be a positive number, got {}",
                self.max_accuracy_meters
            )));
        }
        if !self.work_window.is_ordered() {
            return Err(ConfigError::Invalid(format!(
                "early_threshold {} is after late_threshold {}",
                self.work_window.early_threshold, self.work_window.late_threshold
            )));
        }
        if self.utc_offset_minutes.abs() > MAX_UTC_OFFSET_MINUTES {
            return Err(ConfigError::Invalid(format!(
                "utc_offset_minutes {} is outside +/-{MAX_UTC_OFFSET_MINUTES}",
                self.utc_offset_minutes
            )));
        }
        Ok(())
    }

    pub fn utc_offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_minutes * 60)
            .unwrap_or_else(|| Utc.fix())
    }

    pub fn local_time(&self, instant: DateTime<Utc>) -> DateTime<FixedOffset> {
        instant.with_timezone(&self.utc_offset())
    }

    /// Calendar day an instant belongs to in this deployment.
    pub fn local_day(&self, instant: DateTime<Utc>) -> NaiveDate {
        self.local_time(instant).date_naive()
    }

    /// Returns the single active site for a position.
    ///
    /// A site whose fence contains the position wins, deepest inside first.
    /// With no containing fence, the site with the nearest center is used.
    pub fn resolve_site(&self, coordinate: Coordinate) -> Option<&OfficeSite> {
        let containing = self
            .sites
            .iter()
            .map(|site| (site, distance_meters(coordinate, site.coordinate)))
            .filter(|(site, distance)| *distance <= site.allowed_radius_meters)
            .min_by(|(a, da), (b, db)| {
                (da - a.allowed_radius_meters).total_cmp(&(db - b.allowed_radius_meters))
            })
            .map(|(site, _)| site);

        containing.or_else(|| {
            self.sites.iter().min_by(|a, b| {
                distance_meters(coordinate, a.coordinate)
                    .total_cmp(&distance_meters(coordinate, b.coordinate))
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{AttendanceConfig, ConfigError};
    use crate::model::geo::{Coordinate, OfficeSite};
    use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};

    const CONFIG_JSON: &str = r#"{
        "sites": [
            {
                "name": "Head Office",
                "address": "Tashkent",
                "coordinate": { "latitude": 41.2995, "longitude": 69.2401 },
                "allowed_radius_meters": 100.0
            },
            {
                "name": "Yard",
                "coordinate": { "latitude": 41.3500, "longitude": 69.3000 },
                "allowed_radius_meters": 250.0
            }
        ],
        "max_accuracy_meters": 80.0,
        "work_window": {
            "start_time": "09:00:00",
            "early_threshold": "08:45:00",
            "late_threshold": "09:00:00"
        },
        "utc_offset_minutes": 300
    }"#;

    #[test]
    fn parses_json_config() {
        let config = AttendanceConfig::from_json_str(CONFIG_JSON).expect("valid config");
        assert_eq!(config.sites.len(), 2);
        assert_eq!(config.sites[1].address, "");
        assert_eq!(config.max_accuracy_meters, 80.0);
        assert_eq!(config.utc_offset().local_minus_utc(), 5 * 3600);
    }

    #[test]
    fn default_config_is_valid() {
        AttendanceConfig::default()
            .validate()
            .expect("default config should validate");
    }

    #[test]
    fn rejects_empty_sites_and_bad_radius() {
        let mut config = AttendanceConfig::default();
        config.sites.clear();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = AttendanceConfig::default();
        config.sites[0].allowed_radius_meters = 0.0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = AttendanceConfig::default();
        config.max_accuracy_meters = f64::NAN;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn rejects_inverted_thresholds() {
        let mut config = AttendanceConfig::default();
        config.work_window.early_threshold = NaiveTime::from_hms_opt(9, 30, 0).unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = AttendanceConfig::from_json_str("{ \"sites\": ").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn local_day_follows_offset() {
        let config = AttendanceConfig::default();
        // 20:30 UTC is already the next day in UTC+5.
        let instant = Utc.with_ymd_and_hms(2024, 3, 4, 20, 30, 0).unwrap();
        assert_eq!(
            config.local_day(instant),
            NaiveDate::from_ymd_opt(2024, 3, 5).unwrap()
        );
    }

    #[test]
    fn resolves_nearest_site() {
        let mut config = AttendanceConfig::default();
        config.sites.push(OfficeSite {
            name: "Yard".to_string(),
            address: String::new(),
            coordinate: Coordinate::new(41.3500, 69.3000),
            allowed_radius_meters: 250.0,
        });
        let near_yard = Coordinate::new(41.3499, 69.3001);
        assert_eq!(config.resolve_site(near_yard).unwrap().name, "Yard");
        let near_office = Coordinate::new(41.2996, 69.2400);
        assert_eq!(config.resolve_site(near_office).unwrap().name, "Head Office");
    }

    #[test]
    fn resolves_containing_fence_over_nearer_center() {
        let mut config = AttendanceConfig::default();
        // 240 m north of Head Office, with a 500 m fence.
        config.sites.push(OfficeSite {
            name: "Depot".to_string(),
            address: String::new(),
            coordinate: Coordinate::new(41.301658, 69.2401),
            allowed_radius_meters: 500.0,
        });
        // 120 m north of Head Office: outside its 100 m fence, inside Depot's.
        let between = Coordinate::new(41.300579, 69.2401);
        assert_eq!(config.resolve_site(between).unwrap().name, "Depot");

        // Far from both fences: nearest center wins.
        let far_south = Coordinate::new(41.2800, 69.2401);
        assert_eq!(config.resolve_site(far_south).unwrap().name, "Head Office");
    }
}
