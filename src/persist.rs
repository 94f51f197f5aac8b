//! Saving and loading figure parameters.
//!
//! A [`FigureParams`] is the JSON schema for a figure: the body table plus
//! the handful of settings that shape what gets drawn. Every field is
//! optional, so a file can carry a whole scene or just a tweak; applying
//! params only overwrites what the file actually mentions.
//!
//! The scalar fields accept both JSON numbers and numeric strings, because
//! files written by form-driven frontends tend to quote their numbers.
//!
//! # Example
//!
//! ```ignore
//! let params = FigureParams::load("figure.json")?;
//! params.apply(&mut system, &mut settings);
//! ```

use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::body::{Body, BodySystem};
use crate::error::PersistError;
use crate::settings::{Color, Settings};

/// A serializable snapshot of a figure's bodies and draw parameters.
///
/// `None` fields are omitted on save and leave the current value untouched
/// on [`apply`](Self::apply).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FigureParams {
    /// The full body table. Wire name kept for compatibility with files
    /// that predate the body/planet rename.
    #[serde(rename = "planets", skip_serializing_if = "Option::is_none")]
    pub bodies: Option<Vec<Body>>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "number_or_string"
    )]
    pub total_steps: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub back_color: Option<Color>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "number_or_string"
    )]
    pub fov: Option<f64>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "number_or_string"
    )]
    pub focal_distance: Option<f64>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "number_or_string"
    )]
    pub eye_separation: Option<f64>,
}

impl FigureParams {
    /// Snapshot the current system and settings with every field present.
    pub fn capture(system: &BodySystem, settings: &Settings) -> Self {
        Self {
            bodies: Some(system.bodies().to_vec()),
            total_steps: Some(settings.total_steps),
            back_color: Some(settings.background),
            fov: Some(settings.field_of_view),
            focal_distance: Some(settings.focal_distance),
            eye_separation: Some(settings.eye_separation),
        }
    }

    /// Write the present fields into `system` and `settings`.
    pub fn apply(&self, system: &mut BodySystem, settings: &mut Settings) {
        if let Some(bodies) = &self.bodies {
            *system = BodySystem::from_bodies(bodies.clone());
        }
        if let Some(total_steps) = self.total_steps {
            settings.total_steps = total_steps;
        }
        if let Some(back_color) = self.back_color {
            settings.background = back_color;
        }
        if let Some(fov) = self.fov {
            settings.field_of_view = fov;
        }
        if let Some(focal_distance) = self.focal_distance {
            settings.focal_distance = focal_distance;
        }
        if let Some(eye_separation) = self.eye_separation {
            settings.eye_separation = eye_separation;
        }
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, PersistError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse params from JSON. Unknown keys are ignored.
    pub fn from_json(json: &str) -> Result<Self, PersistError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Save as JSON to `path`.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), PersistError> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Load params from a JSON file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PersistError> {
        Self::from_json(&fs::read_to_string(path)?)
    }
}

/// Accept `1000`, `"1000"`, or `null` for an optional numeric field.
fn number_or_string<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + FromStr,
    T::Err: fmt::Display,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw<T> {
        Number(T),
        Text(String),
    }

    match Option::<Raw<T>>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Number(value)) => Ok(Some(value)),
        Some(Raw::Text(text)) => text
            .trim()
            .parse()
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::Parent;
    use crate::settings::DrawStyle;

    fn sample_system() -> BodySystem {
        BodySystem::from_bodies(vec![
            Body::new(150.0, 150.0, 1.0),
            Body::new(75.0, 75.0, 2.0)
                .with_inclination(10.0)
                .with_color(Color::from_hex("#ff0000").unwrap())
                .with_parent(Parent::Body(0)),
        ])
    }

    #[test]
    fn test_capture_apply_round_trip() {
        let system = sample_system();
        let mut settings = Settings::default();
        settings.total_steps = 720;
        settings.background = Color::from_hex("#101010").unwrap();
        settings.field_of_view = 60.0;

        let json = FigureParams::capture(&system, &settings).to_json().unwrap();
        let restored = FigureParams::from_json(&json).unwrap();

        let mut new_system = BodySystem::single_default();
        let mut new_settings = Settings::default();
        restored.apply(&mut new_system, &mut new_settings);

        assert_eq!(new_system.bodies(), system.bodies());
        assert_eq!(new_settings.total_steps, 720);
        assert_eq!(new_settings.background, settings.background);
        assert_eq!(new_settings.field_of_view, 60.0);
    }

    #[test]
    fn test_absent_fields_keep_current_values() {
        let params = FigureParams::from_json(r#"{"totalSteps": 2000}"#).unwrap();
        let mut system = sample_system();
        let mut settings = Settings::default();
        settings.field_of_view = 50.0;

        params.apply(&mut system, &mut settings);

        assert_eq!(settings.total_steps, 2000);
        assert_eq!(settings.field_of_view, 50.0);
        assert_eq!(system.len(), 2);
    }

    #[test]
    fn test_quoted_numbers_are_accepted() {
        let params = FigureParams::from_json(
            r#"{"totalSteps": "2000", "fov": "60.5", "eyeSeparation": "0.1"}"#,
        )
        .unwrap();
        assert_eq!(params.total_steps, Some(2000));
        assert_eq!(params.fov, Some(60.5));
        assert_eq!(params.eye_separation, Some(0.1));
    }

    #[test]
    fn test_loads_form_frontend_export() {
        // Shape produced by the original web frontend: numeric body fields,
        // quoted setting scalars, -1 for a root parent.
        let json = r##"{
            "planets": [
                {"distanceX":150,"distanceY":150,"speed":1,"inclination":0,"azimuth":0,"radius":5,"color":"#ffffff","parent":-1},
                {"distanceX":75,"distanceY":75,"speed":2,"inclination":10,"azimuth":45,"radius":3,"color":"#ff0000","parent":0}
            ],
            "totalSteps": "1000",
            "backColor": "#000000",
            "fov": "75",
            "focalDistance": "500",
            "eyeSeparation": "0.064"
        }"##;

        let params = FigureParams::from_json(json).unwrap();
        let mut system = BodySystem::new();
        let mut settings = Settings::default();
        params.apply(&mut system, &mut settings);

        assert_eq!(system.len(), 2);
        assert_eq!(system.get(0).unwrap().parent, Parent::Root);
        assert_eq!(system.get(1).unwrap().parent, Parent::Body(0));
        assert_eq!(system.get(1).unwrap().azimuth, 45.0);
        assert_eq!(settings.total_steps, 1000);
        assert_eq!(settings.background, Color::BLACK);
        assert_eq!(settings.focal_distance, 500.0);
        assert_eq!(settings.eye_separation, 0.064);
    }

    #[test]
    fn test_saved_json_uses_wire_names() {
        let system = sample_system();
        let settings = Settings::default();
        let json = FigureParams::capture(&system, &settings).to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert!(value.get("planets").is_some());
        assert!(value.get("totalSteps").is_some());
        assert!(value.get("backColor").is_some());
        assert_eq!(value["planets"][1]["parent"], serde_json::json!(0));
        assert_eq!(value["planets"][0]["parent"], serde_json::json!(-1));
        assert_eq!(value["planets"][1]["distanceX"], serde_json::json!(75.0));
    }

    #[test]
    fn test_empty_params_serialize_to_empty_object() {
        let json = FigureParams::default().to_json().unwrap();
        assert_eq!(json.trim(), "{}");
    }

    #[test]
    fn test_malformed_json_is_rejected() {
        let err = FigureParams::from_json("{\"planets\": [").unwrap_err();
        assert!(matches!(err, PersistError::Json(_)));

        let err = FigureParams::from_json(r#"{"totalSteps": "abc"}"#).unwrap_err();
        assert!(matches!(err, PersistError::Json(_)));
    }

    #[test]
    fn test_save_and_load_file() {
        let path = std::env::temp_dir().join(format!("orrery-params-{}.json", std::process::id()));
        let system = sample_system();
        let settings = Settings::default();

        FigureParams::capture(&system, &settings)
            .save(&path)
            .unwrap();
        let loaded = FigureParams::load(&path).unwrap();
        let _ = fs::remove_file(&path);

        assert_eq!(loaded.bodies.as_deref(), Some(system.bodies()));
        assert_eq!(loaded.total_steps, Some(settings.total_steps));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = FigureParams::load("/nonexistent/orrery-params.json").unwrap_err();
        assert!(matches!(err, PersistError::Io(_)));
    }

    #[test]
    fn test_apply_does_not_touch_draw_style() {
        let params = FigureParams::from_json(r#"{"totalSteps": 10}"#).unwrap();
        let mut system = BodySystem::single_default();
        let mut settings = Settings::default();
        settings.style = DrawStyle::Connect;

        params.apply(&mut system, &mut settings);
        assert_eq!(settings.style, DrawStyle::Connect);
    }
}
