use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Body measurements taken for a client, in centimetres.
///
/// Every field is optional. `None` means the value was never taken; empty
/// text is normalised to `None` on the way in and written back as `""`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Measurements {
    #[serde(default, with = "empty_as_none")]
    pub waist: Option<String>,
    #[serde(default, with = "empty_as_none")]
    pub pants_length: Option<String>,
    #[serde(default, with = "empty_as_none")]
    pub shoulder_width: Option<String>,
    #[serde(default, with = "empty_as_none")]
    pub neck: Option<String>,
    #[serde(default, with = "empty_as_none")]
    pub sleeve: Option<String>,
    #[serde(default, with = "empty_as_none")]
    pub wrist: Option<String>,
    #[serde(default, with = "empty_as_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeasurementField {
    Waist,
    PantsLength,
    ShoulderWidth,
    Neck,
    Sleeve,
    Wrist,
}

impl MeasurementField {
    pub const ALL: [MeasurementField; 6] = [
        MeasurementField::Waist,
        MeasurementField::PantsLength,
        MeasurementField::ShoulderWidth,
        MeasurementField::Neck,
        MeasurementField::Sleeve,
        MeasurementField::Wrist,
    ];

    pub fn label(self) -> &'static str {
        match self {
            MeasurementField::Waist => "Waist",
            MeasurementField::PantsLength => "Pants length",
            MeasurementField::ShoulderWidth => "Shoulder width",
            MeasurementField::Neck => "Neck",
            MeasurementField::Sleeve => "Sleeve",
            MeasurementField::Wrist => "Wrist",
        }
    }
}

impl Measurements {
    pub fn get(&self, field: MeasurementField) -> Option<&str> {
        let value = match field {
            MeasurementField::Waist => &self.waist,
            MeasurementField::PantsLength => &self.pants_length,
            MeasurementField::ShoulderWidth => &self.shoulder_width,
            MeasurementField::Neck => &self.neck,
            MeasurementField::Sleeve => &self.sleeve,
            MeasurementField::Wrist => &self.wrist,
        };
        value.as_deref()
    }

    pub fn set(&mut self, field: MeasurementField, value: &str) {
        let slot = match field {
            MeasurementField::Waist => &mut self.waist,
            MeasurementField::PantsLength => &mut self.pants_length,
            MeasurementField::ShoulderWidth => &mut self.shoulder_width,
            MeasurementField::Neck => &mut self.neck,
            MeasurementField::Sleeve => &mut self.sleeve,
            MeasurementField::Wrist => &mut self.wrist,
        };
        *slot = non_empty(value);
    }

    pub fn set_notes(&mut self, value: &str) {
        self.notes = non_empty(value);
    }

    /// Display form of a measurement: the value with a `cm` suffix, or `-`.
    pub fn display(&self, field: MeasurementField) -> String {
        match self.get(field) {
            Some(value) => format!("{} cm", value),
            None => "-".to_string(),
        }
    }
}

pub(crate) fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Stored records use `""` for values that were never filled in.
pub(crate) mod empty_as_none {
    use super::*;

    pub fn serialize<S>(value: &Option<String>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(value.as_deref().unwrap_or(""))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.and_then(|value| if value.is_empty() { None } else { Some(value) }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_normalises_blank_input_to_unset() {
        let mut m = Measurements::default();
        m.set(MeasurementField::Neck, "  ");
        assert_eq!(m.neck, None);

        m.set(MeasurementField::Neck, " 41 ");
        assert_eq!(m.get(MeasurementField::Neck), Some("41"));
        assert_eq!(m.display(MeasurementField::Neck), "41 cm");
        assert_eq!(m.display(MeasurementField::Wrist), "-");
    }

    #[test]
    fn reads_the_browser_shape_with_empty_strings() {
        let json = r#"{"waist":"80","pantsLength":"","shoulderWidth":"45",
            "neck":"","sleeve":"","wrist":"","notes":"wide collar"}"#;
        let m: Measurements = serde_json::from_str(json).unwrap();

        assert_eq!(m.waist.as_deref(), Some("80"));
        assert_eq!(m.pants_length, None);
        assert_eq!(m.shoulder_width.as_deref(), Some("45"));
        assert_eq!(m.notes.as_deref(), Some("wide collar"));
    }

    #[test]
    fn missing_and_null_fields_are_unset() {
        let m: Measurements = serde_json::from_str(r#"{"waist":null}"#).unwrap();
        assert_eq!(m, Measurements::default());
    }

    #[test]
    fn unset_fields_are_written_as_empty_strings() {
        let mut m = Measurements::default();
        m.set(MeasurementField::Sleeve, "60");
        let value = serde_json::to_value(&m).unwrap();

        assert_eq!(value["sleeve"], "60");
        assert_eq!(value["waist"], "");
        assert_eq!(value["notes"], "");
    }
}
