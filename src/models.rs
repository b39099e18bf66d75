use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Column header and the backend key that fills it, in display order.
pub const COLUMNS: &[(&str, &str)] = &[
    ("A/c Code", "Ac_Code"),
    ("A/c Type", "Ac_type"),
    ("A/c Name", "Ac_Name_E"),
    ("Short Name", "Short_Name"),
    ("Commission", "Ac_rate"),
    ("Address", "Address_E"),
    ("State Code", "GSTStateCode"),
    ("GST No", "Gst_No"),
    ("PAN", "PanLink"),
    ("FSSAI", "FSSAI"),
    ("Adhar No", "adhar_no"),
    ("Mobile No", "Mobile_No"),
    ("A/c Id", "accoid"),
];

pub const CODE_KEY: &str = "Ac_Code";

/// Identity of an account record: the display text of `Ac_Code`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AccountCode(String);

impl AccountCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An account master record exactly as the backend sent it.
/// Unknown keys are kept so the record can be posted back unchanged.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountRecord(Map<String, Value>);

impl AccountRecord {
    pub fn code(&self) -> AccountCode {
        AccountCode(self.text(CODE_KEY))
    }

    /// Display text of a field, empty when missing.
    pub fn text(&self, key: &str) -> String {
        self.0.get(key).map(value_text).unwrap_or_default()
    }

    #[cfg(test)]
    pub fn name(&self) -> String {
        self.text("Ac_Name_E")
    }

    /// Cells for each entry in [`COLUMNS`].
    pub fn cells(&self) -> Vec<String> {
        COLUMNS.iter().map(|(_, key)| self.text(key)).collect()
    }

    /// True when any field's display text contains `needle`.
    /// `needle` must already be lowercase.
    pub fn matches_lowercase(&self, needle: &str) -> bool {
        self.0
            .values()
            .any(|v| value_text(v).to_lowercase().contains(needle))
    }
}

/// Strings as-is, null as empty, everything else as compact JSON.
pub fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use serde_json::json;

    pub fn record(code: i64, name: &str, gst: &str) -> AccountRecord {
        let value = json!({
            "Ac_Code": code,
            "Ac_type": "P",
            "Ac_Name_E": name,
            "Short_Name": name.split_whitespace().next().unwrap_or(""),
            "Ac_rate": 0.5,
            "Address_E": "Station Road",
            "GSTStateCode": 27,
            "Gst_No": gst,
            "PanLink": null,
            "FSSAI": "",
            "adhar_no": "",
            "Mobile_No": "9800000000",
            "accoid": code * 10,
        });
        serde_json::from_value(value).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::record;
    use super::*;
    use serde_json::json;

    #[test]
    fn test_value_text() {
        assert_eq!(value_text(&json!("abc")), "abc");
        assert_eq!(value_text(&json!(42)), "42");
        assert_eq!(value_text(&json!(0.5)), "0.5");
        assert_eq!(value_text(&json!(true)), "true");
        assert_eq!(value_text(&Value::Null), "");
        assert_eq!(value_text(&json!([1, "a"])), r#"[1,"a"]"#);
    }

    #[test]
    fn test_code_from_number_or_string() {
        assert_eq!(record(101, "Shree Traders", "27AAA").code().as_str(), "101");
        let r: AccountRecord = serde_json::from_value(json!({"Ac_Code": "A7"})).unwrap();
        assert_eq!(r.code(), AccountCode::new("A7"));
        let r: AccountRecord = serde_json::from_value(json!({"Ac_Name_E": "x"})).unwrap();
        assert_eq!(r.code().as_str(), "");
    }

    #[test]
    fn test_cells_follow_column_order() {
        let r = record(7, "Shree Traders", "27AAACS1234F1Z5");
        let cells = r.cells();
        assert_eq!(cells.len(), COLUMNS.len());
        assert_eq!(cells[0], "7");
        assert_eq!(cells[2], "Shree Traders");
        assert_eq!(cells[7], "27AAACS1234F1Z5");
        assert_eq!(cells[8], "");
        assert_eq!(cells[12], "70");
    }

    #[test]
    fn test_unknown_keys_survive_serialization() {
        let r: AccountRecord =
            serde_json::from_value(json!({"Ac_Code": 1, "company_code": 3, "nested": {"a": 1}}))
                .unwrap();
        let back = serde_json::to_value(&r).unwrap();
        assert_eq!(back, json!({"Ac_Code": 1, "company_code": 3, "nested": {"a": 1}}));
    }

    #[test]
    fn test_matches_any_field() {
        let r = record(12, "Shree Traders", "27AAACS1234F1Z5");
        assert!(r.matches_lowercase("shree"));
        assert!(r.matches_lowercase("1z5"));
        assert!(r.matches_lowercase("station"));
        assert!(r.matches_lowercase("120"));
        assert!(!r.matches_lowercase("null"));
        assert!(!r.matches_lowercase("mumbai"));
    }
}
