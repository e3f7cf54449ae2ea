//! Column definitions and the columns endpoints.

use std::fmt;

use serde::ser::{self, SerializeStruct};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::client::GristClient;
use crate::documents::DocumentId;
use crate::error::Result;
use crate::http::Method;
use crate::request::GristRequest;
use crate::tables::TableId;

/// Column type as Grist spells it, e.g. `Text` or `Ref:People`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum FieldType {
    Int,
    Any,
    Text,
    Numeric,
    Bool,
    Date,
    Choice,
    /// `DateTime:{timezone}`
    DateTime(String),
    /// `Ref:{table id}`
    Ref(String),
    /// Any type string this client does not model.
    Other(String),
}

impl FieldType {
    pub fn date_time(timezone: &str) -> Self {
        FieldType::DateTime(timezone.to_string())
    }

    pub fn reference(table: &TableId) -> Self {
        FieldType::Ref(table.to_string())
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Int => f.write_str("Int"),
            FieldType::Any => f.write_str("Any"),
            FieldType::Text => f.write_str("Text"),
            FieldType::Numeric => f.write_str("Numeric"),
            FieldType::Bool => f.write_str("Bool"),
            FieldType::Date => f.write_str("Date"),
            FieldType::Choice => f.write_str("Choice"),
            FieldType::DateTime(tz) => write!(f, "DateTime:{tz}"),
            FieldType::Ref(table) => write!(f, "Ref:{table}"),
            FieldType::Other(other) => f.write_str(other),
        }
    }
}

impl From<FieldType> for String {
    fn from(field_type: FieldType) -> Self {
        field_type.to_string()
    }
}

impl From<String> for FieldType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "Int" => FieldType::Int,
            "Any" => FieldType::Any,
            "Text" => FieldType::Text,
            "Numeric" => FieldType::Numeric,
            "Bool" => FieldType::Bool,
            "Date" => FieldType::Date,
            "Choice" => FieldType::Choice,
            _ => {
                if let Some(tz) = s.strip_prefix("DateTime:") {
                    FieldType::DateTime(tz.to_string())
                } else if let Some(table) = s.strip_prefix("Ref:") {
                    FieldType::Ref(table.to_string())
                } else {
                    FieldType::Other(s)
                }
            }
        }
    }
}

/// When a formula column recomputes. Sent as its integer code.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Recalc {
    #[default]
    NewOnly = 0,
    Never = 1,
    NewAndUpdate = 2,
}

impl Serialize for Recalc {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_u8(*self as u8)
    }
}

impl<'de> Deserialize<'de> for Recalc {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        match Option::<u8>::deserialize(deserializer)? {
            None | Some(0) => Ok(Recalc::NewOnly),
            Some(1) => Ok(Recalc::Never),
            Some(2) => Ok(Recalc::NewAndUpdate),
            Some(other) => Err(serde::de::Error::custom(format!(
                "unknown recalcWhen value {other}"
            ))),
        }
    }
}

/// Wire wrapper: `{"columns": [...]}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Columns {
    pub columns: Vec<Column>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub id: String,
    pub fields: ColumnFields,
}

impl Column {
    pub fn new(id: impl Into<String>, fields: ColumnFields) -> Self {
        Self { id: id.into(), fields }
    }
}

/// Column properties. Serializing a formula column without formula text
/// fails, so such a column never reaches the server.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnFields {
    #[serde(default)]
    pub label: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub formula: String,
    #[serde(default)]
    pub is_formula: bool,
    #[serde(default)]
    pub widget_options: String,
    #[serde(default)]
    pub untie_col_id_from_label: bool,
    #[serde(default)]
    pub recalc_when: Recalc,
    #[serde(default)]
    pub visible_col: i64,
    #[serde(default)]
    pub recalc_deps: Vec<i64>,
}

impl ColumnFields {
    pub fn new(label: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            label: label.into(),
            field_type,
            formula: String::new(),
            is_formula: false,
            widget_options: String::new(),
            untie_col_id_from_label: false,
            recalc_when: Recalc::default(),
            visible_col: 0,
            recalc_deps: Vec::new(),
        }
    }

    /// A formula column computing `formula`.
    pub fn formula(
        label: impl Into<String>,
        field_type: FieldType,
        formula: impl Into<String>,
    ) -> Self {
        Self {
            formula: formula.into(),
            is_formula: true,
            ..Self::new(label, field_type)
        }
    }
}

impl Serialize for ColumnFields {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        if self.is_formula && self.formula.is_empty() {
            return Err(ser::Error::custom("formula must be set for formula field"));
        }

        let mut state = serializer.serialize_struct("ColumnFields", 9)?;
        state.serialize_field("label", &self.label)?;
        state.serialize_field("type", &self.field_type)?;
        if self.formula.is_empty() {
            state.skip_field("formula")?;
        } else {
            state.serialize_field("formula", &self.formula)?;
        }
        if self.is_formula {
            state.serialize_field("isFormula", &true)?;
        } else {
            state.skip_field("isFormula")?;
        }
        if self.widget_options.is_empty() {
            state.skip_field("widgetOptions")?;
        } else {
            state.serialize_field("widgetOptions", &self.widget_options)?;
        }
        if self.untie_col_id_from_label {
            state.serialize_field("untieColIdFromLabel", &true)?;
        } else {
            state.skip_field("untieColIdFromLabel")?;
        }
        state.serialize_field("recalcWhen", &self.recalc_when)?;
        if self.visible_col == 0 {
            state.skip_field("visibleCol")?;
        } else {
            state.serialize_field("visibleCol", &self.visible_col)?;
        }
        if self.recalc_deps.is_empty() {
            state.skip_field("recalcDeps")?;
        } else {
            state.serialize_field("recalcDeps", &self.recalc_deps)?;
        }
        state.end()
    }
}

impl GristClient {
    pub fn get_columns(&self, document: &DocumentId, table: &TableId) -> Result<Vec<u8>> {
        self.send(GristRequest::new(Method::Get, columns_path(document, table)))
    }

    pub fn create_columns(
        &self,
        document: &DocumentId,
        table: &TableId,
        columns: &[Column],
    ) -> Result<Vec<u8>> {
        self.write_columns(Method::Post, document, table, columns)
    }

    pub fn patch_columns(
        &self,
        document: &DocumentId,
        table: &TableId,
        columns: &[Column],
    ) -> Result<Vec<u8>> {
        self.write_columns(Method::Patch, document, table, columns)
    }

    fn write_columns(
        &self,
        method: Method,
        document: &DocumentId,
        table: &TableId,
        columns: &[Column],
    ) -> Result<Vec<u8>> {
        #[derive(Serialize)]
        struct Payload<'a> {
            columns: &'a [Column],
        }

        self.send_json(method, columns_path(document, table), &Payload { columns })
    }
}

fn columns_path(document: &DocumentId, table: &TableId) -> String {
    format!("/api/docs/{document}/tables/{table}/columns")
}
