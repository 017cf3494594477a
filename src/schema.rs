use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

use crate::error::CatalogError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Str,
    Int,
    /// Single-bit integer (`int:1`).
    Flag,
}

impl FieldType {
    pub fn tag(self) -> &'static str {
        match self {
            FieldType::Str => "str",
            FieldType::Int => "int",
            FieldType::Flag => "int:1",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldSpec {
    pub name: String,
    pub field_type: FieldType,
}

/// Ordered output fields of a catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Schema {
    fields: Vec<FieldSpec>,
}

impl Schema {
    pub fn new<I, S>(fields: I) -> Result<Self, CatalogError>
    where
        I: IntoIterator<Item = (S, FieldType)>,
        S: Into<String>,
    {
        let mut seen = BTreeSet::new();
        let mut specs = Vec::new();
        for (name, field_type) in fields {
            let name = name.into();
            if !seen.insert(name.clone()) {
                return Err(CatalogError::InvalidConfig(format!(
                    "duplicate schema field: {name}"
                )));
            }
            specs.push(FieldSpec { name, field_type });
        }
        Ok(Self { fields: specs })
    }

    pub fn imagery() -> Self {
        let fields = [
            ("best", FieldType::Flag),
            ("country_code", FieldType::Str),
            ("end_date", FieldType::Str),
            ("id", FieldType::Str),
            ("license_url", FieldType::Str),
            ("max_zoom", FieldType::Int),
            ("name", FieldType::Str),
            ("start_date", FieldType::Str),
            ("type", FieldType::Str),
            ("url", FieldType::Str),
            ("attribution", FieldType::Str),
            ("icon", FieldType::Str),
            ("min_zoom", FieldType::Int),
            ("privacy_policy_url", FieldType::Str),
            ("available_projections", FieldType::Str),
            ("i18n", FieldType::Flag),
            ("overlay", FieldType::Flag),
        ];
        Self {
            fields: fields
                .into_iter()
                .map(|(name, field_type)| FieldSpec {
                    name: name.to_string(),
                    field_type,
                })
                .collect(),
        }
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn field_type(&self, name: &str) -> Option<FieldType> {
        self.fields
            .iter()
            .find(|field| field.name == name)
            .map(|field| field.field_type)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|field| field.name.as_str())
    }
}

impl Default for Schema {
    fn default() -> Self {
        Self::imagery()
    }
}
