//! Dataset kinds and their declared field sets
//!
//! Each kind owns a closed set of fields. Every field is either numeric
//! or text; there is no other type.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Kind of records a dataset holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetKind {
    /// Academic course sections
    Sections,
    /// Campus rooms
    Rooms,
}

const SECTION_FIELDS: &[Field] = &[
    Field::Dept,
    Field::Id,
    Field::Avg,
    Field::Instructor,
    Field::Title,
    Field::Pass,
    Field::Fail,
    Field::Audit,
    Field::Uuid,
    Field::Year,
];

const ROOM_FIELDS: &[Field] = &[
    Field::Fullname,
    Field::Shortname,
    Field::Number,
    Field::Name,
    Field::Address,
    Field::Lat,
    Field::Lon,
    Field::Seats,
    Field::Type,
    Field::Furniture,
    Field::Href,
];

impl DatasetKind {
    /// Returns the lowercase kind name
    pub fn as_str(&self) -> &'static str {
        match self {
            DatasetKind::Sections => "sections",
            DatasetKind::Rooms => "rooms",
        }
    }

    /// Parses a kind name (case-insensitive)
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "sections" | "courses" => Some(DatasetKind::Sections),
            "rooms" => Some(DatasetKind::Rooms),
            _ => None,
        }
    }

    /// All fields declared for this kind, in declaration order
    pub fn fields(&self) -> &'static [Field] {
        match self {
            DatasetKind::Sections => SECTION_FIELDS,
            DatasetKind::Rooms => ROOM_FIELDS,
        }
    }

    /// Returns true if the field belongs to this kind
    pub fn declares(&self, field: Field) -> bool {
        self.fields().contains(&field)
    }

    /// Numeric fields of this kind
    pub fn numeric_fields(&self) -> impl Iterator<Item = Field> {
        self.fields().iter().copied().filter(|f| f.is_numeric())
    }

    /// Text fields of this kind
    pub fn text_fields(&self) -> impl Iterator<Item = Field> {
        self.fields().iter().copied().filter(|f| !f.is_numeric())
    }
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Value type of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Numeric,
    Text,
}

impl FieldType {
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldType::Numeric => "number",
            FieldType::Text => "string",
        }
    }
}

/// Every field any dataset kind can declare
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    // Sections
    Dept,
    Id,
    Avg,
    Instructor,
    Title,
    Pass,
    Fail,
    Audit,
    Uuid,
    Year,
    // Rooms
    Fullname,
    Shortname,
    Number,
    Name,
    Address,
    Lat,
    Lon,
    Seats,
    Type,
    Furniture,
    Href,
}

impl Field {
    /// Bare field name as it appears after the `id_` prefix
    pub fn name(&self) -> &'static str {
        match self {
            Field::Dept => "dept",
            Field::Id => "id",
            Field::Avg => "avg",
            Field::Instructor => "instructor",
            Field::Title => "title",
            Field::Pass => "pass",
            Field::Fail => "fail",
            Field::Audit => "audit",
            Field::Uuid => "uuid",
            Field::Year => "year",
            Field::Fullname => "fullname",
            Field::Shortname => "shortname",
            Field::Number => "number",
            Field::Name => "name",
            Field::Address => "address",
            Field::Lat => "lat",
            Field::Lon => "lon",
            Field::Seats => "seats",
            Field::Type => "type",
            Field::Furniture => "furniture",
            Field::Href => "href",
        }
    }

    /// Looks up a field by its bare name, regardless of kind
    pub fn from_name(name: &str) -> Option<Self> {
        SECTION_FIELDS
            .iter()
            .chain(ROOM_FIELDS.iter())
            .copied()
            .find(|f| f.name() == name)
    }

    pub fn field_type(&self) -> FieldType {
        match self {
            Field::Avg
            | Field::Pass
            | Field::Fail
            | Field::Audit
            | Field::Year
            | Field::Lat
            | Field::Lon
            | Field::Seats => FieldType::Numeric,
            _ => FieldType::Text,
        }
    }

    pub fn is_numeric(&self) -> bool {
        self.field_type() == FieldType::Numeric
    }

    /// Qualifies this field with a dataset id (`id_field`)
    pub fn qualified(&self, dataset_id: &str) -> String {
        format!("{}_{}", dataset_id, self.name())
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
