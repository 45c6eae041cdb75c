//! Legacy field-name translation.
//!
//! Older clients address the audit fields with the names used by the previous
//! backend (`created_date`, `createdAt`, ...). Stored documents only ever use
//! the snake_case names below, so every filter key and order field passes
//! through [`normalize_field`] before a query is built. Names that are not in
//! the table are passed through untouched.

/// Closed set of known legacy field names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LegacyField {
    CreatedDate,
    UpdatedDate,
    CreatedDateCamel,
    UpdatedDateCamel,
    CreatedAtCamel,
    UpdatedAtCamel,
    CreatedByCamel,
    CreatedById,
}

impl LegacyField {
    pub const ALL: [LegacyField; 8] = [
        LegacyField::CreatedDate,
        LegacyField::UpdatedDate,
        LegacyField::CreatedDateCamel,
        LegacyField::UpdatedDateCamel,
        LegacyField::CreatedAtCamel,
        LegacyField::UpdatedAtCamel,
        LegacyField::CreatedByCamel,
        LegacyField::CreatedById,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "created_date" => LegacyField::CreatedDate,
            "updated_date" => LegacyField::UpdatedDate,
            "createdDate" => LegacyField::CreatedDateCamel,
            "updatedDate" => LegacyField::UpdatedDateCamel,
            "createdAt" => LegacyField::CreatedAtCamel,
            "updatedAt" => LegacyField::UpdatedAtCamel,
            "createdBy" => LegacyField::CreatedByCamel,
            "created_by_id" => LegacyField::CreatedById,
            _ => return None,
        })
    }

    pub fn legacy_name(self) -> &'static str {
        match self {
            LegacyField::CreatedDate => "created_date",
            LegacyField::UpdatedDate => "updated_date",
            LegacyField::CreatedDateCamel => "createdDate",
            LegacyField::UpdatedDateCamel => "updatedDate",
            LegacyField::CreatedAtCamel => "createdAt",
            LegacyField::UpdatedAtCamel => "updatedAt",
            LegacyField::CreatedByCamel => "createdBy",
            LegacyField::CreatedById => "created_by_id",
        }
    }

    pub fn canonical(self) -> &'static str {
        match self {
            LegacyField::CreatedDate
            | LegacyField::CreatedDateCamel
            | LegacyField::CreatedAtCamel => "created_at",
            LegacyField::UpdatedDate
            | LegacyField::UpdatedDateCamel
            | LegacyField::UpdatedAtCamel => "updated_at",
            LegacyField::CreatedByCamel | LegacyField::CreatedById => "created_by",
        }
    }
}

/// Translate a public field name to the stored name
pub fn normalize_field(name: &str) -> &str {
    match LegacyField::from_name(name) {
        Some(legacy) => legacy.canonical(),
        None => name,
    }
}
