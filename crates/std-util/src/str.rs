use heck::ToSnakeCase;

/// `EquipmentType` and `equipmentType` both become `equipment_type`.
pub fn snake_case(src: &str) -> String {
    src.to_snake_case()
}

pub fn pluralize(src: &str) -> String {
    pluralizer::pluralize(src, 2, false)
}

/// The last `.`-separated segment of a qualified name.
pub fn last_segment(src: &str) -> &str {
    src.rsplit('.').next().unwrap_or(src)
}
