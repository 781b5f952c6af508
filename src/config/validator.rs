//! Descriptor validation: identifiers, primary key, field uniqueness, rule references, patterns.

use crate::entity::EntityDescriptor;
use crate::error::ConfigError;
use crate::query::is_identifier;
use regex::Regex;
use std::collections::HashSet;

pub fn validate_descriptor(entity: &EntityDescriptor) -> Result<(), ConfigError> {
    if !is_identifier(&entity.table) {
        return Err(ConfigError::InvalidIdentifier(entity.table.clone()));
    }

    let mut names = HashSet::new();
    for f in &entity.fields {
        if !is_identifier(&f.name) {
            return Err(ConfigError::InvalidIdentifier(f.name.clone()));
        }
        if !names.insert(f.name.as_str()) {
            return Err(ConfigError::DuplicateField {
                table: entity.table.clone(),
                field: f.name.clone(),
            });
        }
    }

    let pk_ok = entity
        .get(&entity.pk)
        .map_or(false, |f| f.primary_key);
    if !pk_ok {
        return Err(ConfigError::MissingPrimaryKey {
            table: entity.table.clone(),
            pk: entity.pk.clone(),
        });
    }

    for (field, rule) in &entity.validation {
        if !names.contains(field.as_str()) {
            return Err(ConfigError::UnknownField {
                table: entity.table.clone(),
                field: field.clone(),
            });
        }
        if let Some(pattern) = &rule.pattern {
            Regex::new(pattern).map_err(|e| invalid_pattern(entity, field, e))?;
        }
    }
    Ok(())
}

/// Compile every rule pattern once so requests reuse the regex.
pub fn compile_rules(entity: &mut EntityDescriptor) -> Result<(), ConfigError> {
    let table = entity.table.clone();
    for (field, rule) in entity.validation.iter_mut() {
        rule.compile().map_err(|e| ConfigError::InvalidPattern {
            table: table.clone(),
            field: field.clone(),
            reason: e.to_string(),
        })?;
    }
    Ok(())
}

fn invalid_pattern(entity: &EntityDescriptor, field: &str, e: regex::Error) -> ConfigError {
    ConfigError::InvalidPattern {
        table: entity.table.clone(),
        field: field.to_string(),
        reason: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{FieldDef, FieldKind, ValidationRule};

    #[test]
    fn accepts_well_formed_descriptor() {
        let d = EntityDescriptor::new("users")
            .field(FieldDef::new("name", FieldKind::Text))
            .rule("name", ValidationRule::required())
            .timestamps();
        assert!(validate_descriptor(&d).is_ok());
    }

    #[test]
    fn rejects_duplicate_fields() {
        let d = EntityDescriptor::new("users")
            .field(FieldDef::new("name", FieldKind::Text))
            .field(FieldDef::new("name", FieldKind::Text));
        assert!(matches!(validate_descriptor(&d), Err(ConfigError::DuplicateField { .. })));
    }

    #[test]
    fn rejects_bad_identifiers() {
        let d = EntityDescriptor::new("users; drop");
        assert!(matches!(validate_descriptor(&d), Err(ConfigError::InvalidIdentifier(_))));
        let d = EntityDescriptor::new("users").field(FieldDef::new("a-b", FieldKind::Text));
        assert!(matches!(validate_descriptor(&d), Err(ConfigError::InvalidIdentifier(_))));
    }

    #[test]
    fn rejects_missing_primary_key() {
        let mut d = EntityDescriptor::new("users");
        d.pk = "uid".into();
        assert!(matches!(validate_descriptor(&d), Err(ConfigError::MissingPrimaryKey { .. })));
    }

    #[test]
    fn rejects_patterns_that_do_not_compile() {
        let mut d = EntityDescriptor::new("users")
            .field(FieldDef::new("phone", FieldKind::Text))
            .rule("phone", ValidationRule::default().with_pattern("[0-9"));
        assert!(matches!(validate_descriptor(&d), Err(ConfigError::InvalidPattern { .. })));
        assert!(matches!(compile_rules(&mut d), Err(ConfigError::InvalidPattern { field, .. }) if field == "phone"));
    }

    #[test]
    fn rejects_rules_for_unknown_fields() {
        let d = EntityDescriptor::new("users").rule("ghost", ValidationRule::required());
        assert!(matches!(validate_descriptor(&d), Err(ConfigError::UnknownField { .. })));
    }
}
