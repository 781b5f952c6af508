//! Backend-agnostic select description and the steps that build it.
//!
//! Composition order for a list: filters, count, order, pagination, execute. The count runs on
//! the filtered query before any window is applied.

use crate::entity::EntityDescriptor;
use crate::error::AppError;
use crate::query::{sanitize_order_field, FilterParams, OrderBy, PaginationParams};
use serde_json::Value;

#[derive(Clone, Debug, PartialEq)]
pub enum Predicate {
    /// `field = value`.
    Eq { field: String, value: Value },
    /// `(f1 ILIKE %term% OR f2 ILIKE %term% ...)`.
    AnyContains { fields: Vec<String>, term: String },
}

/// Predicates are ANDed together. Field names are resolved against the entity descriptor.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SelectQuery {
    pub predicates: Vec<Predicate>,
    pub order: Option<OrderBy>,
    pub offset: Option<u64>,
    pub limit: Option<u32>,
}

impl SelectQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, field: impl Into<String>, value: Value) -> Self {
        self.predicates.push(Predicate::Eq {
            field: field.into(),
            value,
        });
        self
    }

    pub fn order_by(mut self, order: OrderBy) -> Self {
        self.order = Some(order);
        self
    }

    pub fn window(mut self, offset: u64, limit: u32) -> Self {
        self.offset = Some(offset);
        self.limit = Some(limit);
        self
    }
}

/// Add one equality predicate per filter. Unknown fields and values that do not parse as the
/// field's kind are rejected.
pub fn apply_filters(
    mut query: SelectQuery,
    entity: &EntityDescriptor,
    params: &FilterParams,
) -> Result<SelectQuery, AppError> {
    for (raw, value) in &params.filters {
        let field = entity
            .resolve(raw)
            .ok_or_else(|| AppError::BadRequest(format!("unknown filter field: {}", raw)))?;
        let value = field.kind.coerce(value).ok_or_else(|| {
            AppError::BadRequest(format!("invalid value for filter {}: {}", field.name, value))
        })?;
        query = query.filter(field.name.clone(), value);
    }
    Ok(query)
}

/// Add at most one ORDER BY. The field is sanitized first; an empty result applies no order.
pub fn apply_order(
    query: SelectQuery,
    entity: &EntityDescriptor,
    order: Option<&OrderBy>,
) -> Result<SelectQuery, AppError> {
    let Some(order) = order else {
        return Ok(query);
    };
    let cleaned = sanitize_order_field(&order.field);
    if cleaned.is_empty() {
        return Ok(query);
    }
    let field = entity
        .resolve(&cleaned)
        .ok_or_else(|| AppError::BadRequest(format!("unknown order field: {}", cleaned)))?;
    Ok(query.order_by(OrderBy {
        field: field.name.clone(),
        direction: order.direction,
    }))
}

pub fn apply_pagination(query: SelectQuery, params: &PaginationParams) -> SelectQuery {
    query.window(params.offset, params.limit)
}

/// Add a single OR-group of case-insensitive substring matches. No-op for a blank term or no fields.
pub fn apply_search(mut query: SelectQuery, term: &str, fields: &[&str]) -> SelectQuery {
    let term = term.trim();
    if term.is_empty() || fields.is_empty() {
        return query;
    }
    query.predicates.push(Predicate::AnyContains {
        fields: fields.iter().map(|f| f.to_string()).collect(),
        term: term.to_string(),
    });
    query
}
