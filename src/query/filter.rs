//! Filter and order intents from query parameters.

use crate::query::QueryParams;

/// Keys never treated as equality filters.
pub const RESERVED_KEYS: &[&str] = &["page", "page_size", "limit", "offset", "order_by", "ordering"];

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    /// `DESC` in any case is descending; everything else collapses to ascending.
    pub fn parse(raw: &str) -> Self {
        if raw.eq_ignore_ascii_case("desc") {
            SortDirection::Desc
        } else {
            SortDirection::Asc
        }
    }

    pub fn as_sql(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderBy {
    pub field: String,
    pub direction: SortDirection,
}

impl OrderBy {
    pub fn asc(field: impl Into<String>) -> Self {
        OrderBy {
            field: field.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        OrderBy {
            field: field.into(),
            direction: SortDirection::Desc,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FilterParams {
    /// Raw `field = value` pairs in request order.
    pub filters: Vec<(String, String)>,
    pub order: Option<OrderBy>,
}

/// Split query parameters into equality filters and at most one order field.
///
/// Every key outside `RESERVED_KEYS` and `exclude` becomes a filter. Ordering comes from
/// `order_by=<field>[ asc|desc]`, or when that is absent from `ordering=[-]<field>`.
pub fn extract_filters(q: &QueryParams, exclude: &[&str]) -> FilterParams {
    let filters = q
        .iter()
        .filter(|(k, _)| !RESERVED_KEYS.contains(k) && !exclude.contains(k))
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

    let order = if let Some(order_by) = q.get_non_empty("order_by") {
        let mut parts = order_by.split_whitespace();
        parts.next().map(|field| OrderBy {
            field: field.to_string(),
            direction: parts.next().map(SortDirection::parse).unwrap_or_default(),
        })
    } else if let Some(ordering) = q.get_non_empty("ordering") {
        match ordering.strip_prefix('-') {
            Some(field) => Some(OrderBy::desc(field)),
            None => Some(OrderBy::asc(ordering)),
        }
    } else {
        None
    };

    FilterParams { filters, order }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(raw: &str, exclude: &[&str]) -> FilterParams {
        extract_filters(&QueryParams::parse(raw), exclude)
    }

    #[test]
    fn non_reserved_keys_become_filters() {
        let f = extract("page=2&status=active&page_size=5&name=bob&order_by=age", &[]);
        assert_eq!(
            f.filters,
            vec![("status".to_string(), "active".to_string()), ("name".to_string(), "bob".to_string())]
        );
    }

    #[test]
    fn caller_exclusions_are_honoured() {
        let f = extract("keyword=zh&status=active", &["keyword"]);
        assert_eq!(f.filters, vec![("status".to_string(), "active".to_string())]);
    }

    #[test]
    fn order_by_and_ordering_are_equivalent() {
        let a = extract("order_by=age%20desc", &[]).order;
        let b = extract("ordering=-age", &[]).order;
        assert_eq!(a, Some(OrderBy::desc("age")));
        assert_eq!(a, b);
    }

    #[test]
    fn order_by_without_direction_is_ascending() {
        assert_eq!(extract("order_by=name", &[]).order, Some(OrderBy::asc("name")));
        assert_eq!(extract("ordering=name", &[]).order, Some(OrderBy::asc("name")));
    }

    #[test]
    fn unknown_direction_collapses_to_asc() {
        assert_eq!(extract("order_by=age%20sideways", &[]).order, Some(OrderBy::asc("age")));
        assert_eq!(extract("order_by=age%20DeSc", &[]).order, Some(OrderBy::desc("age")));
    }

    #[test]
    fn order_by_wins_over_ordering() {
        let f = extract("ordering=-name&order_by=age", &[]);
        assert_eq!(f.order, Some(OrderBy::asc("age")));
    }

    #[test]
    fn blank_order_params_mean_no_order() {
        assert_eq!(extract("order_by=&ordering=", &[]).order, None);
    }
}
