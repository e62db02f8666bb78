use std::str::FromStr;

use crate::config::PaginationConfig;
use crate::shared::{DomainError, DomainResult, PaginationParams, SortOrder};

/// Build listing parameters from raw query values.
///
/// Missing values fall back to page 1, the configured default limit and
/// the resource's default sort. A limit above the configured maximum is
/// rejected rather than clamped; page/limit of zero and unknown sort
/// fields are rejected by the listing itself.
pub fn pagination_params(
    config: &PaginationConfig,
    page: Option<u32>,
    limit: Option<u32>,
    sort_by: Option<String>,
    sort_order: Option<&str>,
    default_sort: (&str, SortOrder),
) -> DomainResult<PaginationParams> {
    let limit = limit.unwrap_or(config.default_limit);
    if limit > config.max_limit {
        return Err(DomainError::InvalidParameter(format!(
            "limit must be at most {}",
            config.max_limit
        )));
    }

    let sort_order = match sort_order {
        Some(raw) => raw.parse::<SortOrder>().map_err(DomainError::from)?,
        None => default_sort.1,
    };

    Ok(PaginationParams::new(
        page.unwrap_or(1),
        limit,
        sort_by.unwrap_or_else(|| default_sort.0.to_string()),
        sort_order,
    ))
}

/// Parse an optional query/body value into a string-backed enum.
pub fn parse_enum<T>(value: Option<&str>) -> DomainResult<Option<T>>
where
    T: FromStr<Err = DomainError>,
{
    value.map(str::parse).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PropertyStatus;

    const CONFIG: PaginationConfig = PaginationConfig {
        default_limit: 20,
        max_limit: 100,
    };

    #[test]
    fn defaults_apply() {
        let params =
            pagination_params(&CONFIG, None, None, None, None, ("created_at", SortOrder::Desc))
                .unwrap();
        assert_eq!(params, PaginationParams::new(1, 20, "created_at", SortOrder::Desc));
    }

    #[test]
    fn explicit_values_win() {
        let params = pagination_params(
            &CONFIG,
            Some(3),
            Some(50),
            Some("price".into()),
            Some("asc"),
            ("created_at", SortOrder::Desc),
        )
        .unwrap();
        assert_eq!(params, PaginationParams::new(3, 50, "price", SortOrder::Asc));
    }

    #[test]
    fn limit_above_max_is_rejected() {
        let err = pagination_params(&CONFIG, None, Some(101), None, None, ("id", SortOrder::Asc))
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidParameter(_)));
    }

    #[test]
    fn bad_sort_order_is_rejected() {
        let err =
            pagination_params(&CONFIG, None, None, None, Some("up"), ("id", SortOrder::Asc))
                .unwrap_err();
        assert!(matches!(err, DomainError::InvalidParameter(_)));
    }

    #[test]
    fn enums_parse_or_fail() {
        assert_eq!(
            parse_enum::<PropertyStatus>(Some("sold")).unwrap(),
            Some(PropertyStatus::Sold)
        );
        assert_eq!(parse_enum::<PropertyStatus>(None).unwrap(), None);
        assert!(parse_enum::<PropertyStatus>(Some("gone")).is_err());
    }
}
