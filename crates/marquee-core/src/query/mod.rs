// ── Query-state codec ──
//
// Translates URL search parameters into a typed `PageRequest` and back.
// Decoding never fails: a malformed page number or size resets the
// request to the first page at the default size.

mod params;

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use tracing::{debug, warn};

pub use params::{ParamValue, QueryParams};

/// 1-based page number.
pub const PARAM_PAGE: &str = "page";
/// Rows per page.
pub const PARAM_PAGE_SIZE: &str = "page_size";
/// Literal row offset, used when `page`/`page_size` are absent.
pub const PARAM_OFFSET: &str = "offset";
/// Literal row limit, used when `page`/`page_size` are absent.
pub const PARAM_LIMIT: &str = "limit";
/// Sort field.
pub const PARAM_SORT: &str = "sort";
/// Sort direction (`asc` | `desc`).
pub const PARAM_ORDER: &str = "order";

const RESERVED: [&str; 6] = [
    PARAM_PAGE,
    PARAM_PAGE_SIZE,
    PARAM_OFFSET,
    PARAM_LIMIT,
    PARAM_SORT,
    PARAM_ORDER,
];

// ── PageRequest ─────────────────────────────────────────────────────

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString, AsRefStr, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn toggled(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortSpec {
    pub field: String,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Desc,
        }
    }
}

/// Pagination, sort and filter contract between a table and its data
/// source.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageRequest {
    pub limit: u64,
    pub offset: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<SortSpec>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub filters: BTreeMap<String, String>,
}

impl PageRequest {
    /// First page of `limit` rows, unsorted, unfiltered.
    pub fn first_page(limit: u64) -> Self {
        Self {
            limit,
            offset: 0,
            sort: None,
            filters: BTreeMap::new(),
        }
    }

    /// 1-based page number containing `offset`.
    pub fn page(&self) -> u64 {
        if self.limit == 0 {
            1
        } else {
            self.offset / self.limit + 1
        }
    }

    pub fn with_sort(mut self, sort: SortSpec) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn with_filter(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.insert(field.into(), value.into());
        self
    }

    /// Query parameters for the catalog API's list endpoints.
    pub fn to_api_params(&self) -> Vec<(String, String)> {
        let mut params = vec![
            (PARAM_LIMIT.to_owned(), self.limit.to_string()),
            (PARAM_OFFSET.to_owned(), self.offset.to_string()),
        ];
        if let Some(sort) = &self.sort {
            params.push((PARAM_SORT.to_owned(), sort.field.clone()));
            params.push((PARAM_ORDER.to_owned(), sort.direction.to_string()));
        }
        params.extend(self.filters.iter().map(|(k, v)| (k.clone(), v.clone())));
        params
    }
}

impl fmt::Display for PageRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "offset={} limit={}", self.offset, self.limit)?;
        if let Some(sort) = &self.sort {
            write!(f, " sort={}:{}", sort.field, sort.direction)?;
        }
        for (k, v) in &self.filters {
            write!(f, " {k}={v}")?;
        }
        Ok(())
    }
}

// ── Codec ───────────────────────────────────────────────────────────

/// Resource-specific translation between [`QueryParams`] and
/// [`PageRequest`].
///
/// Only fields listed as sortable / filterable are read from the URL;
/// everything else is ignored on decode and preserved by
/// [`merge`](Self::merge).
#[derive(Debug, Clone)]
pub struct QueryCodec {
    default_limit: u64,
    max_limit: u64,
    sortable: Vec<String>,
    filterable: Vec<String>,
}

impl QueryCodec {
    pub fn new(default_limit: u64) -> Self {
        let default_limit = default_limit.max(1);
        Self {
            default_limit,
            max_limit: default_limit.max(100),
            sortable: Vec::new(),
            filterable: Vec::new(),
        }
    }

    /// Cap on `page_size` / `limit`. Larger values are clamped.
    pub fn max_limit(mut self, max: u64) -> Self {
        self.max_limit = max.max(self.default_limit);
        self
    }

    pub fn sortable<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sortable = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Filter keys. Names that collide with pagination/sort parameters are
    /// dropped.
    pub fn filterable<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.filterable = fields
            .into_iter()
            .map(Into::into)
            .filter(|f: &String| {
                let reserved = RESERVED.contains(&f.as_str());
                if reserved {
                    warn!(field = %f, "filter key collides with a reserved parameter; ignored");
                }
                !reserved
            })
            .collect();
        self
    }

    pub fn default_limit(&self) -> u64 {
        self.default_limit
    }

    pub fn is_sortable(&self, field: &str) -> bool {
        self.sortable.iter().any(|f| f == field)
    }

    pub fn is_filterable(&self, field: &str) -> bool {
        self.filterable.iter().any(|f| f == field)
    }

    /// The request shown when the URL carries no (usable) pagination.
    pub fn default_request(&self) -> PageRequest {
        PageRequest::first_page(self.default_limit)
    }

    /// URL parameters → `PageRequest`. Never fails.
    pub fn decode(&self, params: &QueryParams) -> PageRequest {
        let (limit, offset) = self.decode_window(params);

        let sort = params
            .first(PARAM_SORT)
            .filter(|field| self.is_sortable(field))
            .map(|field| SortSpec {
                field: field.to_owned(),
                direction: params
                    .first(PARAM_ORDER)
                    .and_then(|d| d.parse().ok())
                    .unwrap_or_default(),
            });

        let filters = self
            .filterable
            .iter()
            .filter_map(|key| {
                let value = params.first(key)?.trim();
                (!value.is_empty()).then(|| (key.clone(), value.to_owned()))
            })
            .collect();

        PageRequest {
            limit,
            offset,
            sort,
            filters,
        }
    }

    /// `(limit, offset)` from either `page`/`page_size` or the literal
    /// `limit`/`offset` pair.
    fn decode_window(&self, params: &QueryParams) -> (u64, u64) {
        let paged = params.contains_key(PARAM_PAGE) || params.contains_key(PARAM_PAGE_SIZE);
        if paged {
            let page = match params.first(PARAM_PAGE) {
                None => Some(1),
                Some(raw) => parse_positive(raw),
            };
            let size = match params.first(PARAM_PAGE_SIZE) {
                None => Some(self.default_limit),
                Some(raw) => parse_positive(raw).map(|s| s.min(self.max_limit)),
            };
            let window = page
                .zip(size)
                .and_then(|(p, s)| (p - 1).checked_mul(s).map(|offset| (s, offset)));
            return window.unwrap_or_else(|| {
                debug!(?params, "malformed page parameters; resetting to first page");
                (self.default_limit, 0)
            });
        }

        let limit = params
            .first(PARAM_LIMIT)
            .and_then(parse_positive)
            .map_or(self.default_limit, |l| l.min(self.max_limit));
        let offset = params
            .first(PARAM_OFFSET)
            .and_then(|raw| raw.trim().parse::<u64>().ok())
            .unwrap_or(0);
        (limit, offset)
    }

    /// `PageRequest` → URL parameters.
    ///
    /// Page-aligned offsets are written as `page`/`page_size`; anything
    /// else falls back to literal `offset`/`limit`. Defaults are omitted.
    pub fn encode(&self, request: &PageRequest) -> QueryParams {
        let mut params = QueryParams::new();

        let aligned = request.limit > 0 && request.offset % request.limit == 0;
        if aligned {
            if request.offset > 0 {
                params.set(PARAM_PAGE, request.page().to_string());
            }
            if request.limit != self.default_limit {
                params.set(PARAM_PAGE_SIZE, request.limit.to_string());
            }
        } else {
            params.set(PARAM_OFFSET, request.offset.to_string());
            if request.limit != self.default_limit {
                params.set(PARAM_LIMIT, request.limit.to_string());
            }
        }

        if let Some(sort) = &request.sort {
            params.set(PARAM_SORT, sort.field.clone());
            if sort.direction == SortDirection::Desc {
                params.set(PARAM_ORDER, sort.direction.to_string());
            }
        }

        for (key, value) in &request.filters {
            params.set(key.clone(), value.clone());
        }
        params
    }

    /// Encode `request` over `base`, keeping parameters this codec does not
    /// own (other widgets' state, tracking params, ...).
    pub fn merge(&self, base: &QueryParams, request: &PageRequest) -> QueryParams {
        let mut merged = base.clone();
        for key in RESERVED {
            merged.remove(key);
        }
        for key in &self.filterable {
            merged.remove(key);
        }
        let encoded = self.encode(request);
        for key in encoded.keys() {
            if let Some(value) = encoded.first(key) {
                merged.set(key, value);
            }
        }
        merged
    }

    /// Whether `request` survives `decode(encode(request))` unchanged.
    pub fn is_well_formed(&self, request: &PageRequest) -> bool {
        let window_ok = (1..=self.max_limit).contains(&request.limit);
        let sort_ok = request
            .sort
            .as_ref()
            .is_none_or(|s| self.is_sortable(&s.field));
        let filters_ok = request
            .filters
            .iter()
            .all(|(k, v)| self.is_filterable(k) && !v.is_empty() && v.trim() == v);
        window_ok && sort_ok && filters_ok
    }
}

/// Integer ≥ 1, or `None` for anything else.
fn parse_positive(raw: &str) -> Option<u64> {
    raw.trim().parse::<u64>().ok().filter(|v| *v >= 1)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn codec() -> QueryCodec {
        QueryCodec::new(10)
            .max_limit(50)
            .sortable(["name", "release_year"])
            .filterable(["name", "genre_id"])
    }

    #[test]
    fn page_two_of_ten_is_offset_ten() {
        let req = codec().decode(&QueryParams::parse("page=2&page_size=10"));
        assert_eq!(req.offset, 10);
        assert_eq!(req.limit, 10);
        assert_eq!(req.page(), 2);
    }

    #[test]
    fn missing_pagination_uses_defaults() {
        let req = codec().decode(&QueryParams::new());
        assert_eq!(req, codec().default_request());
    }

    #[test]
    fn page_without_size_uses_default_size() {
        let req = codec().decode(&QueryParams::parse("page=3"));
        assert_eq!((req.limit, req.offset), (10, 20));
    }

    #[test]
    fn malformed_pagination_resets_to_first_page() {
        let c = codec();
        for raw in [
            "page=abc&page_size=10",
            "page=-1&page_size=10",
            "page=0&page_size=10",
            "page=2&page_size=0",
            "page=2&page_size=ten",
            "page=2&page_size=-5",
            "page=1.5",
            "page=&page_size=",
            "page=18446744073709551615&page_size=50",
        ] {
            let req = c.decode(&QueryParams::parse(raw));
            assert_eq!(req, c.default_request(), "input: {raw}");
        }
    }

    #[test]
    fn literal_offset_when_not_paged() {
        let req = codec().decode(&QueryParams::parse("offset=7&limit=5"));
        assert_eq!((req.limit, req.offset), (5, 7));

        let req = codec().decode(&QueryParams::parse("offset=oops&limit=-3"));
        assert_eq!((req.limit, req.offset), (10, 0));
    }

    #[test]
    fn oversized_page_size_is_clamped() {
        let req = codec().decode(&QueryParams::parse("page=1&page_size=1000"));
        assert_eq!(req.limit, 50);
    }

    #[test]
    fn unknown_and_unsortable_params_are_ignored() {
        let req = codec().decode(&QueryParams::parse(
            "utm_source=mail&sort=budget&order=desc&rating=5",
        ));
        assert_eq!(req, codec().default_request());
    }

    #[test]
    fn sort_and_filters_decode() {
        let req = codec().decode(&QueryParams::parse(
            "sort=release_year&order=DESC&name=%20noir%20&genre_id=",
        ));
        assert_eq!(req.sort, Some(SortSpec::desc("release_year")));
        assert_eq!(req.filters.get("name").map(String::as_str), Some("noir"));
        assert!(!req.filters.contains_key("genre_id"));
    }

    #[test]
    fn unknown_order_defaults_to_ascending() {
        let req = codec().decode(&QueryParams::parse("sort=name&order=sideways"));
        assert_eq!(req.sort, Some(SortSpec::asc("name")));
    }

    #[test]
    fn round_trip_for_well_formed_requests() {
        let c = codec();
        let sorts = [
            None,
            Some(SortSpec::asc("name")),
            Some(SortSpec::desc("release_year")),
        ];
        let filter_sets: [&[(&str, &str)]; 3] = [
            &[],
            &[("name", "noir")],
            &[("name", "the third man"), ("genre_id", "g-1&2")],
        ];

        for limit in [1, 3, 10, 25, 50] {
            for offset in [0, 1, 3, 10, 30, 49, 1000] {
                for sort in &sorts {
                    for filters in filter_sets {
                        let mut req = PageRequest::first_page(limit);
                        req.offset = offset;
                        req.sort.clone_from(sort);
                        for (k, v) in filters {
                            req.filters.insert((*k).to_owned(), (*v).to_owned());
                        }
                        assert!(c.is_well_formed(&req));

                        // Through the string form too, as a browser would.
                        let url = c.encode(&req).to_query_string();
                        let decoded = c.decode(&QueryParams::parse(&url));
                        assert_eq!(decoded, req, "url: {url}");
                    }
                }
            }
        }
    }

    #[test]
    fn encode_omits_defaults() {
        let c = codec();
        assert!(c.encode(&c.default_request()).is_empty());
        let params = c.encode(&PageRequest::first_page(10).with_sort(SortSpec::asc("name")));
        assert_eq!(params.to_query_string(), "sort=name");
    }

    #[test]
    fn merge_preserves_foreign_params_and_replaces_owned_ones() {
        let c = codec();
        let base = QueryParams::parse("tab=archive&page=4&name=old&order=desc");
        let req = PageRequest::first_page(10).with_filter("name", "new");
        let merged = c.merge(&base, &req);
        assert_eq!(merged, QueryParams::parse("tab=archive&name=new"));
    }

    #[test]
    fn reserved_filter_keys_are_dropped() {
        let c = QueryCodec::new(10).filterable(["page", "title"]);
        assert!(!c.is_filterable("page"));
        assert!(c.is_filterable("title"));
    }

    #[test]
    fn api_params_carry_window_sort_and_filters() {
        let req = PageRequest {
            limit: 10,
            offset: 20,
            sort: Some(SortSpec::desc("name")),
            filters: BTreeMap::from([("genre_id".to_owned(), "g1".to_owned())]),
        };
        let params = req.to_api_params();
        assert_eq!(
            params,
            vec![
                ("limit".to_owned(), "10".to_owned()),
                ("offset".to_owned(), "20".to_owned()),
                ("sort".to_owned(), "name".to_owned()),
                ("order".to_owned(), "desc".to_owned()),
                ("genre_id".to_owned(), "g1".to_owned()),
            ]
        );
    }
}
