//! Shared HTTP building blocks: response envelope, error mapping,
//! list-query parsing and the validated JSON extractor

mod list_query;
mod response;
mod validated_json;

pub use list_query::{pagination_params, parse_enum};
pub use response::{
    error_response, status_for, ApiResponse, ApiResult, EmptyData, PaginatedResponse,
    PaginationMetaDto,
};
pub use validated_json::{ValidatedJson, ValidatedJsonRejection};
