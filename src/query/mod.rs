// Submodules for separation of concerns
mod compile;
pub mod convert;
mod filter;
mod translate;
mod types;

pub use compile::{QueryCompiler, compile, parse_query_string};
pub use filter::{CmpOp, Filter, bson_equal, compare_bson, compare_docs, eval_filter, get_path, project, set_path};
pub use translate::{FilterBuilder, FilterTranslator, MatchAll};
pub use types::{
    DEFAULT_MAX_LIMIT, FieldSelection, FilterValue, FindOptions, Order, Projection, Query, Range,
    SortSpec,
};
