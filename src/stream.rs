pub mod adapter;
pub mod classifier;
pub mod interceptor;
pub mod parser;
pub mod rewriter;
pub mod tracker;

pub use adapter::{InterceptedRequest, Interceptor, Outcome, ResponseBody, ResponseView};
pub use classifier::{PlaylistClassifier, PlaylistKind, classify_body, is_master_playlist};
pub use interceptor::BestVariantInterceptor;
pub use parser::{VariantRecord, Variants, parse_variants};
pub use rewriter::{
    MasterRewrite, ModifyReport, modify, modify_reported, rewrite, rewrite_master, select_best,
};
pub use tracker::{RequestId, RequestRewriteState, ResponseRewriteTracker};
