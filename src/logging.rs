pub mod record;

pub use record::RewriteRecord;
