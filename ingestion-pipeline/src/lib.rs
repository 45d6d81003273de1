pub mod chunker;
pub mod fingerprint;
pub mod pipeline;
pub mod utils;

pub use chunker::TextChunker;
pub use fingerprint::chunk_fingerprint;
pub use pipeline::{
    DefaultPipelineServices, FileOutcome, IngestionPipeline, IngestionReport, PipelineServices,
};
