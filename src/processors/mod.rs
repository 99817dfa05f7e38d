pub mod batch;
pub mod block_classifier;
pub mod block_splitter;
pub mod identifier;
pub mod lenient_parser;
pub mod series_normalizer;

pub use batch::{collect_inputs, BatchProcessor, BatchReport};
pub use block_classifier::{BlockLayout, BlockParser, ExtractOptions, Extraction};
pub use block_splitter::split;
pub use identifier::{resolve, MissingPolicy, RequestedId, Resolution, SourceIndex};
pub use lenient_parser::{
    parse_lenient, parse_strict, LenientParser, Separator, StrictError, TextColumn, TextSchema,
    ValueRule,
};
pub use series_normalizer::normalize;
