mod buffering;
mod sse_parser;

pub use buffering::LineBuffer;
pub use sse_parser::{
    decode_chunks, decode_sse, FragmentStream, FrameSource, DATA_PREFIX, DONE_MARKER,
};
