pub mod payload_synthesizer;

pub use payload_synthesizer::{
    PayloadSynthesizer, SynthesizerConfig, TimeWindow, build_request, compute_time_window,
    decode_content, encode_content, generate_identifier, pick_phrase, pick_push_type,
};
