pub mod canvas;
pub mod frame;
pub mod overlay;
pub mod sequencer;
pub mod text;
