//! HLS playlist writers.
//!
//! Playlists are rendered as text directly: the output is small, fixed in
//! shape, and has to be byte-identical across runs.

pub mod master;
pub mod media;

pub use master::{MasterPlaylist, Variant, VariantKind};
pub use media::{MediaPlaylist, PlaylistType};

/// `EXT-X-VERSION` of every generated playlist. `EXT-X-MAP` in a playlist
/// without `I-FRAMES-ONLY` needs at least version 6.
pub const HLS_VERSION: u8 = 7;
