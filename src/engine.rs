use anyhow::Result;
use std::path::PathBuf;

/// Identifier of a sound object loaded inside the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SoundId(pub u64);

/// Identifier of one running playback of a sound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlaybackId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadMode {
    /// Decoded once up front; meant for short effects.
    Buffered,
    /// Decoded on demand; meant for long-form audio.
    Streaming,
}

#[derive(Debug, Clone)]
pub enum SoundData {
    Path(PathBuf),
    Bytes(Vec<u8>),
}

/// The playback engine the deck forwards all audio work to.
///
/// Decoding, mixing, volume ramps, looping and device output all happen behind
/// this trait; the deck only keeps channel bookkeeping on top of it. Times are
/// in seconds, the engine's native unit.
pub trait Engine {
    fn load(&mut self, mode: LoadMode, data: &SoundData) -> Result<SoundId>;
    fn length(&self, sound: SoundId) -> f32;
    /// `0` plays once, `-1` loops forever, `n > 0` repeats `n` extra times.
    fn set_looping(&mut self, sound: SoundId, loops: i32);
    fn unload(&mut self, sound: SoundId);

    fn play(&mut self, sound: SoundId, initial_volume: f32) -> Result<PlaybackId>;
    fn set_pause(&mut self, playback: PlaybackId, paused: bool);
    fn seek(&mut self, playback: PlaybackId, position: f32);
    fn set_volume(&mut self, playback: PlaybackId, volume: f32);
    fn fade_volume(&mut self, playback: PlaybackId, target: f32, duration: f32);
    fn schedule_stop(&mut self, playback: PlaybackId, after: f32);
    fn stop(&mut self, playback: PlaybackId);
    fn set_global_volume(&mut self, volume: f32);

    /// Playbacks that reached their natural end since the last call.
    /// Explicitly stopped playbacks must not be reported here.
    fn take_finished(&mut self) -> Vec<PlaybackId>;

    /// Playback rate control is an optional capability.
    fn supports_rate(&self) -> bool {
        false
    }
    fn set_rate(&mut self, playback: PlaybackId, rate: f32) {
        let _ = (playback, rate);
    }
}
