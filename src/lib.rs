//! Fixed-channel playback control on top of a pluggable audio engine.

pub mod engine;
pub use engine::{Engine, LoadMode, PlaybackId, SoundData, SoundId};

mod channel;
pub use channel::{ChannelState, OnComplete};

mod cache;

use crate::cache::SoundCache;
use crate::channel::{Channel, ChannelTable};
use log::{debug, info, warn};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("channel {0} is out of range")]
    BadChannel(usize),
    #[error("no sound loaded as {0:?}")]
    NotLoaded(String),
    #[error("channel {0} is already in use")]
    ChannelBusy(usize),
    #[error("no free channel")]
    NoFreeChannel,
    #[error("engine does not support playback rate control")]
    RateUnsupported,
    #[error("engine error: {0}")]
    Engine(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone)]
pub struct DeckSettings {
    pub channels: usize,
}

impl Default for DeckSettings {
    fn default() -> Self {
        Self { channels: 32 }
    }
}

pub struct PlayParams {
    /// Target channel; `0` picks the first free one.
    pub channel: usize,
    /// `0` plays once, `-1` loops forever, `n > 0` repeats `n` extra times.
    pub loops: i32,
    /// Engine-scheduled stop after this long.
    pub duration: Option<Duration>,
    /// Ramp from the channel's minimum volume toward its maximum.
    pub fade_in: Option<Duration>,
    pub on_complete: Option<OnComplete>,
}

impl Default for PlayParams {
    fn default() -> Self {
        Self {
            channel: 0,
            loops: 0,
            duration: None,
            fade_in: None,
            on_complete: None,
        }
    }
}

/// Addressing for rewind/seek: one channel, or every channel bound to an id.
#[derive(Debug, Clone, Copy)]
pub enum Target<'a> {
    Channel(usize),
    Sound(&'a str),
}

/// Snapshot of the most recent `play` call for a loaded id. Overwritten by
/// each play; the channel table stays authoritative for per-playback state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LastPlay {
    pub channel: usize,
    pub loops: i32,
    pub duration: Option<Duration>,
    pub fade_in: Option<Duration>,
}

/// Channel table, sound cache and master gain over a boxed [`Engine`].
///
/// All methods run on the caller's thread; completion notifications queued by
/// the engine are only observed inside [`SoundDeck::update`].
pub struct SoundDeck {
    engine: Box<dyn Engine>,
    table: ChannelTable,
    cache: SoundCache,
    master_volume: f32,
}

impl SoundDeck {
    pub fn new(engine: impl Engine + 'static, settings: DeckSettings) -> Self {
        Self::new_box(Box::new(engine), settings)
    }

    pub fn new_box(engine: Box<dyn Engine>, settings: DeckSettings) -> Self {
        Self {
            engine,
            table: ChannelTable::new(settings.channels),
            cache: SoundCache::new(),
            master_volume: 1.,
        }
    }

    /// Loads a fully-buffered sound. Loading an id twice is a no-op.
    pub fn load_sound(&mut self, id: &str, data: SoundData) -> Result<()> {
        self.load(id, LoadMode::Buffered, data)
    }

    /// Loads a streaming sound into the same cache namespace.
    pub fn load_stream(&mut self, id: &str, data: SoundData) -> Result<()> {
        self.load(id, LoadMode::Streaming, data)
    }

    fn load(&mut self, id: &str, mode: LoadMode, data: SoundData) -> Result<()> {
        if let Some(entry) = self.cache.get(id) {
            debug!("{id:?} already loaded ({:?}), reusing", entry.mode);
            return Ok(());
        }
        let sound = self.engine.load(mode, &data)?;
        self.cache.insert(id, sound, mode);
        info!("loaded {id:?} ({mode:?}, {:.2}s)", self.engine.length(sound));
        Ok(())
    }

    /// Starts `id` on a channel and returns the channel index.
    ///
    /// A channel already carrying a sound is never preempted: targeting one
    /// explicitly is an error, and auto-assignment only considers channels
    /// that are unreserved and inactive.
    pub fn play(&mut self, id: &str, mut params: PlayParams) -> Result<usize> {
        let sound = match self.cache.get(id) {
            Some(entry) => entry.sound,
            None => {
                warn!("play: {id:?} is not loaded");
                return Err(Error::NotLoaded(id.into()));
            }
        };

        let index = if params.channel == 0 {
            match self.table.find_free(1) {
                0 => {
                    warn!("play: all channels busy, {id:?} dropped");
                    return Err(Error::NoFreeChannel);
                }
                index => index,
            }
        } else if params.channel <= self.table.len() {
            params.channel
        } else {
            return Err(Error::BadChannel(params.channel));
        };

        if self.table.at(index).occupied() {
            warn!("play: channel {index} is already in use");
            return Err(Error::ChannelBusy(index));
        }

        self.engine.set_looping(sound, params.loops);

        let start_volume = match params.fade_in {
            Some(_) => self.table.at(index).min_volume,
            None => self.table.at(index).volume,
        };
        let playback = self.engine.play(sound, start_volume)?;

        let channel = self.table.at_mut(index);
        channel.state = ChannelState::Playing;
        channel.source = Some(id.to_owned());
        channel.sound = Some(sound);
        channel.playback = Some(playback);
        channel.on_complete = params.on_complete.take();

        if let Some(fade_in) = params.fade_in {
            let target = self.table.at(index).max_volume;
            self.engine
                .fade_volume(playback, target, fade_in.as_secs_f32());
        }
        if let Some(duration) = params.duration {
            self.engine.schedule_stop(playback, duration.as_secs_f32());
        }

        if let Some(entry) = self.cache.get_mut(id) {
            entry.last = LastPlay {
                channel: index,
                loops: params.loops,
                duration: params.duration,
                fade_in: params.fade_in,
            };
        }

        Ok(index)
    }

    /// Drains the engine's completion queue; finished channels are cleared
    /// and their callbacks fired. Returns how many channels completed.
    pub fn update(&mut self) -> usize {
        let mut count = 0;
        for playback in self.engine.take_finished() {
            let Some((index, channel)) = self.table.find_by_playback(playback) else {
                debug!("finished playback {playback:?} has no channel, ignoring");
                continue;
            };
            let on_complete = channel.on_complete.take();
            channel.clear();
            count += 1;
            if let Some(on_complete) = on_complete {
                on_complete(index);
            }
        }
        count
    }

    /// Pauses one channel, or every channel carrying a sound (`channel == 0`).
    /// Returns the count affected; an inactive channel is a no-op.
    pub fn pause(&mut self, channel: usize) -> Result<usize> {
        self.with_channels(channel, |engine, _, ch| match ch.playback {
            Some(playback) => {
                engine.set_pause(playback, true);
                ch.state = ChannelState::Paused;
                true
            }
            None => false,
        })
    }

    /// Resumes paused channels only.
    pub fn resume(&mut self, channel: usize) -> Result<usize> {
        self.with_channels(channel, |engine, _, ch| match (ch.state, ch.playback) {
            (ChannelState::Paused, Some(playback)) => {
                engine.set_pause(playback, false);
                ch.state = ChannelState::Playing;
                true
            }
            _ => false,
        })
    }

    /// Stops and fully clears channels; afterwards they are indistinguishable
    /// from channels that never played. Completion callbacks do not fire.
    pub fn stop(&mut self, channel: usize) -> Result<usize> {
        self.with_channels(channel, |engine, _, ch| match ch.playback.take() {
            Some(playback) => {
                engine.stop(playback);
                ch.clear();
                true
            }
            None => false,
        })
    }

    pub fn rewind(&mut self, target: Target) -> Result<usize> {
        self.seek(Duration::ZERO, target)
    }

    /// Seeks to an absolute position. `Target::Sound` addresses every channel
    /// currently bound to the id.
    pub fn seek(&mut self, position: Duration, target: Target) -> Result<usize> {
        let seconds = position.as_secs_f32();
        match target {
            Target::Channel(index) => {
                if index == 0 || index > self.table.len() {
                    return Err(Error::BadChannel(index));
                }
                match self.table.at(index).playback {
                    Some(playback) => {
                        self.engine.seek(playback, seconds);
                        Ok(1)
                    }
                    None => Ok(0),
                }
            }
            Target::Sound(id) => {
                let sound = match self.cache.get(id) {
                    Some(entry) => entry.sound,
                    None => return Err(Error::NotLoaded(id.into())),
                };
                let mut count = 0;
                for (_, ch) in self.table.iter_mut() {
                    if ch.sound == Some(sound) {
                        if let Some(playback) = ch.playback {
                            self.engine.seek(playback, seconds);
                            count += 1;
                        }
                    }
                }
                Ok(count)
            }
        }
    }

    /// Ramps channels toward `target`, clamped into each affected channel's
    /// own bounds. The stored volume reflects the clamped target immediately;
    /// the ramp itself is the engine's. Returns the count affected.
    pub fn fade(&mut self, channel: usize, target: f32, duration: Duration) -> Result<usize> {
        self.with_channels(channel, |engine, _, ch| match ch.playback {
            Some(playback) => {
                ch.volume = ch.clamped(target);
                engine.fade_volume(playback, ch.volume, duration.as_secs_f32());
                true
            }
            None => false,
        })
    }

    /// Per-channel volume; `channel == 0` returns the mean across the table.
    pub fn volume(&self, channel: usize) -> Result<f32> {
        self.channel_stat(channel, |ch| ch.volume)
    }

    pub fn min_volume(&self, channel: usize) -> Result<f32> {
        self.channel_stat(channel, |ch| ch.min_volume)
    }

    pub fn max_volume(&self, channel: usize) -> Result<f32> {
        self.channel_stat(channel, |ch| ch.max_volume)
    }

    /// Sets one channel's volume, or every channel's (`channel == 0`), each
    /// clamped against that channel's own bounds.
    pub fn set_volume(&mut self, volume: f32, channel: usize) -> Result<()> {
        self.with_channels(channel, |engine, _, ch| {
            ch.volume = ch.clamped(volume);
            if let Some(playback) = ch.playback {
                engine.set_volume(playback, ch.volume);
            }
            true
        })
        .map(|_| ())
    }

    pub fn set_min_volume(&mut self, value: f32, channel: usize) -> Result<()> {
        self.with_channels(channel, |engine, _, ch| {
            ch.min_volume = value;
            Self::apply_bounds(engine, ch);
            true
        })
        .map(|_| ())
    }

    pub fn set_max_volume(&mut self, value: f32, channel: usize) -> Result<()> {
        self.with_channels(channel, |engine, _, ch| {
            ch.max_volume = value;
            Self::apply_bounds(engine, ch);
            true
        })
        .map(|_| ())
    }

    /// Master gain forwarded to the engine. Distinct from per-channel volume:
    /// this never touches the table.
    pub fn set_master_volume(&mut self, volume: f32) {
        self.master_volume = volume;
        self.engine.set_global_volume(volume);
    }

    pub fn master_volume(&self) -> f32 {
        self.master_volume
    }

    /// Playback rate on one channel or all (`channel == 0`); reported as
    /// unsupported when the engine lacks the capability.
    pub fn set_pitch(&mut self, rate: f32, channel: usize) -> Result<usize> {
        if !self.engine.supports_rate() {
            return Err(Error::RateUnsupported);
        }
        self.with_channels(channel, |engine, _, ch| match ch.playback {
            Some(playback) => {
                engine.set_rate(playback, rate);
                true
            }
            None => false,
        })
    }

    /// Force-stops every channel bound to `id`, destroys the engine sound
    /// object and drops the cache entry. Safe while `id` is playing.
    pub fn dispose(&mut self, id: &str) -> Result<()> {
        let entry = match self.cache.remove(id) {
            Some(entry) => entry,
            None => return Err(Error::NotLoaded(id.into())),
        };
        for (_, ch) in self.table.iter_mut() {
            if ch.source.as_deref() == Some(id) {
                if let Some(playback) = ch.playback.take() {
                    self.engine.stop(playback);
                }
                ch.clear();
            }
        }
        self.engine.unload(entry.sound);
        info!("disposed {id:?}");
        Ok(())
    }

    pub fn dispose_all(&mut self) {
        for id in self.cache.ids() {
            let _ = self.dispose(&id);
        }
    }

    /// Reserves channels `1..=count`: skipped by auto-assignment, still
    /// targetable by explicit index. `count == 0` clears all reservations.
    pub fn reserve_channels(&mut self, count: usize) -> Result<()> {
        if count > self.table.len() {
            return Err(Error::BadChannel(count));
        }
        self.table.reserve(count);
        Ok(())
    }

    /// First unreserved inactive channel at or after `start_from`, or `0`.
    pub fn find_free_channel(&self, start_from: usize) -> usize {
        self.table.find_free(start_from)
    }

    pub fn state(&self, channel: usize) -> Result<ChannelState> {
        self.table
            .get(channel)
            .map(|ch| ch.state)
            .ok_or(Error::BadChannel(channel))
    }

    /// Id of the sound bound to `channel`, if any.
    pub fn source(&self, channel: usize) -> Result<Option<&str>> {
        self.table
            .get(channel)
            .map(|ch| ch.source.as_deref())
            .ok_or(Error::BadChannel(channel))
    }

    pub fn is_loaded(&self, id: &str) -> bool {
        self.cache.contains(id)
    }

    /// Length of a loaded sound in seconds, per the engine.
    pub fn sound_length(&self, id: &str) -> Result<f32> {
        match self.cache.get(id) {
            Some(entry) => Ok(self.engine.length(entry.sound)),
            None => Err(Error::NotLoaded(id.into())),
        }
    }

    pub fn last_play(&self, id: &str) -> Result<LastPlay> {
        match self.cache.get(id) {
            Some(entry) => Ok(entry.last),
            None => Err(Error::NotLoaded(id.into())),
        }
    }

    pub fn total_channels(&self) -> usize {
        self.table.len()
    }

    pub fn free_channels(&self) -> usize {
        self.table
            .iter()
            .filter(|ch| !ch.reserved && ch.state == ChannelState::Inactive)
            .count()
    }

    pub fn used_channels(&self) -> usize {
        self.table.iter().filter(|ch| ch.occupied()).count()
    }

    fn channel_stat(&self, channel: usize, get: impl Fn(&Channel) -> f32) -> Result<f32> {
        if channel == 0 {
            Ok(self.table.mean(get))
        } else {
            self.table
                .get(channel)
                .map(get)
                .ok_or(Error::BadChannel(channel))
        }
    }

    /// Runs `apply` over one validated channel, or the whole table when
    /// `channel == 0`, counting the channels it reports as affected.
    fn with_channels(
        &mut self,
        channel: usize,
        mut apply: impl FnMut(&mut dyn Engine, usize, &mut Channel) -> bool,
    ) -> Result<usize> {
        if channel == 0 {
            let mut count = 0;
            for (index, ch) in self.table.iter_mut() {
                if apply(self.engine.as_mut(), index, ch) {
                    count += 1;
                }
            }
            Ok(count)
        } else if channel <= self.table.len() {
            Ok(apply(self.engine.as_mut(), channel, self.table.at_mut(channel)) as usize)
        } else {
            Err(Error::BadChannel(channel))
        }
    }

    fn apply_bounds(engine: &mut dyn Engine, ch: &mut Channel) {
        ch.volume = ch.clamped(ch.volume);
        if let Some(playback) = ch.playback {
            engine.set_volume(playback, ch.volume);
        }
    }
}
