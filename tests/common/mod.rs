#![allow(dead_code)]

use anyhow::bail;
use cueboard::{DeckSettings, Engine, LoadMode, PlaybackId, SoundData, SoundDeck, SoundId};
use std::cell::RefCell;
use std::rc::Rc;

/// Deck over a fresh fake engine, plus the handles tests observe it through.
pub fn deck_with(
    channels: usize,
) -> (
    SoundDeck,
    Rc<RefCell<EngineLog>>,
    Rc<RefCell<Vec<PlaybackId>>>,
) {
    let engine = FakeEngine::new();
    let log = engine.log.clone();
    let finished = engine.finished.clone();
    let deck = SoundDeck::new(engine, DeckSettings { channels });
    (deck, log, finished)
}

pub fn bytes() -> SoundData {
    SoundData::Bytes(vec![0; 16])
}

/// Everything the fake engine was asked to do, in call order per kind.
#[derive(Default)]
pub struct EngineLog {
    pub loads: Vec<LoadMode>,
    pub unloads: Vec<SoundId>,
    pub loopings: Vec<(SoundId, i32)>,
    pub plays: Vec<(SoundId, PlaybackId, f32)>,
    pub pauses: Vec<(PlaybackId, bool)>,
    pub seeks: Vec<(PlaybackId, f32)>,
    pub volumes: Vec<(PlaybackId, f32)>,
    pub fades: Vec<(PlaybackId, f32, f32)>,
    pub scheduled_stops: Vec<(PlaybackId, f32)>,
    pub stops: Vec<PlaybackId>,
    pub global_volumes: Vec<f32>,
    pub rates: Vec<(PlaybackId, f32)>,
}

pub struct FakeEngine {
    pub log: Rc<RefCell<EngineLog>>,
    /// Tests push naturally-finished playbacks here; drained by the deck.
    pub finished: Rc<RefCell<Vec<PlaybackId>>>,
    pub fail_loads: bool,
    pub rate_capable: bool,
    next_sound: u64,
    next_playback: u64,
}

impl FakeEngine {
    pub fn new() -> Self {
        Self {
            log: Rc::default(),
            finished: Rc::default(),
            fail_loads: false,
            rate_capable: false,
            next_sound: 0,
            next_playback: 0,
        }
    }
}

impl Engine for FakeEngine {
    fn load(&mut self, mode: LoadMode, _data: &SoundData) -> anyhow::Result<SoundId> {
        if self.fail_loads {
            bail!("decode failed");
        }
        self.next_sound += 1;
        self.log.borrow_mut().loads.push(mode);
        Ok(SoundId(self.next_sound))
    }

    fn length(&self, _sound: SoundId) -> f32 {
        1.5
    }

    fn set_looping(&mut self, sound: SoundId, loops: i32) {
        self.log.borrow_mut().loopings.push((sound, loops));
    }

    fn unload(&mut self, sound: SoundId) {
        self.log.borrow_mut().unloads.push(sound);
    }

    fn play(&mut self, sound: SoundId, initial_volume: f32) -> anyhow::Result<PlaybackId> {
        self.next_playback += 1;
        let playback = PlaybackId(self.next_playback);
        self.log.borrow_mut().plays.push((sound, playback, initial_volume));
        Ok(playback)
    }

    fn set_pause(&mut self, playback: PlaybackId, paused: bool) {
        self.log.borrow_mut().pauses.push((playback, paused));
    }

    fn seek(&mut self, playback: PlaybackId, position: f32) {
        self.log.borrow_mut().seeks.push((playback, position));
    }

    fn set_volume(&mut self, playback: PlaybackId, volume: f32) {
        self.log.borrow_mut().volumes.push((playback, volume));
    }

    fn fade_volume(&mut self, playback: PlaybackId, target: f32, duration: f32) {
        self.log.borrow_mut().fades.push((playback, target, duration));
    }

    fn schedule_stop(&mut self, playback: PlaybackId, after: f32) {
        self.log.borrow_mut().scheduled_stops.push((playback, after));
    }

    fn stop(&mut self, playback: PlaybackId) {
        self.log.borrow_mut().stops.push(playback);
    }

    fn set_global_volume(&mut self, volume: f32) {
        self.log.borrow_mut().global_volumes.push(volume);
    }

    fn take_finished(&mut self) -> Vec<PlaybackId> {
        self.finished.borrow_mut().drain(..).collect()
    }

    fn supports_rate(&self) -> bool {
        self.rate_capable
    }

    fn set_rate(&mut self, playback: PlaybackId, rate: f32) {
        self.log.borrow_mut().rates.push((playback, rate));
    }
}
