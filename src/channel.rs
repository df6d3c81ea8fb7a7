use crate::engine::{PlaybackId, SoundId};

/// Called with the channel index when a playback ends on its own.
pub type OnComplete = Box<dyn FnOnce(usize)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Inactive,
    Playing,
    Paused,
}

pub(crate) struct Channel {
    pub(crate) volume: f32,
    pub(crate) min_volume: f32,
    pub(crate) max_volume: f32,
    pub(crate) state: ChannelState,
    pub(crate) source: Option<String>,
    pub(crate) sound: Option<SoundId>,
    pub(crate) playback: Option<PlaybackId>,
    pub(crate) reserved: bool,
    pub(crate) on_complete: Option<OnComplete>,
}

impl Channel {
    fn new() -> Self {
        Self {
            volume: 1.,
            min_volume: 0.,
            max_volume: 1.,
            state: ChannelState::Inactive,
            source: None,
            sound: None,
            playback: None,
            reserved: false,
            on_complete: None,
        }
    }

    pub(crate) fn occupied(&self) -> bool {
        self.source.is_some()
    }

    pub(crate) fn clamped(&self, volume: f32) -> f32 {
        volume.clamp(self.min_volume, self.max_volume)
    }

    pub(crate) fn clear(&mut self) {
        self.state = ChannelState::Inactive;
        self.source = None;
        self.sound = None;
        self.playback = None;
        self.on_complete = None;
    }
}

/// Fixed table of playback channels, indexed `1..=len`. Index `0` is the
/// "none" / "all" sentinel of the channel API and never addresses a record.
pub(crate) struct ChannelTable {
    channels: Vec<Channel>,
}

impl ChannelTable {
    pub(crate) fn new(count: usize) -> Self {
        Self {
            channels: (0..count).map(|_| Channel::new()).collect(),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.channels.len()
    }

    pub(crate) fn get(&self, index: usize) -> Option<&Channel> {
        index.checked_sub(1).and_then(|it| self.channels.get(it))
    }

    /// Callers validate the index first.
    pub(crate) fn at(&self, index: usize) -> &Channel {
        &self.channels[index - 1]
    }

    pub(crate) fn at_mut(&mut self, index: usize) -> &mut Channel {
        &mut self.channels[index - 1]
    }

    /// First unreserved inactive channel in `max(start_from, 1)..=len`, or 0.
    pub(crate) fn find_free(&self, start_from: usize) -> usize {
        for index in start_from.max(1)..=self.channels.len() {
            let channel = &self.channels[index - 1];
            if !channel.reserved && channel.state == ChannelState::Inactive {
                return index;
            }
        }
        0
    }

    pub(crate) fn find_by_playback(
        &mut self,
        playback: PlaybackId,
    ) -> Option<(usize, &mut Channel)> {
        self.channels
            .iter_mut()
            .enumerate()
            .find(|(_, channel)| channel.playback == Some(playback))
            .map(|(index, channel)| (index + 1, channel))
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Channel> {
        self.channels.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = (usize, &mut Channel)> {
        self.channels
            .iter_mut()
            .enumerate()
            .map(|(index, channel)| (index + 1, channel))
    }

    /// Marks channels `1..=count` reserved and the rest unreserved.
    pub(crate) fn reserve(&mut self, count: usize) {
        for (index, channel) in self.channels.iter_mut().enumerate() {
            channel.reserved = index < count;
        }
    }

    pub(crate) fn mean(&self, get: impl Fn(&Channel) -> f32) -> f32 {
        self.channels.iter().map(get).sum::<f32>() / self.channels.len() as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn find_free_scans_in_order() {
        let mut table = ChannelTable::new(4);
        assert_eq!(table.find_free(1), 1);
        table.at_mut(1).state = ChannelState::Playing;
        assert_eq!(table.find_free(1), 2);
        assert_eq!(table.find_free(3), 3);
        assert_eq!(table.find_free(5), 0);
    }

    #[test]
    fn find_free_skips_reserved() {
        let mut table = ChannelTable::new(3);
        table.reserve(2);
        assert_eq!(table.find_free(1), 3);
        table.at_mut(3).state = ChannelState::Paused;
        assert_eq!(table.find_free(1), 0);
        table.reserve(0);
        assert_eq!(table.find_free(1), 1);
    }

    #[test]
    fn index_zero_is_never_a_record() {
        let table = ChannelTable::new(2);
        assert!(table.get(0).is_none());
        assert!(table.get(3).is_none());
        assert!(table.get(2).is_some());
    }

    #[test]
    fn clear_is_idempotent() {
        let mut table = ChannelTable::new(1);
        let channel = table.at_mut(1);
        channel.state = ChannelState::Playing;
        channel.source = Some("a".into());
        channel.sound = Some(SoundId(1));
        channel.playback = Some(PlaybackId(1));
        channel.clear();
        channel.clear();
        assert_eq!(channel.state, ChannelState::Inactive);
        assert!(channel.source.is_none());
        assert!(channel.sound.is_none());
        assert!(channel.playback.is_none());
    }
}
