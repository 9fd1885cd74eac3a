//! Laps and the append-only ledger that records them.


use crate::types::{Channel, LapId, LapTag};

/// A committed interval. Immutable once recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lap {
    pub id: LapId,
    /// Position among laps of the same channel, starting at 1.
    pub number: u32,
    pub name: String,
    pub category: LapTag,
    pub duration_ms: u64,
    pub channel: Channel,
}

/// An interval about to be committed to the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLap {
    pub channel: Channel,
    /// Blank names are replaced with `Study {n}` / `Break {n}`.
    pub name: String,
    pub category: LapTag,
    pub duration_ms: u64,
}

/// Ordered lap history.
///
/// Laps are stored oldest first and handed out most recent first. Ids come
/// from a counter that survives [`LapLedger::clear`], so an id is never
/// handed out twice by the same ledger.
#[derive(Debug, Clone, Default)]
pub struct LapLedger {
    laps: Vec<Lap>,
    next_id: u64,
}

impl LapLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a lap, assigning its id, per-channel number and default name.
    pub fn record(&mut self, lap: NewLap) -> &Lap {
        self.next_id += 1;
        let number = self.count_by_channel(lap.channel) + 1;
        let name = match lap.name.trim() {
            "" => default_name(lap.channel, number),
            name => name.to_string(),
        };

        self.laps.push(Lap {
            id: LapId::new(self.next_id),
            number,
            name,
            category: lap.category,
            duration_ms: lap.duration_ms,
            channel: lap.channel,
        });
        &self.laps[self.laps.len() - 1]
    }

    /// Laps, most recent first.
    pub fn history(&self) -> impl DoubleEndedIterator<Item = &Lap> + ExactSizeIterator {
        self.laps.iter().rev()
    }

    pub fn latest(&self) -> Option<&Lap> {
        self.laps.last()
    }

    /// Number of recorded laps on `channel`.
    #[expect(
        clippy::cast_possible_truncation,
        reason = "a session will not record four billion laps"
    )]
    pub fn count_by_channel(&self, channel: Channel) -> u32 {
        self.laps.iter().filter(|lap| lap.channel == channel).count() as u32
    }

    pub fn clear(&mut self) {
        self.laps.clear();
    }

    pub fn len(&self) -> usize {
        self.laps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.laps.is_empty()
    }
}

fn default_name(channel: Channel, number: u32) -> String {
    match channel {
        Channel::Focus => format!("Study {number}"),
        Channel::Break => format!("Break {number}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Category;

    fn focus(name: &str, duration_ms: u64) -> NewLap {
        NewLap {
            channel: Channel::Focus,
            name: name.to_string(),
            category: LapTag::Category(Category::new("Physics").unwrap()),
            duration_ms,
        }
    }

    fn rest(duration_ms: u64) -> NewLap {
        NewLap {
            channel: Channel::Break,
            name: String::new(),
            category: LapTag::Break,
            duration_ms,
        }
    }

    #[test]
    fn numbers_are_per_channel() {
        let mut ledger = LapLedger::new();
        ledger.record(focus("", 10));
        ledger.record(rest(5));
        ledger.record(focus("  ", 20));
        ledger.record(rest(5));

        let names: Vec<_> = ledger.history().map(|l| l.name.as_str()).collect();
        assert_eq!(names, ["Break 2", "Study 2", "Break 1", "Study 1"]);
        assert_eq!(ledger.count_by_channel(Channel::Focus), 2);
        assert_eq!(ledger.count_by_channel(Channel::Break), 2);
    }

    #[test]
    fn explicit_names_still_consume_a_number() {
        let mut ledger = LapLedger::new();
        ledger.record(focus("Kinematics", 10));
        let lap = ledger.record(focus("", 10));

        assert_eq!(lap.number, 2);
        assert_eq!(lap.name, "Study 2");
    }

    #[test]
    fn history_is_most_recent_first() {
        let mut ledger = LapLedger::new();
        ledger.record(focus("first", 1));
        ledger.record(focus("second", 2));

        let latest = ledger.history().next().unwrap();
        assert_eq!(latest.name, "second");
        assert_eq!(ledger.latest().unwrap().id, latest.id);
    }

    #[test]
    fn ids_keep_increasing_across_clear() {
        let mut ledger = LapLedger::new();
        let before = ledger.record(rest(0)).id;
        ledger.clear();
        assert!(ledger.is_empty());

        let after = ledger.record(rest(0));
        assert!(after.id > before);
        assert_eq!(after.number, 1);
        assert_eq!(after.name, "Break 1");
    }
}
