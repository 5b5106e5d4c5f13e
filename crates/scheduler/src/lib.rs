use rand::prelude::*;

#[derive(Debug, thiserror::Error)]
pub enum RotationError {
    #[error("asset rotation requires at least one asset")]
    Empty,
}

/// Picks which asset the display shows next.
///
/// Selection favors the asset that has been off-screen longest. Until every
/// asset has been shown once, picks walk a shuffled rotation order; after the
/// first full rotation, half of all picks substitute a uniformly random other
/// asset so long-running installations do not settle into a fixed cycle. The
/// currently showing asset is never picked again while alternatives exist.
pub struct AssetRota {
    entries: Vec<EntryState>,
    order: Vec<usize>,
    cursor: usize,
    current: Option<usize>,
    rotation_complete: bool,
    rng: StdRng,
}

#[derive(Debug, Clone, Copy, Default)]
struct EntryState {
    last_shown_ms: Option<u64>,
}

impl AssetRota {
    pub fn new(asset_count: usize, seed: u64) -> Result<Self, RotationError> {
        if asset_count == 0 {
            return Err(RotationError::Empty);
        }
        let mut rng = StdRng::seed_from_u64(seed);
        let order = build_order(asset_count, &mut rng);
        Ok(Self {
            entries: vec![EntryState::default(); asset_count],
            order,
            cursor: 0,
            current: None,
            rotation_complete: false,
            rng,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Index of the asset currently on screen, if any.
    pub fn current(&self) -> Option<usize> {
        self.current
    }

    /// Selects the next asset to show and records it as current.
    pub fn next(&mut self, now_ms: u64) -> usize {
        let pick = self.select();
        self.mark_shown(pick, now_ms);
        pick
    }

    /// Records that `index` went on screen at `now_ms` without selecting.
    pub fn mark_shown(&mut self, index: usize, now_ms: u64) {
        self.entries[index].last_shown_ms = Some(now_ms);
        self.current = Some(index);
    }

    fn select(&mut self) -> usize {
        if self.entries.len() == 1 {
            return 0;
        }

        if !self.rotation_complete {
            let pick = self.order[self.cursor];
            self.cursor += 1;
            if self.cursor >= self.order.len() {
                self.rotation_complete = true;
            }
            return pick;
        }

        let stale = self.least_recently_shown();
        if self.rng.gen_bool(0.5) {
            self.random_other(stale)
        } else {
            stale
        }
    }

    /// Oldest-first pick, skipping whatever is currently showing.
    fn least_recently_shown(&self) -> usize {
        self.entries
            .iter()
            .enumerate()
            .filter(|(index, _)| Some(*index) != self.current)
            .min_by_key(|(_, entry)| entry.last_shown_ms.unwrap_or(0))
            .map(|(index, _)| index)
            .expect("rotation holds at least two assets here")
    }

    fn random_other(&mut self, fallback: usize) -> usize {
        let candidates: Vec<usize> = (0..self.entries.len())
            .filter(|index| Some(*index) != self.current)
            .collect();
        candidates
            .choose(&mut self.rng)
            .copied()
            .unwrap_or(fallback)
    }
}

fn build_order(len: usize, rng: &mut StdRng) -> Vec<usize> {
    let mut order: Vec<usize> = (0..len).collect();
    order.shuffle(rng);
    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn rejects_empty_rotation() {
        assert!(matches!(AssetRota::new(0, 1), Err(RotationError::Empty)));
    }

    #[test]
    fn single_asset_always_picks_zero() {
        let mut rota = AssetRota::new(1, 42).unwrap();
        for tick in 0..8 {
            assert_eq!(rota.next(tick * 1000), 0);
        }
    }

    #[test]
    fn first_rotation_shows_every_asset_once() {
        let mut rota = AssetRota::new(5, 7).unwrap();
        let mut seen = HashSet::new();
        for tick in 0..5 {
            seen.insert(rota.next(tick * 1000));
        }
        assert_eq!(seen.len(), 5, "each asset shown before any repeats");
    }

    #[test]
    fn never_repeats_current_asset() {
        let mut rota = AssetRota::new(3, 11).unwrap();
        let mut previous = rota.next(0);
        for tick in 1..200 {
            let pick = rota.next(tick * 1000);
            assert_ne!(pick, previous, "pick {tick} repeated the showing asset");
            previous = pick;
        }
    }

    #[test]
    fn seeded_sequences_are_deterministic() {
        let mut a = AssetRota::new(6, 99).unwrap();
        let mut b = AssetRota::new(6, 99).unwrap();
        for tick in 0..50 {
            assert_eq!(a.next(tick * 500), b.next(tick * 500));
        }
    }

    #[test]
    fn substitution_diverges_from_pure_lru_after_first_rotation() {
        // With substitution disabled the post-rotation sequence would be the
        // strict least-recently-shown walk; a seeded run must depart from it
        // at least once over a long horizon.
        let mut rota = AssetRota::new(4, 3).unwrap();
        let mut lru_only = Vec::new();
        let mut actual = Vec::new();
        for tick in 0..4 {
            actual.push(rota.next(tick * 1000));
        }
        // Replay the same history through a pure-LRU oracle.
        let mut shown: Vec<(usize, u64)> = actual
            .iter()
            .enumerate()
            .map(|(t, &i)| (i, t as u64 * 1000))
            .collect();
        let mut current = *actual.last().unwrap();
        for tick in 4..40 {
            let pick = rota.next(tick * 1000);
            actual.push(pick);

            let oracle = shown
                .iter()
                .filter(|(index, _)| *index != current)
                .min_by_key(|(_, at)| *at)
                .map(|(index, _)| *index)
                .unwrap();
            lru_only.push(oracle);
            let entry = shown.iter_mut().find(|(index, _)| *index == pick).unwrap();
            entry.1 = tick * 1000;
            current = pick;
        }
        assert_ne!(&actual[4..], &lru_only[..], "substitution never fired");
    }
}
