//! Rebuild coalescing.
//!
//! At most one rebuild runs at a time. Triggers arriving while one is in
//! flight collapse into a single follow-up, however many there are.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RebuildQueue {
    #[default]
    Idle,
    Building {
        pending: bool,
    },
}

impl RebuildQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a trigger. Returns `true` when a rebuild should start now.
    pub fn trigger(&mut self) -> bool {
        match self {
            Self::Idle => {
                *self = Self::Building { pending: false };
                true
            }
            Self::Building { pending } => {
                *pending = true;
                false
            }
        }
    }

    /// Record the end of a rebuild. Returns `true` when a follow-up rebuild
    /// should start immediately; the queue then stays in `Building`.
    pub fn finish(&mut self) -> bool {
        match self {
            Self::Building { pending: true } => {
                *self = Self::Building { pending: false };
                true
            }
            _ => {
                *self = Self::Idle;
                false
            }
        }
    }

    pub fn is_building(&self) -> bool {
        matches!(self, Self::Building { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_trigger_starts_a_build() {
        let mut queue = RebuildQueue::new();
        assert!(queue.trigger());
        assert!(queue.is_building());
        assert!(!queue.finish());
        assert_eq!(queue, RebuildQueue::Idle);
    }

    #[test]
    fn triggers_during_a_build_coalesce_into_one_follow_up() {
        let mut queue = RebuildQueue::new();
        assert!(queue.trigger());
        for _ in 0..5 {
            assert!(!queue.trigger());
        }
        assert_eq!(queue, RebuildQueue::Building { pending: true });

        assert!(queue.finish(), "one follow-up");
        assert!(!queue.finish(), "and only one");
        assert!(!queue.is_building());
    }
}
