//! DMA channel arbitration.
//!
//! A fixed set of channels, each usable by one direction at a time, handed
//! out first-fit by direction (tagged with the requester's priority for
//! bookkeeping) and released back to the pool on `release_channel`.

use ferrite_status::Status;

use ferrite_core::spinlock::SpinLock;

/// Direction a DMA channel is configured to transfer in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Peripheral-to-memory.
    MemoryToDevice,
    /// Memory-to-peripheral.
    DeviceToMemory,
    /// Memory-to-memory.
    MemoryToMemory,
}

#[derive(Clone, Copy)]
struct Channel {
    owner: Option<u32>,
    direction: Direction,
    priority: u8,
}

struct Channels<const N: usize> {
    slots: [Channel; N],
}

/// A fixed-size pool of DMA channels, arbitrated first-fit by direction.
pub struct DmaManager<const N: usize> {
    channels: SpinLock<Channels<N>>,
}

impl<const N: usize> DmaManager<N> {
    /// Creates a manager with `N` channels, all free.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            channels: SpinLock::new(Channels {
                slots: [Channel {
                    owner: None,
                    direction: Direction::MemoryToMemory,
                    priority: 0,
                }; N],
            }),
        }
    }

    /// Claims the first free channel for `direction` at `priority`, tagging
    /// it with `owner` (typically the requesting device's registry index).
    ///
    /// Returns [`Status::NoResource`] if every channel is in use.
    pub fn request_channel(
        &self,
        owner: u32,
        direction: Direction,
        priority: u8,
    ) -> Result<usize, Status> {
        let mut channels = self.channels.lock();
        for (index, channel) in channels.slots.iter_mut().enumerate() {
            if channel.owner.is_none() {
                channel.owner = Some(owner);
                channel.direction = direction;
                channel.priority = priority;
                return Ok(index);
            }
        }
        Err(Status::NoResource)
    }

    /// Returns the priority `channel_index` was granted at, if claimed.
    #[must_use]
    pub fn channel_priority(&self, channel_index: usize) -> Option<u8> {
        let channels = self.channels.lock();
        let channel = channels.slots.get(channel_index)?;
        channel.owner.is_some().then_some(channel.priority)
    }

    /// Releases `channel_index` back to the free pool.
    ///
    /// Returns [`Status::InvalidParam`] if the index is out of range or the
    /// channel is not currently claimed by `owner`.
    pub fn release_channel(&self, channel_index: usize, owner: u32) -> Status {
        let mut channels = self.channels.lock();
        let Some(channel) = channels.slots.get_mut(channel_index) else {
            return Status::InvalidParam;
        };
        if channel.owner != Some(owner) {
            return Status::InvalidParam;
        }
        channel.owner = None;
        Status::Ok
    }

    /// Returns the number of channels currently claimed.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.channels
            .lock()
            .slots
            .iter()
            .filter(|c| c.owner.is_some())
            .count()
    }
}

impl<const N: usize> Default for DmaManager<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_and_release_round_trip() {
        let mgr: DmaManager<2> = DmaManager::new();
        let ch = mgr
            .request_channel(7, Direction::DeviceToMemory, 3)
            .unwrap();
        assert_eq!(mgr.active_count(), 1);
        assert_eq!(mgr.channel_priority(ch), Some(3));
        assert_eq!(mgr.release_channel(ch, 7), Status::Ok);
        assert_eq!(mgr.active_count(), 0);
    }

    #[test]
    fn exhaustion_returns_no_resource() {
        let mgr: DmaManager<1> = DmaManager::new();
        mgr.request_channel(1, Direction::MemoryToDevice, 0)
            .unwrap();
        assert_eq!(
            mgr.request_channel(2, Direction::MemoryToDevice, 0),
            Err(Status::NoResource)
        );
    }

    #[test]
    fn release_by_wrong_owner_is_rejected() {
        let mgr: DmaManager<1> = DmaManager::new();
        let ch = mgr
            .request_channel(1, Direction::MemoryToDevice, 0)
            .unwrap();
        assert_eq!(mgr.release_channel(ch, 2), Status::InvalidParam);
    }

    #[test]
    fn released_channel_is_reused() {
        let mgr: DmaManager<1> = DmaManager::new();
        let ch = mgr
            .request_channel(1, Direction::MemoryToDevice, 0)
            .unwrap();
        mgr.release_channel(ch, 1);
        assert!(
            mgr.request_channel(2, Direction::MemoryToDevice, 1)
                .is_ok()
        );
    }

    #[test]
    fn higher_priority_request_does_not_preempt_in_use_channel() {
        let mgr: DmaManager<1> = DmaManager::new();
        mgr.request_channel(1, Direction::MemoryToDevice, 0)
            .unwrap();
        assert_eq!(
            mgr.request_channel(2, Direction::MemoryToDevice, 7),
            Err(Status::NoResource)
        );
    }
}
