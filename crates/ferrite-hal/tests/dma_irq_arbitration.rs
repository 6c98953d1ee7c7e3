//! A device acquiring a DMA channel and registering its completion
//! interrupt together, the pairing a real block/stream driver's `init`
//! does in one call.

use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

use ferrite_hal::dma::{DmaManager, Direction};
use ferrite_hal::irq::InterruptManager;
use ferrite_status::Status;

static COMPLETIONS: AtomicU32 = AtomicU32::new(0);
static LAST_USER_DATA: AtomicUsize = AtomicUsize::new(0);

fn on_dma_complete(_vector: u32, user_data: usize) {
    COMPLETIONS.fetch_add(1, Ordering::SeqCst);
    LAST_USER_DATA.store(user_data, Ordering::SeqCst);
}

#[test]
fn device_claims_a_channel_and_its_completion_irq_then_releases_both() {
    let dma: DmaManager<4> = DmaManager::new();
    let irq: InterruptManager<16> = InterruptManager::new();
    const OWNER: u32 = 42;
    const VECTOR: u32 = 7;

    let channel = dma
        .request_channel(OWNER, Direction::DeviceToMemory, 1)
        .expect("a fresh manager always has a free channel");
    assert_eq!(
        irq.register(VECTOR, on_dma_complete, OWNER as usize, 1),
        Status::Ok
    );

    assert_eq!(irq.dispatch(VECTOR), Status::Ok);
    assert_eq!(COMPLETIONS.load(Ordering::SeqCst), 1);
    assert_eq!(LAST_USER_DATA.load(Ordering::SeqCst), OWNER as usize);

    assert_eq!(dma.release_channel(channel, OWNER), Status::Ok);
    assert_eq!(irq.unregister(VECTOR), Status::Ok);
    assert_eq!(dma.active_count(), 0);
    assert_eq!(irq.dispatch(VECTOR), Status::NotSupported);
}

#[test]
fn exhausting_channels_does_not_disturb_already_claimed_ones() {
    let dma: DmaManager<2> = DmaManager::new();
    let first = dma
        .request_channel(1, Direction::MemoryToDevice, 0)
        .unwrap();
    let _second = dma
        .request_channel(2, Direction::MemoryToDevice, 0)
        .unwrap();
    assert_eq!(
        dma.request_channel(3, Direction::MemoryToDevice, 0),
        Err(Status::NoResource)
    );
    assert_eq!(dma.release_channel(first, 1), Status::Ok);
    assert!(
        dma.request_channel(3, Direction::MemoryToDevice, 0)
            .is_ok()
    );
}
