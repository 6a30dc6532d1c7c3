//! Loopback Transactor - drive packets through a driver and the async service.
//!
//! This example demonstrates:
//! - Building a driver around the echoing `LoopbackEngine`
//! - Reading the trailer and reply words from a `Response`
//! - Sharing one transactor between tasks through `TransactorHandle`
//!
//! # Running
//!
//! ```text
//! cargo run --example loopback
//! ```

use ipbus_transactor::{
    spawn_transactor_task, ByteOrder, Driver, IdWord, LoopbackEngine, Packet, TransactorConfig,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = TransactorConfig::default();

    // Synchronous: one driver, packets processed in order
    let mut driver = Driver::new(config.clone(), LoopbackEngine::new())?;
    for id in 1..=3u16 {
        let packet = Packet::new(
            IdWord::control(id, ByteOrder::Normal).encode(),
            vec![0x1000 + u32::from(id), 0x2000 + u32::from(id)],
        )
        .with_header(vec![0xC0DE_0000 | u32::from(id)]);

        let response = driver.process(&packet)?;
        println!(
            "packet {id}: {:?}, trailer {:#010x}, replies {:x?}",
            response.outcome(),
            response.trailer().encode(),
            response.reply_words()
        );
    }

    // Out of sequence: rejected, sequence unchanged
    let stale = Packet::new(IdWord::control(9, ByteOrder::Normal).encode(), vec![1, 2]);
    let response = driver.process(&stale)?;
    println!("stale packet: {:?}", response.outcome());

    // Async: the same transactor behind a service task
    let (handle, task) = spawn_transactor_task(config, LoopbackEngine::new())?;
    let packet = Packet::new(IdWord::control(1, ByteOrder::Swapped).encode(), vec![7, 8, 9]);
    let response = handle.submit(&packet).await?;
    println!(
        "service: {:?}, next expected id {}",
        response.outcome(),
        handle.next_expected_id().await?
    );

    drop(handle);
    task.await??;
    Ok(())
}
