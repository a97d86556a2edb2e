use std::env;

use anyhow::{Context, Result};
use log::info;

use geode_bufmgr::{
    engine::{StorageEngine, StorageOptions},
    storage::Page,
};

const DEMO_FILE: &str = "demo.tbl";

fn main() -> Result<()> {
    log_init::init();

    let dir = env::args().nth(1).unwrap_or_else(|| "geodeData".to_string());
    let engine = StorageEngine::open(&dir, StorageOptions::from_env()?)?;
    let bpm = engine.buffer_manager();

    // Write a value and commit it
    let tx = engine.begin()?;
    let handle = bpm.pin_new(DEMO_FILE, &|page: &mut Page| page.clear())?;
    bpm.buffer(&handle).set_int(0, 1234, tx.tx_number(), None)?;
    bpm.unpin(&handle)?;
    tx.commit()?;
    info!("committed 1234 to {}", handle.block());

    // Overwrite it under a shadow copy, then roll back
    let tx = engine.begin()?;
    let handle = bpm.pin(handle.block())?;
    let lsn = tx.shadow_block(&handle)?;
    bpm.buffer(&handle)
        .set_int(0, 9999, tx.tx_number(), Some(lsn))?;
    info!("overwrote {} with 9999", handle.block());
    bpm.unpin(&handle)?;
    tx.rollback()?;

    let handle = bpm.pin(handle.block())?;
    let value = bpm
        .buffer(&handle)
        .get_int(0)
        .context("failed to read back the demo block")?;
    bpm.unpin(&handle)?;

    println!("{} holds {} after rollback", handle.block(), value);
    println!("{} buffers available", bpm.available());
    Ok(())
}
