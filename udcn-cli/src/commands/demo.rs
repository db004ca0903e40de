//! Self-contained round-trip demo: one forwarder, one producer app face and
//! one consumer app face wired through it, so the whole Interest/Data
//! exchange plays out inside a single process.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use log::info;

use udcn_common::crypto::SigningKeyMaterial;
use udcn_common::metrics::UdcnMetrics;
use udcn_common::tlv::sig_types;
use udcn_common::{Metainfo, Name};
use udcn_forwarder::{AppHandle, Disposition, Forwarder};

use crate::utils::{print_header, Timer};

pub fn run(prefix: String, name: String, content: String, timeout_ms: u64) -> Result<()> {
    let prefix = Name::from_uri(&prefix).context("invalid prefix URI")?;
    let name = Name::from_uri(&name).context("invalid name URI")?;

    print_header("µDCN loopback demo");
    let (forwarder, handle) = Forwarder::new(Arc::new(UdcnMetrics::new()));
    thread::spawn(move || forwarder.run());

    let mut producer = AppHandle::new(handle.clone()).context("registering producer face")?;
    producer
        .register_prefix(prefix.clone(), |interest_block| {
            if let Ok(interest_name) = udcn_common::packet::interest::get_name(interest_block) {
                info!("producer: serving interest for {}", interest_name.to_uri());
            }
            Disposition::Continue
        })
        .context("registering prefix")?;
    println!("registered producer prefix {}", prefix.to_uri());

    let mut consumer = AppHandle::new(handle).context("registering consumer face")?;
    let timer = Timer::new("interest round trip");

    consumer
        .express_interest(name.clone(), timeout_ms, |_| Disposition::Stop, || Disposition::Stop)
        .context("expressing interest")?;
    println!("sent interest for {}", name.to_uri());

    let interest_msg = producer
        .recv_timeout(Duration::from_millis(timeout_ms))
        .context("no interest arrived at producer")?;
    producer.handle_one(interest_msg);

    let data = udcn_common::packet::data::create(
        &name,
        &Metainfo::none(),
        content.as_bytes(),
        sig_types::DIGEST_SHA256,
        &SigningKeyMaterial::None,
    )
    .context("building data packet")?;
    producer.put_data(data).context("publishing data")?;

    let data_msg = consumer
        .recv_timeout(Duration::from_millis(timeout_ms))
        .context("no data arrived before timeout")?;
    consumer.handle_one(data_msg);

    println!("round trip completed in {}", timer.elapsed_str());
    Ok(())
}
