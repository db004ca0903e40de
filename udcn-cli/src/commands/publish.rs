//! `udcn-cli publish`: register a prefix, serve exactly one Interest that
//! arrives under it within the deadline, then exit.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};

use udcn_common::crypto::SigningKeyMaterial;
use udcn_common::metrics::UdcnMetrics;
use udcn_common::tlv::sig_types;
use udcn_common::{Metainfo, Name};
use udcn_forwarder::{AppHandle, AppEvent, AppLoopMsg, Disposition, Forwarder};

pub fn run(prefix: String, content: String, timeout_ms: u64) -> Result<()> {
    let prefix = Name::from_uri(&prefix).context("invalid prefix URI")?;

    let (forwarder, handle) = Forwarder::new(Arc::new(UdcnMetrics::new()));
    thread::spawn(move || forwarder.run());

    let mut producer = AppHandle::new(handle).context("registering producer face")?;
    producer.register_prefix(prefix.clone(), |_| Disposition::Continue).context("registering prefix")?;
    println!("listening for interests under {}", prefix.to_uri());

    match producer.recv_timeout(Duration::from_millis(timeout_ms)) {
        Ok(AppLoopMsg::Event(AppEvent::Interest(block))) => {
            let interest_name = udcn_common::packet::interest::get_name(&block)
                .context("malformed interest")?;
            println!("serving interest for {}", interest_name.to_uri());
            let data = udcn_common::packet::data::create(
                &interest_name,
                &Metainfo::none(),
                content.as_bytes(),
                sig_types::DIGEST_SHA256,
                &SigningKeyMaterial::None,
            )
            .context("building data packet")?;
            producer.put_data(data).context("publishing data")?;
        }
        Ok(_) => println!("unexpected event while waiting for an interest"),
        Err(_) => println!("no interest arrived within {}ms", timeout_ms),
    }

    Ok(())
}
