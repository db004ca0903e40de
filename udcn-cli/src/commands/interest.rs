//! `udcn-cli interest`: express a single Interest against a built-in
//! echo producer registered at `/`, and print the Data (or the timeout).

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};

use udcn_common::crypto::SigningKeyMaterial;
use udcn_common::metrics::UdcnMetrics;
use udcn_common::tlv::sig_types;
use udcn_common::{Metainfo, Name};
use udcn_forwarder::{AppHandle, Disposition, Forwarder};

pub fn run(name: String, timeout_ms: u64) -> Result<()> {
    let name = Name::from_uri(&name).context("invalid name URI")?;

    let (forwarder, handle) = Forwarder::new(Arc::new(UdcnMetrics::new()));
    thread::spawn(move || forwarder.run());

    let mut echo = AppHandle::new(handle.clone()).context("registering echo face")?;
    echo.register_prefix(Name::root(), |_| Disposition::Continue).context("registering echo prefix")?;

    let echo_thread = thread::spawn(move || {
        if let Ok(msg) = echo.recv_timeout(Duration::from_millis(timeout_ms)) {
            if let udcn_forwarder::AppLoopMsg::Event(udcn_forwarder::AppEvent::Interest(block)) = &msg {
                if let Ok(interest_name) = udcn_common::packet::interest::get_name(block) {
                    if let Ok(data) = udcn_common::packet::data::create(
                        &interest_name,
                        &Metainfo::none(),
                        b"echo",
                        sig_types::DIGEST_SHA256,
                        &SigningKeyMaterial::None,
                    ) {
                        let _ = echo.put_data(data);
                    }
                }
            }
            echo.handle_one(msg);
        }
    });

    let mut consumer = AppHandle::new(handle).context("registering consumer face")?;
    let satisfied = Arc::new(AtomicBool::new(false));
    let satisfied_cb = Arc::clone(&satisfied);
    let name_uri = name.to_uri();
    consumer
        .express_interest(
            name.clone(),
            timeout_ms,
            move |data| {
                if let Ok(content) = udcn_common::packet::data::get_content(data) {
                    println!("received data for {}: {} bytes", name_uri, content.len());
                }
                satisfied_cb.store(true, Ordering::SeqCst);
                Disposition::Stop
            },
            || {
                println!("interest timed out");
                Disposition::Stop
            },
        )
        .context("expressing interest")?;

    let msg = consumer
        .recv_timeout(Duration::from_millis(timeout_ms + 500))
        .context("no response before deadline")?;
    consumer.handle_one(msg);

    let _ = echo_thread.join();

    if satisfied.load(Ordering::SeqCst) {
        println!("interest for {} satisfied", name.to_uri());
    } else {
        println!("interest for {} timed out", name.to_uri());
    }
    Ok(())
}
