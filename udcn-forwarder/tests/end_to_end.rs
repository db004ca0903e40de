//! Multi-thread integration tests driving the full forwarder/app stack:
//! a `LINK` face over a loopback pair plus `APP` faces, exercising the
//! forwarding, PIT timeout and PIT aggregation scenarios end-to-end rather
//! than through direct mailbox injection.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use udcn_common::crypto::SigningKeyMaterial;
use udcn_common::metrics::UdcnMetrics;
use udcn_common::tlv::sig_types;
use udcn_common::{Metainfo, Name};
use udcn_forwarder::{AppHandle, Disposition, Forwarder, LoopbackDriver};

fn spawn_forwarder_pair() -> (udcn_forwarder::ForwarderHandle, udcn_forwarder::ForwarderHandle) {
    let (a_fwd, a_handle) = Forwarder::new(Arc::new(UdcnMetrics::new()));
    let (b_fwd, b_handle) = Forwarder::new(Arc::new(UdcnMetrics::new()));

    let (link_a, link_b) = LoopbackDriver::pair(LoopbackDriver::DEFAULT_MTU);

    let mut a_fwd = a_fwd;
    let mut b_fwd = b_fwd;
    a_fwd.add_link(Arc::new(link_a));
    b_fwd.add_link(Arc::new(link_b));

    thread::spawn(move || a_fwd.run());
    thread::spawn(move || b_fwd.run());

    (a_handle, b_handle)
}

/// S5: an Interest expressed by an app on node A, routed over the link to
/// node B, served by an app registered on B, satisfies the original app.
#[test]
fn s5_forwarding_across_linked_nodes() {
    let (a_handle, b_handle) = spawn_forwarder_pair();

    let mut producer = AppHandle::new(b_handle).unwrap();
    producer.register_prefix(Name::from_uri("/site").unwrap(), |_| Disposition::Continue).unwrap();

    let producer_thread = thread::spawn(move || {
        let msg = producer.recv_timeout(Duration::from_secs(2)).expect("interest arrived");
        let udcn_forwarder::AppLoopMsg::Event(udcn_forwarder::AppEvent::Interest(block)) = &msg else {
            panic!("expected an interest event");
        };
        let name = udcn_common::packet::interest::get_name(block).unwrap();
        let data = udcn_common::packet::data::create(
            &name,
            &Metainfo::none(),
            b"payload",
            sig_types::DIGEST_SHA256,
            &SigningKeyMaterial::None,
        )
        .unwrap();
        producer.put_data(data).unwrap();
        producer.handle_one(msg);
    });

    let mut consumer = AppHandle::new(a_handle).unwrap();
    let satisfied = Arc::new(AtomicBool::new(false));
    let satisfied2 = Arc::clone(&satisfied);
    consumer
        .express_interest(
            Name::from_uri("/site/page").unwrap(),
            4000,
            move |block| {
                assert_eq!(udcn_common::packet::data::get_content(block).unwrap().to_vec(), b"payload".to_vec());
                satisfied2.store(true, Ordering::SeqCst);
                Disposition::Stop
            },
            || Disposition::Stop,
        )
        .unwrap();

    let msg = consumer.recv_timeout(Duration::from_secs(2)).expect("data delivered");
    consumer.handle_one(msg);
    producer_thread.join().unwrap();
    assert!(satisfied.load(Ordering::SeqCst));
}

/// S4: a PIT entry with nobody to serve it expires and delivers exactly one
/// timeout to the waiting app, never a data callback.
#[test]
fn s4_unserved_interest_times_out() {
    let (a_handle, _b_handle) = spawn_forwarder_pair();
    let mut consumer = AppHandle::new(a_handle).unwrap();

    let timed_out = Arc::new(AtomicBool::new(false));
    let got_data = Arc::new(AtomicBool::new(false));
    let (t1, t2) = (Arc::clone(&timed_out), Arc::clone(&got_data));
    consumer
        .express_interest(
            Name::from_uri("/nowhere").unwrap(),
            30,
            move |_| {
                t2.store(true, Ordering::SeqCst);
                Disposition::Stop
            },
            move || {
                t1.store(true, Ordering::SeqCst);
                Disposition::Stop
            },
        )
        .unwrap();

    let msg = consumer.recv_timeout(Duration::from_secs(2)).expect("timeout delivered");
    consumer.handle_one(msg);
    assert!(timed_out.load(Ordering::SeqCst));
    assert!(!got_data.load(Ordering::SeqCst));
}

/// S6: two consumers expressing the same name aggregate into one PIT
/// entry and a single Data satisfies both, each exactly once.
#[test]
fn s6_two_consumers_aggregate_and_both_are_satisfied() {
    let (a_handle, b_handle) = spawn_forwarder_pair();

    let mut producer = AppHandle::new(b_handle).unwrap();
    producer.register_prefix(Name::from_uri("/shared").unwrap(), |_| Disposition::Continue).unwrap();

    let deliveries = Arc::new(AtomicUsize::new(0));

    let producer_thread = thread::spawn(move || {
        let msg = producer.recv_timeout(Duration::from_secs(2)).expect("first interest arrived");
        let udcn_forwarder::AppLoopMsg::Event(udcn_forwarder::AppEvent::Interest(block)) = &msg else {
            panic!("expected an interest event");
        };
        let name = udcn_common::packet::interest::get_name(block).unwrap();
        let data = udcn_common::packet::data::create(
            &name,
            &Metainfo::none(),
            b"shared-payload",
            sig_types::DIGEST_SHA256,
            &SigningKeyMaterial::None,
        )
        .unwrap();
        producer.put_data(data).unwrap();
        producer.handle_one(msg);
    });

    let mut consumer_x = AppHandle::new(a_handle.clone()).unwrap();
    let mut consumer_y = AppHandle::new(a_handle).unwrap();

    let dx = Arc::clone(&deliveries);
    consumer_x
        .express_interest(
            Name::from_uri("/shared/item").unwrap(),
            4000,
            move |_| {
                dx.fetch_add(1, Ordering::SeqCst);
                Disposition::Stop
            },
            || Disposition::Stop,
        )
        .unwrap();

    let dy = Arc::clone(&deliveries);
    consumer_y
        .express_interest(
            Name::from_uri("/shared/item").unwrap(),
            4000,
            move |_| {
                dy.fetch_add(1, Ordering::SeqCst);
                Disposition::Stop
            },
            || Disposition::Stop,
        )
        .unwrap();

    let msg_x = consumer_x.recv_timeout(Duration::from_secs(2)).expect("x satisfied");
    consumer_x.handle_one(msg_x);
    let msg_y = consumer_y.recv_timeout(Duration::from_secs(2)).expect("y satisfied");
    consumer_y.handle_one(msg_y);

    producer_thread.join().unwrap();
    assert_eq!(deliveries.load(Ordering::SeqCst), 2);
}
