//! End-to-end tests for bridges talking over real transports.

use std::thread;
use std::time::{Duration, Instant};

use zbridge::prelude::*;

const WAIT: Duration = Duration::from_secs(10);

fn tcp_endpoint() -> String {
    let port = portpicker::pick_unused_port().expect("no free port");
    format!("tcp://127.0.0.1:{port}")
}

/// Terminate `ctx` on a helper thread and report whether it finished in time.
fn terminates_within(ctx: Context, limit: Duration) -> bool {
    let (done_tx, done_rx) = flume::bounded(1);
    thread::spawn(move || {
        ctx.terminate();
        let _ = done_tx.send(());
    });
    done_rx.recv_timeout(limit).is_ok()
}

fn wait_for_state(bridge: &Bridge, state: BridgeState) {
    let deadline = Instant::now() + WAIT;
    while bridge.state() != state {
        assert!(Instant::now() < deadline, "bridge never reached {state}");
        thread::sleep(Duration::from_millis(5));
    }
}

#[test]
fn test_req_rep_round_trip() {
    zbridge::dev_tracing::init_tracing();
    let ctx = Context::new();
    let endpoint = tcp_endpoint();
    let rep = Bridge::new(&ctx, SocketKind::Rep, &endpoint, 16);
    let req = Bridge::new(&ctx, SocketKind::Req, &endpoint, 16);

    req.send(["test"]).unwrap();
    let request = rep.recv_timeout(WAIT).unwrap();
    assert_eq!(request.parts(), vec![&b"test"[..]]);

    rep.send(["reply"]).unwrap();
    let reply = req.recv_timeout(WAIT).unwrap();
    assert_eq!(reply.parts(), vec![&b"reply"[..]]);

    req.close().unwrap();
    rep.close().unwrap();
    assert!(terminates_within(ctx, WAIT));
}

#[test]
fn test_empty_frame_preserved() {
    let ctx = Context::new();
    let endpoint = tcp_endpoint();
    let pull = Bridge::new(&ctx, SocketKind::Pull, &endpoint, 16);
    let push = Bridge::new(&ctx, SocketKind::Push, &endpoint, 16);

    push.send(["test", "", "test3"]).unwrap();
    let msg = pull.recv_timeout(WAIT).unwrap();
    assert_eq!(msg.len(), 3);
    assert_eq!(msg.parts(), vec![&b"test"[..], b"", b"test3"]);
    assert!(msg.frames()[1].is_empty());
}

#[test]
fn test_large_multipart() {
    const FRAMES: usize = 90_000;

    let ctx = Context::new();
    let endpoint = tcp_endpoint();
    let pull = Bridge::new(&ctx, SocketKind::Pull, &endpoint, 4);
    let push = Bridge::new(&ctx, SocketKind::Push, &endpoint, 4);

    let parts: Vec<Bytes> = (0..FRAMES).map(|i| Bytes::from(i.to_string())).collect();
    push.send(parts).unwrap();

    let msg = pull.recv_timeout(Duration::from_secs(60)).unwrap();
    assert_eq!(msg.len(), FRAMES);
    for (i, part) in msg.iter().enumerate() {
        assert_eq!(part, i.to_string().as_bytes());
    }
}

#[test]
fn test_single_producer_order() {
    let ctx = Context::new();
    let endpoint = tcp_endpoint();
    let pull = Bridge::new(&ctx, SocketKind::Pull, &endpoint, 16);
    let push = Bridge::new(&ctx, SocketKind::Push, &endpoint, 16);

    let producer = push.sender();
    let handle = thread::spawn(move || {
        for i in 0..1_000u32 {
            producer.send(vec![Bytes::from(i.to_string())]).unwrap();
        }
    });

    for i in 0..1_000u32 {
        let msg = pull.recv_timeout(WAIT).unwrap();
        assert_eq!(msg.parts(), vec![i.to_string().as_bytes()]);
    }
    handle.join().unwrap();
}

#[test]
fn test_concurrent_producers_keep_their_own_order() {
    const PRODUCERS: u32 = 4;
    const PER_PRODUCER: u32 = 250;

    let ctx = Context::new();
    let endpoint = tcp_endpoint();
    let pull = Bridge::new(&ctx, SocketKind::Pull, &endpoint, 8);
    let push = Bridge::new(&ctx, SocketKind::Push, &endpoint, 8);

    let handles: Vec<_> = (0..PRODUCERS)
        .map(|p| {
            let producer = push.sender();
            thread::spawn(move || {
                for seq in 0..PER_PRODUCER {
                    let parts = vec![Bytes::from(p.to_string()), Bytes::from(seq.to_string())];
                    producer.send(parts).unwrap();
                }
            })
        })
        .collect();

    let mut next = vec![0u32; PRODUCERS as usize];
    for _ in 0..PRODUCERS * PER_PRODUCER {
        let msg = pull.recv_timeout(WAIT).unwrap();
        let parts = msg.to_vec();
        let p: usize = std::str::from_utf8(&parts[0]).unwrap().parse().unwrap();
        let seq: u32 = std::str::from_utf8(&parts[1]).unwrap().parse().unwrap();
        assert_eq!(seq, next[p], "producer {p} out of order");
        next[p] += 1;
    }
    for handle in handles {
        handle.join().unwrap();
    }
    assert!(next.iter().all(|&n| n == PER_PRODUCER));
}

#[test]
fn test_router_dealer_with_identity() {
    let ctx = Context::new();
    let endpoint = tcp_endpoint();
    let router = Bridge::new(&ctx, SocketKind::Router, &endpoint, 16);
    let dealer = Bridge::builder(&ctx, SocketKind::Dealer, &endpoint)
        .options(BridgeOptions::new().with_identity("worker-1"))
        .spawn();

    dealer.send(["hello"]).unwrap();
    let request = router.recv_timeout(WAIT).unwrap();
    assert_eq!(request.parts(), vec![&b"worker-1"[..], b"hello"]);

    router.send(["worker-1", "ack"]).unwrap();
    let reply = dealer.recv_timeout(WAIT).unwrap();
    assert_eq!(reply.parts(), vec![&b"ack"[..]]);
}

#[test]
fn test_sub_filters_by_subscription() {
    let ctx = Context::new();
    let endpoint = tcp_endpoint();
    let publisher = Bridge::new(&ctx, SocketKind::Pub, &endpoint, 64);
    let subscriber = Bridge::builder(&ctx, SocketKind::Sub, &endpoint)
        .options(BridgeOptions::new().with_subscription("weather."))
        .spawn();

    // Subscriptions propagate asynchronously, so publish until one lands.
    let deadline = Instant::now() + WAIT;
    let msg = loop {
        assert!(Instant::now() < deadline, "no message reached the subscriber");
        publisher.send(["news.skip"]).unwrap();
        publisher.send(["weather.rain"]).unwrap();
        if let Ok(msg) = subscriber.recv_timeout(Duration::from_millis(50)) {
            break msg;
        }
    };
    assert_eq!(msg.parts(), vec![&b"weather.rain"[..]]);

    while let Ok(Some(msg)) = subscriber.try_recv() {
        assert!(msg.parts()[0].starts_with(b"weather."));
    }
}

#[test]
fn test_reaches_running_then_closed() {
    let ctx = Context::new();
    let bridge = Bridge::new(&ctx, SocketKind::Pair, "inproc://lifecycle", 4);
    wait_for_state(&bridge, BridgeState::Running);
    assert!(bridge
        .relay_address()
        .unwrap()
        .starts_with("inproc://zbridge-relay/pair/inproc://lifecycle#"));
    bridge.close().unwrap();
    assert!(terminates_within(ctx, WAIT));
}

#[test]
fn test_close_idle_bridge_does_not_hang() {
    let ctx = Context::new();
    let bridge_ctx = ctx.clone();
    let (done_tx, done_rx) = flume::bounded(1);
    thread::spawn(move || {
        let bridge = Bridge::new(&bridge_ctx, SocketKind::Pull, tcp_endpoint(), 4);
        wait_for_state(&bridge, BridgeState::Running);
        let _ = done_tx.send(bridge.close().is_ok());
    });
    assert_eq!(done_rx.recv_timeout(WAIT), Ok(true));
    assert!(terminates_within(ctx, WAIT));
}

#[test]
fn test_close_with_full_inbound_queue() {
    let ctx = Context::new();
    let endpoint = tcp_endpoint();
    let pull = Bridge::new(&ctx, SocketKind::Pull, &endpoint, 1);
    let push = Bridge::new(&ctx, SocketKind::Push, &endpoint, 16);

    for i in 0..50u32 {
        push.send([Bytes::from(i.to_string())]).unwrap();
    }
    // The owner is now stalled on the full inbound queue.
    let first = pull.recv_timeout(WAIT).unwrap();
    assert_eq!(first.parts(), vec![&b"0"[..]]);

    let (done_tx, done_rx) = flume::bounded(1);
    thread::spawn(move || {
        let _ = done_tx.send(pull.close().is_ok());
    });
    assert_eq!(done_rx.recv_timeout(WAIT), Ok(true));

    push.close().unwrap();
    assert!(terminates_within(ctx, WAIT));
}

#[test]
fn test_queued_messages_relayed_on_close() {
    let ctx = Context::new();
    let endpoint = tcp_endpoint();
    let pull = Bridge::new(&ctx, SocketKind::Pull, &endpoint, 32);
    let push = Bridge::builder(&ctx, SocketKind::Push, &endpoint)
        .options(
            BridgeOptions::new()
                .with_capacity(32)
                .with_linger(Some(Duration::from_secs(5))),
        )
        .spawn();

    for i in 0..10u32 {
        push.send([Bytes::from(i.to_string())]).unwrap();
    }
    push.close().unwrap();

    for i in 0..10u32 {
        let msg = pull.recv_timeout(WAIT).unwrap();
        assert_eq!(msg.parts(), vec![i.to_string().as_bytes()]);
    }
}

#[test]
fn test_sender_fails_after_close() {
    let ctx = Context::new();
    let bridge = Bridge::new(&ctx, SocketKind::Push, "inproc://after-close", 4);
    let producer = bridge.sender();
    bridge.close().unwrap();
    assert!(producer.send(vec![Bytes::from_static(b"late")]).is_err());
}

#[test]
fn test_bind_conflict_reported() {
    let ctx = Context::new();
    let endpoint = tcp_endpoint();
    let first = Bridge::new(&ctx, SocketKind::Pull, &endpoint, 4);
    wait_for_state(&first, BridgeState::Running);

    let second = Bridge::new(&ctx, SocketKind::Pull, &endpoint, 4);
    let err = second.errors().recv_timeout(WAIT).unwrap();
    assert!(err.is_connection_error(), "unexpected error: {err}");
    assert!(matches!(err, Error::Connection { .. }));
    wait_for_state(&second, BridgeState::Closed);

    second.close().unwrap();
    first.close().unwrap();
}

#[test]
fn test_invalid_endpoint_reported() {
    let ctx = Context::new();
    let bridge = Bridge::new(&ctx, SocketKind::Req, "udp://127.0.0.1:1", 4);
    let err = bridge.errors().recv_timeout(WAIT).unwrap();
    assert!(matches!(err, Error::InvalidEndpoint(_)));
    assert_eq!(bridge.state(), BridgeState::Closed);
    assert!(matches!(bridge.recv(), Err(Error::Closed)));
}

#[test]
fn test_injected_frame_pool_is_used() {
    let ctx = Context::new();
    let pool = FramePool::new(8);
    let pull = Bridge::builder(&ctx, SocketKind::Pull, "inproc://injected-pool")
        .frame_pool(pool.clone())
        .spawn();
    let push = Bridge::new(&ctx, SocketKind::Push, "inproc://injected-pool", 4);

    push.send(["a", "b"]).unwrap();
    let mut msg = pull.recv_timeout(WAIT).unwrap();
    msg.close().unwrap();
    assert_eq!(pool.idle(), 2);
}

#[test]
fn test_close_with_unreachable_peer_does_not_hang() {
    let ctx = Context::new();
    // Nobody listens here, so the socket fills up to its high water mark.
    let push = Bridge::builder(&ctx, SocketKind::Push, tcp_endpoint())
        .options(BridgeOptions::new().with_capacity(256).with_send_hwm(5))
        .spawn();
    wait_for_state(&push, BridgeState::Running);

    for i in 0..200u32 {
        let _ = push.try_send([Bytes::from(i.to_string())]);
    }
    thread::sleep(Duration::from_millis(100));
    assert_eq!(push.state(), BridgeState::Running);

    let (done_tx, done_rx) = flume::bounded(1);
    thread::spawn(move || {
        let _ = done_tx.send(push.close().is_ok());
    });
    assert_eq!(done_rx.recv_timeout(WAIT), Ok(true));
    assert!(terminates_within(ctx, WAIT));
}

#[test]
fn test_close_with_cloned_inbound_queue() {
    let ctx = Context::new();
    let endpoint = tcp_endpoint();
    let pull = Bridge::new(&ctx, SocketKind::Pull, &endpoint, 1);
    let push = Bridge::new(&ctx, SocketKind::Push, &endpoint, 32);
    let held = pull.inbound().clone();

    for i in 0..20u32 {
        push.send([Bytes::from(i.to_string())]).unwrap();
    }
    let deadline = Instant::now() + WAIT;
    while !held.is_full() {
        assert!(Instant::now() < deadline, "inbound queue never filled");
        thread::sleep(Duration::from_millis(5));
    }

    let (done_tx, done_rx) = flume::bounded(1);
    thread::spawn(move || {
        let _ = done_tx.send(pull.close().is_ok());
    });
    assert_eq!(done_rx.recv_timeout(WAIT), Ok(true));

    // The clone keeps what was already queued, then sees the bridge gone.
    let first = held.try_recv().unwrap();
    assert_eq!(first.parts(), vec![&b"0"[..]]);
    assert!(held.recv_timeout(WAIT).is_err());
    assert!(held.is_disconnected());

    push.close().unwrap();
}

#[test]
fn test_transfer_error_tears_down_bridge() {
    let ctx = Context::new();
    let endpoint = tcp_endpoint();
    let rep = Bridge::new(&ctx, SocketKind::Rep, &endpoint, 4);
    let req = Bridge::new(&ctx, SocketKind::Req, &endpoint, 4);

    // A REQ socket must read the reply before sending again.
    req.send(["first"]).unwrap();
    req.send(["second"]).unwrap();

    let err = req.errors().recv_timeout(WAIT).unwrap();
    assert!(matches!(err, Error::Transfer(_)), "unexpected error: {err}");
    assert!(err.is_transfer_error());
    wait_for_state(&req, BridgeState::Closed);
    assert!(matches!(req.send(["late"]), Err(Error::Closed)));

    let (done_tx, done_rx) = flume::bounded(1);
    thread::spawn(move || {
        let _ = done_tx.send(req.close().is_ok());
    });
    assert_eq!(done_rx.recv_timeout(WAIT), Ok(true));
    rep.close().unwrap();
    assert!(terminates_within(ctx, WAIT));
}
