//! Tests for the thread-affine socket, the poller and socket monitoring.

use std::time::Duration;

use zbridge::monitor::{read_event, MonitorEvents, SocketEvent};
use zbridge::poller::{poll, PollItem, POLLIN};
use zbridge::prelude::*;

const WAIT: Duration = Duration::from_secs(10);

fn tcp_endpoint() -> String {
    let port = portpicker::pick_unused_port().expect("no free port");
    format!("tcp://127.0.0.1:{port}")
}

fn tcp_pipe(ctx: &Context) -> (Socket, Socket) {
    let endpoint = tcp_endpoint();
    let pull = ctx.socket(SocketKind::Pull).unwrap();
    pull.set_linger(0).unwrap();
    pull.bind(&endpoint).unwrap();
    let push = ctx.socket(SocketKind::Push).unwrap();
    push.set_linger(0).unwrap();
    push.connect(&endpoint).unwrap();
    (push, pull)
}

#[test]
fn test_poll_blocks_until_peer_sends() {
    let ctx = Context::new();
    let (push, pull) = tcp_pipe(&ctx);

    push.send_multipart(["ready"]).unwrap();
    let mut items = [PollItem::readable(&pull)];
    let ready = poll(&mut items, None).unwrap();
    assert_eq!(ready, 1);
    assert!(items[0].observed().contains(POLLIN));
}

#[test]
fn test_poll_zero_timeout_with_nothing_pending() {
    let ctx = Context::new();
    let (_push, pull) = tcp_pipe(&ctx);

    let mut items = [PollItem::readable(&pull)];
    let started = std::time::Instant::now();
    assert_eq!(poll(&mut items, Some(Duration::ZERO)).unwrap(), 0);
    assert!(started.elapsed() < Duration::from_secs(1));
    assert!(!items[0].is_readable());
}

#[test]
fn test_multipart_over_tcp() {
    let ctx = Context::new();
    let pool = FramePool::new(16);
    let (push, pull) = tcp_pipe(&ctx);

    push.send_multipart(["header", "", "body"]).unwrap();
    let mut msg = pull.recv_multipart(&pool).unwrap();
    assert_eq!(msg.parts(), vec![&b"header"[..], b"", b"body"]);
    assert!(msg.frames()[0].has_more());
    assert!(msg.frames()[1].has_more());
    assert!(!msg.frames()[2].has_more());

    msg.close().unwrap();
    assert!(matches!(msg.close(), Err(Error::FrameReleased)));
    assert_eq!(pool.idle(), 3);
}

#[test]
fn test_frame_copy_survives_release() {
    let ctx = Context::new();
    let pool = FramePool::new(4);
    let (push, pull) = tcp_pipe(&ctx);

    push.send_multipart(["payload"]).unwrap();
    let mut frame = pull.recv_frame(&pool).unwrap();
    let copy = frame.to_bytes();
    frame.close().unwrap();
    assert!(frame.data().is_empty());
    assert_eq!(&copy[..], b"payload");
}

#[test]
fn test_monitor_reports_listening_and_accepted() {
    let ctx = Context::new();
    let pool = FramePool::new(8);
    let endpoint = tcp_endpoint();

    let server = ctx.socket(SocketKind::Rep).unwrap();
    server.set_linger(0).unwrap();
    server
        .monitor(
            "inproc://monitor-events",
            MonitorEvents::LISTENING | MonitorEvents::ACCEPTED,
        )
        .unwrap();
    let watcher = ctx.socket(SocketKind::Pair).unwrap();
    watcher.set_linger(0).unwrap();
    watcher.connect("inproc://monitor-events").unwrap();

    server.bind(&endpoint).unwrap();
    let mut items = [PollItem::readable(&watcher)];
    assert_eq!(poll(&mut items, Some(WAIT)).unwrap(), 1);
    let event = read_event(&watcher, &pool).unwrap();
    assert_eq!(event, SocketEvent::Listening(endpoint.clone()));

    let client = ctx.socket(SocketKind::Req).unwrap();
    client.set_linger(0).unwrap();
    client.connect(&endpoint).unwrap();
    assert_eq!(poll(&mut items, Some(WAIT)).unwrap(), 1);
    let event = read_event(&watcher, &pool).unwrap();
    assert!(matches!(event, SocketEvent::Accepted(ref ep) if ep == &endpoint));
}
