//! REQ/REP echo through two bridges, with worker threads on both sides.
//!
//! Run this example:
//! ```bash
//! RUST_LOG=info cargo run --example req_rep_bridge
//! ```

use std::thread;
use std::time::Duration;

use tracing::{info, warn};
use zbridge::prelude::*;

const REQUESTS: usize = 5;

fn main() -> zbridge::Result<()> {
    zbridge::dev_tracing::init_tracing();
    info!("=== zbridge REQ ↔ REP echo ===");

    let ctx = Context::new();
    let endpoint = "tcp://127.0.0.1:5599";

    let server = Bridge::new(&ctx, SocketKind::Rep, endpoint, 16);
    let client = Bridge::new(&ctx, SocketKind::Req, endpoint, 16);

    // The server loop runs on its own thread; the REP socket stays on the
    // bridge's owner thread.
    let replies = server.sender();
    let requests = server.inbound().clone();
    let echo = thread::spawn(move || {
        for _ in 0..REQUESTS {
            let Ok(request) = requests.recv() else { break };
            info!("[REP] Received {:?}", String::from_utf8_lossy(&request.parts().concat()));
            let mut reply = vec![Bytes::from_static(b"echo: ")];
            reply.extend(request.to_vec());
            if replies.send(reply).is_err() {
                break;
            }
        }
    });

    for i in 0..REQUESTS {
        client.send([Bytes::from(format!("request #{i}"))])?;
        let reply = client.recv_timeout(Duration::from_secs(5))?;
        let text: Vec<_> = reply.iter().map(String::from_utf8_lossy).collect();
        info!("[REQ] Reply {}: {}", i, text.concat());
    }

    if echo.join().is_err() {
        warn!("echo thread panicked");
    }

    client.close()?;
    server.close()?;
    info!("Done");
    Ok(())
}
