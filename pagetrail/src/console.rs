//! Dry-run transport: records go to stdout instead of the network.

use std::io::Write;

use pagetrail_core::delivery::{Beacon, BoxFuture, HttpPost, PostRequest};
use pagetrail_core::Error;

/// Beacon that prints each record as one JSON line
pub struct ConsoleBeacon;

impl Beacon for ConsoleBeacon {
    fn send_beacon(&self, _endpoint: &str, body: &str) -> bool {
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{}", body).is_ok()
    }
}

/// Fallback that refuses to touch the network
pub struct OfflinePost;

impl HttpPost for OfflinePost {
    fn post(&self, request: PostRequest) -> BoxFuture<'static, pagetrail_core::Result<()>> {
        Box::pin(async move {
            Err(Error::Delivery(format!(
                "dry run: not posting to {}",
                request.endpoint
            )))
        })
    }
}
