//! Reachability and latency probing for Minecraft servers.
//!
//! A probe takes the `host:port` text a user typed, runs exactly one
//! [`Strategy`] against it (a timed TCP connect, a RakNet unconnected ping
//! over UDP, or a lookup through an HTTP status API), and classifies the
//! answer into a [`LatencyTier`] or a specific failure. See [`run_probe`].

#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::module_name_repetitions)]

macro_rules! create_timeout {
    ($name:ident, $ret:ty) => {
        ::paste::paste! {
            #[doc = concat!("Similar to [`", stringify!($name), "`]")]
            /// but with an added argument for timeout.
            ///
            /// Note that timeouts are not precise, and may vary on the order
            /// of milliseconds, because of the way the async event loop works.
            ///
            /// # Arguments
            /// * `host` - A string slice that holds the hostname of the server to connect to.
            /// * `port` - The port to connect to on that server.
            /// * `dur` - How long to wait for the whole exchange.
            ///
            /// # Errors
            /// Returns `Err` on any condition that
            #[doc = concat!("[`", stringify!($name), "`]")]
            /// does, and an [`std::io::ErrorKind::TimedOut`] error when the
            /// response is not fully recieved within `dur`.
            pub async fn [<$name _with_timeout>](
                host: &str,
                port: u16,
                dur: ::std::time::Duration,
            ) -> ::std::io::Result<$ret> {
                use crate::errors::timeout_err;
                use ::tokio::time::timeout;

                timeout(dur, $name(host, port))
                    .await
                    .unwrap_or_else(|_| timeout_err::<$ret>())
            }
        }
    };
}

pub mod classify;
pub mod config;
pub mod endpoint;
pub mod errors;
pub mod orchestrator;
pub mod outcome;
pub mod probe;
mod socket;
mod varint;

pub use classify::{classify, Classification, ClassifiedOutcome, LatencyTier};
pub use config::{Edition, ProbeConfig, StatusApiConfig, Strategy};
pub use endpoint::Endpoint;
pub use errors::ParseError;
pub use orchestrator::{probe_endpoint, run_probe, run_probe_with};
pub use outcome::{ProbeOutcome, ServerMetadata, ServiceFailure, UnreachableReason};
pub use probe::Probe;
