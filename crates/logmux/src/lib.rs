//! Decoder for the log stream returned by the container runtime's log API.
//!
//! Containers started without a pseudo-terminal produce a multiplexed binary
//! stream interleaving stdout and stderr frames; TTY-attached containers
//! produce plain unframed bytes. The container service fetches the raw
//! buffer, inspects the container's TTY flag, and hands both to
//! [`decode_stream`].

pub mod demux;

pub use demux::{decode_stream, demultiplex};
