//! Streaming rsync-style network deltas: signature, delta, and patch as
//! a pull-driven codec.
//!
//! The core of this crate is a family of *jobs* (see [`job`]) that each
//! wrap a small state machine and expose a single `iter(buffers)` entry
//! point: callers drive a job across arbitrarily-chopped, caller-owned
//! input/output buffers, and the job never performs I/O of its own. This
//! mirrors streaming C libraries such as `zlib`/`librsync`, adapted to
//! Rust's ownership rules — buffers are borrowed for the duration of a
//! single `iter` call rather than referenced through raw pointers.
//!
//! Four job kinds cover the whole protocol:
//!
//! - [`job::sig::SigJob`] — produces a signature stream from a basis file.
//! - [`job::loadsig::LoadSigJob`] — parses a signature stream back into a
//!   [`signature::SignatureTable`].
//! - [`job::delta::DeltaJob`] — scans a new file against an indexed
//!   signature table, producing a delta stream.
//! - [`job::patch::PatchJob`] — replays a delta stream against a basis to
//!   reconstruct the new file.
//!
//! For callers who would rather hand over a `Read`/`Write` pair and not
//! think about buffer chopping at all, [`whole`] drives the same jobs to
//! completion in one call.

pub mod error;
pub mod job;
pub mod logging;
pub mod magic;
pub mod opcode;
pub mod signature;
pub mod stats;
pub mod strong;
pub mod tunables;
pub mod weak;
pub mod whole;

pub use error::{Error, Result, RunResult};
pub use job::Buffers;
pub use job::delta::DeltaJob;
pub use job::loadsig::LoadSigJob;
pub use job::patch::{BasisRead, PatchJob};
pub use job::sig::SigJob;
pub use magic::{Magic, StrongKind, WeakKind};
pub use signature::{SignatureEntry, SignatureTable};
pub use stats::Stats;
