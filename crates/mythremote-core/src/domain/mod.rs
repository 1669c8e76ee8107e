//! Domain layer: value types describing a frontend session.
//!
//! Pure data with no I/O.  The client crate owns the mutable session; these
//! types only describe *what* it tracks:
//!
//! - **`endpoint`** – which frontend to talk to.
//! - **`status`** – the connection state machine's states and status codes.
//! - **`location`** – what the frontend is showing, and the snapshot used to
//!   raise a location-change notification only on an actual change.

pub mod endpoint;
pub mod location;
pub mod status;
