//! Marshalling for remote calls on distributed objects.
//!
//! An [`ObjectCaller`] turns `(target, object id, function, arguments)` into a
//! self-describing packet, built in a per-thread pooled [`Archive`], and hands
//! an exactly sized copy to a [`Sender`]. A [`Dispatcher`] on the receiving
//! peer decodes the packet and invokes the function on the object found in
//! its [`Rmi`] registry.

#[macro_use]
mod macros;

pub mod archive;
pub mod calling;
pub mod dispatcher;
pub mod function;
pub mod net;
pub mod pool;
pub mod rmi;
pub mod split;
pub mod transport;
pub mod types;
pub mod wire;

pub use archive::{Archive, ArchiveReader};
pub use calling::{EncodeError, ObjectCaller};
pub use dispatcher::{DispatchError, Dispatcher, RegisterError};
pub use function::{DispatchId, RemoteFunction};
pub use net::{client::TcpSender, server::serve_tcp, NetConfig, NetError};
pub use rmi::{ObjectError, Rmi};
pub use split::SplitCall;
pub use transport::{Accounting, Sender};
pub use types::{Flags, ObjectId, ProcId};
