//! The receive side: decoding packets back into calls on registered objects.

use crate::{
    archive::ArchiveReader,
    function::{function_bytes, DispatchId, RemoteFunction},
    rmi::{ObjectError, Rmi},
    types::{ObjectId, ProcId, SIZE_WORD},
    wire::PACKET_HEADER_LEN,
};
use serde::de::DeserializeOwned;
use std::{collections::BTreeMap, marker::PhantomData, sync::Arc};
use thiserror::Error;
use tracing::trace;

/// Maps [`DispatchId`]s to the typed routines that decode and invoke a call.
///
/// Functions are registered with [`add`](Self::add); received packets are
/// run with [`dispatch`](Self::dispatch). Fn pointers of one signature share
/// an identity, so each identity holds a list of handlers told apart by
/// their function bytes.
#[derive(Default)]
pub struct Dispatcher {
    handlers: BTreeMap<DispatchId, Vec<Arc<dyn DynamicHandler>>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `function` callable by peers. Returns the identity calls to it carry.
    pub fn add<T, Args, F>(&mut self, function: F) -> Result<DispatchId, RegisterError>
    where
        T: Send + Sync + 'static,
        Args: DeserializeOwned + 'static,
        F: RemoteFunction<T, Args>,
    {
        let id = DispatchId::of::<T, F, Args>();
        let bits = function_bytes(&function);
        let handlers = self.handlers.entry(id).or_default();
        if handlers.iter().any(|h| h.function_bits() == bits) {
            return Err(RegisterError::Duplicate(id));
        }
        handlers.push(Arc::new(TypedHandler::<T, Args, F> {
            function,
            _signature: PhantomData,
        }));
        Ok(id)
    }

    pub fn contains(&self, id: DispatchId) -> bool {
        self.handlers.contains_key(&id)
    }

    /// Decode `packet` and invoke the function it names on the object it names.
    pub fn dispatch(&self, source: ProcId, rmi: &Rmi, packet: &[u8]) -> DispatchResult {
        use DispatchError::*;
        let mut rd = ArchiveReader::new(packet);
        let declared = rd.read_size_word().ok_or(Truncated)?;
        let actual = (packet.len() - SIZE_WORD) as u64;
        if declared != actual {
            return Err(LengthMismatch { declared, actual });
        }
        rd.read_bytes(PACKET_HEADER_LEN).ok_or(Truncated)?;
        let id = DispatchId(rd.read_size_word().ok_or(Truncated)?);
        let handlers = self.handlers.get(&id).ok_or(NoSuchFunction(id))?;
        // Every handler under one identity has the same function type, hence the same width.
        let width = handlers.first().map_or(0, |h| h.function_bits().len());
        let bits = rd.read_bytes(width).ok_or(Truncated)?;
        let handler = handlers
            .iter()
            .find(|h| h.function_bits() == bits)
            .ok_or(FunctionMismatch)?;
        trace!(source, dispatch = %id, "dispatching call");
        handler.invoke(rmi, &mut rd)
    }
}

pub type DispatchResult = Result<(), DispatchError>;

#[derive(Debug, Error)]
pub enum RegisterError {
    #[error("this function is already registered under dispatch identity {0}")]
    Duplicate(DispatchId),
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("packet truncated")]
    Truncated,

    #[error("length word says {declared} bytes, packet carries {actual}")]
    LengthMismatch { declared: u64, actual: u64 },

    #[error("no function with dispatch identity {0}")]
    NoSuchFunction(DispatchId),

    #[error("function value does not match the registered one")]
    FunctionMismatch,

    #[error("resolving target object: {0}")]
    Object(#[from] ObjectError),

    #[error("decoding arguments for object {objid}: {source}")]
    Args {
        objid: ObjectId,
        source: bincode::Error,
    },

    #[error("{0} unread bytes after the arguments")]
    TrailingBytes(usize),
}

struct TypedHandler<T, Args, F> {
    function: F,
    _signature: PhantomData<fn(&T, Args)>,
}

/// A type-erased version of [`TypedHandler`]
trait DynamicHandler: Send + Sync {
    fn function_bits(&self) -> &[u8];

    /// Run the call; `rd` is positioned just past the function bytes.
    fn invoke(&self, rmi: &Rmi, rd: &mut ArchiveReader) -> DispatchResult;
}

impl<T, Args, F> DynamicHandler for TypedHandler<T, Args, F>
where
    T: Send + Sync + 'static,
    Args: DeserializeOwned,
    F: RemoteFunction<T, Args>,
{
    fn function_bits(&self) -> &[u8] {
        function_bytes(&self.function)
    }

    fn invoke(&self, rmi: &Rmi, rd: &mut ArchiveReader) -> DispatchResult {
        let objid = rd.read_size_word().ok_or(DispatchError::Truncated)?;
        let object = rmi.get::<T>(objid)?;
        let args: Args = rd
            .read()
            .map_err(|source| DispatchError::Args { objid, source })?;
        let trailing = rd.remaining().len();
        if trailing != 0 {
            return Err(DispatchError::TrailingBytes(trailing));
        }
        self.function.invoke(&object, args);
        Ok(())
    }
}
