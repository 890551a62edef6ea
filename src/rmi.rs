//! Distributed-object registry and per-peer traffic counters.

use crate::{
    transport::Accounting,
    types::{ObjectId, ProcId},
};
use parking_lot::RwLock;
use std::{
    any::{type_name, Any},
    collections::BTreeMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};
use thiserror::Error;
use tracing::warn;

pub type SharedObject = Arc<dyn Any + Send + Sync>;

/// Maps object ids to live instances and counts bytes sent to each peer.
///
/// Objects created in the same order on every peer get the same id from
/// [`Rmi::insert`], which is how a call names its target object remotely.
pub struct Rmi {
    objects: RwLock<BTreeMap<ObjectId, SharedObject>>,
    next_id: AtomicU64,
    bytes_sent: Box<[AtomicU64]>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ObjectError {
    #[error("no object with id {0}")]
    NoSuchObject(ObjectId),

    #[error("object {id} is not a {expected}")]
    WrongType { id: ObjectId, expected: &'static str },
}

impl Rmi {
    pub fn new(num_procs: usize) -> Self {
        Self {
            objects: RwLock::new(BTreeMap::new()),
            next_id: AtomicU64::new(0),
            bytes_sent: (0..num_procs).map(|_| AtomicU64::new(0)).collect(),
        }
    }

    pub fn num_procs(&self) -> usize {
        self.bytes_sent.len()
    }

    /// Register `object` under the next sequential id.
    pub fn insert<T: Any + Send + Sync>(&self, object: Arc<T>) -> ObjectId {
        let mut objects = self.objects.write();
        let mut id = self.next_id.fetch_add(1, Ordering::Relaxed);
        while objects.contains_key(&id) {
            id = self.next_id.fetch_add(1, Ordering::Relaxed);
        }
        objects.insert(id, object);
        id
    }

    /// Register `object` under an explicit id, returning whatever was there before.
    pub fn insert_at<T: Any + Send + Sync>(
        &self,
        id: ObjectId,
        object: Arc<T>,
    ) -> Option<SharedObject> {
        self.objects.write().insert(id, object)
    }

    pub fn remove(&self, id: ObjectId) -> Option<SharedObject> {
        self.objects.write().remove(&id)
    }

    pub fn get<T: Any + Send + Sync>(&self, id: ObjectId) -> Result<Arc<T>, ObjectError> {
        let object = self
            .objects
            .read()
            .get(&id)
            .cloned()
            .ok_or(ObjectError::NoSuchObject(id))?;
        object.downcast::<T>().map_err(|_| ObjectError::WrongType {
            id,
            expected: type_name::<T>(),
        })
    }

    pub fn bytes_sent(&self, target: ProcId) -> u64 {
        self.bytes_sent
            .get(usize::from(target))
            .map_or(0, |counter| counter.load(Ordering::Relaxed))
    }

    pub fn total_bytes_sent(&self) -> u64 {
        self.bytes_sent
            .iter()
            .map(|counter| counter.load(Ordering::Relaxed))
            .sum()
    }
}

impl Accounting for Rmi {
    fn inc_bytes_sent(&self, target: ProcId, bytes: usize) {
        match self.bytes_sent.get(usize::from(target)) {
            Some(counter) => {
                counter.fetch_add(bytes as u64, Ordering::Relaxed);
            }
            None => warn!(peer = target, bytes, "bytes sent to unknown peer"),
        }
    }
}
