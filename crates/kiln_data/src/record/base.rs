//! # Record Contract
//!
//! What a record type supplies to the store.

use std::fmt::Debug;
use std::future::{ready, Future};
use std::hash::Hash;
use std::pin::Pin;

use kiln_core::{Poolable, Pooled};
use serde_json::Value;

use super::meta::RecordMeta;
use crate::error::RecordResult;

/// Future returned by [`Record::package`]. Owns everything it needs.
pub type PackageFuture = Pin<Box<dyn Future<Output = RecordResult<Value>> + Send + 'static>>;

/// Future returned by [`Record::parse`].
pub type ParseFuture<'a> = Pin<Box<dyn Future<Output = RecordResult<bool>> + Send + 'a>>;

/// A pooled, change-tracked row.
///
/// The concrete type is the table's scheme. Exactly one primary key is
/// declared through [`Record::primary_key`]; a table caches nothing else
/// about the type.
///
/// `Poolable::clear` must call [`RecordMeta::clear`].
pub trait Record: Poolable {
    /// Primary key type.
    type Key: Clone + Eq + Hash + Debug + Send + Sync + 'static;

    /// Stable tag naming the scheme, used by the scheme registry and in errors.
    const SCHEME: &'static str;

    /// Value of the primary key.
    fn primary_key(&self) -> Self::Key;

    /// Tracking metadata.
    fn meta(&self) -> &RecordMeta<Self>;

    /// Mutable tracking metadata.
    fn meta_mut(&mut self) -> &mut RecordMeta<Self>;

    /// Runs once after the record is acquired and stamped with its set.
    fn on_create(&mut self) {}

    /// Runs when the record is deleted, before it is disposed or marked.
    fn on_deleted(&mut self) {}

    /// Serializes the record for an external collaborator.
    ///
    /// The future must not borrow the record; copy what it needs first.
    fn package(&self) -> PackageFuture {
        Box::pin(ready(Ok(Value::Null)))
    }

    /// Fills the record from external data. `Ok(false)` reports a record
    /// that could not be filled.
    fn parse<'a>(&'a mut self, data: &'a Value) -> ParseFuture<'a> {
        let _ = data;
        Box::pin(ready(Ok(true)))
    }
}

/// Runs [`Record::parse`] on a record nobody else is reading yet.
///
/// The value is moved out of its cell for the duration of the call so no
/// lock is held across the suspension point.
pub(crate) async fn parse_detached<R: Record>(record: &Pooled<R>, data: &Value) -> RecordResult<bool> {
    let mut value = std::mem::take(&mut *record.write());
    let parsed = value.parse(data).await;
    *record.write() = value;
    parsed
}
