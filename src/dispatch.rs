//! Entity dispatch. An [`Entity`] is a user-defined object whose
//! designated methods are reached only through `invoke`, identified by a
//! stable integer ordinal.

use crate::error::KernelError;
use crate::value::Value;
use std::future::Future;
use std::pin::Pin;

/// Reserved ordinal meaning "this event carries no real invocation, it is
/// a resume of a parked continuation" — a reserved sentinel meaning
/// resume-only.
pub const RESUME_ORDINAL: u32 = u32::MAX;

/// The future an entity body returns. Kernels without async/await would
/// hand-write a state machine for this; here the Rust compiler does it for
/// us whenever the body is an `async fn`.
pub type BoxEventFuture = Pin<Box<dyn Future<Output = Result<Value, KernelError>>>>;

/// The dispatch contract every simulated entity type implements. `invoke`
/// may suspend — the body can `.await` kernel primitives
/// (`sleep`, `post_continuing`, channel `put`/`take`) any number of times
/// before resolving. `signature_for` must be pure and total.
pub trait Entity {
	/// Executes the method identified by `ordinal` with `args`. May raise
	/// [`KernelError::UserEventError`] or, for unrecognized ordinals,
	/// [`KernelError::UnknownOrdinal`].
	fn invoke(&self, ordinal: u32, args: Vec<Value>) -> BoxEventFuture;

	/// Human-readable name for `ordinal`, used for spectrum accounting and
	/// debug logging. Must be stable and side-effect-free.
	fn signature_for(&self, ordinal: u32) -> &'static str;
}

/// Assigns stable, dense ordinals to an entity type's declared event
/// methods, preserving parent ordinals across inheritance — violating this
/// corrupts dispatch across an inheritance chain.
///
/// A base type builds its table with [`DispatchTable::new`]; a type that
/// extends it appends its own methods with [`DispatchTable::extend`], which
/// keeps the parent's ordinal assignments untouched and starts the child's
/// own methods at the parent's count.
#[derive(Debug, Clone)]
pub struct DispatchTable {
	names: Vec<&'static str>,
}

impl DispatchTable {
	#[must_use]
	pub const fn new(names: Vec<&'static str>) -> Self {
		Self { names }
	}

	/// Builds a child table: parent's ordinals first (unchanged), then the
	/// child's own methods starting at `parent.len()`.
	#[must_use]
	pub fn extend(parent: &Self, child_methods: &[&'static str]) -> Self {
		let mut names = parent.names.clone();
		names.extend_from_slice(child_methods);
		Self { names }
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.names.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.names.is_empty()
	}

	/// # Errors
	/// Returns [`KernelError::UnknownOrdinal`] if `ordinal` is out of range.
	pub fn signature_for(&self, ordinal: u32) -> Result<&'static str, KernelError> {
		self.names.get(ordinal as usize).copied().ok_or(KernelError::UnknownOrdinal {
			signature: "<dispatch table>",
			ordinal,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn child_appends_after_parent_ordinals() {
		let parent = DispatchTable::new(vec!["arrive", "depart"]);
		let child = DispatchTable::extend(&parent, &["refuel"]);

		assert_eq!(child.signature_for(0).unwrap(), "arrive");
		assert_eq!(child.signature_for(1).unwrap(), "depart");
		assert_eq!(child.signature_for(2).unwrap(), "refuel");
		assert_eq!(child.len(), 3);
	}

	#[test]
	fn unknown_ordinal_is_an_error() {
		let table = DispatchTable::new(vec!["only_method"]);
		assert!(table.signature_for(1).is_err());
	}

	#[test]
	fn grandchild_preserves_entire_chain() {
		let base = DispatchTable::new(vec!["a"]);
		let mid = DispatchTable::extend(&base, &["b", "c"]);
		let leaf = DispatchTable::extend(&mid, &["d"]);

		assert_eq!(leaf.signature_for(0).unwrap(), "a");
		assert_eq!(leaf.signature_for(1).unwrap(), "b");
		assert_eq!(leaf.signature_for(2).unwrap(), "c");
		assert_eq!(leaf.signature_for(3).unwrap(), "d");
	}
}
