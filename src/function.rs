//! Function values and the dispatch identity derived from their type.

use serde::{Deserialize, Serialize};
use std::{
    any::TypeId,
    collections::hash_map::DefaultHasher,
    fmt,
    hash::{Hash, Hasher},
    marker::PhantomData,
    mem::{align_of, size_of},
};

/// A function that can be invoked remotely on an object of type `T` with the
/// argument tuple `Args`.
///
/// Implemented for every `Fn(&T, A0, .., An)` up to eight arguments that is
/// `Copy + Send + Sync + 'static`: fn items, fn pointers and closures that
/// capture nothing (or one word-sized `Copy` value).
pub trait RemoteFunction<T, Args>: Copy + Send + Sync + 'static {
    fn invoke(&self, object: &T, args: Args);
}

all_arities!(impl_remote_function);

/// Identifies, across peers running the same binary, the receive-side routine
/// for one `(object type, function type, argument types)` combination.
///
/// Derived from the [`TypeId`] of the triple, so every closure and fn item
/// gets its own identity. Distinct fn pointers of one signature share an
/// identity and are told apart by their function bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DispatchId(pub u64);

impl DispatchId {
    pub fn of<T: 'static, F: 'static, Args: 'static>() -> Self {
        // DefaultHasher::new is unkeyed, so the result only depends on the binary.
        let mut hasher = DefaultHasher::new();
        TypeId::of::<(T, F, Args)>().hash(&mut hasher);
        Self(hasher.finish())
    }
}

impl fmt::Display for DispatchId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:#018x}", self.0)
    }
}

struct PaddingFree<F>(PhantomData<F>);

impl<F> PaddingFree<F> {
    const CHECK: () = assert!(
        size_of::<F>() == 0
            || (size_of::<F>() == size_of::<usize>() && align_of::<F>() == align_of::<usize>()),
        "remote function values must be zero-sized or a single machine word"
    );
}

/// Width of the raw function-value field on the wire for `F`.
pub const fn function_width<F>() -> usize {
    size_of::<F>()
}

/// The exact bit pattern of a function value.
pub fn function_bytes<F: Copy + 'static>(function: &F) -> &[u8] {
    #[allow(clippy::let_unit_value)]
    let () = PaddingFree::<F>::CHECK;
    // SAFETY: `F` is either zero-sized or exactly one word wide with word
    // alignment, so all `size_of::<F>()` bytes are initialized.
    unsafe { std::slice::from_raw_parts(function as *const F as *const u8, size_of::<F>()) }
}
