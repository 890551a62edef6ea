/// Implements [`RemoteFunction`](crate::function::RemoteFunction) for every
/// `Fn(&T, A0, .., An)` of the given arity, with the argument tuple as `Args`.
macro_rules! impl_remote_function {
    ($($arg:ident),*) => {
        impl<T, F, $($arg,)*> $crate::function::RemoteFunction<T, ($($arg,)*)> for F
        where
            F: Fn(&T, $($arg),*) + Copy + Send + Sync + 'static,
        {
            #[allow(non_snake_case)]
            fn invoke(&self, object: &T, ($($arg,)*): ($($arg,)*)) {
                (self)(object, $($arg),*)
            }
        }
    };
}

/// Calls `$mac!` once for each arity from zero up to the full list.
macro_rules! all_arities {
    ($mac:ident) => {
        $mac!();
        $mac!(A0);
        $mac!(A0, A1);
        $mac!(A0, A1, A2);
        $mac!(A0, A1, A2, A3);
        $mac!(A0, A1, A2, A3, A4);
        $mac!(A0, A1, A2, A3, A4, A5);
        $mac!(A0, A1, A2, A3, A4, A5, A6);
        $mac!(A0, A1, A2, A3, A4, A5, A6, A7);
    };
}
