/// Invoke `$m` for a list of type idents and for every shorter suffix of it.
#[macro_export]
#[doc(hidden)]
macro_rules! for_each_tuple_suffix {
    ($m:ident !! $head_ty:ident) => {
        $m!($head_ty);
    };
    ($m:ident !! $head_ty:ident, $($tail_ty:ident),*) => (
        $m!($head_ty, $( $tail_ty ),*);
        $crate::for_each_tuple_suffix!($m !! $( $tail_ty ),*);
    );
}

/// Apply a macro to every tuple arity from 1 to 16.
///
/// Bundles and signatures built from component tuples are implemented through this, so a
/// single entity can be described by at most 16 component types in one tuple (tuples nest).
#[macro_export]
#[doc(hidden)]
macro_rules! all_tuples {
    ($m:ident) => {
        $crate::for_each_tuple_suffix!($m !! A, B, C, D, E, F, G, H, I, J, K, L, M, N, O, P);
    };
}
