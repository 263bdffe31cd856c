pub use enclose::*;

/// Builds a [`Listener`](crate::Listener), cloning the captures listed
/// in parentheses first.
///
/// ```
/// use observe_value::{listener, Graph};
///
/// let graph = Graph::new();
/// let source = graph.state();
/// let target = graph.state();
/// let copy = listener!((source, target) => { let _ = target.set(source.is()); });
/// source.observer().add_listener(&copy);
/// source.set(true).unwrap();
/// assert!(target.is());
/// ```
#[macro_export]
macro_rules! listener {
    (( $($d_tt:tt)* ) => $($b:tt)*) => {
        $crate::listener($crate::macros::enclose!(($( $d_tt )*) move || { $($b)* }))
    };
    (=> $($b:tt)*) => {
        $crate::listener(move || { $($b)* })
    };
}

/// Builds a [`Consumer`](crate::Consumer) receiving the committed value as
/// `Option<&T>`, cloning the captures listed in parentheses first.
#[macro_export]
macro_rules! consumer {
    (( $($d_tt:tt)* ) $value:ident => $($b:tt)*) => {
        $crate::consumer($crate::macros::enclose!(($( $d_tt )*) move |$value: Option<&_>| { $($b)* }))
    };
    ($value:ident => $($b:tt)*) => {
        $crate::consumer(move |$value: Option<&_>| { $($b)* })
    };
}
