//! Declarative macros for ergonomic effect construction
//!
//! These macros reduce boilerplate when creating `Effect` variants from
//! reducers, in particular the boxed async blocks that wrap HTTP calls.

/// Create an `Effect::Future` from an async block
///
/// The block is moved into the future, so clone everything it needs from
/// the environment before invoking the macro.
///
/// # Example
///
/// ```rust,ignore
/// use todo_sync_core::async_effect;
///
/// let backend = env.backend.clone();
/// async_effect! {
///     match backend.delete_todo(&token, &id).await {
///         Ok(()) => Some(TodoAction::TodoDeleted { id }),
///         Err(error) => Some(TodoAction::RequestFailed { error }),
///     }
/// }
/// ```
#[macro_export]
macro_rules! async_effect {
    ($($body:tt)*) => {
        $crate::effect::Effect::Future(
            ::std::boxed::Box::pin(async move { $($body)* })
        )
    };
}
