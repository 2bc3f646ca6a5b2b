//! The [`Transport`] trait.

use std::sync::Arc;

use bbb_core::BbbResult;

use crate::request::{Request, Response};

/// Performs one HTTP exchange for an API call.
///
/// Implementations must:
/// - send a POST iff the request payload is non-empty, a GET otherwise
/// - fail with [`bbb_core::ErrorKind::Network`] (status attached) on a non-2xx
///   status
/// - fail with [`bbb_core::ErrorKind::Transport`] when the server cannot be
///   reached
/// - return the `JSESSIONID` cookie value, if the server set a non-empty one
///
/// A call holds no state shared with other calls beyond read-only
/// configuration, so one transport can serve several threads.
pub trait Transport: Send + Sync {
    fn send(&self, request: &Request) -> BbbResult<Response>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn send(&self, request: &Request) -> BbbResult<Response> {
        (**self).send(request)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&self, request: &Request) -> BbbResult<Response> {
        (**self).send(request)
    }
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn send(&self, request: &Request) -> BbbResult<Response> {
        (**self).send(request)
    }
}
