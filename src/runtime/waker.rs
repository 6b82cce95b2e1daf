//! `std::task::Waker` integration.
//!
//! Every resumption is polled with a waker bound to the unit's token, so any
//! future awaited inside a unit (channels, foreign leaf futures) requeues the
//! right unit when it calls `wake`.

use crate::runtime::queue::Remote;
use crate::unit::Token;

use futures::task::{self, ArcWake};
use std::sync::Arc;
use std::task::Waker;

struct TokenWaker {
    remote: Remote,
    token: Token,
}

impl ArcWake for TokenWaker {
    fn wake_by_ref(arc_self: &Arc<Self>) {
        arc_self.remote.wakeup(arc_self.token);
    }
}

/// Creates a waker that enqueues `token` on the ready queue behind `remote`.
pub(crate) fn make_waker(remote: Remote, token: Token) -> Waker {
    task::waker(Arc::new(TokenWaker { remote, token }))
}
