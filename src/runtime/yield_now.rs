use crate::runtime::context::Cx;
use crate::suspend::{Suspend, Suspension};
use crate::unit::Token;

/// Cooperative scheduler hint: suspends once and requeues itself.
///
/// The unit runs again on the next drain, after every token that was already
/// queued ahead of it.
#[derive(Debug, Default)]
pub struct YieldNow {
    yielded: bool,
}

impl YieldNow {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Suspend for YieldNow {
    type Output = ();

    fn is_ready(&self) -> bool {
        self.yielded
    }

    fn suspend(&mut self, token: Token, cx: &Cx) -> Suspension {
        self.yielded = true;
        cx.wakeup(token);
        Suspension::Wait
    }

    fn resume(&mut self) {}
}
